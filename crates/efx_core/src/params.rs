//! Logical Parameter Model
//!
//! The full set of user-facing settings: master gain, the EQ bands, reverb
//! and limiter. This is what a control plane sends and what
//! [`DspControls::params`](crate::DspControls::params) reports back; the
//! audio thread never sees it directly, only the coefficients and flags
//! derived from it.

use efx_dsp::{
    clamp_frequency, clamp_gain_db, clamp_q, design, Coefficients, FilterType, ReverbParams,
};
use serde::{Deserialize, Serialize};

use crate::error::EngineResult;

/// Number of EQ bands, applied in index order
pub const EQ_BANDS: usize = 12;

/// Largest channel count a context accepts
pub const MAX_CHANNELS: usize = 32;

/// Default centre frequencies (Hz). The first three are the classic
/// low shelf / mid peak / high shelf trio; the rest fill the spectrum.
const DEFAULT_FREQUENCIES: [f32; EQ_BANDS] = [
    100.0, 1000.0, 8000.0, // Shelf / presence / shelf
    31.0, 62.0, 250.0, 500.0, 2000.0, 3000.0, 4000.0, 12000.0, 16000.0,
];

/// Response a band takes when no type is given explicitly
pub fn canonical_type(band: usize) -> FilterType {
    match band {
        0 => FilterType::LowShelf,
        2 => FilterType::HighShelf,
        _ => FilterType::Peaking,
    }
}

/// Settings of one EQ band
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EqBandParams {
    pub enabled: bool,
    pub frequency: f32,
    pub q: f32,
    pub gain_db: f32,
    pub filter_type: FilterType,
}

impl EqBandParams {
    /// Disabled, flat band in its canonical role
    pub fn canonical(band: usize) -> Self {
        let filter_type = canonical_type(band);
        Self {
            enabled: false,
            frequency: DEFAULT_FREQUENCIES[band % EQ_BANDS],
            q: match filter_type {
                FilterType::Peaking => 1.0,
                // Butterworth shelf slope
                FilterType::LowShelf | FilterType::HighShelf => 0.707,
            },
            gain_db: 0.0,
            filter_type,
        }
    }

    pub fn clamped(self, sample_rate: u32) -> Self {
        Self {
            frequency: clamp_frequency(self.frequency, sample_rate as f32),
            q: clamp_q(self.q),
            gain_db: clamp_gain_db(self.gain_db),
            ..self
        }
    }

    /// Biquad coefficients for this band at `sample_rate`
    pub fn coefficients(&self, sample_rate: u32) -> Coefficients<f32> {
        design(
            self.filter_type,
            sample_rate as f32,
            self.frequency,
            self.q,
            self.gain_db,
        )
    }
}

/// Reverb switch plus tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReverbSettings {
    pub enabled: bool,
    #[serde(flatten)]
    pub params: ReverbParams,
}

impl Default for ReverbSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            params: ReverbParams::default(),
        }
    }
}

/// Complete parameter set of one DSP context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DspParams {
    /// Linear pre-gain
    pub gain: f32,
    pub eq: [EqBandParams; EQ_BANDS],
    pub reverb: ReverbSettings,
    pub limiter_enabled: bool,
}

impl Default for DspParams {
    fn default() -> Self {
        Self {
            gain: 1.0,
            eq: core::array::from_fn(EqBandParams::canonical),
            reverb: ReverbSettings::default(),
            limiter_enabled: true,
        }
    }
}

impl DspParams {
    /// Every value clamped to its documented range; a non-finite gain becomes unity
    pub fn sanitized(&self, sample_rate: u32) -> Self {
        Self {
            gain: if self.gain.is_finite() { self.gain } else { 1.0 },
            eq: self.eq.map(|band| band.clamped(sample_rate)),
            reverb: ReverbSettings {
                enabled: self.reverb.enabled,
                params: self.reverb.params.clamped(),
            },
            limiter_enabled: self.limiter_enabled,
        }
    }

    pub fn from_json(json: &str) -> EngineResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> EngineResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
