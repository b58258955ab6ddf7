//! Control Path
//!
//! [`DspControls`] is the handle the control thread uses to change a running
//! context. It is cheap to clone and every method takes `&self`, so it can be
//! handed to whatever thread relays user changes.
//!
//! # Architecture
//!
//! ```text
//! Control Thread                      Audio Thread
//! ──────────────                      ────────────
//! DspControls                         DspContext::process_block
//!   │ gain, flags ───── atomics ───────▶ read once per block
//!   │ EQ designs ────── ParamSlot ─────▶ adopted per filter, per sample
//!   │ reverb params ─── ParamSlot ─────▶ adopted at block start
//!   └ params (Mutex) ◀── snapshot only, never touched by audio thread
//! ```
//!
//! The mutex serialises concurrent control-path writers and keeps the
//! logical parameter record consistent; the audio thread never locks.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use efx_dsp::{FilterType, ParamSlot, PendingCoefficients, ReverbParams};
use parking_lot::Mutex;
use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::params::{DspParams, EqBandParams, EQ_BANDS};

/// State shared between the control handle and the audio thread
#[derive(Debug)]
pub(crate) struct SharedState {
    /// Linear gain, stored as f32 bits
    gain: AtomicU32,
    limiter_enabled: AtomicBool,
    reverb_enabled: AtomicBool,
    band_enabled: [AtomicBool; EQ_BANDS],
    band_designs: [Arc<PendingCoefficients>; EQ_BANDS],
    reverb: ParamSlot<4>,
    /// Logical parameter record (control path only)
    params: Mutex<DspParams>,
}

/// Flags and scalars the audio thread reads once per block
#[derive(Debug, Clone, Copy)]
pub(crate) struct BlockControls {
    pub gain: f32,
    pub limiter_enabled: bool,
    pub reverb_enabled: bool,
    pub bands: [bool; EQ_BANDS],
}

/// Control-path handle to a DSP context
#[derive(Debug, Clone)]
pub struct DspControls {
    sample_rate: u32,
    shared: Arc<SharedState>,
}

impl DspControls {
    /// Create the shared state for a context at `sample_rate`, publishing the defaults
    pub(crate) fn new(sample_rate: u32) -> Self {
        let defaults = DspParams::default();
        let shared = SharedState {
            gain: AtomicU32::new(defaults.gain.to_bits()),
            limiter_enabled: AtomicBool::new(defaults.limiter_enabled),
            reverb_enabled: AtomicBool::new(defaults.reverb.enabled),
            band_enabled: core::array::from_fn(|_| AtomicBool::new(false)),
            band_designs: core::array::from_fn(|_| Arc::new(PendingCoefficients::new())),
            reverb: ParamSlot::new(defaults.reverb.params.to_words()),
            params: Mutex::new(defaults.clone()),
        };

        let controls = Self {
            sample_rate,
            shared: Arc::new(shared),
        };
        controls.apply(&defaults);
        controls
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Set the linear pre-gain; non-finite values are ignored
    pub fn set_gain(&self, linear_gain: f32) {
        if !linear_gain.is_finite() {
            debug!(linear_gain, "Ignoring non-finite gain");
            return;
        }
        let mut params = self.shared.params.lock();
        params.gain = linear_gain;
        self.shared
            .gain
            .store(linear_gain.to_bits(), Ordering::Relaxed);
        debug!(linear_gain, "Gain updated");
    }

    /// Switch one EQ band in or out of the chain
    pub fn set_eq_enabled(&self, band: usize, enabled: bool) -> EngineResult<()> {
        check_band(band)?;
        let mut params = self.shared.params.lock();
        params.eq[band].enabled = enabled;
        self.shared.band_enabled[band].store(enabled, Ordering::Relaxed);
        debug!(band, enabled, "EQ band toggled");
        Ok(())
    }

    /// Retune one EQ band, keeping its current filter type
    pub fn set_eq_params(
        &self,
        band: usize,
        frequency: f32,
        q: f32,
        gain_db: f32,
    ) -> EngineResult<()> {
        check_band(band)?;
        let filter_type = self.shared.params.lock().eq[band].filter_type;
        self.set_eq_band(band, frequency, q, gain_db, filter_type)
    }

    /// Retune one EQ band with an explicit filter type
    ///
    /// Values are clamped: frequency to 20 Hz..20 kHz (and below Nyquist),
    /// Q to 0.3..8, gain to ±24 dB.
    pub fn set_eq_band(
        &self,
        band: usize,
        frequency: f32,
        q: f32,
        gain_db: f32,
        filter_type: FilterType,
    ) -> EngineResult<()> {
        check_band(band)?;
        let mut params = self.shared.params.lock();
        let settings = EqBandParams {
            enabled: params.eq[band].enabled,
            frequency,
            q,
            gain_db,
            filter_type,
        }
        .clamped(self.sample_rate);

        self.shared.band_designs[band].set_design(settings.coefficients(self.sample_rate));
        params.eq[band] = settings;

        debug!(
            band,
            frequency = settings.frequency,
            q = settings.q,
            gain_db = settings.gain_db,
            ?filter_type,
            "EQ band updated"
        );
        Ok(())
    }

    pub fn set_reverb_enabled(&self, enabled: bool) {
        let mut params = self.shared.params.lock();
        params.reverb.enabled = enabled;
        self.shared.reverb_enabled.store(enabled, Ordering::Relaxed);
        debug!(enabled, "Reverb toggled");
    }

    /// Retune the reverb; values are clamped to their documented ranges
    ///
    /// The audio thread picks the new tuning up at its next block boundary
    /// and reinitialises its reverb channels in place.
    pub fn set_reverb_params(&self, wet: f32, room_size: f32, damping: f32, pre_delay_ms: f32) {
        let reverb = ReverbParams {
            wet,
            room_size,
            damping,
            pre_delay_ms,
        }
        .clamped();

        let mut params = self.shared.params.lock();
        self.shared.reverb.store(reverb.to_words());
        params.reverb.params = reverb;
        debug!(?reverb, "Reverb updated");
    }

    pub fn set_limiter_enabled(&self, enabled: bool) {
        let mut params = self.shared.params.lock();
        params.limiter_enabled = enabled;
        self.shared.limiter_enabled.store(enabled, Ordering::Relaxed);
        debug!(enabled, "Limiter toggled");
    }

    /// Apply a complete parameter set (clamped first)
    pub fn apply(&self, params: &DspParams) {
        let params = params.sanitized(self.sample_rate);
        let mut current = self.shared.params.lock();

        self.shared
            .gain
            .store(params.gain.to_bits(), Ordering::Relaxed);
        for (band, settings) in params.eq.iter().enumerate() {
            // Design first so a band switched on sees its new response
            self.shared.band_designs[band].set_design(settings.coefficients(self.sample_rate));
            self.shared.band_enabled[band].store(settings.enabled, Ordering::Relaxed);
        }
        self.shared.reverb.store(params.reverb.params.to_words());
        self.shared
            .reverb_enabled
            .store(params.reverb.enabled, Ordering::Relaxed);
        self.shared
            .limiter_enabled
            .store(params.limiter_enabled, Ordering::Relaxed);

        *current = params;
        debug!("Parameter set applied");
    }

    /// Snapshot of the current logical parameters
    pub fn params(&self) -> DspParams {
        self.shared.params.lock().clone()
    }

    /// Read the per-block scalars (audio thread, lock-free)
    #[inline]
    pub(crate) fn block_controls(&self) -> BlockControls {
        let shared = &self.shared;
        BlockControls {
            gain: f32::from_bits(shared.gain.load(Ordering::Relaxed)),
            limiter_enabled: shared.limiter_enabled.load(Ordering::Relaxed),
            reverb_enabled: shared.reverb_enabled.load(Ordering::Relaxed),
            bands: core::array::from_fn(|band| {
                shared.band_enabled[band].load(Ordering::Relaxed)
            }),
        }
    }

    pub(crate) fn band_design(&self, band: usize) -> Arc<PendingCoefficients> {
        Arc::clone(&self.shared.band_designs[band])
    }

    pub(crate) fn reverb_slot(&self) -> &ParamSlot<4> {
        &self.shared.reverb
    }
}

fn check_band(band: usize) -> EngineResult<()> {
    if band >= EQ_BANDS {
        return Err(EngineError::InvalidBandIndex(band));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_published() {
        let controls = DspControls::new(48000);
        let block = controls.block_controls();

        assert_eq!(block.gain, 1.0);
        assert!(block.limiter_enabled);
        assert!(!block.reverb_enabled);
        assert!(block.bands.iter().all(|&enabled| !enabled));
        assert_eq!(controls.params(), DspParams::default());
    }

    #[test]
    fn test_gain_set_get() {
        let controls = DspControls::new(48000);
        controls.set_gain(0.5);
        assert_eq!(controls.block_controls().gain, 0.5);
        assert_eq!(controls.params().gain, 0.5);
    }

    #[test]
    fn test_non_finite_gain_ignored() {
        let controls = DspControls::new(48000);
        controls.set_gain(0.5);
        controls.set_gain(f32::NAN);
        controls.set_gain(f32::INFINITY);
        assert_eq!(controls.block_controls().gain, 0.5);
        assert_eq!(controls.params().gain, 0.5);
    }

    #[test]
    fn test_nan_eq_and_reverb_values_fall_back() {
        let controls = DspControls::new(48000);
        controls.set_eq_params(4, f32::NAN, f32::NAN, f32::NAN).unwrap();
        controls.set_reverb_params(f32::NAN, f32::NAN, 0.5, f32::NAN);

        let params = controls.params();
        assert_eq!(params.eq[4].frequency, 1000.0);
        assert_eq!(params.eq[4].q, 0.707);
        assert_eq!(params.eq[4].gain_db, 0.0);
        let defaults = ReverbParams::default();
        assert_eq!(params.reverb.params.wet, defaults.wet);
        assert_eq!(params.reverb.params.room_size, defaults.room_size);
        assert_eq!(params.reverb.params.damping, 0.5);
        assert_eq!(params.reverb.params.pre_delay_ms, defaults.pre_delay_ms);
    }

    #[test]
    fn test_flags() {
        let controls = DspControls::new(48000);
        controls.set_limiter_enabled(false);
        controls.set_reverb_enabled(true);
        controls.set_eq_enabled(3, true).unwrap();

        let block = controls.block_controls();
        assert!(!block.limiter_enabled);
        assert!(block.reverb_enabled);
        assert!(block.bands[3]);
        assert!(!block.bands[2]);
    }

    #[test]
    fn test_invalid_band_index() {
        let controls = DspControls::new(48000);
        assert!(controls.set_eq_enabled(EQ_BANDS, true).is_err());
        assert!(controls.set_eq_params(100, 1000.0, 1.0, 3.0).is_err());
        assert!(controls
            .set_eq_band(EQ_BANDS, 1000.0, 1.0, 3.0, FilterType::Peaking)
            .is_err());
    }

    #[test]
    fn test_eq_params_keep_type_and_clamp() {
        let controls = DspControls::new(48000);
        controls.set_eq_params(0, 5.0, 100.0, 99.0).unwrap();

        let band = controls.params().eq[0];
        assert_eq!(band.filter_type, FilterType::LowShelf);
        assert_eq!(band.frequency, 20.0);
        assert_eq!(band.q, 8.0);
        assert_eq!(band.gain_db, 24.0);
    }

    #[test]
    fn test_eq_band_publishes_design() {
        let controls = DspControls::new(48000);
        let design = controls.band_design(1);
        let before = design.design();
        assert_eq!(before.b0, 1.0);

        controls
            .set_eq_band(1, 2000.0, 2.0, 6.0, FilterType::HighShelf)
            .unwrap();
        let after = design.design();
        assert!(after.b0 != 1.0);
        assert_eq!(controls.params().eq[1].filter_type, FilterType::HighShelf);
    }

    #[test]
    fn test_reverb_params_clamped_and_published() {
        let controls = DspControls::new(48000);
        let seen = controls.reverb_slot().sequence();

        controls.set_reverb_params(5.0, 0.0, 0.9, 250.0);

        let (_, words) = controls.reverb_slot().read_newer(seen).unwrap();
        let published = ReverbParams::from_words(words);
        assert_eq!(published.wet, 1.0);
        assert_eq!(published.room_size, 0.2);
        assert_eq!(published.damping, 0.7);
        assert_eq!(published.pre_delay_ms, 100.0);
        assert_eq!(controls.params().reverb.params, published);
    }

    #[test]
    fn test_apply_and_snapshot() {
        let controls = DspControls::new(44100);
        let mut params = DspParams::default();
        params.gain = 0.25;
        params.eq[5].enabled = true;
        params.eq[5].gain_db = -3.0;
        params.reverb.enabled = true;
        params.limiter_enabled = false;

        controls.apply(&params);

        assert_eq!(controls.params(), params);
        let block = controls.block_controls();
        assert_eq!(block.gain, 0.25);
        assert!(block.bands[5]);
        assert!(block.reverb_enabled);
        assert!(!block.limiter_enabled);
    }

    #[test]
    fn test_clones_share_state() {
        let controls = DspControls::new(48000);
        let other = controls.clone();
        other.set_gain(3.0);
        assert_eq!(controls.block_controls().gain, 3.0);
    }
}
