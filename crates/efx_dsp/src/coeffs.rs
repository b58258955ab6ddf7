//! Biquad Coefficient Design
//!
//! Shelving and peaking responses from the RBJ (Robert Bristow-Johnson)
//! Audio EQ Cookbook, normalised so that a0 = 1.
//!
//! These are control-path functions. They allocate nothing, but the
//! trigonometry is not something to run once per sample.

use std::f64::consts::PI;

use biquad::Coefficients;
use serde::{Deserialize, Serialize};

/// Lowest frequency an EQ band can be set to (Hz)
pub const MIN_FREQUENCY: f32 = 20.0;
/// Highest frequency an EQ band can be set to (Hz)
pub const MAX_FREQUENCY: f32 = 20_000.0;
/// Narrowest/widest band shape
pub const MIN_Q: f32 = 0.3;
pub const MAX_Q: f32 = 8.0;
/// Band gain range (dB)
pub const MIN_GAIN_DB: f32 = -24.0;
pub const MAX_GAIN_DB: f32 = 24.0;

/// Filter response realised by an EQ band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterType {
    Peaking,
    LowShelf,
    HighShelf,
}

/// Coefficients that pass the signal through unchanged
pub const IDENTITY: Coefficients<f32> = Coefficients {
    a1: 0.0,
    a2: 0.0,
    b0: 1.0,
    b1: 0.0,
    b2: 0.0,
};

/// Clamp a band frequency to the audible range and below Nyquist
///
/// NaN maps to 1 kHz.
pub fn clamp_frequency(frequency: f32, sample_rate: f32) -> f32 {
    clamp_or(frequency, MIN_FREQUENCY, MAX_FREQUENCY, 1000.0).min(sample_rate * 0.49)
}

/// NaN maps to a Butterworth Q of 0.707.
pub fn clamp_q(q: f32) -> f32 {
    clamp_or(q, MIN_Q, MAX_Q, 0.707)
}

/// NaN maps to 0 dB, leaving the band flat.
pub fn clamp_gain_db(gain_db: f32) -> f32 {
    clamp_or(gain_db, MIN_GAIN_DB, MAX_GAIN_DB, 0.0)
}

/// Clamp `value` to `min..=max`, substituting `fallback` for NaN
///
/// `f32::clamp` lets NaN through, and one NaN coefficient poisons a
/// recursive filter's memory for good.
#[inline]
pub(crate) fn clamp_or(value: f32, min: f32, max: f32, fallback: f32) -> f32 {
    if value.is_nan() {
        fallback
    } else {
        value.clamp(min, max)
    }
}

/// Design a filter of the given type
///
/// Inputs are expected to be clamped already. A gain of 0 dB returns
/// [`IDENTITY`] for every type: the cookbook numerator and denominator are
/// equal there, so the exact identity has the same response without the
/// rounding noise of cancelling terms.
pub fn design(
    filter_type: FilterType,
    sample_rate: f32,
    frequency: f32,
    q: f32,
    gain_db: f32,
) -> Coefficients<f32> {
    if gain_db.abs() < f32::EPSILON {
        return IDENTITY;
    }

    match filter_type {
        FilterType::Peaking => peaking(sample_rate, frequency, q, gain_db),
        FilterType::LowShelf => low_shelf(sample_rate, frequency, q, gain_db),
        FilterType::HighShelf => high_shelf(sample_rate, frequency, q, gain_db),
    }
}

/// Intermediate terms shared by all three cookbook responses
struct Prototype {
    a: f64,
    cos_w0: f64,
    alpha: f64,
}

impl Prototype {
    fn new(sample_rate: f32, frequency: f32, q: f32, gain_db: f32) -> Self {
        let w0 = 2.0 * PI * f64::from(frequency) / f64::from(sample_rate);
        Self {
            // Amplitude from dB: A = 10^(dB/40), so A^2 is the linear gain
            a: 10.0_f64.powf(f64::from(gain_db) / 40.0),
            cos_w0: w0.cos(),
            alpha: w0.sin() / (2.0 * f64::from(q)),
        }
    }
}

fn normalize(b0: f64, b1: f64, b2: f64, a0: f64, a1: f64, a2: f64) -> Coefficients<f32> {
    Coefficients {
        a1: (a1 / a0) as f32,
        a2: (a2 / a0) as f32,
        b0: (b0 / a0) as f32,
        b1: (b1 / a0) as f32,
        b2: (b2 / a0) as f32,
    }
}

/// Peaking EQ: boost or cut centred on `frequency`, bandwidth set by `q`
pub fn peaking(sample_rate: f32, frequency: f32, q: f32, gain_db: f32) -> Coefficients<f32> {
    let Prototype { a, cos_w0, alpha } = Prototype::new(sample_rate, frequency, q, gain_db);

    normalize(
        1.0 + alpha * a,
        -2.0 * cos_w0,
        1.0 - alpha * a,
        1.0 + alpha / a,
        -2.0 * cos_w0,
        1.0 - alpha / a,
    )
}

/// Low shelf: boost or cut everything below `frequency`
pub fn low_shelf(sample_rate: f32, frequency: f32, q: f32, gain_db: f32) -> Coefficients<f32> {
    let Prototype { a, cos_w0, alpha } = Prototype::new(sample_rate, frequency, q, gain_db);
    let two_sqrt_a_alpha = 2.0 * a.sqrt() * alpha;

    normalize(
        a * ((a + 1.0) - (a - 1.0) * cos_w0 + two_sqrt_a_alpha),
        2.0 * a * ((a - 1.0) - (a + 1.0) * cos_w0),
        a * ((a + 1.0) - (a - 1.0) * cos_w0 - two_sqrt_a_alpha),
        (a + 1.0) + (a - 1.0) * cos_w0 + two_sqrt_a_alpha,
        -2.0 * ((a - 1.0) + (a + 1.0) * cos_w0),
        (a + 1.0) + (a - 1.0) * cos_w0 - two_sqrt_a_alpha,
    )
}

/// High shelf: boost or cut everything above `frequency`
pub fn high_shelf(sample_rate: f32, frequency: f32, q: f32, gain_db: f32) -> Coefficients<f32> {
    let Prototype { a, cos_w0, alpha } = Prototype::new(sample_rate, frequency, q, gain_db);
    let two_sqrt_a_alpha = 2.0 * a.sqrt() * alpha;

    normalize(
        a * ((a + 1.0) + (a - 1.0) * cos_w0 + two_sqrt_a_alpha),
        -2.0 * a * ((a - 1.0) + (a + 1.0) * cos_w0),
        a * ((a + 1.0) + (a - 1.0) * cos_w0 - two_sqrt_a_alpha),
        (a + 1.0) - (a - 1.0) * cos_w0 + two_sqrt_a_alpha,
        2.0 * ((a - 1.0) - (a + 1.0) * cos_w0),
        (a + 1.0) - (a - 1.0) * cos_w0 - two_sqrt_a_alpha,
    )
}
