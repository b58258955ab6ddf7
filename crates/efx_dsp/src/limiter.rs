//! Soft Limiter
//!
//! Tanh saturation at the end of the chain so that gain, EQ boosts and
//! reverb build-up can never hard-clip the output.
//!
//! # Algorithm
//!
//! `y = tanh(drive * x)`, clamped to just inside ±1:
//! - odd and monotonically increasing
//! - slope `drive` around zero, flattening smoothly towards ±1
//! - stateless, so it can sit anywhere in the per-sample loop

/// Drive applied before saturation
pub const LIMITER_DRIVE: f32 = 1.5;

/// Largest magnitude the limiter emits
///
/// `tanh` rounds to exactly 1.0 in `f32` for arguments above ~9, so the
/// curve is capped one step inside the open interval (-1, 1).
pub const LIMITER_CEILING: f32 = 1.0 - f32::EPSILON;

/// Soft-limit one sample
///
/// # Real-time Safety
/// No allocations, no branches on the signal, O(1).
#[inline]
pub fn soft_limit(sample: f32) -> f32 {
    (LIMITER_DRIVE * sample)
        .tanh()
        .clamp(-LIMITER_CEILING, LIMITER_CEILING)
}
