//! Efx DSP - Digital Signal Processing Units
//!
//! This crate provides the building blocks of the Efx effects chain:
//! - RBJ cookbook coefficient design (peaking, low shelf, high shelf)
//! - Per-channel biquad filters with lock-free coefficient handoff
//! - Delay-line primitives (pre-delay, damped comb, allpass)
//! - Schroeder reverb channel (4 combs + 2 allpasses)
//! - Tanh soft limiter
//!
//! # Architecture
//!
//! The DSP chain follows a strict "no allocation in audio callback" rule.
//! Every buffer is sized at construction; parameters travel from the control
//! thread through [`ParamSlot`]s and are adopted by the audio thread without
//! locks or torn reads.

mod coeffs;
mod delay;
mod error;
mod filter;
mod limiter;
mod processor;
mod reverb;
mod slot;

pub use biquad::Coefficients;
pub use coeffs::{
    clamp_frequency, clamp_gain_db, clamp_q, design, high_shelf, low_shelf, peaking, FilterType,
    IDENTITY, MAX_FREQUENCY, MAX_GAIN_DB, MAX_Q, MIN_FREQUENCY, MIN_GAIN_DB, MIN_Q,
};
pub use delay::{ms_to_samples, AllpassFilter, CombFilter, DelayLine};
pub use error::{try_with_capacity, DspError};
pub use filter::{BiquadFilter, PendingCoefficients};
pub use limiter::{soft_limit, LIMITER_CEILING, LIMITER_DRIVE};
pub use processor::{AudioProcessor, ProcessContext};
pub use reverb::{
    ReverbChannel, ReverbParams, MAX_DAMPING, MAX_PRE_DELAY_MS, MAX_ROOM_SIZE, MIN_ROOM_SIZE,
};
pub use slot::ParamSlot;
