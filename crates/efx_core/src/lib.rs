//! Efx Core - Effects Engine
//!
//! This crate provides the real-time effects engine, including:
//! - The DSP context and its block pipeline (gain, EQ, reverb, limiter)
//! - A clonable control handle for changing parameters while audio runs
//! - A serialisable parameter model and stream configuration
//! - A C ABI for host wrappers
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Control Thread                         │
//! │        host / UI ──setters──▶ DspControls (may lock)        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │ atomics + ParamSlot
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Audio Thread                           │
//! │   in ──▶ gain ──▶ EQ bands ──▶ reverb ──▶ limiter ──▶ out   │
//! │              (Zero allocation in this path)                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod context;
mod control;
mod error;
pub mod ffi;
mod params;

pub use config::{EngineConfig, StreamConfig};
pub use context::DspContext;
pub use control::DspControls;
pub use error::{EngineError, EngineResult};
pub use params::{canonical_type, DspParams, EqBandParams, ReverbSettings, EQ_BANDS, MAX_CHANNELS};

// Re-export DSP types for convenience
pub use efx_dsp::{AudioProcessor, FilterType, ProcessContext, ReverbParams};
