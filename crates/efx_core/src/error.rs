//! Engine Error Types

use thiserror::Error;

use crate::params::EQ_BANDS;

/// Errors that can occur in the effects engine
///
/// None of these can come out of block processing: the real-time path has no
/// error channel and degrades to passthrough instead.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("DSP error: {0}")]
    DspError(#[from] efx_dsp::DspError),

    #[error("Invalid band index: {0} (must be below {max})", max = EQ_BANDS)]
    InvalidBandIndex(usize),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
