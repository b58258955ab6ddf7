//! DSP Error Types

use std::collections::TryReserveError;

use thiserror::Error;

/// Errors that can occur while building DSP units
///
/// Only construction can fail. Processing and parameter updates never
/// return errors: out-of-range values are clamped before they reach a unit.
#[derive(Error, Debug)]
pub enum DspError {
    #[error("Sample rate must be positive, got {0}")]
    InvalidSampleRate(u32),

    #[error("Channel count must be at least 1, got {0}")]
    InvalidChannelCount(usize),

    #[error("Failed to allocate room for {len} elements")]
    AllocationFailed {
        len: usize,
        #[source]
        source: TryReserveError,
    },
}

/// Empty vector with room for exactly `len` elements, reporting allocation
/// failure instead of aborting.
pub fn try_with_capacity<T>(len: usize) -> Result<Vec<T>, DspError> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|source| DspError::AllocationFailed { len, source })?;
    Ok(buffer)
}

/// Allocate a zeroed sample buffer
pub(crate) fn zeroed_buffer(samples: usize) -> Result<Vec<f32>, DspError> {
    let mut buffer = try_with_capacity(samples)?;
    buffer.resize(samples, 0.0);
    Ok(buffer)
}
