//! Engine and Stream Configuration

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::params::{DspParams, MAX_CHANNELS};

/// Stream format negotiated with the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Sample rate in Hz (e.g., 44100, 48000, 96000)
    pub sample_rate: u32,

    /// Number of interleaved audio channels (1 = mono, 2 = stereo)
    pub channels: u16,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            channels: 2,
        }
    }
}

impl StreamConfig {
    /// Validate configuration
    pub fn validate(&self) -> EngineResult<()> {
        if self.sample_rate < 8000 || self.sample_rate > 384_000 {
            return Err(EngineError::ConfigError(format!(
                "Invalid sample rate: {}",
                self.sample_rate
            )));
        }
        if self.channels == 0 || usize::from(self.channels) > MAX_CHANNELS {
            return Err(EngineError::ConfigError(format!(
                "Invalid channel count: {}",
                self.channels
            )));
        }
        Ok(())
    }
}

/// Overall engine configuration: stream format plus initial parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Stream configuration
    pub stream: StreamConfig,

    /// Parameters applied when the context is created
    #[serde(default)]
    pub params: DspParams,
}

impl EngineConfig {
    pub fn new(stream: StreamConfig) -> Self {
        Self {
            stream,
            params: DspParams::default(),
        }
    }

    pub fn from_json(json: &str) -> EngineResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.stream.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> EngineResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
