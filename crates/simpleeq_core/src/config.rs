//! Engine Configuration

use serde::{Deserialize, Serialize};
use simpleeq_dsp::ProcessSpec;

use crate::error::{EngineError, EngineResult};

/// Supported sample rates in Hz
pub const MIN_SAMPLE_RATE: f32 = 8000.0;
pub const MAX_SAMPLE_RATE: f32 = 192000.0;

/// Largest host block the analyzer taps are sized for
pub const MAX_BLOCK_SIZE: usize = 8192;

/// Stream parameters handed over by the host before playback starts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Sample rate in Hz (e.g., 44100, 48000, 96000)
    pub sample_rate: f32,

    /// Host block length in samples; analyzer blocks have this size
    pub max_block_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000.0,
            max_block_size: 512,
        }
    }
}

impl EngineConfig {
    pub fn new(sample_rate: f32, max_block_size: usize) -> Self {
        Self {
            sample_rate,
            max_block_size,
        }
    }

    /// Create config optimized for low latency
    pub fn low_latency() -> Self {
        Self {
            sample_rate: 48000.0,
            max_block_size: 128, // ~2.7ms
        }
    }

    /// Create config optimized for stability
    pub fn stable() -> Self {
        Self {
            sample_rate: 48000.0,
            max_block_size: 1024, // ~21ms
        }
    }

    /// Duration of one block in milliseconds
    pub fn latency_ms(&self) -> f32 {
        (self.max_block_size as f32 / self.sample_rate) * 1000.0
    }

    pub fn process_spec(&self) -> ProcessSpec {
        ProcessSpec::new(self.sample_rate, self.max_block_size)
    }

    /// Validate configuration
    pub fn validate(&self) -> EngineResult<()> {
        self.process_spec().validate()?;

        if !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&self.sample_rate) {
            return Err(EngineError::ConfigError(format!(
                "Invalid sample rate: {}",
                self.sample_rate
            )));
        }
        if self.max_block_size > MAX_BLOCK_SIZE {
            return Err(EngineError::ConfigError(format!(
                "Invalid block size: {}",
                self.max_block_size
            )));
        }
        Ok(())
    }
}
