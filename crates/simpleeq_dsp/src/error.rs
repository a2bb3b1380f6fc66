//! DSP Error Types

use thiserror::Error;

/// Errors that can occur while preparing DSP components
///
/// Nothing on the per-sample path returns these: out-of-range filter
/// parameters are clamped by the designer instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DspError {
    #[error("Sample rate must be positive and finite, got {0}")]
    InvalidSampleRate(f32),

    #[error("Block size must be at least one sample, got {0}")]
    InvalidBlockSize(usize),
}
