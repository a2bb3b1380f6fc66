//! Engine Error Types

use thiserror::Error;

/// Errors that can occur while configuring the engine
///
/// None of these can surface from block processing; they are reported when
/// the host sets the engine up or writes parameters by name.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Engine configuration error: {0}")]
    ConfigError(String),

    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("DSP error: {0}")]
    DspError(#[from] simpleeq_dsp::DspError),
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
