//! SimpleEQ Core - Stereo Engine
//!
//! This crate wires the DSP building blocks into a stereo processor:
//! - Engine configuration and setup validation
//! - Lock-free parameter store sampled once per block
//! - Dual channel processing with shared per-block coefficients
//! - Analyzer taps handing filtered blocks to a visualizer thread
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Control Thread                         │
//! │        AtomicParameterStore::set / set_by_name              │
//! └─────────────────────────────────────────────────────────────┘
//!                              │ relaxed atomics
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Audio Thread                           │
//! │   snapshot ──▶ design ──▶ ChannelChain L/R ──▶ accumulators │
//! │              (Zero allocation in this path)                 │
//! └─────────────────────────────────────────────────────────────┘
//!                              │ CaptureFifo (SPSC, 30 blocks)
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Visualizer Thread                        │
//! │              ChannelTaps::left / right .drain()             │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod engine;
mod error;
mod params;

pub use config::{EngineConfig, MAX_BLOCK_SIZE, MAX_SAMPLE_RATE, MIN_SAMPLE_RATE};
pub use engine::{ChannelTaps, DualChannelEngine};
pub use error::{EngineError, EngineResult};
pub use params::{
    AtomicParameterStore, ParameterId, ParameterRange, ParameterSnapshot, ParameterStore,
    PARAMETER_COUNT,
};

// Re-export DSP types for convenience
pub use simpleeq_dsp::{BlockDrain, ChainSettings, Channel, Slope, CAPTURE_FIFO_CAPACITY};
