//! SimpleEQ DSP - Digital Signal Processing Module
//!
//! This crate provides the building blocks of the SimpleEQ processing chain:
//! - Coefficient design for peak (bell) and Butterworth cut filters
//! - Variable-slope cut cascades (12/24/36/48 dB/oct) with cumulative activation
//! - A per-channel low-cut -> peak -> high-cut chain with stage bypass
//! - A lock-free SPSC FIFO and block accumulator for analyzer taps
//! - Analytic frequency response for drawing the EQ curve
//!
//! # Architecture
//!
//! The DSP chain follows a strict "no allocation in audio callback" rule.
//! Coefficients are designed on the audio thread between blocks, so no
//! filter state ever crosses threads; the capture FIFO is the only
//! cross-thread path.

mod accumulator;
mod capture;
mod cascade;
mod chain;
mod design;
mod error;
mod processor;
mod response;
mod section;

pub use accumulator::{BlockDrain, Channel, ChannelBlockAccumulator};
pub use capture::{CaptureFifo, FifoConsumer, FifoProducer, CAPTURE_FIFO_CAPACITY};
pub use cascade::{CascadeStage, Slope};
pub use chain::{ChainCoefficients, ChainPosition, ChainSettings, ChannelChain};
pub use design::{
    butterworth_q, db_to_gain, design_cut_cascade, gain_to_db, high_cut_coefficients,
    identity_coefficients, low_cut_coefficients, peak_coefficients, BiquadCoefficients,
    CutCoefficients, CutKind, MAX_CUT_SECTIONS, MAX_FREQUENCY_RATIO, MAX_PEAK_GAIN_DB, MAX_Q,
    MIN_FREQUENCY_HZ, MIN_Q,
};
pub use error::DspError;
pub use processor::{ProcessSpec, Stage};
pub use response::{biquad_magnitude, biquad_response, cascade_magnitude};
pub use section::FilterSection;
