//! Stage Abstraction
//!
//! Defines the interface shared by every element of the filter chain.
//! A chain is a fixed sequence of stages (low-cut -> peak -> high-cut), so
//! static dispatch on concrete fields is used for processing and this trait
//! is what makes the stages interchangeable for bypass and response queries.

use crate::error::DspError;

/// Stream metadata handed to components at setup time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessSpec {
    pub sample_rate: f32,
    pub max_block_size: usize,
}

impl ProcessSpec {
    pub fn new(sample_rate: f32, max_block_size: usize) -> Self {
        Self {
            sample_rate,
            max_block_size,
        }
    }

    /// Check the setup preconditions
    ///
    /// A failure here is a programming error on the host side; the per-block
    /// path never re-checks these values.
    pub fn validate(&self) -> Result<(), DspError> {
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(DspError::InvalidSampleRate(self.sample_rate));
        }
        if self.max_block_size == 0 {
            return Err(DspError::InvalidBlockSize(self.max_block_size));
        }
        Ok(())
    }
}

/// One element of a channel's filter chain
///
/// # Real-time Safety Contract
///
/// Implementors MUST follow these rules in `process_sample()`:
/// - NO heap allocations (no Vec::push, no Box::new, no String)
/// - NO syscalls (no file I/O, no mutex locks, no logging)
/// - Constant time per sample
///
/// A bypassed stage returns its input unchanged and leaves its delay
/// lines untouched.
pub trait Stage: Send {
    /// Filter one sample
    fn process_sample(&mut self, sample: f32) -> f32;

    /// Filter a block in place
    #[inline]
    fn process_block(&mut self, block: &mut [f32]) {
        for sample in block.iter_mut() {
            *sample = self.process_sample(*sample);
        }
    }

    /// Clear delay lines
    fn reset(&mut self);

    fn set_bypassed(&mut self, bypassed: bool);

    fn is_bypassed(&self) -> bool;

    /// Linear magnitude of this stage's transfer function at `frequency`
    ///
    /// A bypassed stage reports unity gain.
    fn magnitude_for_frequency(&self, frequency: f64, sample_rate: f64) -> f64;
}
