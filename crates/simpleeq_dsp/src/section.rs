//! Single Second-Order Filter Section

use biquad::{Biquad, DirectForm2Transposed};

use crate::design::{identity_coefficients, BiquadCoefficients};
use crate::processor::Stage;
use crate::response::biquad_magnitude;

/// One biquad with its own delay lines and a bypass flag
///
/// Sections start bypassed with identity coefficients; a cascade or chain
/// activates them when it assigns designed coefficients.
pub struct FilterSection {
    // DirectForm2Transposed: better numerical stability than DF1
    filter: DirectForm2Transposed<f32>,
    coefficients: BiquadCoefficients,
    bypassed: bool,
}

impl FilterSection {
    pub fn new() -> Self {
        let coefficients = identity_coefficients();
        Self {
            filter: DirectForm2Transposed::<f32>::new(coefficients),
            coefficients,
            bypassed: true,
        }
    }

    /// Replace the coefficients, keeping the delay lines
    ///
    /// Called at block boundaries only. The switch is abrupt; no smoothing
    /// between the old and new response is performed.
    pub fn set_coefficients(&mut self, coefficients: BiquadCoefficients) {
        self.coefficients = coefficients;
        self.filter.update_coefficients(coefficients);
    }

    pub fn coefficients(&self) -> &BiquadCoefficients {
        &self.coefficients
    }

    /// Whether this section currently alters the signal
    pub fn is_active(&self) -> bool {
        !self.bypassed
    }
}

impl Default for FilterSection {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage for FilterSection {
    /// # Real-time Safety
    /// No allocations, no syscalls, O(1) time.
    #[inline]
    fn process_sample(&mut self, sample: f32) -> f32 {
        if self.bypassed {
            return sample;
        }
        self.filter.run(sample)
    }

    fn reset(&mut self) {
        self.filter.reset_state();
    }

    fn set_bypassed(&mut self, bypassed: bool) {
        self.bypassed = bypassed;
    }

    fn is_bypassed(&self) -> bool {
        self.bypassed
    }

    fn magnitude_for_frequency(&self, frequency: f64, sample_rate: f64) -> f64 {
        if self.bypassed {
            return 1.0;
        }
        biquad_magnitude(&self.coefficients, frequency, sample_rate)
    }
}
