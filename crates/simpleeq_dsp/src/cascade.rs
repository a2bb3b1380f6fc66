//! Variable-Order Cut Filter
//!
//! A low-cut or high-cut stage is four second-order sections in series.
//! Higher slopes are built by enabling more sections: slope level `L`
//! activates sections `0..=L` with the first `L + 1` designed coefficient
//! sets and bypasses the rest, giving a Butterworth response of order
//! `2 * (L + 1)`.

use serde::{Deserialize, Serialize};

use crate::design::{BiquadCoefficients, MAX_CUT_SECTIONS};
use crate::processor::Stage;
use crate::section::FilterSection;

/// Roll-off steepness of a cut filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Slope {
    #[default]
    Db12,
    Db24,
    Db36,
    Db48,
}

impl Slope {
    pub const ALL: [Slope; 4] = [Slope::Db12, Slope::Db24, Slope::Db36, Slope::Db48];

    /// Slope level 0..=3
    pub fn index(self) -> usize {
        self as usize
    }

    /// Level from an index; values past the steepest setting saturate
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index.min(Self::ALL.len() - 1)]
    }

    /// Level from a host choice parameter (rounded, clamped to 0..=3)
    pub fn from_choice(value: f32) -> Self {
        if value.is_nan() {
            return Slope::Db12;
        }
        Self::from_index(value.round().max(0.0) as usize)
    }

    /// Total filter order: two per active section
    pub fn order(self) -> usize {
        2 * (self.index() + 1)
    }

    /// Number of sections this slope enables
    pub fn sections(self) -> usize {
        self.index() + 1
    }

    pub fn db_per_octave(self) -> u32 {
        12 * (self.index() as u32 + 1)
    }

    /// Display label, e.g. "24 dB/Oct"
    pub fn label(self) -> &'static str {
        match self {
            Slope::Db12 => "12 dB/Oct",
            Slope::Db24 => "24 dB/Oct",
            Slope::Db36 => "36 dB/Oct",
            Slope::Db48 => "48 dB/Oct",
        }
    }
}

/// Four filter sections with cumulative activation and a stage bypass
pub struct CascadeStage {
    sections: [FilterSection; MAX_CUT_SECTIONS],
    slope: Slope,
    bypassed: bool,
}

impl CascadeStage {
    /// Create a stage with every section bypassed
    pub fn new() -> Self {
        Self {
            sections: core::array::from_fn(|_| FilterSection::new()),
            slope: Slope::Db12,
            bypassed: false,
        }
    }

    /// Apply a slope with its designed coefficients
    ///
    /// Sections `0..=slope.index()` receive `coefficients[0..=slope.index()]`
    /// and are activated; every later section is bypassed again, so moving
    /// from a steep slope to a gentler one never leaves stale sections
    /// running. A section with no matching coefficient set is bypassed.
    pub fn set_slope(&mut self, slope: Slope, coefficients: &[BiquadCoefficients]) {
        debug_assert!(
            coefficients.len() >= slope.sections(),
            "slope {:?} needs {} coefficient sets, got {}",
            slope,
            slope.sections(),
            coefficients.len()
        );

        for (index, section) in self.sections.iter_mut().enumerate() {
            match coefficients.get(index).filter(|_| index <= slope.index()) {
                Some(&designed) => {
                    section.set_coefficients(designed);
                    section.set_bypassed(false);
                }
                None => section.set_bypassed(true),
            }
        }
        self.slope = slope;
    }

    pub fn slope(&self) -> Slope {
        self.slope
    }

    /// Number of sections currently running
    pub fn active_sections(&self) -> usize {
        self.sections.iter().filter(|s| s.is_active()).count()
    }

    pub fn sections(&self) -> &[FilterSection; MAX_CUT_SECTIONS] {
        &self.sections
    }

    /// Direct section access, bypassing the slope rule
    pub fn section_mut(&mut self, index: usize) -> Option<&mut FilterSection> {
        self.sections.get_mut(index)
    }
}

impl Default for CascadeStage {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage for CascadeStage {
    #[inline]
    fn process_sample(&mut self, sample: f32) -> f32 {
        if self.bypassed {
            return sample;
        }
        // Bypassed sections return their input, so a plain fold covers
        // the cumulative activation
        self.sections
            .iter_mut()
            .fold(sample, |value, section| section.process_sample(value))
    }

    fn reset(&mut self) {
        for section in &mut self.sections {
            section.reset();
        }
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
        self.sections
            .iter()
            .map(|s| s.magnitude_for_frequency(frequency, sample_rate))
            .product()
    }
}
