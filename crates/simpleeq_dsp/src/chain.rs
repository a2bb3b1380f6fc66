//! Per-Channel Filter Chain
//!
//! Low-cut cascade -> peak section -> high-cut cascade. Each stage can be
//! bypassed as a whole; a bypassed stage is an identity regardless of which
//! of its sections are active.

use serde::{Deserialize, Serialize};

use crate::cascade::{CascadeStage, Slope};
use crate::design::{
    high_cut_coefficients, low_cut_coefficients, peak_coefficients, BiquadCoefficients,
    CutCoefficients,
};
use crate::processor::Stage;
use crate::section::FilterSection;

/// Filter settings for one processing block
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChainSettings {
    pub low_cut_freq: f32,
    pub high_cut_freq: f32,
    pub peak_freq: f32,
    pub peak_gain_db: f32,
    pub peak_quality: f32,
    pub low_cut_slope: Slope,
    pub high_cut_slope: Slope,
    pub low_cut_bypassed: bool,
    pub peak_bypassed: bool,
    pub high_cut_bypassed: bool,
}

impl Default for ChainSettings {
    /// Cut filters at the edges of the audible range, flat peak
    fn default() -> Self {
        Self {
            low_cut_freq: 20.0,
            high_cut_freq: 20000.0,
            peak_freq: 750.0,
            peak_gain_db: 0.0,
            peak_quality: 1.0,
            low_cut_slope: Slope::Db12,
            high_cut_slope: Slope::Db12,
            low_cut_bypassed: false,
            peak_bypassed: false,
            high_cut_bypassed: false,
        }
    }
}

/// Stage positions in processing order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainPosition {
    LowCut,
    Peak,
    HighCut,
}

impl ChainPosition {
    pub const ALL: [ChainPosition; 3] = [
        ChainPosition::LowCut,
        ChainPosition::Peak,
        ChainPosition::HighCut,
    ];
}

/// Every coefficient a chain needs for one block
///
/// Designed once per block and shared by both channels, so left and right
/// can never drift apart.
#[derive(Debug, Clone, Copy)]
pub struct ChainCoefficients {
    pub low_cut: CutCoefficients,
    pub peak: BiquadCoefficients,
    pub high_cut: CutCoefficients,
}

impl ChainCoefficients {
    pub fn design(settings: &ChainSettings, sample_rate: f32) -> Self {
        Self {
            low_cut: low_cut_coefficients(
                settings.low_cut_freq,
                sample_rate,
                settings.low_cut_slope,
            ),
            peak: peak_coefficients(
                settings.peak_freq,
                settings.peak_quality,
                settings.peak_gain_db,
                sample_rate,
            ),
            high_cut: high_cut_coefficients(
                settings.high_cut_freq,
                sample_rate,
                settings.high_cut_slope,
            ),
        }
    }
}

/// Mono filter chain for one channel
pub struct ChannelChain {
    low_cut: CascadeStage,
    peak: FilterSection,
    high_cut: CascadeStage,
}

impl ChannelChain {
    pub fn new() -> Self {
        let mut peak = FilterSection::new();
        peak.set_bypassed(false);
        Self {
            low_cut: CascadeStage::new(),
            peak,
            high_cut: CascadeStage::new(),
        }
    }

    /// Design and apply coefficients for `settings`
    pub fn configure(&mut self, settings: &ChainSettings, sample_rate: f32) {
        let coefficients = ChainCoefficients::design(settings, sample_rate);
        self.apply(&coefficients, settings);
    }

    /// Apply already designed coefficients plus the stage bypass flags
    pub fn apply(&mut self, coefficients: &ChainCoefficients, settings: &ChainSettings) {
        self.low_cut
            .set_slope(settings.low_cut_slope, coefficients.low_cut.as_slice());
        self.peak.set_coefficients(coefficients.peak);
        self.high_cut
            .set_slope(settings.high_cut_slope, coefficients.high_cut.as_slice());

        self.low_cut.set_bypassed(settings.low_cut_bypassed);
        self.peak.set_bypassed(settings.peak_bypassed);
        self.high_cut.set_bypassed(settings.high_cut_bypassed);
    }

    /// Filter one sample through low-cut, peak, then high-cut
    ///
    /// # Real-time Safety
    /// No allocations, no syscalls, O(1) time.
    #[inline]
    pub fn process(&mut self, sample: f32) -> f32 {
        let sample = self.low_cut.process_sample(sample);
        let sample = self.peak.process_sample(sample);
        self.high_cut.process_sample(sample)
    }

    /// Filter a channel buffer in place
    #[inline]
    pub fn process_block(&mut self, block: &mut [f32]) {
        for sample in block.iter_mut() {
            *sample = self.process(*sample);
        }
    }

    /// Clear every delay line (call when the stream restarts)
    pub fn reset(&mut self) {
        for position in ChainPosition::ALL {
            self.stage_mut(position).reset();
        }
    }

    pub fn set_bypassed(&mut self, position: ChainPosition, bypassed: bool) {
        self.stage_mut(position).set_bypassed(bypassed);
    }

    pub fn is_bypassed(&self, position: ChainPosition) -> bool {
        self.stage(position).is_bypassed()
    }

    pub fn stage(&self, position: ChainPosition) -> &dyn Stage {
        match position {
            ChainPosition::LowCut => &self.low_cut,
            ChainPosition::Peak => &self.peak,
            ChainPosition::HighCut => &self.high_cut,
        }
    }

    pub fn stage_mut(&mut self, position: ChainPosition) -> &mut dyn Stage {
        match position {
            ChainPosition::LowCut => &mut self.low_cut,
            ChainPosition::Peak => &mut self.peak,
            ChainPosition::HighCut => &mut self.high_cut,
        }
    }

    pub fn low_cut(&self) -> &CascadeStage {
        &self.low_cut
    }

    pub fn peak(&self) -> &FilterSection {
        &self.peak
    }

    pub fn high_cut(&self) -> &CascadeStage {
        &self.high_cut
    }

    /// Linear magnitude of the whole chain, honoring every bypass flag
    pub fn magnitude_for_frequency(&self, frequency: f64, sample_rate: f64) -> f64 {
        ChainPosition::ALL
            .iter()
            .map(|&p| self.stage(p).magnitude_for_frequency(frequency, sample_rate))
            .product()
    }
}

impl Default for ChannelChain {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::gain_to_db;

    const SAMPLE_RATE: f32 = 48000.0;

    fn sine(freq: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / SAMPLE_RATE).sin())
            .collect()
    }

    fn rms(samples: &[f32]) -> f32 {
        (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
    }

    #[test]
    fn test_configure_sets_bypass_and_slopes() {
        let mut chain = ChannelChain::new();
        let settings = ChainSettings {
            low_cut_slope: Slope::Db36,
            high_cut_slope: Slope::Db24,
            peak_bypassed: true,
            high_cut_bypassed: true,
            ..Default::default()
        };
        chain.configure(&settings, SAMPLE_RATE);

        assert!(!chain.is_bypassed(ChainPosition::LowCut));
        assert!(chain.is_bypassed(ChainPosition::Peak));
        assert!(chain.is_bypassed(ChainPosition::HighCut));
        assert_eq!(chain.low_cut().active_sections(), 3);
        assert_eq!(chain.high_cut().active_sections(), 2);
    }

    #[test]
    fn test_fully_bypassed_chain_is_identity() {
        let mut chain = ChannelChain::new();
        let settings = ChainSettings {
            low_cut_freq: 5000.0,
            high_cut_freq: 200.0,
            peak_gain_db: 18.0,
            low_cut_slope: Slope::Db48,
            high_cut_slope: Slope::Db48,
            low_cut_bypassed: true,
            peak_bypassed: true,
            high_cut_bypassed: true,
            ..Default::default()
        };
        chain.configure(&settings, SAMPLE_RATE);

        let input = sine(440.0, 1024);
        let mut output = input.clone();
        chain.process_block(&mut output);
        assert_eq!(input, output);
    }

    #[test]
    fn test_stage_bypass_overrides_section_state() {
        let mut chain = ChannelChain::new();
        chain.configure(
            &ChainSettings {
                low_cut_freq: 2000.0,
                low_cut_slope: Slope::Db48,
                peak_bypassed: true,
                high_cut_bypassed: true,
                ..Default::default()
            },
            SAMPLE_RATE,
        );
        assert_eq!(chain.low_cut().active_sections(), 4);

        chain.set_bypassed(ChainPosition::LowCut, true);
        for sample in sine(100.0, 480) {
            assert_eq!(chain.process(sample), sample);
        }
    }

    #[test]
    fn test_peak_boost_raises_center_frequency() {
        let mut chain = ChannelChain::new();
        chain.configure(
            &ChainSettings {
                peak_freq: 1000.0,
                peak_gain_db: 12.0,
                peak_quality: 1.0,
                low_cut_bypassed: true,
                high_cut_bypassed: true,
                ..Default::default()
            },
            SAMPLE_RATE,
        );

        let mut signal = sine(1000.0, 9600);
        let input_rms = rms(&signal[4800..]);
        chain.process_block(&mut signal);
        let gain_db = 20.0 * (rms(&signal[4800..]) / input_rms).log10();
        assert!((gain_db - 12.0).abs() < 0.5, "peak gain was {gain_db}");
    }

    #[test]
    fn test_default_settings_are_nearly_transparent_midband() {
        let chain = {
            let mut chain = ChannelChain::new();
            chain.configure(&ChainSettings::default(), SAMPLE_RATE);
            chain
        };
        for freq in [200.0, 1000.0, 5000.0] {
            let db = gain_to_db(chain.magnitude_for_frequency(freq, SAMPLE_RATE as f64));
            assert!(db.abs() < 0.1, "{freq} Hz: {db}");
        }
    }

    #[test]
    fn test_chain_response_honors_bypass() {
        let mut chain = ChannelChain::new();
        let settings = ChainSettings {
            low_cut_freq: 1000.0,
            low_cut_slope: Slope::Db48,
            ..Default::default()
        };
        chain.configure(&settings, SAMPLE_RATE);
        let cut = gain_to_db(chain.magnitude_for_frequency(250.0, SAMPLE_RATE as f64));
        assert!(cut < -40.0, "48 dB/oct two octaves down: {cut}");

        chain.set_bypassed(ChainPosition::LowCut, true);
        let open = gain_to_db(chain.magnitude_for_frequency(250.0, SAMPLE_RATE as f64));
        assert!(open.abs() < 0.1);
    }

    #[test]
    fn test_apply_matches_configure() {
        let settings = ChainSettings {
            low_cut_freq: 80.0,
            high_cut_freq: 12000.0,
            peak_gain_db: -6.0,
            low_cut_slope: Slope::Db24,
            high_cut_slope: Slope::Db36,
            ..Default::default()
        };
        let mut configured = ChannelChain::new();
        configured.configure(&settings, SAMPLE_RATE);

        let mut applied = ChannelChain::new();
        applied.apply(&ChainCoefficients::design(&settings, SAMPLE_RATE), &settings);

        for sample in sine(3000.0, 256) {
            assert_eq!(configured.process(sample), applied.process(sample));
        }
    }
}
