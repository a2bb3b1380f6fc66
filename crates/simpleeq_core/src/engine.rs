//! Dual Channel Engine - Main Entry Point
//!
//! Owns one [`ChannelChain`] per channel plus the analyzer taps, and runs
//! them block by block.
//!
//! # Architecture
//!
//! ```text
//! control thread ──atomics──▶ ParameterSnapshot (once per block)
//!                                    │
//!                     ChainCoefficients::design (once per block)
//!                          │                    │
//!   left  ──▶ ChannelChain(L) ──▶ out   right ──▶ ChannelChain(R) ──▶ out
//!                  │                                   │
//!            accumulator(L)                      accumulator(R)
//!                  │ CaptureFifo                       │ CaptureFifo
//!                  ▼                                   ▼
//!           BlockDrain(L)  ◀── visualizer thread ──▶  BlockDrain(R)
//! ```
//!
//! Both chains receive the same coefficients, so the channels never
//! disagree about the curve. Parameter changes take effect at the next
//! block boundary with an abrupt switch; nothing is smoothed.

use simpleeq_dsp::{
    BlockDrain, ChainCoefficients, ChainSettings, Channel, ChannelBlockAccumulator, ChannelChain,
};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::params::{ParameterSnapshot, ParameterStore};

/// Consumer ends of both analyzer taps
///
/// Hand these to the visualizer thread. A new pair is returned by every
/// [`DualChannelEngine::setup`]; earlier pairs stop receiving blocks.
pub struct ChannelTaps {
    pub left: BlockDrain,
    pub right: BlockDrain,
}

impl ChannelTaps {
    pub fn get_mut(&mut self, channel: Channel) -> &mut BlockDrain {
        match channel {
            Channel::Left => &mut self.left,
            Channel::Right => &mut self.right,
        }
    }
}

/// Stereo EQ processor
///
/// Lives on the audio thread. Everything it needs is allocated in
/// [`new`](Self::new) and [`setup`](Self::setup); [`process_block`](Self::process_block)
/// never allocates, locks or blocks.
pub struct DualChannelEngine {
    config: EngineConfig,
    left: ChannelChain,
    right: ChannelChain,
    left_tap: ChannelBlockAccumulator,
    right_tap: ChannelBlockAccumulator,
    /// Settings applied by the most recent block
    settings: ChainSettings,
}

impl DualChannelEngine {
    /// Create an engine prepared for `config`
    pub fn new(config: EngineConfig) -> EngineResult<(Self, ChannelTaps)> {
        Self::check(&config)?;
        let (left_tap, right_tap, taps) = Self::build_taps(&config)?;

        let settings = ChainSettings::default();
        let mut engine = Self {
            config,
            left: ChannelChain::new(),
            right: ChannelChain::new(),
            left_tap,
            right_tap,
            settings,
        };
        engine.configure_chains();

        info!(
            "Engine ready: {} Hz, {} samples/block ({:.2} ms)",
            config.sample_rate,
            config.max_block_size,
            config.latency_ms()
        );
        Ok((engine, taps))
    }

    /// Re-prepare for a new sample rate or block size
    ///
    /// Clears all filter state and rebuilds both taps at the new block size.
    /// On error the engine keeps its previous configuration.
    ///
    /// Note: This allocates. Only call while the stream is stopped.
    pub fn setup(&mut self, config: EngineConfig) -> EngineResult<ChannelTaps> {
        Self::check(&config)?;
        let (left_tap, right_tap, taps) = Self::build_taps(&config)?;

        self.config = config;
        self.left_tap = left_tap;
        self.right_tap = right_tap;
        self.left.reset();
        self.right.reset();
        self.configure_chains();

        info!(
            "Engine re-prepared: {} Hz, {} samples/block",
            config.sample_rate, config.max_block_size
        );
        Ok(taps)
    }

    fn check(config: &EngineConfig) -> EngineResult<()> {
        config.validate().map_err(|e| {
            warn!("Rejected engine configuration {:?}: {}", config, e);
            e
        })
    }

    fn build_taps(
        config: &EngineConfig,
    ) -> EngineResult<(ChannelBlockAccumulator, ChannelBlockAccumulator, ChannelTaps)> {
        let (left_tap, left) = ChannelBlockAccumulator::new(Channel::Left, config.max_block_size)?;
        let (right_tap, right) =
            ChannelBlockAccumulator::new(Channel::Right, config.max_block_size)?;
        Ok((left_tap, right_tap, ChannelTaps { left, right }))
    }

    fn configure_chains(&mut self) {
        let coefficients = ChainCoefficients::design(&self.settings, self.config.sample_rate);
        self.left.apply(&coefficients, &self.settings);
        self.right.apply(&coefficients, &self.settings);
    }

    /// Filter one stereo block in place
    ///
    /// Coefficients are designed once from `snapshot` and applied to both
    /// chains before any sample is touched. The filtered samples are always
    /// fed to the taps; `analyzer_enabled` is only a hint for the visualizer.
    ///
    /// # Real-time Safety
    /// No allocations, no locks, no syscalls.
    pub fn process_block(
        &mut self,
        left: &mut [f32],
        right: &mut [f32],
        snapshot: &ParameterSnapshot,
    ) {
        debug_assert_eq!(left.len(), right.len(), "channel buffers differ in length");

        self.settings = snapshot.chain;
        self.configure_chains();

        self.left.process_block(left);
        self.right.process_block(right);

        self.left_tap.feed_slice(left);
        self.right_tap.feed_slice(right);
    }

    /// Sample `store` once, then process the block
    pub fn process_block_from_store(
        &mut self,
        left: &mut [f32],
        right: &mut [f32],
        store: &dyn ParameterStore,
    ) {
        let snapshot = ParameterSnapshot::read(store);
        self.process_block(left, right, &snapshot);
    }

    /// Clear the delay lines of both chains
    pub fn reset(&mut self) {
        debug!("Resetting filter state");
        self.left.reset();
        self.right.reset();
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Settings used by the most recent block
    pub fn settings(&self) -> &ChainSettings {
        &self.settings
    }

    pub fn chain(&self, channel: Channel) -> &ChannelChain {
        match channel {
            Channel::Left => &self.left,
            Channel::Right => &self.right,
        }
    }

    /// Linear magnitude of the current curve at `frequency`
    ///
    /// Both chains share coefficients, so the left chain speaks for both.
    pub fn magnitude_for_frequency(&self, frequency: f64) -> f64 {
        self.left
            .magnitude_for_frequency(frequency, self.config.sample_rate as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::params::{AtomicParameterStore, ParameterId};
    use simpleeq_dsp::{gain_to_db, Slope, CAPTURE_FIFO_CAPACITY};

    const SAMPLE_RATE: f32 = 48000.0;
    const BLOCK: usize = 256;

    fn engine() -> (DualChannelEngine, ChannelTaps) {
        DualChannelEngine::new(EngineConfig::new(SAMPLE_RATE, BLOCK)).unwrap()
    }

    fn sine(freq: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / SAMPLE_RATE).sin())
            .collect()
    }

    fn rms(samples: &[f32]) -> f32 {
        (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
    }

    fn low_cut_only(freq: f32) -> ParameterSnapshot {
        ParameterSnapshot {
            chain: ChainSettings {
                low_cut_freq: freq,
                low_cut_slope: Slope::Db12,
                peak_bypassed: true,
                high_cut_bypassed: true,
                ..Default::default()
            },
            analyzer_enabled: false,
        }
    }

    #[test]
    fn test_low_cut_is_three_db_down_at_cutoff() {
        let (mut engine, _taps) = engine();
        let snapshot = low_cut_only(100.0);

        let mut left = vec![0.0; BLOCK];
        let mut right = vec![0.0; BLOCK];
        engine.process_block(&mut left, &mut right, &snapshot);

        let analytic = gain_to_db(engine.magnitude_for_frequency(100.0));
        assert!((analytic + 3.0).abs() < 1.0, "analytic: {analytic} dB");
        for freq in [1000.0, 2000.0, 10000.0] {
            let passband = gain_to_db(engine.magnitude_for_frequency(freq));
            assert!(passband.abs() < 1.0, "{freq} Hz: {passband} dB");
        }

        // Measured on settled sines, block by block
        for (freq, expected_db) in [(100.0, -3.0), (2000.0, 0.0)] {
            engine.reset();
            let signal = sine(freq, BLOCK * 40);
            let mut out_left = Vec::with_capacity(signal.len());
            for chunk in signal.chunks(BLOCK) {
                let mut l = chunk.to_vec();
                let mut r = chunk.to_vec();
                engine.process_block(&mut l, &mut r, &snapshot);
                out_left.extend_from_slice(&l);
            }
            let settled = signal.len() / 2;
            let measured = 20.0 * (rms(&out_left[settled..]) / rms(&signal[settled..])).log10();
            assert!(
                (measured - expected_db).abs() < 1.0,
                "{freq} Hz measured: {measured} dB"
            );
        }
    }

    #[test]
    fn test_channels_are_filtered_identically() {
        let (mut engine, _taps) = engine();
        let snapshot = ParameterSnapshot {
            chain: ChainSettings {
                low_cut_freq: 150.0,
                high_cut_freq: 6000.0,
                peak_freq: 1200.0,
                peak_gain_db: 9.0,
                low_cut_slope: Slope::Db36,
                high_cut_slope: Slope::Db24,
                ..Default::default()
            },
            analyzer_enabled: true,
        };

        let input = sine(900.0, BLOCK);
        for _ in 0..8 {
            let mut left = input.clone();
            let mut right = input.clone();
            engine.process_block(&mut left, &mut right, &snapshot);
            assert_eq!(left, right);
        }
    }

    #[test]
    fn test_each_block_is_published_to_both_taps() {
        const BLOCKS: usize = 6;
        let (mut engine, mut taps) = engine();
        let snapshot = ParameterSnapshot::default();

        let input = sine(440.0, BLOCK);
        let mut expected_left = Vec::new();
        for _ in 0..BLOCKS {
            let mut left = input.clone();
            let mut right = input.clone();
            engine.process_block(&mut left, &mut right, &snapshot);
            expected_left.push(left);
        }

        assert_eq!(taps.left.complete_blocks_available(), BLOCKS);
        assert_eq!(taps.right.complete_blocks_available(), BLOCKS);

        let mut block = Vec::new();
        for expected in &expected_left {
            assert!(taps.get_mut(Channel::Left).drain(&mut block));
            assert_eq!(&block, expected);
        }
        assert!(!taps.left.drain(&mut block));
    }

    #[test]
    fn test_taps_are_fed_with_analyzer_disabled() {
        let (mut engine, taps) = engine();
        let snapshot = ParameterSnapshot {
            analyzer_enabled: false,
            ..Default::default()
        };
        for _ in 0..3 {
            let mut left = vec![0.25; BLOCK];
            let mut right = vec![0.25; BLOCK];
            engine.process_block(&mut left, &mut right, &snapshot);
        }
        assert_eq!(taps.left.complete_blocks_available(), 3);
        assert_eq!(taps.right.complete_blocks_available(), 3);
    }

    #[test]
    fn test_slow_visualizer_loses_newest_blocks() {
        let (mut engine, taps) = engine();
        let snapshot = ParameterSnapshot::default();
        for _ in 0..CAPTURE_FIFO_CAPACITY + 4 {
            let mut left = vec![0.1; BLOCK];
            let mut right = vec![0.1; BLOCK];
            engine.process_block(&mut left, &mut right, &snapshot);
        }
        assert_eq!(taps.left.complete_blocks_available(), CAPTURE_FIFO_CAPACITY);
        assert_eq!(taps.left.dropped_blocks(), 4);
        assert_eq!(taps.right.dropped_blocks(), 4);
    }

    #[test]
    fn test_parameter_change_applies_at_next_block() {
        let (mut engine, _taps) = engine();
        let store = AtomicParameterStore::new();
        store.set_bool(ParameterId::LowCutBypassed, true);
        store.set_bool(ParameterId::HighCutBypassed, true);

        let mut left = vec![0.5; BLOCK];
        let mut right = vec![0.5; BLOCK];
        engine.process_block_from_store(&mut left, &mut right, &store);
        assert_eq!(engine.settings().peak_gain_db, 0.0);
        let flat = gain_to_db(engine.magnitude_for_frequency(750.0));
        assert!(flat.abs() < 1e-3);

        store.set(ParameterId::PeakGain, 12.0);
        // Not visible until a block starts
        assert_eq!(engine.settings().peak_gain_db, 0.0);

        engine.process_block_from_store(&mut left, &mut right, &store);
        assert_eq!(engine.settings().peak_gain_db, 12.0);
        let boosted = gain_to_db(engine.magnitude_for_frequency(750.0));
        assert!((boosted - 12.0).abs() < 0.1, "boost: {boosted}");
    }

    #[test]
    fn test_store_and_snapshot_paths_agree() {
        let snapshot = ParameterSnapshot {
            chain: ChainSettings {
                low_cut_freq: 60.0,
                peak_gain_db: -8.0,
                peak_quality: 3.0,
                high_cut_slope: Slope::Db48,
                ..Default::default()
            },
            analyzer_enabled: true,
        };
        let store = AtomicParameterStore::new();
        store.apply_snapshot(&snapshot);

        let (mut by_snapshot, _a) = engine();
        let (mut by_store, _b) = engine();
        let input = sine(2000.0, BLOCK);

        let (mut l1, mut r1) = (input.clone(), input.clone());
        by_snapshot.process_block(&mut l1, &mut r1, &snapshot);
        let (mut l2, mut r2) = (input.clone(), input);
        by_store.process_block_from_store(&mut l2, &mut r2, &store);

        assert_eq!(l1, l2);
        assert_eq!(r1, r2);
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(matches!(
            DualChannelEngine::new(EngineConfig::new(0.0, BLOCK)),
            Err(EngineError::DspError(_))
        ));
        assert!(DualChannelEngine::new(EngineConfig::new(SAMPLE_RATE, 0)).is_err());

        let (mut engine, _taps) = engine();
        assert!(engine.setup(EngineConfig::new(f32::NAN, BLOCK)).is_err());
        assert_eq!(engine.config().sample_rate, SAMPLE_RATE);
    }

    #[test]
    fn test_setup_changes_tap_block_size() {
        let (mut engine, old_taps) = engine();
        let mut taps = engine.setup(EngineConfig::new(44100.0, 64)).unwrap();
        assert_eq!(taps.left.block_size(), 64);
        assert_eq!(engine.config().sample_rate, 44100.0);

        let snapshot = ParameterSnapshot::default();
        let mut left = vec![0.0; 64];
        let mut right = vec![0.0; 64];
        engine.process_block(&mut left, &mut right, &snapshot);

        let mut block = Vec::new();
        assert!(taps.right.drain(&mut block));
        assert_eq!(block.len(), 64);
        assert_eq!(old_taps.left.complete_blocks_available(), 0);
    }

    #[test]
    fn test_reset_clears_filter_memory() {
        let (mut engine, _taps) = engine();
        let snapshot = low_cut_only(500.0);
        let mut left = vec![1.0; BLOCK];
        let mut right = vec![1.0; BLOCK];
        engine.process_block(&mut left, &mut right, &snapshot);

        engine.reset();
        let mut left = vec![0.0; BLOCK];
        let mut right = vec![0.0; BLOCK];
        engine.process_block(&mut left, &mut right, &snapshot);
        assert!(left.iter().all(|&s| s == 0.0));
    }
}
