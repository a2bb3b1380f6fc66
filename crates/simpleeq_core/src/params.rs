//! Parameter Store and Per-Block Snapshots
//!
//! The control thread writes parameters at any time; the audio thread reads
//! every parameter once at the start of a block into a [`ParameterSnapshot`].
//! Each field is an independent atomic load, so a snapshot may mix values
//! from before and after a concurrent edit. That skew lasts at most one
//! block and is accepted.

use std::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Serialize};
use simpleeq_dsp::{ChainSettings, Slope, MAX_PEAK_GAIN_DB, MAX_Q, MIN_Q};
use tracing::{debug, warn};

use crate::error::{EngineError, EngineResult};

pub const PARAMETER_COUNT: usize = 11;

/// Every parameter the engine reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterId {
    LowCutFreq,
    HighCutFreq,
    PeakFreq,
    PeakGain,
    PeakQuality,
    LowCutSlope,
    HighCutSlope,
    LowCutBypassed,
    PeakBypassed,
    HighCutBypassed,
    AnalyzerEnabled,
}

/// Value bounds and default of a parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterRange {
    pub min: f32,
    pub max: f32,
    pub default: f32,
}

impl ParameterRange {
    const fn new(min: f32, max: f32, default: f32) -> Self {
        Self { min, max, default }
    }

    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }
}

const FREQUENCY_MIN: f32 = 20.0;
const FREQUENCY_MAX: f32 = 20000.0;

impl ParameterId {
    pub const ALL: [ParameterId; PARAMETER_COUNT] = [
        ParameterId::LowCutFreq,
        ParameterId::HighCutFreq,
        ParameterId::PeakFreq,
        ParameterId::PeakGain,
        ParameterId::PeakQuality,
        ParameterId::LowCutSlope,
        ParameterId::HighCutSlope,
        ParameterId::LowCutBypassed,
        ParameterId::PeakBypassed,
        ParameterId::HighCutBypassed,
        ParameterId::AnalyzerEnabled,
    ];

    /// Host-facing parameter name
    pub fn name(self) -> &'static str {
        match self {
            ParameterId::LowCutFreq => "LowCut Freq",
            ParameterId::HighCutFreq => "HighCut Freq",
            ParameterId::PeakFreq => "Peak Freq",
            ParameterId::PeakGain => "Peak Gain",
            ParameterId::PeakQuality => "Peak Quality",
            ParameterId::LowCutSlope => "LowCut Slope",
            ParameterId::HighCutSlope => "HighCut Slope",
            ParameterId::LowCutBypassed => "LowCut Bypassed",
            ParameterId::PeakBypassed => "Peak Bypassed",
            ParameterId::HighCutBypassed => "HighCut Bypassed",
            ParameterId::AnalyzerEnabled => "Analyzer Enabled",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.name() == name)
    }

    pub fn range(self) -> ParameterRange {
        let slope_max = (Slope::ALL.len() - 1) as f32;
        match self {
            ParameterId::LowCutFreq => ParameterRange::new(FREQUENCY_MIN, FREQUENCY_MAX, 20.0),
            ParameterId::HighCutFreq => {
                ParameterRange::new(FREQUENCY_MIN, FREQUENCY_MAX, 20000.0)
            }
            ParameterId::PeakFreq => ParameterRange::new(FREQUENCY_MIN, FREQUENCY_MAX, 750.0),
            ParameterId::PeakGain => {
                ParameterRange::new(-MAX_PEAK_GAIN_DB, MAX_PEAK_GAIN_DB, 0.0)
            }
            ParameterId::PeakQuality => ParameterRange::new(MIN_Q, MAX_Q, 1.0),
            ParameterId::LowCutSlope | ParameterId::HighCutSlope => {
                ParameterRange::new(0.0, slope_max, 0.0)
            }
            ParameterId::LowCutBypassed
            | ParameterId::PeakBypassed
            | ParameterId::HighCutBypassed => ParameterRange::new(0.0, 1.0, 0.0),
            ParameterId::AnalyzerEnabled => ParameterRange::new(0.0, 1.0, 1.0),
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Source of parameter values, sampled once per block
pub trait ParameterStore: Send + Sync {
    /// Current value of `id`; must be safe to call from the audio thread
    fn value(&self, id: ParameterId) -> f32;

    /// Current value of a parameter looked up by its host-facing name
    fn value_by_name(&self, name: &str) -> Option<f32> {
        ParameterId::from_name(name).map(|id| self.value(id))
    }
}

/// Lock-free parameter store
///
/// Values are kept as f32 bit patterns in atomics.
/// Rust pattern: AtomicF32 doesn't exist, so we use bit-casting
pub struct AtomicParameterStore {
    values: [AtomicU32; PARAMETER_COUNT],
}

impl AtomicParameterStore {
    /// Create a store holding every parameter's default
    pub fn new() -> Self {
        Self {
            values: core::array::from_fn(|i| {
                AtomicU32::new(ParameterId::ALL[i].range().default.to_bits())
            }),
        }
    }

    /// Write a value, clamped to the parameter's range
    ///
    /// NaN writes are ignored.
    pub fn set(&self, id: ParameterId, value: f32) {
        if value.is_nan() {
            debug!("Ignoring NaN write to {}", id.name());
            return;
        }
        let clamped = id.range().clamp(value);
        // Rust pattern: Relaxed ordering is fine for single-value updates
        // that don't need to synchronize with other memory operations
        self.values[id.index()].store(clamped.to_bits(), Ordering::Relaxed);
    }

    /// Write a value addressed by its host-facing name
    pub fn set_by_name(&self, name: &str, value: f32) -> EngineResult<()> {
        match ParameterId::from_name(name) {
            Some(id) => {
                self.set(id, value);
                Ok(())
            }
            None => {
                warn!("Write to unknown parameter {:?}", name);
                Err(EngineError::UnknownParameter(name.to_string()))
            }
        }
    }

    pub fn set_bool(&self, id: ParameterId, value: bool) {
        self.set(id, if value { 1.0 } else { 0.0 });
    }

    pub fn set_slope(&self, id: ParameterId, slope: Slope) {
        self.set(id, slope.index() as f32);
    }

    /// Store every field of `snapshot`
    pub fn apply_snapshot(&self, snapshot: &ParameterSnapshot) {
        let chain = &snapshot.chain;
        self.set(ParameterId::LowCutFreq, chain.low_cut_freq);
        self.set(ParameterId::HighCutFreq, chain.high_cut_freq);
        self.set(ParameterId::PeakFreq, chain.peak_freq);
        self.set(ParameterId::PeakGain, chain.peak_gain_db);
        self.set(ParameterId::PeakQuality, chain.peak_quality);
        self.set_slope(ParameterId::LowCutSlope, chain.low_cut_slope);
        self.set_slope(ParameterId::HighCutSlope, chain.high_cut_slope);
        self.set_bool(ParameterId::LowCutBypassed, chain.low_cut_bypassed);
        self.set_bool(ParameterId::PeakBypassed, chain.peak_bypassed);
        self.set_bool(ParameterId::HighCutBypassed, chain.high_cut_bypassed);
        self.set_bool(ParameterId::AnalyzerEnabled, snapshot.analyzer_enabled);
    }

    pub fn reset_to_defaults(&self) {
        for id in ParameterId::ALL {
            self.set(id, id.range().default);
        }
    }
}

impl Default for AtomicParameterStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ParameterStore for AtomicParameterStore {
    #[inline]
    fn value(&self, id: ParameterId) -> f32 {
        f32::from_bits(self.values[id.index()].load(Ordering::Relaxed))
    }
}

/// Every parameter value needed to process one block
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterSnapshot {
    #[serde(flatten)]
    pub chain: ChainSettings,
    /// Whether the visualizer should render; the taps are fed regardless
    pub analyzer_enabled: bool,
}

impl Default for ParameterSnapshot {
    fn default() -> Self {
        Self {
            chain: ChainSettings::default(),
            analyzer_enabled: true,
        }
    }
}

impl ParameterSnapshot {
    /// Sample every parameter once
    ///
    /// # Real-time Safety
    /// Only atomic loads (for the lock-free store); no allocation.
    pub fn read(store: &dyn ParameterStore) -> Self {
        let flag = |id| store.value(id) > 0.5;
        Self {
            chain: ChainSettings {
                low_cut_freq: store.value(ParameterId::LowCutFreq),
                high_cut_freq: store.value(ParameterId::HighCutFreq),
                peak_freq: store.value(ParameterId::PeakFreq),
                peak_gain_db: store.value(ParameterId::PeakGain),
                peak_quality: store.value(ParameterId::PeakQuality),
                low_cut_slope: Slope::from_choice(store.value(ParameterId::LowCutSlope)),
                high_cut_slope: Slope::from_choice(store.value(ParameterId::HighCutSlope)),
                low_cut_bypassed: flag(ParameterId::LowCutBypassed),
                peak_bypassed: flag(ParameterId::PeakBypassed),
                high_cut_bypassed: flag(ParameterId::HighCutBypassed),
            },
            analyzer_enabled: flag(ParameterId::AnalyzerEnabled),
        }
    }
}
