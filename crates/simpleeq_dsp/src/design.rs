//! Filter Coefficient Design
//!
//! Pure functions turning musical parameters into biquad coefficients.
//! Sections come from `biquad`'s RBJ (Audio EQ Cookbook) designs, computed
//! in f64 and narrowed to f32; higher-order cut filters are Butterworth
//! responses factored into cascaded second-order sections.
//!
//! Every function here is total: out-of-range inputs are clamped to the
//! nearest safe value instead of producing an error or unstable poles.
//! Nothing allocates, so the designer can run on the audio thread once per
//! block.

use std::f64::consts::PI;

use biquad::{Coefficients, Errors, Hertz, Type};

use crate::cascade::Slope;

/// Coefficients of one second-order section (a0 normalized to 1)
pub type BiquadCoefficients = Coefficients<f32>;

/// Maximum number of second-order sections in a cut cascade (48 dB/oct)
pub const MAX_CUT_SECTIONS: usize = 4;

/// Lowest frequency the designer will place a corner or center at
pub const MIN_FREQUENCY_HZ: f32 = 1.0;

/// Highest corner/center frequency as a fraction of the sample rate.
/// Keeps every design strictly below Nyquist, where the bilinear
/// transform puts poles on the unit circle.
pub const MAX_FREQUENCY_RATIO: f32 = 0.49;

pub const MIN_Q: f32 = 0.1;
pub const MAX_Q: f32 = 10.0;

/// Peak gain range in dB
pub const MAX_PEAK_GAIN_DB: f32 = 24.0;

/// Which side of the spectrum a cut filter removes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutKind {
    /// High-pass response: removes content below the cutoff
    LowCut,
    /// Low-pass response: removes content above the cutoff
    HighCut,
}

/// Coefficients for a cascade of up to four second-order sections
///
/// Fixed capacity so that designing a cascade never touches the heap.
#[derive(Debug, Clone, Copy)]
pub struct CutCoefficients {
    sections: [BiquadCoefficients; MAX_CUT_SECTIONS],
    len: usize,
}

impl CutCoefficients {
    /// Designed sections in processing order
    pub fn as_slice(&self) -> &[BiquadCoefficients] {
        &self.sections[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Total filter order (two per section)
    pub fn order(&self) -> usize {
        self.len * 2
    }
}

/// Coefficients that leave the signal untouched
pub fn identity_coefficients() -> BiquadCoefficients {
    Coefficients {
        a1: 0.0,
        a2: 0.0,
        b0: 1.0,
        b1: 0.0,
        b2: 0.0,
    }
}

/// Convert dB gain to linear amplitude
/// Formula: amplitude = 10^(dB/20)
pub fn db_to_gain(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// Convert linear amplitude to dB, flooring silence at -200 dB
pub fn gain_to_db(gain: f64) -> f64 {
    20.0 * gain.max(1e-10).log10()
}

/// Parametric peaking (bell) filter
///
/// The cookbook amplitude is `A = sqrt(10^(gain_db/20))`. A gain of 0 dB
/// yields a section whose numerator equals its denominator, i.e. an exact
/// identity.
pub fn peak_coefficients(
    frequency: f32,
    q: f32,
    gain_db: f32,
    sample_rate: f32,
) -> BiquadCoefficients {
    let Some(fs) = usable_sample_rate(sample_rate) else {
        return identity_coefficients();
    };

    // NaN parameters fall back to the least intrusive setting
    let frequency = clamp_frequency(nan_or(frequency, 1000.0), sample_rate);
    let q = f64::from(nan_or(q, std::f32::consts::FRAC_1_SQRT_2).clamp(MIN_Q, MAX_Q));
    let gain_db = nan_or(gain_db, 0.0).clamp(-MAX_PEAK_GAIN_DB, MAX_PEAK_GAIN_DB);

    // biquad 0.4 takes the peaking gain in dB (A = 10^(dB/40))
    design_section(Type::PeakingEQ(f64::from(gain_db)), frequency, q, fs)
}

/// Butterworth cut filter of the given total order as cascaded sections
///
/// `order` is rounded to the nearest supported even order in 2..=8, so the
/// result always holds between one and four sections. The cutoff is clamped
/// below Nyquist.
pub fn design_cut_cascade(
    kind: CutKind,
    cutoff: f32,
    sample_rate: f32,
    order: usize,
) -> CutCoefficients {
    let len = (order.clamp(2, MAX_CUT_SECTIONS * 2) + 1) / 2;
    let mut sections = [identity_coefficients(); MAX_CUT_SECTIONS];

    let Some(fs) = usable_sample_rate(sample_rate) else {
        return CutCoefficients { sections, len };
    };

    let fallback = match kind {
        CutKind::LowCut => MIN_FREQUENCY_HZ,
        CutKind::HighCut => f32::MAX,
    };
    let cutoff = clamp_frequency(nan_or(cutoff, fallback), sample_rate);
    let filter = match kind {
        CutKind::LowCut => Type::HighPass,
        CutKind::HighCut => Type::LowPass,
    };

    for (index, section) in sections.iter_mut().take(len).enumerate() {
        *section = design_section(filter, cutoff, butterworth_q(len * 2, index), fs);
    }

    CutCoefficients { sections, len }
}

/// Low-cut (high-pass) cascade for a slope setting
pub fn low_cut_coefficients(cutoff: f32, sample_rate: f32, slope: Slope) -> CutCoefficients {
    design_cut_cascade(CutKind::LowCut, cutoff, sample_rate, slope.order())
}

/// High-cut (low-pass) cascade for a slope setting
pub fn high_cut_coefficients(cutoff: f32, sample_rate: f32, slope: Slope) -> CutCoefficients {
    design_cut_cascade(CutKind::HighCut, cutoff, sample_rate, slope.order())
}

/// Q of section `index` in an even-order Butterworth factorization
///
/// Pole pair k sits at angle (2k+1)·π/(2N) from the negative real axis,
/// giving Q = 1 / (2·cos θ).
pub fn butterworth_q(order: usize, index: usize) -> f64 {
    let theta = (2 * index + 1) as f64 * PI / (2 * order) as f64;
    1.0 / (2.0 * theta.cos())
}

/// Design in f64 and narrow to the storage precision
///
/// Inputs are clamped beforehand, so an `Err` can only come from a
/// degenerate value slipping through; it degrades to a pass-through.
fn design_section(filter: Type<f64>, frequency: f64, q: f64, fs: f64) -> BiquadCoefficients {
    match from_params(filter, frequency, q, fs) {
        Ok(designed) => Coefficients {
            a1: designed.a1 as f32,
            a2: designed.a2 as f32,
            b0: designed.b0 as f32,
            b1: designed.b1 as f32,
            b2: designed.b2 as f32,
        },
        Err(_) => identity_coefficients(),
    }
}

fn from_params(
    filter: Type<f64>,
    frequency: f64,
    q: f64,
    fs: f64,
) -> Result<Coefficients<f64>, Errors> {
    Coefficients::<f64>::from_params(
        filter,
        Hertz::<f64>::from_hz(fs)?,
        Hertz::<f64>::from_hz(frequency)?,
        q,
    )
}

fn usable_sample_rate(sample_rate: f32) -> Option<f64> {
    (sample_rate.is_finite() && sample_rate > 0.0).then(|| f64::from(sample_rate))
}

fn clamp_frequency(frequency: f32, sample_rate: f32) -> f64 {
    let upper = (sample_rate * MAX_FREQUENCY_RATIO).max(MIN_FREQUENCY_HZ);
    f64::from(frequency.clamp(MIN_FREQUENCY_HZ, upper))
}

fn nan_or(value: f32, fallback: f32) -> f32 {
    if value.is_nan() {
        fallback
    } else {
        value
    }
}
