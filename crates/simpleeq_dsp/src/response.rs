//! Frequency Response Evaluation
//!
//! Evaluates the transfer function of designed sections on the unit circle.
//! The analyzer overlay draws the chain's response curve from these values,
//! and the tests use them to check designs without running audio.

use std::f64::consts::PI;

use num_complex::Complex;

use crate::design::BiquadCoefficients;

/// Complex response H(e^jω) of one section at `frequency`
pub fn biquad_response(
    coefficients: &BiquadCoefficients,
    frequency: f64,
    sample_rate: f64,
) -> Complex<f64> {
    let omega = 2.0 * PI * frequency / sample_rate;
    // z^-1 and z^-2 on the unit circle
    let z1 = Complex::from_polar(1.0, -omega);
    let z2 = z1 * z1;

    let numerator = f64::from(coefficients.b0)
        + z1 * f64::from(coefficients.b1)
        + z2 * f64::from(coefficients.b2);
    let denominator = 1.0 + z1 * f64::from(coefficients.a1) + z2 * f64::from(coefficients.a2);

    numerator / denominator
}

/// Linear magnitude of one section at `frequency`
pub fn biquad_magnitude(coefficients: &BiquadCoefficients, frequency: f64, sample_rate: f64) -> f64 {
    biquad_response(coefficients, frequency, sample_rate).norm()
}

/// Linear magnitude of sections applied in series
pub fn cascade_magnitude(sections: &[BiquadCoefficients], frequency: f64, sample_rate: f64) -> f64 {
    sections
        .iter()
        .map(|c| biquad_magnitude(c, frequency, sample_rate))
        .product()
}
