// src/processing/filters/notch.rs
//! Mains interference notch filter
//!
//! Pole-zero biquad centered on a single known interference frequency,
//! suppressing it without the wide-band cost of a low-pass cutoff. Applied
//! zero-phase so the narrow rejection band adds no phase distortion around
//! the line frequency.

use super::butterworth::{run_cascade_zero_phase, BiquadCoeffs};
use crate::error::{Error, Result};
use std::f64::consts::PI;

/// Design a notch biquad at `center_hz` with quality factor `q`
///
/// Higher `q` narrows the rejection band relative to the center frequency.
pub fn notch_coeffs(center_hz: f64, q: f64, sample_rate: f64) -> Result<BiquadCoeffs> {
    let nyquist = sample_rate / 2.0;
    if !center_hz.is_finite() || center_hz <= 0.0 || center_hz >= nyquist {
        return Err(Error::InvalidSpec(format!(
            "notch center {} Hz outside (0, {}) at {} Hz sampling",
            center_hz, nyquist, sample_rate
        )));
    }
    if !q.is_finite() || q <= 0.0 {
        return Err(Error::InvalidSpec(format!(
            "notch quality factor must be positive, got {}",
            q
        )));
    }

    let omega = 2.0 * PI * center_hz / sample_rate;
    let cos_omega = omega.cos();
    let alpha = omega.sin() / (2.0 * q);
    let norm = 1.0 + alpha;

    Ok(BiquadCoeffs {
        b: [1.0 / norm, -2.0 * cos_omega / norm, 1.0 / norm],
        a: [-2.0 * cos_omega / norm, (1.0 - alpha) / norm],
    })
}

/// Suppress a single interference frequency in a waveform payload
pub fn notch_filter(samples: &[f64], sample_rate: f64, center_hz: f64, q: f64) -> Result<Vec<f64>> {
    let coeffs = notch_coeffs(center_hz, q, sample_rate)?;
    Ok(run_cascade_zero_phase(std::slice::from_ref(&coeffs), samples))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f64, rate: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| (2.0 * PI * freq * i as f64 / rate).sin())
            .collect()
    }

    fn rms(samples: &[f64]) -> f64 {
        (samples.iter().map(|v| v * v).sum::<f64>() / samples.len() as f64).sqrt()
    }

    #[test]
    fn test_notch_suppresses_center_frequency() {
        let rate = 1000.0;
        let line = sine(50.0, rate, 4000);
        let out = notch_filter(&line, rate, 50.0, 30.0).unwrap();
        // Ignore edge transients
        assert!(rms(&out[500..3500]) < 0.05 * rms(&line[500..3500]));
    }

    #[test]
    fn test_notch_passes_distant_frequency() {
        let rate = 1000.0;
        let tone = sine(10.0, rate, 4000);
        let out = notch_filter(&tone, rate, 50.0, 30.0).unwrap();
        let ratio = rms(&out[500..3500]) / rms(&tone[500..3500]);
        assert!(ratio > 0.95, "10 Hz tone attenuated to {}", ratio);
    }

    #[test]
    fn test_notch_validates_center() {
        assert!(notch_filter(&[0.0; 10], 100.0, 50.0, 30.0).is_err());
        assert!(notch_filter(&[0.0; 10], 100.0, 0.0, 30.0).is_err());
        assert!(notch_filter(&[0.0; 10], 1000.0, 50.0, -1.0).is_err());
    }
}
