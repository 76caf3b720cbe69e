// src/processing/filters/butterworth.rs
//! Butterworth filter design and application
//!
//! Filters are designed as cascaded second-order sections (a first-order
//! section leads for odd orders) via the bilinear transform with frequency
//! pre-warp, and run in Direct Form II transposed. Cascading sections keeps
//! the numerics stable at higher orders, where a single expanded transfer
//! function would not be.

use crate::config::constants::filters::{MAX_FILTER_ORDER, MIN_FILTER_ORDER};
use crate::error::{Error, Result};
use std::f64::consts::PI;

/// Pass band of a Butterworth stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    Low,
    High,
}

/// One second-order section; first-order sections carry zero b2/a2
#[derive(Debug, Clone, PartialEq)]
pub struct BiquadCoeffs {
    pub b: [f64; 3],
    /// a[0] is normalized to 1 and omitted
    pub a: [f64; 2],
}

/// Design a Butterworth cascade
///
/// Fails with `InvalidSpec` for orders outside the supported range or
/// cutoffs at or above the Nyquist frequency.
pub fn design_butterworth(
    order: usize,
    cutoff_hz: f64,
    sample_rate: f64,
    band: Band,
) -> Result<Vec<BiquadCoeffs>> {
    if !(MIN_FILTER_ORDER..=MAX_FILTER_ORDER).contains(&order) {
        return Err(Error::InvalidSpec(format!(
            "filter order must be in {}..={}, got {}",
            MIN_FILTER_ORDER, MAX_FILTER_ORDER, order
        )));
    }
    let nyquist = sample_rate / 2.0;
    if !cutoff_hz.is_finite() || cutoff_hz <= 0.0 || cutoff_hz >= nyquist {
        return Err(Error::InvalidSpec(format!(
            "cutoff {} Hz outside (0, {}) at {} Hz sampling",
            cutoff_hz, nyquist, sample_rate
        )));
    }

    // Pre-warp for the bilinear transform
    let k = (PI * cutoff_hz / sample_rate).tan();

    let mut sections = Vec::with_capacity((order + 1) / 2);
    if order % 2 == 1 {
        sections.push(first_order_section(k, band));
    }
    let pairs = order / 2;
    for i in 0..pairs {
        // Pole-pair angles of the Butterworth circle
        let theta = PI * (2.0 * i as f64 + 1.0) / (2.0 * order as f64);
        let q = 1.0 / (2.0 * theta.sin());
        sections.push(second_order_section(k, q, band));
    }
    Ok(sections)
}

fn first_order_section(k: f64, band: Band) -> BiquadCoeffs {
    let norm = 1.0 + k;
    let a = [(k - 1.0) / norm, 0.0];
    match band {
        Band::Low => BiquadCoeffs {
            b: [k / norm, k / norm, 0.0],
            a,
        },
        Band::High => BiquadCoeffs {
            b: [1.0 / norm, -1.0 / norm, 0.0],
            a,
        },
    }
}

fn second_order_section(k: f64, q: f64, band: Band) -> BiquadCoeffs {
    let k2 = k * k;
    let norm = 1.0 + k / q + k2;
    let a = [2.0 * (k2 - 1.0) / norm, (1.0 - k / q + k2) / norm];
    match band {
        Band::Low => BiquadCoeffs {
            b: [k2 / norm, 2.0 * k2 / norm, k2 / norm],
            a,
        },
        Band::High => BiquadCoeffs {
            b: [1.0 / norm, -2.0 / norm, 1.0 / norm],
            a,
        },
    }
}

/// Run a causal forward pass through the cascade with fresh state
pub fn run_cascade(sections: &[BiquadCoeffs], samples: &[f64]) -> Vec<f64> {
    let mut out = samples.to_vec();
    for section in sections {
        let mut z1 = 0.0;
        let mut z2 = 0.0;
        for v in out.iter_mut() {
            let x = *v;
            let y = section.b[0] * x + z1;
            z1 = section.b[1] * x - section.a[0] * y + z2;
            z2 = section.b[2] * x - section.a[1] * y;
            *v = y;
        }
    }
    out
}

/// Zero-phase application: forward pass, then a pass over the time-reversed
/// signal with fresh state, cancelling the phase delay
pub fn run_cascade_zero_phase(sections: &[BiquadCoeffs], samples: &[f64]) -> Vec<f64> {
    let mut out = run_cascade(sections, samples);
    out.reverse();
    out = run_cascade(sections, &out);
    out.reverse();
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_design_validates_order() {
        assert!(design_butterworth(0, 10.0, 100.0, Band::Low).is_err());
        assert!(design_butterworth(9, 10.0, 100.0, Band::Low).is_err());
        assert!(design_butterworth(4, 10.0, 100.0, Band::Low).is_ok());
    }

    #[test]
    fn test_design_validates_cutoff() {
        assert!(design_butterworth(2, 50.0, 100.0, Band::Low).is_err());
        assert!(design_butterworth(2, 60.0, 100.0, Band::Low).is_err());
        assert!(design_butterworth(2, 0.0, 100.0, Band::Low).is_err());
        assert!(design_butterworth(2, f64::NAN, 100.0, Band::Low).is_err());
    }

    #[test]
    fn test_section_count() {
        assert_eq!(design_butterworth(1, 10.0, 100.0, Band::Low).unwrap().len(), 1);
        assert_eq!(design_butterworth(2, 10.0, 100.0, Band::Low).unwrap().len(), 1);
        assert_eq!(design_butterworth(3, 10.0, 100.0, Band::Low).unwrap().len(), 2);
        assert_eq!(design_butterworth(8, 10.0, 100.0, Band::Low).unwrap().len(), 4);
    }

    #[test]
    fn test_lowpass_dc_gain_is_unity() {
        for order in 1..=8 {
            let sections = design_butterworth(order, 10.0, 1000.0, Band::Low).unwrap();
            let dc: f64 = sections
                .iter()
                .map(|s| (s.b[0] + s.b[1] + s.b[2]) / (1.0 + s.a[0] + s.a[1]))
                .product();
            assert!((dc - 1.0).abs() < 1e-9, "order {} dc gain {}", order, dc);
        }
    }

    #[test]
    fn test_highpass_blocks_dc() {
        let sections = design_butterworth(2, 1.0, 100.0, Band::High).unwrap();
        let constant = vec![1.0; 2000];
        let out = run_cascade(&sections, &constant);
        assert!(out.last().unwrap().abs() < 1e-3);
    }

    #[test]
    fn test_lowpass_step_response_settles_to_one() {
        let sections = design_butterworth(4, 10.0, 1000.0, Band::Low).unwrap();
        let step = vec![1.0; 3000];
        let out = run_cascade(&sections, &step);
        assert!((out.last().unwrap() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_phase_output_length() {
        let sections = design_butterworth(2, 10.0, 100.0, Band::Low).unwrap();
        let samples = vec![0.5; 123];
        assert_eq!(run_cascade_zero_phase(&sections, &samples).len(), 123);
    }
}
