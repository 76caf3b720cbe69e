// src/processing/resample.rs
//! Integer-factor decimation
//!
//! Downsampling keeps every n-th sample after anti-alias filtering (the
//! filter engine inserts the anti-alias stage). The achievable rate is
//! constrained to integer divisors of the current rate, so the actual
//! resulting rate can differ from the requested target.

use crate::error::{Error, Result};

/// Anti-alias Butterworth order inserted ahead of decimation
pub const ANTIALIAS_ORDER: usize = 4;

/// Nearest achievable integer decimation factor for a target rate
///
/// The target must be positive and below the current rate.
pub fn decimation_factor(sample_rate: f64, target_rate: f64) -> Result<usize> {
    if !target_rate.is_finite() || target_rate <= 0.0 {
        return Err(Error::InvalidInput(format!(
            "downsample target must be positive, got {}",
            target_rate
        )));
    }
    if target_rate >= sample_rate {
        return Err(Error::InvalidInput(format!(
            "downsample target {} Hz not below current rate {} Hz",
            target_rate, sample_rate
        )));
    }
    let factor = (sample_rate / target_rate).round() as usize;
    Ok(factor.max(1))
}

/// Keep every `factor`-th sample, starting with the first
pub fn decimate(samples: &[f64], factor: usize) -> Vec<f64> {
    if factor <= 1 {
        return samples.to_vec();
    }
    samples.iter().step_by(factor).copied().collect()
}
