// src/processing/filters/smoothing.rs
//! Order-statistic and analytic smoothing operators
//!
//! The median filter suppresses spikes and outliers without frequency
//! semantics; the leaky integrator is a causal exponential smoother whose
//! latency behavior is explicit rather than filter-designed.

use crate::error::{Error, Result};

/// Sliding-window median with an odd window length in samples
///
/// The window is centered and truncated at the boundaries. Missing (NaN)
/// samples inside a window are ignored; a window with no finite samples
/// yields NaN.
pub fn median_filter(samples: &[f64], window_len: usize) -> Result<Vec<f64>> {
    if window_len == 0 || window_len % 2 == 0 {
        return Err(Error::InvalidInput(format!(
            "median window length must be odd, got {}",
            window_len
        )));
    }

    let half = window_len / 2;
    let mut out = Vec::with_capacity(samples.len());
    let mut window = Vec::with_capacity(window_len);
    for i in 0..samples.len() {
        let lo = i.saturating_sub(half);
        let hi = (i + half + 1).min(samples.len());
        window.clear();
        window.extend(samples[lo..hi].iter().copied().filter(|v| !v.is_nan()));
        if window.is_empty() {
            out.push(f64::NAN);
            continue;
        }
        window.sort_unstable_by(f64::total_cmp);
        let mid = window.len() / 2;
        let median = if window.len() % 2 == 1 {
            window[mid]
        } else {
            (window[mid - 1] + window[mid]) / 2.0
        };
        out.push(median);
    }
    Ok(out)
}

/// Exponential-decay running accumulator
///
/// The time constant is given in seconds and converted to samples with the
/// channel's rate; it must span at least one sample.
pub fn leaky_integrator(samples: &[f64], sample_rate: f64, time_constant_s: f64) -> Result<Vec<f64>> {
    if !time_constant_s.is_finite() || time_constant_s <= 0.0 {
        return Err(Error::InvalidInput(format!(
            "time constant must be positive, got {}",
            time_constant_s
        )));
    }
    let tau = time_constant_s * sample_rate;
    if tau < 1.0 {
        return Err(Error::InvalidInput(format!(
            "time constant {} s spans less than one sample at {} Hz",
            time_constant_s, sample_rate
        )));
    }

    let mut out = Vec::with_capacity(samples.len());
    let mut state = match samples.first() {
        Some(&first) => first,
        None => return Ok(out),
    };
    out.push(state);
    for &x in &samples[1..] {
        state += (x - state) / tau;
        out.push(state);
    }
    Ok(out)
}
