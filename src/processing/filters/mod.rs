// src/processing/filters/mod.rs
//! Numeric filtering primitives
//!
//! All operators here work on a bare waveform payload (a sample slice plus
//! its rate); channel-category rejection happens at the orchestrator
//! boundary where channels are in hand.

pub mod butterworth;
pub mod notch;
pub mod smoothing;

pub use butterworth::{design_butterworth, run_cascade, run_cascade_zero_phase, Band, BiquadCoeffs};
pub use notch::notch_filter;
pub use smoothing::{leaky_integrator, median_filter};

use crate::config::constants::filters::DEFAULT_FILTER_ORDER;
use crate::error::{Result, Warning};
use crate::processing::resample;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// One Butterworth stage of a filter specification
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CutoffSpec {
    pub freq_hz: f64,
    pub order: usize,
}

impl CutoffSpec {
    pub fn new(freq_hz: f64) -> Self {
        Self {
            freq_hz,
            order: DEFAULT_FILTER_ORDER,
        }
    }

    pub fn with_order(freq_hz: f64, order: usize) -> Self {
        Self { freq_hz, order }
    }
}

/// Filter application direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Causal forward-only pass
    Unidirectional,
    /// Zero-phase forward-backward pass
    Bidirectional,
}

/// Complete specification for one filtering call
///
/// `None` for a frequency disables that stage. A `downsample_to` below the
/// current rate decimates to the nearest achievable integer factor after the
/// filter stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub low_pass: Option<CutoffSpec>,
    pub high_pass: Option<CutoffSpec>,
    pub direction: Direction,
    pub downsample_to: Option<f64>,
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self {
            low_pass: None,
            high_pass: None,
            direction: Direction::Unidirectional,
            downsample_to: None,
        }
    }
}

impl FilterSpec {
    /// Band-pass convenience constructor
    pub fn band_pass(low_hz: f64, high_hz: f64, order: usize, direction: Direction) -> Self {
        Self {
            low_pass: Some(CutoffSpec::with_order(high_hz, order)),
            high_pass: Some(CutoffSpec::with_order(low_hz, order)),
            direction,
            downsample_to: None,
        }
    }
}

/// Result of [`apply_filter`]
#[derive(Debug, Clone, PartialEq)]
pub struct FilterOutcome {
    pub samples: Vec<f64>,
    /// Actual resulting rate; differs from any requested downsample target
    /// by the integer decimation constraint
    pub sample_rate: f64,
    pub warnings: Vec<Warning>,
}

/// Apply a Butterworth specification to a waveform payload
///
/// Stages run in order low-pass, high-pass, decimation. A stage whose cutoff
/// is NaN is skipped like an absent stage. Cutoffs at or above the Nyquist
/// frequency of the rate the stage runs at fail with `InvalidSpec`.
pub fn apply_filter(samples: &[f64], sample_rate: f64, spec: &FilterSpec) -> Result<FilterOutcome> {
    let mut out = samples.to_vec();
    let mut warnings = Vec::new();

    let stages = [(Band::Low, spec.low_pass), (Band::High, spec.high_pass)];
    for (band, stage) in stages {
        let Some(cutoff) = stage else { continue };
        if cutoff.freq_hz.is_nan() {
            continue;
        }
        let sections = design_butterworth(cutoff.order, cutoff.freq_hz, sample_rate, band)?;
        out = match spec.direction {
            Direction::Unidirectional => run_cascade(&sections, &out),
            Direction::Bidirectional => run_cascade_zero_phase(&sections, &out),
        };
    }

    let mut rate = sample_rate;
    if let Some(target) = spec.downsample_to {
        if target.is_nan() {
            // treated like an absent target
        } else if target >= sample_rate {
            warn!(
                requested = target,
                current = sample_rate,
                "downsample target not below current rate; skipped"
            );
            warnings.push(Warning::DownsampleSkipped {
                requested_hz: target,
                current_hz: sample_rate,
            });
        } else {
            let factor = resample::decimation_factor(sample_rate, target)?;
            // A factor of one means the target rounds back to the current
            // rate; nothing to decimate, nothing to alias
            if factor > 1 {
                let actual = sample_rate / factor as f64;
                // Anti-alias unless the caller's own low-pass already bounds
                // the band below the new Nyquist
                let covered = spec
                    .low_pass
                    .map(|c| !c.freq_hz.is_nan() && c.freq_hz <= actual / 2.0)
                    .unwrap_or(false);
                if !covered {
                    let sections = design_butterworth(
                        resample::ANTIALIAS_ORDER,
                        actual / 2.0,
                        sample_rate,
                        Band::Low,
                    )?;
                    out = match spec.direction {
                        Direction::Unidirectional => run_cascade(&sections, &out),
                        Direction::Bidirectional => run_cascade_zero_phase(&sections, &out),
                    };
                }
                out = resample::decimate(&out, factor);
                rate = actual;
            }
        }
    }

    Ok(FilterOutcome {
        samples: out,
        sample_rate: rate,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f64, rate: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| (2.0 * std::f64::consts::PI * freq * i as f64 / rate).sin())
            .collect()
    }

    #[test]
    fn test_lowpass_attenuates_high_frequency() {
        let rate = 1000.0;
        let n = 2000;
        let low = sine(5.0, rate, n);
        let high = sine(200.0, rate, n);
        let mixed: Vec<f64> = low.iter().zip(&high).map(|(a, b)| a + b).collect();

        // Zero-phase so the passband tone can be compared sample-for-sample
        let spec = FilterSpec {
            low_pass: Some(CutoffSpec::with_order(20.0, 4)),
            direction: Direction::Bidirectional,
            ..Default::default()
        };
        let out = apply_filter(&mixed, rate, &spec).unwrap();
        assert_eq!(out.sample_rate, rate);

        // Compare away from the edge transients of the two passes
        let residual: f64 = out.samples[500..1500]
            .iter()
            .zip(&low[500..1500])
            .map(|(y, x)| (y - x).powi(2))
            .sum::<f64>()
            / 1000.0;
        assert!(residual < 0.01, "residual power {}", residual);
    }

    #[test]
    fn test_cutoff_at_nyquist_rejected() {
        let spec = FilterSpec {
            low_pass: Some(CutoffSpec::new(500.0)),
            ..Default::default()
        };
        assert!(apply_filter(&[0.0; 100], 1000.0, &spec).is_err());
    }

    #[test]
    fn test_nan_cutoff_skips_stage() {
        let samples = sine(5.0, 100.0, 200);
        let spec = FilterSpec {
            low_pass: Some(CutoffSpec::new(f64::NAN)),
            ..Default::default()
        };
        let out = apply_filter(&samples, 100.0, &spec).unwrap();
        assert_eq!(out.samples, samples);
    }

    #[test]
    fn test_downsample_integer_factor() {
        let samples = sine(2.0, 1000.0, 1000);
        let spec = FilterSpec {
            downsample_to: Some(300.0),
            ..Default::default()
        };
        let out = apply_filter(&samples, 1000.0, &spec).unwrap();
        // Nearest integer factor to 1000/300 is 3, so the actual rate is
        // 1000/3 rather than the requested 300
        let factor = 1000.0 / out.sample_rate;
        assert!((factor - factor.round()).abs() < 1e-9);
        assert!(out.sample_rate <= 1000.0);
        assert_eq!(out.samples.len(), 334);
    }

    #[test]
    fn test_downsample_target_above_rate_warns() {
        let samples = sine(2.0, 100.0, 100);
        let spec = FilterSpec {
            downsample_to: Some(200.0),
            ..Default::default()
        };
        let out = apply_filter(&samples, 100.0, &spec).unwrap();
        assert_eq!(out.sample_rate, 100.0);
        assert_eq!(out.samples.len(), 100);
        assert!(matches!(
            out.warnings[0],
            Warning::DownsampleSkipped { .. }
        ));
    }

    #[test]
    fn test_bidirectional_preserves_phase() {
        let rate = 500.0;
        let signal = sine(3.0, rate, 2000);
        let spec = FilterSpec {
            low_pass: Some(CutoffSpec::with_order(30.0, 2)),
            direction: Direction::Bidirectional,
            ..Default::default()
        };
        let out = apply_filter(&signal, rate, &spec).unwrap();

        // A 3 Hz tone far below the cutoff should come through with no lag;
        // check the peak of the filtered signal stays aligned
        let mid = 700..1300;
        let orig_peak = mid
            .clone()
            .max_by(|&a, &b| signal[a].partial_cmp(&signal[b]).unwrap())
            .unwrap();
        let filt_peak = mid
            .max_by(|&a, &b| out.samples[a].partial_cmp(&out.samples[b]).unwrap())
            .unwrap();
        assert!(
            (orig_peak as i64 - filt_peak as i64).abs() <= 2,
            "peak moved from {} to {}",
            orig_peak,
            filt_peak
        );
    }
}
