// src/processing/interpolate.rs
//! Gap filling of missing samples
//!
//! Missing samples are NaN runs inside a waveform. The engine fits the
//! chosen 1-D method over the known index/value pairs and evaluates it at
//! the missing indices. Boundary gaps are always filled: once interpolation
//! is requested, leaving NaNs at the edges is not an option, so the engine
//! extrapolates and raises a warning when extrapolation was not asked for.

use crate::config::constants::interpolation::MIN_SUPPORT_POINTS;
use crate::error::{Error, Result, Warning};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// 1-D interpolation method, standard semantics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpolationMethod {
    Linear,
    Nearest,
    Previous,
    Next,
    /// Natural cubic spline over all known points
    Spline,
    /// Monotone piecewise cubic Hermite (Fritsch–Carlson)
    Pchip,
    /// Cubic convolution (Catmull–Rom), linear where the 4-point
    /// neighborhood is incomplete
    Cubic,
}

impl std::fmt::Display for InterpolationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            InterpolationMethod::Linear => "linear",
            InterpolationMethod::Nearest => "nearest",
            InterpolationMethod::Previous => "previous",
            InterpolationMethod::Next => "next",
            InterpolationMethod::Spline => "spline",
            InterpolationMethod::Pchip => "pchip",
            InterpolationMethod::Cubic => "cubic",
        };
        write!(f, "{}", name)
    }
}

/// Result of a gap-filling call
#[derive(Debug, Clone, PartialEq)]
pub struct Interpolated {
    pub samples: Vec<f64>,
    /// Proportion of samples that were filled, for provenance logging
    pub filled_fraction: f64,
    pub warnings: Vec<Warning>,
}

/// Fill NaN runs in a waveform payload
pub fn interpolate(
    samples: &[f64],
    method: InterpolationMethod,
    allow_extrapolation: bool,
) -> Result<Interpolated> {
    let known: Vec<(f64, f64)> = samples
        .iter()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .map(|(i, v)| (i as f64, *v))
        .collect();

    let missing = samples.len() - known.len();
    if missing == 0 {
        return Ok(Interpolated {
            samples: samples.to_vec(),
            filled_fraction: 0.0,
            warnings: Vec::new(),
        });
    }
    if known.len() < MIN_SUPPORT_POINTS {
        return Err(Error::InsufficientData {
            required: MIN_SUPPORT_POINTS,
            available: known.len(),
        });
    }

    let leading = known[0].0 as usize;
    let trailing = samples.len() - 1 - known[known.len() - 1].0 as usize;

    if method == InterpolationMethod::Previous && leading > 0 {
        return Err(Error::OutOfRange(format!(
            "'previous' undefined for {} missing samples before the first known sample",
            leading
        )));
    }
    if method == InterpolationMethod::Next && trailing > 0 {
        return Err(Error::OutOfRange(format!(
            "'next' undefined for {} missing samples after the last known sample",
            trailing
        )));
    }

    let mut warnings = Vec::new();
    if (leading > 0 || trailing > 0) && !allow_extrapolation {
        warn!(leading, trailing, "boundary gaps force extrapolation");
        warnings.push(Warning::ForcedExtrapolation { leading, trailing });
    }

    let interpolant = Interpolant::fit(&known, method);
    let mut out = samples.to_vec();
    for (i, v) in out.iter_mut().enumerate() {
        if v.is_nan() {
            *v = interpolant.eval(i as f64);
        }
    }

    Ok(Interpolated {
        samples: out,
        filled_fraction: missing as f64 / samples.len() as f64,
        warnings,
    })
}

/// Fitted interpolant over the known points of one call
struct Interpolant<'a> {
    known: &'a [(f64, f64)],
    method: InterpolationMethod,
    /// Per-knot second derivatives (spline) or slopes (pchip)
    derivatives: Vec<f64>,
}

impl<'a> Interpolant<'a> {
    fn fit(known: &'a [(f64, f64)], method: InterpolationMethod) -> Self {
        let derivatives = match method {
            InterpolationMethod::Spline => natural_spline_moments(known),
            InterpolationMethod::Pchip => pchip_slopes(known),
            _ => Vec::new(),
        };
        Self {
            known,
            method,
            derivatives,
        }
    }

    fn eval(&self, t: f64) -> f64 {
        match self.method {
            InterpolationMethod::Linear => self.eval_linear(t),
            InterpolationMethod::Nearest => self.eval_nearest(t),
            InterpolationMethod::Previous => self.eval_previous(t),
            InterpolationMethod::Next => self.eval_next(t),
            InterpolationMethod::Spline => self.eval_spline(t),
            InterpolationMethod::Pchip => self.eval_pchip(t),
            InterpolationMethod::Cubic => self.eval_cubic(t),
        }
    }

    /// Index of the interval containing `t`, clamped to valid intervals so
    /// boundary evaluation extrapolates the edge polynomial
    fn interval(&self, t: f64) -> usize {
        let n = self.known.len();
        let after = self.known.partition_point(|&(x, _)| x <= t);
        after.clamp(1, n - 1) - 1
    }

    fn eval_linear(&self, t: f64) -> f64 {
        let i = self.interval(t);
        let (x0, y0) = self.known[i];
        let (x1, y1) = self.known[i + 1];
        y0 + (y1 - y0) * (t - x0) / (x1 - x0)
    }

    fn eval_nearest(&self, t: f64) -> f64 {
        let i = self.interval(t);
        let (x0, y0) = self.known[i];
        let (x1, y1) = self.known[i + 1];
        // Ties round up, matching common nearest-neighbor semantics
        if t - x0 < x1 - t {
            y0
        } else {
            y1
        }
    }

    fn eval_previous(&self, t: f64) -> f64 {
        let i = self.interval(t);
        let (x1, y1) = self.known[i + 1];
        if t >= x1 {
            y1
        } else {
            self.known[i].1
        }
    }

    fn eval_next(&self, t: f64) -> f64 {
        let i = self.interval(t);
        let (x0, y0) = self.known[i];
        if t <= x0 {
            y0
        } else {
            self.known[i + 1].1
        }
    }

    fn eval_spline(&self, t: f64) -> f64 {
        let i = self.interval(t);
        let (x0, y0) = self.known[i];
        let (x1, y1) = self.known[i + 1];
        let h = x1 - x0;
        let m0 = self.derivatives[i];
        let m1 = self.derivatives[i + 1];
        let a = (x1 - t) / h;
        let b = (t - x0) / h;
        a * y0
            + b * y1
            + ((a.powi(3) - a) * m0 + (b.powi(3) - b) * m1) * h * h / 6.0
    }

    fn eval_pchip(&self, t: f64) -> f64 {
        let i = self.interval(t);
        let (x0, y0) = self.known[i];
        let (x1, y1) = self.known[i + 1];
        let h = x1 - x0;
        let s = (t - x0) / h;
        let d0 = self.derivatives[i];
        let d1 = self.derivatives[i + 1];
        let h00 = (1.0 + 2.0 * s) * (1.0 - s) * (1.0 - s);
        let h10 = s * (1.0 - s) * (1.0 - s);
        let h01 = s * s * (3.0 - 2.0 * s);
        let h11 = s * s * (s - 1.0);
        h00 * y0 + h10 * h * d0 + h01 * y1 + h11 * h * d1
    }

    fn eval_cubic(&self, t: f64) -> f64 {
        let i = self.interval(t);
        let n = self.known.len();
        // Catmull-Rom needs one known point on each side of the interval
        if i == 0 || i + 2 >= n || t < self.known[0].0 || t > self.known[n - 1].0 {
            return self.eval_linear(t);
        }
        let (x0, p0) = self.known[i - 1];
        let (x1, p1) = self.known[i];
        let (x2, p2) = self.known[i + 1];
        let (x3, p3) = self.known[i + 2];
        let h = x2 - x1;
        let s = (t - x1) / h;
        // Tangents from the neighboring points, scaled to the interval
        let m1 = h * (p2 - p0) / (x2 - x0);
        let m2 = h * (p3 - p1) / (x3 - x1);
        let s2 = s * s;
        let s3 = s2 * s;
        (2.0 * s3 - 3.0 * s2 + 1.0) * p1
            + (s3 - 2.0 * s2 + s) * m1
            + (-2.0 * s3 + 3.0 * s2) * p2
            + (s3 - s2) * m2
    }
}

/// Second derivatives of the natural cubic spline, by Thomas algorithm
fn natural_spline_moments(known: &[(f64, f64)]) -> Vec<f64> {
    let n = known.len();
    let mut moments = vec![0.0; n];
    if n < 3 {
        return moments;
    }

    // Interior tridiagonal system; natural boundary moments stay zero
    let mut diag = vec![0.0; n];
    let mut rhs = vec![0.0; n];
    for i in 1..n - 1 {
        let h0 = known[i].0 - known[i - 1].0;
        let h1 = known[i + 1].0 - known[i].0;
        diag[i] = 2.0 * (h0 + h1);
        rhs[i] = 6.0
            * ((known[i + 1].1 - known[i].1) / h1 - (known[i].1 - known[i - 1].1) / h0);
    }

    // Forward sweep
    let mut upper = vec![0.0; n];
    for i in 1..n - 1 {
        let h0 = known[i].0 - known[i - 1].0;
        if i > 1 {
            let w = h0 / diag[i - 1];
            diag[i] -= w * upper[i - 1];
            rhs[i] -= w * rhs[i - 1];
        }
        upper[i] = known[i + 1].0 - known[i].0;
    }

    // Back substitution
    for i in (1..n - 1).rev() {
        let next = if i + 1 < n - 1 { moments[i + 1] } else { 0.0 };
        moments[i] = (rhs[i] - upper[i] * next) / diag[i];
    }
    moments
}

/// Monotonicity-preserving knot slopes (Fritsch–Carlson)
fn pchip_slopes(known: &[(f64, f64)]) -> Vec<f64> {
    let n = known.len();
    let mut slopes = vec![0.0; n];
    if n == 2 {
        let delta = (known[1].1 - known[0].1) / (known[1].0 - known[0].0);
        slopes[0] = delta;
        slopes[1] = delta;
        return slopes;
    }

    let h: Vec<f64> = (0..n - 1).map(|i| known[i + 1].0 - known[i].0).collect();
    let delta: Vec<f64> = (0..n - 1)
        .map(|i| (known[i + 1].1 - known[i].1) / h[i])
        .collect();

    // Interior: weighted harmonic mean of adjacent secants, zero across a
    // local extremum
    for i in 1..n - 1 {
        if delta[i - 1] * delta[i] <= 0.0 {
            slopes[i] = 0.0;
        } else {
            let w1 = 2.0 * h[i] + h[i - 1];
            let w2 = h[i] + 2.0 * h[i - 1];
            slopes[i] = (w1 + w2) / (w1 / delta[i - 1] + w2 / delta[i]);
        }
    }
    slopes[0] = edge_slope(h[0], h[1], delta[0], delta[1]);
    slopes[n - 1] = edge_slope(h[n - 2], h[n - 3], delta[n - 2], delta[n - 3]);
    slopes
}

/// Non-centered three-point end slope with shape-preserving clamps
fn edge_slope(h0: f64, h1: f64, delta0: f64, delta1: f64) -> f64 {
    let d = ((2.0 * h0 + h1) * delta0 - h0 * delta1) / (h0 + h1);
    if d * delta0 <= 0.0 {
        0.0
    } else if delta0 * delta1 < 0.0 && d.abs() > 3.0 * delta0.abs() {
        3.0 * delta0
    } else {
        d
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAN: f64 = f64::NAN;

    #[test]
    fn test_no_missing_returns_unchanged() {
        let samples = vec![1.0, 2.0, 3.0];
        let out = interpolate(&samples, InterpolationMethod::Linear, false).unwrap();
        assert_eq!(out.samples, samples);
        assert_eq!(out.filled_fraction, 0.0);
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_insufficient_data() {
        let result = interpolate(&[1.0, NAN, NAN], InterpolationMethod::Linear, false);
        match result {
            Err(Error::InsufficientData { available, .. }) => assert_eq!(available, 1),
            other => panic!("expected insufficient data, got {:?}", other),
        }
    }

    #[test]
    fn test_linear_interior_gap() {
        let out = interpolate(&[0.0, NAN, NAN, 3.0], InterpolationMethod::Linear, false).unwrap();
        assert_eq!(out.samples, vec![0.0, 1.0, 2.0, 3.0]);
        assert!((out.filled_fraction - 0.5).abs() < 1e-12);
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_linear_boundary_extrapolation_warns() {
        let out = interpolate(&[NAN, 1.0, 2.0, NAN], InterpolationMethod::Linear, false).unwrap();
        assert_eq!(out.samples, vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(
            out.warnings,
            vec![Warning::ForcedExtrapolation {
                leading: 1,
                trailing: 1
            }]
        );

        // Requested extrapolation raises no warning
        let out = interpolate(&[NAN, 1.0, 2.0, NAN], InterpolationMethod::Linear, true).unwrap();
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_nearest() {
        let out = interpolate(&[0.0, NAN, NAN, NAN, 4.0], InterpolationMethod::Nearest, false)
            .unwrap();
        assert_eq!(out.samples, vec![0.0, 0.0, 4.0, 4.0, 4.0]);
    }

    #[test]
    fn test_previous_and_next() {
        let out = interpolate(&[1.0, NAN, 3.0, NAN], InterpolationMethod::Previous, false).unwrap();
        assert_eq!(out.samples, vec![1.0, 1.0, 3.0, 3.0]);

        let out = interpolate(&[NAN, 1.0, NAN, 3.0], InterpolationMethod::Next, false).unwrap();
        assert_eq!(out.samples, vec![1.0, 1.0, 3.0, 3.0]);
    }

    #[test]
    fn test_previous_leading_gap_out_of_range() {
        let result = interpolate(&[NAN, 1.0, 2.0], InterpolationMethod::Previous, false);
        assert!(matches!(result, Err(Error::OutOfRange(_))));
    }

    #[test]
    fn test_next_trailing_gap_out_of_range() {
        let result = interpolate(&[1.0, 2.0, NAN], InterpolationMethod::Next, false);
        assert!(matches!(result, Err(Error::OutOfRange(_))));
    }

    #[test]
    fn test_spline_reproduces_line() {
        // A spline through collinear points is that line
        let out = interpolate(
            &[0.0, NAN, 2.0, NAN, 4.0, 5.0],
            InterpolationMethod::Spline,
            false,
        )
        .unwrap();
        for (i, v) in out.samples.iter().enumerate() {
            assert!((v - i as f64).abs() < 1e-9, "sample {} = {}", i, v);
        }
    }

    #[test]
    fn test_spline_smooth_curve() {
        // Fill one point of a parabola; the natural spline lands close
        let mut samples: Vec<f64> = (0..9).map(|i| (i as f64).powi(2)).collect();
        samples[4] = NAN;
        let out = interpolate(&samples, InterpolationMethod::Spline, false).unwrap();
        assert!((out.samples[4] - 16.0).abs() < 0.2);
    }

    #[test]
    fn test_pchip_preserves_monotonicity() {
        let samples = vec![0.0, NAN, NAN, 1.0, NAN, NAN, 10.0];
        let out = interpolate(&samples, InterpolationMethod::Pchip, false).unwrap();
        for pair in out.samples.windows(2) {
            assert!(pair[1] >= pair[0] - 1e-12, "not monotone: {:?}", out.samples);
        }
    }

    #[test]
    fn test_cubic_interior() {
        // Catmull-Rom through a line is exact
        let out = interpolate(
            &[0.0, 1.0, NAN, 3.0, 4.0],
            InterpolationMethod::Cubic,
            false,
        )
        .unwrap();
        assert!((out.samples[2] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_all_methods_fill_everything() {
        let samples = [NAN, 1.0, NAN, 2.5, NAN, 2.0, NAN];
        for method in [
            InterpolationMethod::Linear,
            InterpolationMethod::Nearest,
            InterpolationMethod::Spline,
            InterpolationMethod::Pchip,
            InterpolationMethod::Cubic,
        ] {
            let out = interpolate(&samples, method, true).unwrap();
            assert!(
                out.samples.iter().all(|v| !v.is_nan()),
                "{} left NaNs: {:?}",
                method,
                out.samples
            );
            assert!((out.filled_fraction - 4.0 / 7.0).abs() < 1e-12);
        }
    }
}
