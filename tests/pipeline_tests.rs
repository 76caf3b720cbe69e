// tests/pipeline_tests.rs
//! End-to-end preprocessing scenarios
//!
//! Runs the orchestrators against realistic stores and checks the
//! externally observable contract: category rejection, rate bookkeeping,
//! history provenance, and per-item batch containment.

use physio_core::channel::{Channel, ChannelType};
use physio_core::error::Error;
use physio_core::processing::filters::{apply_filter, median_filter, notch_filter, FilterSpec};
use physio_core::processing::{
    emg_pipeline, interpolate, preprocess, preprocess_file, ChannelSelector, EmgOptions,
    InterpolationMethod, PreprocessMethod,
};
use physio_core::store::{persistence, ChannelStore, WriteMode};
use physio_core::Warning;
use proptest::prelude::*;
use std::f64::consts::PI;

fn scr_channel(n: usize, rate: f64) -> Channel {
    let samples: Vec<f64> = (0..n)
        .map(|i| 2.0 + (2.0 * PI * 0.5 * i as f64 / rate).sin())
        .collect();
    Channel::waveform(ChannelType::SkinConductance, samples, rate, "µS").unwrap()
}

fn marker_channel() -> Channel {
    Channel::events(ChannelType::Marker, vec![0.4, 1.1, 1.9], None, "events").unwrap()
}

/// Store with [scr@100Hz, marker]; median window 5 with write-mode add
/// appends a third channel with matching shape and a provenance entry
#[test]
fn test_median_pipeline_end_to_end() {
    let mut store = ChannelStore::new();
    store.add(scr_channel(300, 100.0), None);
    store.add(marker_channel(), None);

    let report = preprocess(
        &mut store,
        &ChannelSelector::Id(1),
        &PreprocessMethod::Median { window_len: 5 },
        WriteMode::Add,
    )
    .unwrap();

    assert_eq!(store.channel_count(), 3);
    assert_eq!(report.channel_id, 3);

    let out = store.channel(3).unwrap();
    assert_eq!(out.kind, ChannelType::SkinConductance);
    assert_eq!(out.len(), 300);
    assert_eq!(out.sample_rate(), Some(100.0));

    let entry = store.history().last().unwrap();
    assert!(entry.message.contains("median filter over 5 timepoints"));
}

/// EMG pipeline with mains at 60 Hz: derived output type, unchanged rate
/// and length
#[test]
fn test_emg_pipeline_end_to_end() {
    let rate = 2000.0;
    let n = 6000;
    let raw: Vec<f64> = (0..n)
        .map(|i| {
            let t = i as f64 / rate;
            (2.0 * PI * 120.0 * t).sin() + 0.5 * (2.0 * PI * 60.0 * t).sin()
        })
        .collect();
    let mut store = ChannelStore::new();
    store.add(
        Channel::waveform(ChannelType::Emg, raw, rate, "mV").unwrap(),
        None,
    );

    let options = EmgOptions {
        mains_frequency_hz: 60.0,
        ..Default::default()
    };
    let report = emg_pipeline(&mut store, &options).unwrap();

    let out = store.channel(report.channel_id).unwrap();
    assert_eq!(out.kind, ChannelType::EmgProcessed);
    assert_eq!(out.sample_rate(), Some(rate));
    assert_eq!(out.len(), n);

    let entry = store.history().last().unwrap();
    assert!(entry.message.contains("60 Hz"));
}

/// Waveform-only operators reject events channels regardless of payload
#[test]
fn test_category_rejection_is_uniform() {
    let mut store = ChannelStore::new();
    store.add(scr_channel(100, 100.0), None);
    store.add(marker_channel(), None);

    let methods = [
        PreprocessMethod::Median { window_len: 3 },
        PreprocessMethod::Butterworth(FilterSpec::default()),
        PreprocessMethod::LeakyIntegrator { time_constant_s: 0.1 },
    ];
    for method in &methods {
        let result = preprocess(
            &mut store,
            &ChannelSelector::Id(2),
            method,
            WriteMode::Add,
        );
        assert!(
            matches!(result, Err(Error::UnsupportedChannelCategory { .. })),
            "{:?} did not reject events channel",
            method
        );
    }

    // Same store shape afterwards: nothing was written
    assert_eq!(store.channel_count(), 2);
}

/// File entry point: load, preprocess, save is one atomic read-modify-write
#[test]
fn test_preprocess_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");

    let mut store = ChannelStore::new();
    store.add(scr_channel(200, 100.0), None);
    persistence::save(&store, &path).unwrap();

    let report = preprocess_file(
        &path,
        &ChannelSelector::Kind(ChannelType::SkinConductance),
        &PreprocessMethod::LeakyIntegrator { time_constant_s: 0.05 },
        WriteMode::Add,
    )
    .unwrap();
    assert_eq!(report.channel_id, 2);

    let reloaded = persistence::load(&path).unwrap();
    assert_eq!(reloaded.channel_count(), 2);
    assert!(reloaded
        .history()
        .last()
        .unwrap()
        .message
        .contains("leaky integrator"));
}

#[test]
fn test_preprocess_missing_file_is_not_found() {
    let result = preprocess_file(
        "/nonexistent/session.json",
        &ChannelSelector::Id(1),
        &PreprocessMethod::Median { window_len: 3 },
        WriteMode::Add,
    );
    assert!(matches!(result, Err(Error::NotFound(_))));
}

/// Interpolation over a complete waveform is the identity
#[test]
fn test_interpolation_exactness() {
    let samples: Vec<f64> = (0..50).map(|i| (i as f64 * 0.1).cos()).collect();
    let out = interpolate(&samples, InterpolationMethod::Spline, false).unwrap();
    assert_eq!(out.samples, samples);
    assert_eq!(out.filled_fraction, 0.0);
}

/// A forced boundary extrapolation surfaces as a warning, not an error
#[test]
fn test_forced_extrapolation_warns_but_completes() {
    let samples = vec![f64::NAN, f64::NAN, 1.0, 2.0, 3.0];
    let out = interpolate(&samples, InterpolationMethod::Linear, false).unwrap();
    assert!(out.samples.iter().all(|v| !v.is_nan()));
    assert_eq!(
        out.warnings,
        vec![Warning::ForcedExtrapolation {
            leading: 2,
            trailing: 0
        }]
    );
}

proptest! {
    /// Interior gaps always fill completely with fraction k/N
    #[test]
    fn prop_interpolation_coverage(
        n in 6usize..50,
        seed in 0u64..1000,
    ) {
        let mut samples: Vec<f64> = (0..n).map(|i| ((i as f64) * 0.37).sin()).collect();
        // Knock out a pseudo-random interior subset, never all of it
        let mut missing = 0usize;
        for i in 1..n - 1 {
            if (i as u64).wrapping_mul(2654435761).wrapping_add(seed) % 3 == 0 && missing + 2 < n {
                samples[i] = f64::NAN;
                missing += 1;
            }
        }
        prop_assume!(missing > 0);

        let out = interpolate(&samples, InterpolationMethod::Linear, false).unwrap();
        prop_assert_eq!(out.samples.len(), n);
        prop_assert!(out.samples.iter().all(|v| !v.is_nan()));
        prop_assert!((out.filled_fraction - missing as f64 / n as f64).abs() < 1e-12);
        prop_assert!(out.warnings.is_empty());
    }

    /// Downsampling yields a rate the original divides by an integer factor
    #[test]
    fn prop_downsample_rate_relationship(
        rate in 100u32..2000,
        target in 10u32..1000,
    ) {
        prop_assume!(target < rate);
        let rate = rate as f64;
        let target = target as f64;
        let samples = vec![0.5; 400];
        let spec = FilterSpec {
            downsample_to: Some(target),
            ..Default::default()
        };

        let out = apply_filter(&samples, rate, &spec).unwrap();
        prop_assert!(out.sample_rate <= rate);
        let factor = rate / out.sample_rate;
        prop_assert!((factor - factor.round()).abs() < 1e-9);
    }

    /// The median filter never invents values outside the window range
    #[test]
    fn prop_median_bounded(window in prop::sample::select(vec![3usize, 5, 7])) {
        let samples: Vec<f64> = (0..64).map(|i| ((i * 37) % 11) as f64).collect();
        let out = median_filter(&samples, window).unwrap();
        let lo = samples.iter().cloned().fold(f64::INFINITY, f64::min);
        let hi = samples.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        for v in out {
            prop_assert!(v >= lo && v <= hi);
        }
    }
}

/// Notch at 50 Hz leaves a 60 Hz recording environment unharmed and
/// vice versa
#[test]
fn test_notch_targets_requested_mains() {
    let rate = 1000.0;
    let n = 4000;
    let line60: Vec<f64> = (0..n)
        .map(|i| (2.0 * PI * 60.0 * i as f64 / rate).sin())
        .collect();

    let at60 = notch_filter(&line60, rate, 60.0, 30.0).unwrap();
    let at50 = notch_filter(&line60, rate, 50.0, 30.0).unwrap();

    let power = |s: &[f64]| s[500..3500].iter().map(|v| v * v).sum::<f64>();
    assert!(power(&at60) < 0.01 * power(&line60));
    assert!(power(&at50) > 0.5 * power(&line60));
}
