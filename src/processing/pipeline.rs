// src/processing/pipeline.rs
//! Preprocessing orchestrators
//!
//! Each orchestrator resolves channels from a store, runs a fixed sequence
//! of filter/interpolation stages, and writes the result back. Every stage
//! must succeed before anything is written: a failure mid-pipeline leaves
//! the store exactly as it was.

use crate::channel::{Channel, ChannelType};
use crate::config::constants::{emg, filters as filter_constants};
use crate::config::ToolboxConfig;
use crate::error::{Error, Result, Warning};
use crate::processing::filters::{
    apply_filter, leaky_integrator, median_filter, notch_filter, CutoffSpec, Direction, FilterSpec,
};
use crate::processing::interpolate::{interpolate, InterpolationMethod};
use crate::store::{persistence, ChannelId, ChannelStore, MatchPolicy, WriteAction, WriteMode};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::path::Path;
use tracing::debug;

/// How an orchestrator picks its input channel
///
/// A kind selector resolving to several channels takes the most recently
/// added one.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelSelector {
    Id(ChannelId),
    Kind(ChannelType),
}

impl std::fmt::Display for ChannelSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelSelector::Id(id) => write!(f, "channel {}", id),
            ChannelSelector::Kind(kind) => write!(f, "channel type '{}'", kind),
        }
    }
}

/// Single-operator preprocessing method
///
/// The operator is selected once at construction; there is no per-call
/// dispatch on method names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum PreprocessMethod {
    Median { window_len: usize },
    Butterworth(FilterSpec),
    LeakyIntegrator { time_constant_s: f64 },
}

impl PreprocessMethod {
    fn describe(&self) -> String {
        match self {
            PreprocessMethod::Median { window_len } => {
                format!("median filter over {} timepoints", window_len)
            }
            PreprocessMethod::Butterworth(spec) => {
                let mut stages = Vec::new();
                if let Some(c) = spec.low_pass {
                    stages.push(format!("low-pass {} Hz order {}", c.freq_hz, c.order));
                }
                if let Some(c) = spec.high_pass {
                    stages.push(format!("high-pass {} Hz order {}", c.freq_hz, c.order));
                }
                if let Some(target) = spec.downsample_to {
                    stages.push(format!("downsampled towards {} Hz", target));
                }
                if stages.is_empty() {
                    "butterworth filter (no active stage)".to_string()
                } else {
                    format!("butterworth filter ({})", stages.join(", "))
                }
            }
            PreprocessMethod::LeakyIntegrator { time_constant_s } => {
                format!("leaky integrator with {} s time constant", time_constant_s)
            }
        }
    }
}

/// Outcome of one orchestrator run
#[derive(Debug, Clone, PartialEq)]
pub struct PreprocessReport {
    pub channel_id: ChannelId,
    pub action: WriteAction,
    pub sample_rate: f64,
    pub warnings: Vec<Warning>,
}

/// Apply a method to an inline waveform payload, without a store
///
/// Returns the transformed samples and the resulting sample rate.
pub fn preprocess_data(
    samples: &[f64],
    sample_rate: f64,
    method: &PreprocessMethod,
) -> Result<(Vec<f64>, f64, Vec<Warning>)> {
    match method {
        PreprocessMethod::Median { window_len } => {
            let out = median_filter(samples, *window_len)?;
            Ok((out, sample_rate, Vec::new()))
        }
        PreprocessMethod::Butterworth(spec) => {
            let out = apply_filter(samples, sample_rate, spec)?;
            Ok((out.samples, out.sample_rate, out.warnings))
        }
        PreprocessMethod::LeakyIntegrator { time_constant_s } => {
            let out = leaky_integrator(samples, sample_rate, *time_constant_s)?;
            Ok((out, sample_rate, Vec::new()))
        }
    }
}

/// Generic single-operator pipeline over one store channel
pub fn preprocess(
    store: &mut ChannelStore,
    selector: &ChannelSelector,
    method: &PreprocessMethod,
    write_mode: WriteMode,
) -> Result<PreprocessReport> {
    let (id, channel) = resolve_one(store, selector)?;
    let (samples, sample_rate) = channel.waveform_parts("preprocessing")?;

    debug!(channel = %channel.kind, id, method = ?method, "preprocessing channel");
    let (out, out_rate, mut warnings) = preprocess_data(samples, sample_rate, method)?;

    let result = Channel::waveform(channel.kind.clone(), out, out_rate, channel.units.clone())?;
    let message = method.describe();
    let report = store.write(result, write_mode, Some(&message))?;
    warnings.extend(report.warnings);

    Ok(PreprocessReport {
        channel_id: report.id,
        action: report.action,
        sample_rate: out_rate,
        warnings,
    })
}

/// Generic pipeline against a persisted store file; the whole store is
/// loaded, transformed, and saved back atomically
pub fn preprocess_file(
    path: impl AsRef<Path>,
    selector: &ChannelSelector,
    method: &PreprocessMethod,
    write_mode: WriteMode,
) -> Result<PreprocessReport> {
    let path = path.as_ref();
    let mut store = persistence::load(path)?;
    let report = preprocess(&mut store, selector, method, write_mode)?;
    persistence::save(&store, path)?;
    Ok(report)
}

/// EMG preprocessing options
#[derive(Debug, Clone, PartialEq)]
pub struct EmgOptions {
    /// Mains interference frequency for the notch stage
    pub mains_frequency_hz: f64,
    /// Defaults to the most recent raw EMG channel
    pub selector: ChannelSelector,
    pub write_mode: WriteMode,
}

impl Default for EmgOptions {
    fn default() -> Self {
        Self {
            mains_frequency_hz: filter_constants::POWERLINE_FREQ_50HZ,
            selector: ChannelSelector::Kind(ChannelType::Emg),
            write_mode: WriteMode::Replace,
        }
    }
}

impl EmgOptions {
    /// Options seeded from the toolbox configuration
    pub fn from_config(config: &ToolboxConfig) -> Self {
        Self {
            mains_frequency_hz: config.processing.mains_frequency_hz,
            ..Default::default()
        }
    }
}

/// Three-stage EMG pipeline
///
/// Band-pass for baseline/movement artifact removal, notch against line
/// noise, then rectification and smoothing into an amplitude envelope. The
/// result is written back under the derived processed-EMG type; length and
/// sample rate are unchanged.
pub fn emg_pipeline(store: &mut ChannelStore, options: &EmgOptions) -> Result<PreprocessReport> {
    let (id, channel) = resolve_one(store, &options.selector)?;
    let (samples, sample_rate) = channel.waveform_parts("EMG preprocessing")?;
    debug!(channel = %channel.kind, id, "running EMG pipeline");

    // Stage 1: band-pass against baseline drift and movement artifacts
    let band = FilterSpec::band_pass(
        emg::BANDPASS_LOW_HZ,
        emg::BANDPASS_HIGH_HZ,
        emg::BANDPASS_ORDER,
        Direction::Unidirectional,
    );
    let stage1 = apply_filter(samples, sample_rate, &band)?;

    // Stage 2: mains notch
    let stage2 = notch_filter(
        &stage1.samples,
        sample_rate,
        options.mains_frequency_hz,
        filter_constants::DEFAULT_NOTCH_Q,
    )?;

    // Stage 3: rectify, then smooth with the cutoff equivalent to the fixed
    // envelope time constant
    let rectified: Vec<f64> = stage2.iter().map(|v| v.abs()).collect();
    let envelope_cutoff = 1.0 / (2.0 * PI * emg::ENVELOPE_TIME_CONSTANT_S);
    let envelope_spec = FilterSpec {
        low_pass: Some(CutoffSpec::with_order(envelope_cutoff, emg::ENVELOPE_ORDER)),
        high_pass: None,
        direction: Direction::Bidirectional,
        downsample_to: None,
    };
    let stage3 = apply_filter(&rectified, sample_rate, &envelope_spec)?;

    let result = Channel::waveform(
        ChannelType::EmgProcessed,
        stage3.samples,
        sample_rate,
        channel.units.clone(),
    )?;
    let message = format!(
        "EMG preprocessing (band-pass {}-{} Hz, notch at {} Hz, rectified and smoothed)",
        emg::BANDPASS_LOW_HZ,
        emg::BANDPASS_HIGH_HZ,
        options.mains_frequency_hz
    );
    let report = store.write(result, options.write_mode, Some(&message))?;

    Ok(PreprocessReport {
        channel_id: report.id,
        action: report.action,
        sample_rate,
        warnings: report.warnings,
    })
}

/// One item of a batch run
#[derive(Debug)]
pub struct BatchItem {
    pub selector: ChannelSelector,
    pub outcome: Result<PreprocessReport>,
}

/// Aggregate outcome of a batch run
#[derive(Debug, Default)]
pub struct BatchReport {
    pub items: Vec<BatchItem>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.items.iter().filter(|i| i.outcome.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.items.len() - self.succeeded()
    }
}

/// Gap-fill several channels; one channel's failure is recorded and the
/// batch continues with the remaining channels
pub fn interpolate_channels(
    store: &mut ChannelStore,
    selectors: &[ChannelSelector],
    method: InterpolationMethod,
    allow_extrapolation: bool,
    write_mode: WriteMode,
) -> BatchReport {
    let mut report = BatchReport::default();
    for selector in selectors {
        let outcome = interpolate_one(store, selector, method, allow_extrapolation, write_mode);
        report.items.push(BatchItem {
            selector: selector.clone(),
            outcome,
        });
    }
    report
}

fn interpolate_one(
    store: &mut ChannelStore,
    selector: &ChannelSelector,
    method: InterpolationMethod,
    allow_extrapolation: bool,
    write_mode: WriteMode,
) -> Result<PreprocessReport> {
    let (id, channel) = resolve_one(store, selector)?;
    let (samples, sample_rate) = channel.waveform_parts("interpolation")?;

    debug!(channel = %channel.kind, id, %method, "interpolating channel");
    let filled = interpolate(samples, method, allow_extrapolation)?;

    let result = Channel::waveform(
        channel.kind.clone(),
        filled.samples,
        sample_rate,
        channel.units.clone(),
    )?;
    let message = format!(
        "{} interpolation filled {:.1}% of samples",
        method,
        filled.filled_fraction * 100.0
    );
    let write = store.write(result, write_mode, Some(&message))?;

    let mut warnings = filled.warnings;
    warnings.extend(write.warnings);
    Ok(PreprocessReport {
        channel_id: write.id,
        action: write.action,
        sample_rate,
        warnings,
    })
}

fn resolve_one<'a>(
    store: &'a ChannelStore,
    selector: &ChannelSelector,
) -> Result<(ChannelId, &'a Channel)> {
    match selector {
        ChannelSelector::Id(id) => Ok((*id, store.channel(*id)?)),
        ChannelSelector::Kind(kind) => {
            let mut matches = store.select_by_kind(kind, MatchPolicy::Last)?;
            matches
                .pop()
                .ok_or_else(|| Error::NotFound(selector.to_string()))
        }
    }
}
