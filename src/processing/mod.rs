// src/processing/mod.rs
//! Signal-conditioning pipeline for channel data

pub mod filters;
pub mod interpolate;
pub mod pipeline;
pub mod resample;

pub use filters::{apply_filter, Direction, FilterOutcome, FilterSpec};
pub use interpolate::{interpolate, Interpolated, InterpolationMethod};
pub use pipeline::{
    emg_pipeline, interpolate_channels, preprocess, preprocess_data, preprocess_file,
    BatchReport, ChannelSelector, EmgOptions, PreprocessMethod, PreprocessReport,
};
