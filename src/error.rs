// src/error.rs
//! Unified error handling for the channel core
//!
//! Every fallible operation in the crate returns [`Result`]. Recoverable
//! anomalies (forced extrapolation, a replace degrading to an add) are not
//! errors: they are [`Warning`] values carried alongside successful results
//! so callers can report them without aborting a run.

use crate::channel::Category;
use thiserror::Error;

/// Result type alias for channel-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the channel core
///
/// Validation errors are raised before any store mutation; a pipeline that
/// fails mid-run leaves the store untouched.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed arguments or options, detected before any mutation
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A referenced channel, type, or file does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// An operation requiring a single target matched multiple channels
    #[error("ambiguous target: {matched} channels match {query}")]
    AmbiguousTarget { query: String, matched: usize },

    /// A waveform-only operator was invoked on an events channel (or vice versa)
    #[error("unsupported channel category: {operation} requires a {required} channel, got {actual}")]
    UnsupportedChannelCategory {
        operation: &'static str,
        required: Category,
        actual: Category,
    },

    /// A filter specification is numerically inconsistent
    #[error("invalid filter spec: {0}")]
    InvalidSpec(String),

    /// Too few known samples to fit an interpolant
    #[error("insufficient data: {available} known samples, at least {required} required")]
    InsufficientData { required: usize, available: usize },

    /// Interpolation method undefined over the requested range
    #[error("out of range: {0}")]
    OutOfRange(String),

    /// Store load/save failure; the on-disk file is left unchanged
    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Recoverable anomaly reported alongside a successful result
#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    /// Boundary gaps forced extrapolation although it was not requested
    ForcedExtrapolation { leading: usize, trailing: usize },
    /// A replace matched zero channels and degraded to an add
    ReplaceDegradedToAdd { tag: String, id: usize },
    /// A requested downsample target at or above the current rate was skipped
    DownsampleSkipped { requested_hz: f64, current_hz: f64 },
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::ForcedExtrapolation { leading, trailing } => write!(
                f,
                "extrapolation forced for {} leading and {} trailing missing samples",
                leading, trailing
            ),
            Warning::ReplaceDegradedToAdd { tag, id } => write!(
                f,
                "no '{}' channel to replace; added as channel {} instead",
                tag, id
            ),
            Warning::DownsampleSkipped { requested_hz, current_hz } => write!(
                f,
                "downsample target {} Hz is not below current rate {} Hz; skipped",
                requested_hz, current_hz
            ),
        }
    }
}
