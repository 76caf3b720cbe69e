//! physio-core: channel data model and signal-conditioning pipeline for
//! psychophysiological recordings
//!
//! This library provides the core every other toolbox component builds on:
//!
//! - Uniform multi-channel time-series container with provenance history
//! - Channel-type registry governing validation and import per signal kind
//! - Filtering primitives (Butterworth, notch, median, leaky integrator)
//! - Resampling and gap interpolation with explicit edge policies
//! - Modality preprocessing pipelines writing results back to the store
//!
//! # Quick Start
//!
//! ```rust
//! use physio_core::channel::{Channel, ChannelType};
//! use physio_core::processing::{preprocess, ChannelSelector, PreprocessMethod};
//! use physio_core::store::{ChannelStore, WriteMode};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut store = ChannelStore::new();
//!     let scr = Channel::waveform(
//!         ChannelType::SkinConductance,
//!         vec![0.1, 0.4, 0.2, 0.5, 0.3],
//!         100.0,
//!         "µS",
//!     )?;
//!     let id = store.add(scr, None);
//!
//!     let report = preprocess(
//!         &mut store,
//!         &ChannelSelector::Id(id),
//!         &PreprocessMethod::Median { window_len: 3 },
//!         WriteMode::Add,
//!     )?;
//!     println!("smoothed channel written as id {}", report.channel_id);
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]

pub mod channel;
pub mod config;
pub mod error;
pub mod processing;
pub mod registry;
pub mod store;

// Re-export commonly used types for convenience
pub use channel::{Category, Channel, ChannelData, ChannelType, MarkerInfo};
pub use error::{Error, Result, Warning};
pub use registry::Registry;
pub use store::{ChannelStore, MatchPolicy, WriteAction, WriteMode, WriteTarget};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn version_info() -> VersionInfo {
    VersionInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: "Channel data model and signal-conditioning core for psychophysiological recordings"
            .to_string(),
        features: vec![
            "Typed multi-channel session store".to_string(),
            "Channel-type registry with import hooks".to_string(),
            "Butterworth/notch/median/leaky-integrator filtering".to_string(),
            "Gap interpolation with edge policies".to_string(),
            "Modality preprocessing pipelines".to_string(),
        ],
    }
}

/// Library version information
#[derive(Debug, Clone)]
pub struct VersionInfo {
    /// Library name
    pub name: String,
    /// Version string
    pub version: String,
    /// Description
    pub description: String,
    /// List of features
    pub features: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_info() {
        let info = version_info();
        assert_eq!(info.name, NAME);
        assert_eq!(info.version, VERSION);
        assert!(!info.features.is_empty());
    }

    #[test]
    fn test_constants() {
        assert!(!VERSION.is_empty());
        assert!(!NAME.is_empty());
    }
}
