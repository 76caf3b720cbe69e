// src/registry/mod.rs
//! Channel type registry
//!
//! Static catalog of recognized channel kinds: semantic category, default
//! units, and an optional import hook. Components query the registry instead
//! of hardcoding type lists, so extending the toolbox with a new modality is
//! one new catalog row. The catalog is immutable after construction.

use crate::channel::{Category, Channel, ChannelType, MarkerInfo};
use crate::error::{Error, Result};
use once_cell::sync::Lazy;

/// Raw payload a vendor importer hands to an import hook
///
/// The importer has already parsed the vendor format; this is the last step
/// turning its output into a canonical [`Channel`].
#[derive(Debug, Clone, Default)]
pub struct ImportedRecord {
    /// Waveform samples, or event timestamps in seconds for event kinds
    pub data: Vec<f64>,
    /// Required for waveform kinds, ignored for event kinds
    pub sample_rate: Option<f64>,
    /// Overrides the catalog default units when present
    pub units: Option<String>,
    /// Per-event labels/values for event kinds
    pub marker_info: Option<MarkerInfo>,
}

/// Import hook attached to directly importable channel kinds
pub type ImportFn = fn(&TypeEntry, ImportedRecord) -> Result<Channel>;

/// One catalog row
pub struct TypeEntry {
    pub kind: ChannelType,
    pub description: &'static str,
    pub category: Category,
    pub default_units: &'static str,
    /// Absent for derived/internal-only kinds
    pub import: Option<ImportFn>,
}

impl TypeEntry {
    pub fn is_importable(&self) -> bool {
        self.import.is_some()
    }
}

fn import_waveform(entry: &TypeEntry, record: ImportedRecord) -> Result<Channel> {
    let sample_rate = record.sample_rate.ok_or_else(|| {
        Error::InvalidInput(format!("importing '{}' requires a sample rate", entry.kind))
    })?;
    let units = record
        .units
        .unwrap_or_else(|| entry.default_units.to_string());
    Channel::waveform(entry.kind.clone(), record.data, sample_rate, units)
}

fn import_events(entry: &TypeEntry, record: ImportedRecord) -> Result<Channel> {
    let units = record
        .units
        .unwrap_or_else(|| entry.default_units.to_string());
    Channel::events(entry.kind.clone(), record.data, record.marker_info, units)
}

static GLOBAL: Lazy<Registry> = Lazy::new(Registry::new);

/// Immutable catalog of recognized channel kinds
pub struct Registry {
    entries: Vec<TypeEntry>,
}

impl Registry {
    /// Build the catalog
    pub fn new() -> Self {
        let entries = vec![
            TypeEntry {
                kind: ChannelType::SkinConductance,
                description: "skin conductance",
                category: Category::Waveform,
                default_units: "µS",
                import: Some(import_waveform),
            },
            TypeEntry {
                kind: ChannelType::HeartPeriod,
                description: "interbeat interval",
                category: Category::Waveform,
                default_units: "ms",
                import: Some(import_waveform),
            },
            TypeEntry {
                kind: ChannelType::HeartRate,
                description: "heart rate",
                category: Category::Waveform,
                default_units: "bpm",
                import: Some(import_waveform),
            },
            TypeEntry {
                kind: ChannelType::HeartBeat,
                description: "heart beat onsets",
                category: Category::Events,
                default_units: "events",
                import: Some(import_events),
            },
            TypeEntry {
                kind: ChannelType::Respiration,
                description: "respiration trace",
                category: Category::Waveform,
                default_units: "mV",
                import: Some(import_waveform),
            },
            TypeEntry {
                kind: ChannelType::PupilLeft,
                description: "left pupil diameter",
                category: Category::Waveform,
                default_units: "mm",
                import: Some(import_waveform),
            },
            TypeEntry {
                kind: ChannelType::PupilRight,
                description: "right pupil diameter",
                category: Category::Waveform,
                default_units: "mm",
                import: Some(import_waveform),
            },
            TypeEntry {
                kind: ChannelType::GazeX,
                description: "horizontal gaze position",
                category: Category::Waveform,
                default_units: "mm",
                import: Some(import_waveform),
            },
            TypeEntry {
                kind: ChannelType::GazeY,
                description: "vertical gaze position",
                category: Category::Waveform,
                default_units: "mm",
                import: Some(import_waveform),
            },
            TypeEntry {
                kind: ChannelType::Emg,
                description: "surface EMG",
                category: Category::Waveform,
                default_units: "mV",
                import: Some(import_waveform),
            },
            TypeEntry {
                kind: ChannelType::EmgProcessed,
                description: "preprocessed EMG envelope",
                category: Category::Waveform,
                default_units: "mV",
                import: None,
            },
            TypeEntry {
                kind: ChannelType::Marker,
                description: "experiment markers",
                category: Category::Events,
                default_units: "events",
                import: Some(import_events),
            },
        ];
        Self { entries }
    }

    /// Process-wide catalog, built once
    pub fn global() -> &'static Registry {
        &GLOBAL
    }

    /// Case-insensitive lookup by type tag
    pub fn lookup(&self, tag: &str) -> Result<&TypeEntry> {
        let kind = ChannelType::from_tag(tag);
        self.entries
            .iter()
            .find(|e| e.kind == kind)
            .ok_or_else(|| Error::NotFound(format!("channel type '{}'", tag)))
    }

    /// Catalog row for a known kind
    pub fn entry(&self, kind: &ChannelType) -> Option<&TypeEntry> {
        self.entries.iter().find(|e| &e.kind == kind)
    }

    /// Tags of every kind carrying an import hook
    pub fn importable_types(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| e.is_importable())
            .map(|e| e.kind.tag().to_string())
            .collect()
    }

    /// Whether the tagged kind is a waveform kind
    pub fn is_waveform(&self, tag: &str) -> Result<bool> {
        Ok(self.lookup(tag)?.category == Category::Waveform)
    }

    pub fn entries(&self) -> &[TypeEntry] {
        &self.entries
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
