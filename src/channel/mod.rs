// src/channel/mod.rs
//! Canonical channel representation
//!
//! A [`Channel`] is one physiological (or auxiliary) signal stream in the
//! uniform shape every vendor importer must produce and every preprocessing
//! operator consumes: a typed header plus either a uniformly sampled waveform
//! or a sparse series of event timestamps.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Semantic category of a channel, fixed at creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Uniformly sampled continuous signal
    Waveform,
    /// Sparse timestamp series, optionally with per-event value/label
    Events,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Waveform => write!(f, "waveform"),
            Category::Events => write!(f, "events"),
        }
    }
}

/// Recognized channel kinds
///
/// The closed set of modalities plus an escape hatch for site-specific
/// auxiliary signals. The registry holds one catalog row per variant; adding
/// a kind means adding a variant and its row, nothing else.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChannelType {
    SkinConductance,
    HeartPeriod,
    HeartRate,
    /// Heart beat event onsets (events category)
    HeartBeat,
    Respiration,
    PupilLeft,
    PupilRight,
    GazeX,
    GazeY,
    Emg,
    /// Preprocessed EMG envelope, derived only, never imported
    EmgProcessed,
    /// Experiment markers (events category)
    Marker,
    Custom(String),
}

impl ChannelType {
    /// Canonical lower-case tag
    pub fn tag(&self) -> &str {
        match self {
            ChannelType::SkinConductance => "scr",
            ChannelType::HeartPeriod => "hp",
            ChannelType::HeartRate => "hr",
            ChannelType::HeartBeat => "hb",
            ChannelType::Respiration => "resp",
            ChannelType::PupilLeft => "pupil_l",
            ChannelType::PupilRight => "pupil_r",
            ChannelType::GazeX => "gaze_x",
            ChannelType::GazeY => "gaze_y",
            ChannelType::Emg => "emg",
            ChannelType::EmgProcessed => "emg_proc",
            ChannelType::Marker => "marker",
            ChannelType::Custom(tag) => tag,
        }
    }

    /// Parse a tag, case-insensitively; unknown tags become [`ChannelType::Custom`]
    pub fn from_tag(tag: &str) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "scr" => ChannelType::SkinConductance,
            "hp" => ChannelType::HeartPeriod,
            "hr" => ChannelType::HeartRate,
            "hb" => ChannelType::HeartBeat,
            "resp" => ChannelType::Respiration,
            "pupil_l" => ChannelType::PupilLeft,
            "pupil_r" => ChannelType::PupilRight,
            "gaze_x" => ChannelType::GazeX,
            "gaze_y" => ChannelType::GazeY,
            "emg" => ChannelType::Emg,
            "emg_proc" => ChannelType::EmgProcessed,
            "marker" => ChannelType::Marker,
            other => ChannelType::Custom(other.to_string()),
        }
    }
}

impl std::fmt::Display for ChannelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

impl Serialize for ChannelType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.tag())
    }
}

impl<'de> Deserialize<'de> for ChannelType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(ChannelType::from_tag(&tag))
    }
}

/// Per-event auxiliary labels and values, parallel to the timestamp vector
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarkerInfo {
    pub names: Vec<String>,
    pub values: Vec<f64>,
}

/// Channel payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "lowercase")]
pub enum ChannelData {
    Waveform {
        /// Samples at fixed rate; missing values are NaN
        #[serde(with = "nan_safe")]
        samples: Vec<f64>,
        /// Samples per second, always positive
        sample_rate: f64,
    },
    Events {
        /// Event onsets in seconds from session start
        timestamps: Vec<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        info: Option<MarkerInfo>,
    },
}

/// One typed signal stream in canonical shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub kind: ChannelType,
    pub units: String,
    pub data: ChannelData,
}

impl Channel {
    /// Create a waveform channel
    pub fn waveform(
        kind: ChannelType,
        samples: Vec<f64>,
        sample_rate: f64,
        units: impl Into<String>,
    ) -> Result<Self> {
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "sample rate must be positive, got {}",
                sample_rate
            )));
        }
        Ok(Self {
            kind,
            units: units.into(),
            data: ChannelData::Waveform { samples, sample_rate },
        })
    }

    /// Create an events channel from second timestamps
    pub fn events(
        kind: ChannelType,
        timestamps: Vec<f64>,
        info: Option<MarkerInfo>,
        units: impl Into<String>,
    ) -> Result<Self> {
        if let Some(ref info) = info {
            if !info.names.is_empty() && info.names.len() != timestamps.len() {
                return Err(Error::InvalidInput(format!(
                    "marker names length {} does not match {} timestamps",
                    info.names.len(),
                    timestamps.len()
                )));
            }
            if !info.values.is_empty() && info.values.len() != timestamps.len() {
                return Err(Error::InvalidInput(format!(
                    "marker values length {} does not match {} timestamps",
                    info.values.len(),
                    timestamps.len()
                )));
            }
        }
        Ok(Self {
            kind,
            units: units.into(),
            data: ChannelData::Events { timestamps, info },
        })
    }

    pub fn category(&self) -> Category {
        match self.data {
            ChannelData::Waveform { .. } => Category::Waveform,
            ChannelData::Events { .. } => Category::Events,
        }
    }

    /// Sample rate for waveform channels; events channels carry literal
    /// timestamps instead and return `None`
    pub fn sample_rate(&self) -> Option<f64> {
        match self.data {
            ChannelData::Waveform { sample_rate, .. } => Some(sample_rate),
            ChannelData::Events { .. } => None,
        }
    }

    /// Number of samples or events
    pub fn len(&self) -> usize {
        match &self.data {
            ChannelData::Waveform { samples, .. } => samples.len(),
            ChannelData::Events { timestamps, .. } => timestamps.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Recording span covered by this channel, in seconds
    pub fn duration_s(&self) -> f64 {
        match &self.data {
            ChannelData::Waveform { samples, sample_rate } => samples.len() as f64 / sample_rate,
            ChannelData::Events { timestamps, .. } => timestamps.last().copied().unwrap_or(0.0),
        }
    }

    /// Borrow waveform samples, or fail for events channels
    pub fn waveform_samples(&self, operation: &'static str) -> Result<&[f64]> {
        self.waveform_parts(operation).map(|(samples, _)| samples)
    }

    /// Borrow waveform samples together with the sample rate
    pub fn waveform_parts(&self, operation: &'static str) -> Result<(&[f64], f64)> {
        match &self.data {
            ChannelData::Waveform { samples, sample_rate } => Ok((samples, *sample_rate)),
            ChannelData::Events { .. } => Err(Error::UnsupportedChannelCategory {
                operation,
                required: Category::Waveform,
                actual: Category::Events,
            }),
        }
    }
}

/// JSON has no NaN literal; missing samples round-trip as null
mod nan_safe {
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(samples: &[f64], serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(samples.len()))?;
        for v in samples {
            if v.is_nan() {
                seq.serialize_element(&None::<f64>)?;
            } else {
                seq.serialize_element(&Some(*v))?;
            }
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f64>, D::Error> {
        let values: Vec<Option<f64>> = Deserialize::deserialize(deserializer)?;
        Ok(values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_round_trip() {
        for kind in [
            ChannelType::SkinConductance,
            ChannelType::HeartPeriod,
            ChannelType::HeartBeat,
            ChannelType::PupilLeft,
            ChannelType::EmgProcessed,
            ChannelType::Marker,
        ] {
            assert_eq!(ChannelType::from_tag(kind.tag()), kind);
        }
    }

    #[test]
    fn test_tag_parse_case_insensitive() {
        assert_eq!(ChannelType::from_tag("SCR"), ChannelType::SkinConductance);
        assert_eq!(ChannelType::from_tag("Marker"), ChannelType::Marker);
    }

    #[test]
    fn test_unknown_tag_is_custom() {
        match ChannelType::from_tag("temp_probe") {
            ChannelType::Custom(tag) => assert_eq!(tag, "temp_probe"),
            other => panic!("expected custom type, got {:?}", other),
        }
    }

    #[test]
    fn test_waveform_rejects_bad_rate() {
        assert!(Channel::waveform(ChannelType::SkinConductance, vec![0.0], 0.0, "µS").is_err());
        assert!(Channel::waveform(ChannelType::SkinConductance, vec![0.0], -10.0, "µS").is_err());
        assert!(Channel::waveform(ChannelType::SkinConductance, vec![0.0], f64::NAN, "µS").is_err());
    }

    #[test]
    fn test_events_rejects_mismatched_info() {
        let info = MarkerInfo {
            names: vec!["a".to_string()],
            values: vec![],
        };
        let result = Channel::events(ChannelType::Marker, vec![0.5, 1.0], Some(info), "events");
        assert!(result.is_err());
    }

    #[test]
    fn test_duration() {
        let wave = Channel::waveform(ChannelType::SkinConductance, vec![0.0; 200], 100.0, "µS").unwrap();
        assert!((wave.duration_s() - 2.0).abs() < 1e-12);

        let ev = Channel::events(ChannelType::Marker, vec![0.5, 3.25], None, "events").unwrap();
        assert!((ev.duration_s() - 3.25).abs() < 1e-12);
    }

    #[test]
    fn test_nan_samples_survive_json() {
        let chan = Channel::waveform(
            ChannelType::SkinConductance,
            vec![1.0, f64::NAN, 3.0],
            100.0,
            "µS",
        )
        .unwrap();
        let json = serde_json::to_string(&chan).unwrap();
        assert!(json.contains("null"));

        let back: Channel = serde_json::from_str(&json).unwrap();
        match back.data {
            ChannelData::Waveform { samples, .. } => {
                assert_eq!(samples.len(), 3);
                assert!(samples[1].is_nan());
                assert_eq!(samples[2], 3.0);
            }
            _ => panic!("expected waveform"),
        }
    }

    #[test]
    fn test_waveform_samples_rejects_events() {
        let ev = Channel::events(ChannelType::Marker, vec![1.0], None, "events").unwrap();
        match ev.waveform_samples("test op") {
            Err(Error::UnsupportedChannelCategory { operation, .. }) => {
                assert_eq!(operation, "test op");
            }
            other => panic!("expected category error, got {:?}", other),
        }
    }
}
