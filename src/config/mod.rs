// src/config/mod.rs
//! Process-wide toolbox configuration
//!
//! One immutable [`ToolboxConfig`] is constructed at startup (from defaults
//! or a TOML file), validated once, and passed by reference into the
//! components that need modality defaults. It is never mutated afterwards.

pub mod constants;

use crate::processing::interpolate::InterpolationMethod;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    #[error("configuration parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("configuration validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Complete toolbox configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ToolboxConfig {
    #[serde(default)]
    pub processing: ProcessingDefaults,
}

/// Modality-independent processing defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingDefaults {
    /// Mains interference frequency assumed by notch stages
    #[serde(default = "defaults::mains_frequency_hz")]
    pub mains_frequency_hz: f64,

    /// Butterworth order used when a spec leaves it unset
    #[serde(default = "defaults::filter_order")]
    pub filter_order: usize,

    /// Whether boundary extrapolation is considered requested behavior
    #[serde(default = "defaults::allow_extrapolation")]
    pub allow_extrapolation: bool,

    /// Gap-filling method used when none is named
    #[serde(default = "defaults::interpolation_method")]
    pub interpolation_method: InterpolationMethod,
}

impl Default for ProcessingDefaults {
    fn default() -> Self {
        Self {
            mains_frequency_hz: defaults::mains_frequency_hz(),
            filter_order: defaults::filter_order(),
            allow_extrapolation: defaults::allow_extrapolation(),
            interpolation_method: defaults::interpolation_method(),
        }
    }
}

/// Default value providers using constants
mod defaults {
    use super::constants::filters;
    use crate::processing::interpolate::InterpolationMethod;

    pub fn mains_frequency_hz() -> f64 {
        filters::POWERLINE_FREQ_50HZ
    }

    pub fn filter_order() -> usize {
        filters::DEFAULT_FILTER_ORDER
    }

    pub fn allow_extrapolation() -> bool {
        false
    }

    pub fn interpolation_method() -> InterpolationMethod {
        InterpolationMethod::Linear
    }
}

impl ToolboxConfig {
    /// Load and validate a TOML configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate a TOML document
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: ToolboxConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate once before use
    pub fn validate(&self) -> Result<(), ConfigError> {
        use crate::config::constants::filters::{MAX_FILTER_ORDER, MIN_FILTER_ORDER};

        let mut issues = Vec::new();
        let p = &self.processing;

        if !p.mains_frequency_hz.is_finite() || p.mains_frequency_hz <= 0.0 {
            issues.push(format!(
                "mains_frequency_hz must be positive, got {}",
                p.mains_frequency_hz
            ));
        }
        if p.filter_order < MIN_FILTER_ORDER || p.filter_order > MAX_FILTER_ORDER {
            issues.push(format!(
                "filter_order must be in {}..={}, got {}",
                MIN_FILTER_ORDER, MAX_FILTER_ORDER, p.filter_order
            ));
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(issues))
        }
    }
}
