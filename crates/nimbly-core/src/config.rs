//! Parser and assessor configuration
//!
//! Config is loaded with a two-layer resolution:
//! 1. An explicit path, or the override in the config dir
//!    (~/.config/nimbly/config.toml)
//! 2. Embedded defaults (compiled into binary)
//!
//! Insight minimum-data gates are deliberately absent here; they are named
//! constants in `insights`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

/// Parser tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParserConfig {
    /// Non-empty lines from the top searched for the store name
    pub store_scan_lines: usize,
    /// Retailer names recognized in addition to the built-in chain list
    pub extra_chains: Vec<String>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            store_scan_lines: 5,
            extra_chains: Vec::new(),
        }
    }
}

/// Confidence assessor tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssessmentConfig {
    pub store_weight: f64,
    pub date_weight: f64,
    pub total_weight: f64,
    pub line_items_weight: f64,
    /// Minimum overall confidence for SUCCESS
    pub success_threshold: f64,
    /// Per-field confidence below this is reported as an issue
    pub low_field_confidence: f64,
}

impl Default for AssessmentConfig {
    fn default() -> Self {
        Self {
            store_weight: 0.20,
            date_weight: 0.20,
            total_weight: 0.35,
            line_items_weight: 0.25,
            success_threshold: 0.80,
            low_field_confidence: 0.70,
        }
    }
}

impl AssessmentConfig {
    fn weight_sum(&self) -> f64 {
        self.store_weight + self.date_weight + self.total_weight + self.line_items_weight
    }
}

/// Top-level configuration
///
/// Missing sections and keys keep their defaults; unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NimblyConfig {
    pub parser: ParserConfig,
    pub assessment: AssessmentConfig,
}

impl NimblyConfig {
    /// Load configuration (explicit path, then override file, then embedded defaults)
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }

        match default_config_path() {
            Some(default_path) if default_path.exists() => Self::from_file(&default_path),
            _ => Self::from_toml(DEFAULT_CONFIG),
        }
    }

    /// Load from a specific file; a missing file is an error
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "Loading config");
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    /// Parse config from TOML content, filling missing keys with defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would break the assessor's guarantees
    ///
    /// Negative weights would let a better signal lower the overall score.
    pub fn validate(&self) -> Result<()> {
        let a = &self.assessment;
        let weights = [
            ("store_weight", a.store_weight),
            ("date_weight", a.date_weight),
            ("total_weight", a.total_weight),
            ("line_items_weight", a.line_items_weight),
        ];
        for (name, value) in weights {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::Config(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        if a.weight_sum() <= 0.0 {
            return Err(Error::Config("assessment weights sum to zero".into()));
        }
        for (name, value) in [
            ("success_threshold", a.success_threshold),
            ("low_field_confidence", a.low_field_confidence),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(Error::Config(format!(
                    "{} must be in (0, 1], got {}",
                    name, value
                )));
            }
        }
        if self.parser.store_scan_lines == 0 {
            return Err(Error::Config("store_scan_lines must be at least 1".into()));
        }
        Ok(())
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("nimbly").join("config.toml"))
}
