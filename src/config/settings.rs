//! TOML-based configuration for joinwise.
//!
//! Every key is optional; missing keys take the built-in defaults.
//!
//! Example configuration:
//! ```toml
//! [inference]
//! key_uniqueness_min = 0.99
//! key_completeness_min = 0.95
//! max_composite_arity = 3
//! max_composite_columns = 12
//! min_containment = 0.9
//! ambiguity_penalty = 0.05
//! many_to_many_factor = 0.5
//!
//! [planner]
//! join_kind = "left"   # or "inner"
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::semantic::inference::{thresholds, InferenceConfig};
use crate::semantic::planner::{JoinKind, PlannerConfig};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "JOINWISE_CONFIG";

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub inference: InferenceSettings,
    pub planner: PlannerSettings,
}

/// Key and link thresholds.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct InferenceSettings {
    /// Minimum uniqueness for a single-column key (0.0 to 1.0).
    pub key_uniqueness_min: f64,

    /// Minimum completeness for any key (0.0 to 1.0).
    pub key_completeness_min: f64,

    /// Largest composite key arity; 1 disables composite keys.
    pub max_composite_arity: usize,

    pub max_composite_columns: usize,

    /// Minimum containment for a link (0.0 to 1.0).
    pub min_containment: f64,

    pub ambiguity_penalty: f64,

    pub many_to_many_factor: f64,
}

impl Default for InferenceSettings {
    fn default() -> Self {
        Self {
            key_uniqueness_min: thresholds::key::UNIQUENESS_MIN,
            key_completeness_min: thresholds::key::COMPLETENESS_MIN,
            max_composite_arity: thresholds::key::MAX_COMPOSITE_ARITY,
            max_composite_columns: thresholds::key::MAX_COMPOSITE_COLUMNS,
            min_containment: thresholds::link::MIN_CONTAINMENT,
            ambiguity_penalty: thresholds::link::AMBIGUITY_PENALTY,
            many_to_many_factor: thresholds::link::MANY_TO_MANY_FACTOR,
        }
    }
}

/// Planner settings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PlannerSettings {
    /// Join type for every join step.
    pub join_kind: JoinKind,
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate settings from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `JOINWISE_CONFIG`
    /// 2. `./joinwise.toml`
    /// 3. `~/.config/joinwise/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var(CONFIG_ENV) {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("joinwise.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("joinwise").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    /// Reject out-of-range thresholds.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let inference = &self.inference;
        let ratios = [
            ("key_uniqueness_min", inference.key_uniqueness_min),
            ("key_completeness_min", inference.key_completeness_min),
            ("min_containment", inference.min_containment),
            ("ambiguity_penalty", inference.ambiguity_penalty),
            ("many_to_many_factor", inference.many_to_many_factor),
        ];
        for (name, value) in ratios {
            if !(0.0..=1.0).contains(&value) {
                return Err(SettingsError::InvalidConfig(format!(
                    "inference.{} must be between 0 and 1, got {}",
                    name, value
                )));
            }
        }
        if inference.max_composite_arity == 0 {
            return Err(SettingsError::InvalidConfig(
                "inference.max_composite_arity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn inference_config(&self) -> InferenceConfig {
        let s = &self.inference;
        let mut config = InferenceConfig::default()
            .with_key_thresholds(s.key_uniqueness_min, s.key_completeness_min)
            .with_max_composite_arity(s.max_composite_arity)
            .with_min_containment(s.min_containment)
            .with_ambiguity_penalty(s.ambiguity_penalty)
            .with_many_to_many_factor(s.many_to_many_factor);
        config.max_composite_columns = s.max_composite_columns;
        config
    }

    pub fn planner_config(&self) -> PlannerConfig {
        PlannerConfig::default().with_join_kind(self.planner.join_kind)
    }
}
