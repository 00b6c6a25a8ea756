//! Configuration module for joinwise.
//!
//! Handles the TOML settings file and its discovery.

mod settings;

pub use settings::{InferenceSettings, PlannerSettings, Settings, SettingsError, CONFIG_ENV};
