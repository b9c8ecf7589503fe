use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Log level configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Administrative switch for the handler, mirrors a group policy rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PolicyState {
    #[default]
    NotConfigured,
    Enabled,
    Disabled,
}

/// Preview handler settings stored as JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Whether to write logs to file
    pub log_to_file: bool,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: LogLevel,
    /// Maximum number of log files to keep
    pub log_max_files: usize,
    /// Initial zoom level of the map
    pub map_zoom: u8,
    /// Administrative enable/disable state
    pub policy: PolicyState,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            log_to_file: true,
            log_level: LogLevel::Info,
            log_max_files: 5,
            map_zoom: 13,
            policy: PolicyState::NotConfigured,
        }
    }
}

impl PreviewConfig {
    /// Load configuration from the specified path, using defaults for missing fields
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!(target: "config", path = %path.display(), "Settings file not found, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).context("Failed to read settings file")?;

        let config: PreviewConfig =
            serde_json::from_str(&content).context("Failed to parse settings file")?;

        tracing::info!(target: "config", path = %path.display(), "Loaded settings from file");

        Ok(config)
    }

    /// Whether the policy switch turns the handler off
    pub fn is_disabled(&self) -> bool {
        self.policy == PolicyState::Disabled
    }
}
