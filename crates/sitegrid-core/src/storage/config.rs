//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Default timeline window and filter policy
//! - Terminal chart rendering options
//! - Priority colours
//!
//! Configuration is stored at `<data_dir>/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;
use crate::timeline::{OverlapPolicy, Priority, WindowDuration};

/// Timeline defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineConfig {
    #[serde(default)]
    pub default_duration_days: WindowDuration,
    #[serde(default = "default_true")]
    pub week_starts_monday: bool,
    #[serde(default)]
    pub overlap_policy: OverlapPolicy,
}

/// Terminal chart configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    #[serde(default = "default_chart_width")]
    pub chart_width: u32,
    #[serde(default = "default_label_width")]
    pub label_width: u32,
    #[serde(default = "default_true")]
    pub color: bool,
    #[serde(default = "default_true")]
    pub show_weekends: bool,
}

/// Hex colour per priority.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriorityColors {
    #[serde(default = "default_low_color")]
    pub low: String,
    #[serde(default = "default_medium_color")]
    pub medium: String,
    #[serde(default = "default_high_color")]
    pub high: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timeline: TimelineConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub priority_colors: PriorityColors,
}

// Default functions
fn default_true() -> bool {
    true
}
fn default_chart_width() -> u32 {
    60
}
fn default_label_width() -> u32 {
    24
}
fn default_low_color() -> String {
    "#22c55e".into()
}
fn default_medium_color() -> String {
    "#f59e0b".into()
}
fn default_high_color() -> String {
    "#ef4444".into()
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            default_duration_days: WindowDuration::default(),
            week_starts_monday: true,
            overlap_policy: OverlapPolicy::default(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            chart_width: default_chart_width(),
            label_width: default_label_width(),
            color: true,
            show_weekends: true,
        }
    }
}

impl Default for PriorityColors {
    fn default() -> Self {
        Self {
            low: default_low_color(),
            medium: default_medium_color(),
            high: default_high_color(),
        }
    }
}

impl PriorityColors {
    pub fn for_priority(&self, priority: Priority) -> &str {
        match priority {
            Priority::Low => &self.low,
            Priority::Medium => &self.medium,
            Priority::High => &self.high,
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as bool")))?,
                    ),
                    serde_json::Value::Number(_) => value
                        .parse::<u64>()
                        .map(|n| serde_json::Value::Number(n.into()))
                        .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?,
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the data directory, writing defaults if no file exists yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to the data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        tracing::debug!(path = %path.display(), "config saved");
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Update a value in memory by dot-separated key.
    ///
    /// The whole config is re-validated, so e.g. an unsupported window
    /// duration is rejected here rather than on the next load.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not fit.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Set a value by key and persist.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.apply(key, value)?;
        self.save()
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "falling back to default config");
            Self::default()
        })
    }
}
