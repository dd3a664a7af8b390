use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::core::history::RetentionPolicy;

const APP_DIR: &str = "devex";
const DATABASE_FILE: &str = "devex_metrics.db";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Seconds between metric samples
    pub collect_interval_secs: u64,
    /// Seconds between process cache refreshes
    pub process_refresh_secs: u64,
    pub max_processes: usize,
    pub retention_minutes: u64,
    pub prune_interval_minutes: u64,
    /// Upper bound for every external tool invocation
    pub command_timeout_secs: u64,
    /// Overrides the default database location
    pub database_path: Option<String>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            collect_interval_secs: 10,
            process_refresh_secs: 30,
            max_processes: 300,
            retention_minutes: 60,
            prune_interval_minutes: 15,
            command_timeout_secs: 5,
            database_path: None,
        }
    }
}

impl TelemetryConfig {
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let data = fs::read(&config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        // An empty or unreadable file falls back to defaults
        if data.is_empty() {
            return Ok(Self::default());
        }

        Ok(serde_json::from_slice(&data).unwrap_or_else(|e| {
            log::warn!("Ignoring corrupt config {:?}: {}", config_path, e);
            Self::default()
        }))
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let data = serde_json::to_vec_pretty(self).context("Failed to serialize config")?;

        fs::write(&config_path, data)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir =
            dirs::config_dir().with_context(|| "Could not determine config directory")?;

        Ok(config_dir.join(APP_DIR).join("config.json"))
    }

    /// Configured database path, or `<data dir>/devex/devex_metrics.db`
    pub fn database_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.database_path {
            return Ok(PathBuf::from(path));
        }

        let data_dir = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .with_context(|| "Could not determine data directory")?;

        Ok(data_dir.join(APP_DIR).join(DATABASE_FILE))
    }

    pub fn collect_interval(&self) -> Duration {
        Duration::from_secs(self.collect_interval_secs.max(1))
    }

    pub fn process_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.process_refresh_secs.max(1))
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs.max(1))
    }

    pub fn retention_policy(&self) -> RetentionPolicy {
        RetentionPolicy {
            retention: Duration::from_secs(self.retention_minutes.saturating_mul(60)),
            prune_interval: Duration::from_secs(
                self.prune_interval_minutes.max(1).saturating_mul(60),
            ),
        }
    }

    /// Set one field from its textual form, as used by `devex config set`.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        fn number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
            value
                .trim()
                .parse::<T>()
                .ok()
                .with_context(|| format!("Invalid value for {}: {:?}", key, value))
        }

        match key {
            "collect_interval_secs" => self.collect_interval_secs = number(key, value)?,
            "process_refresh_secs" => self.process_refresh_secs = number(key, value)?,
            "max_processes" => self.max_processes = number(key, value)?,
            "retention_minutes" => self.retention_minutes = number(key, value)?,
            "prune_interval_minutes" => self.prune_interval_minutes = number(key, value)?,
            "command_timeout_secs" => self.command_timeout_secs = number(key, value)?,
            "database_path" => {
                let value = value.trim();
                self.database_path = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                };
            }
            other => bail!("Unknown config key: {}", other),
        }

        Ok(())
    }
}
