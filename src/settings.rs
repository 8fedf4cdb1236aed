use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

pub const CONFIG_ENV_VAR: &str = "PAGEPULSE_CONFIG";
pub const DEBUG_ENV_VAR: &str = "PAGEPULSE_DEBUG";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServiceSettings {
    pub allocation_timeout_ms: u64,
    pub session_idle_ttl_secs: u64,
    pub sweep_interval_secs: u64,
    /// Used when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            allocation_timeout_ms: 5_000,
            session_idle_ttl_secs: 30 * 60,
            sweep_interval_secs: 60,
            log_level: "info".into(),
        }
    }
}

impl ServiceSettings {
    /// Reads settings from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Malformed settings in {}", path.display()))
    }

    /// Loads from `PAGEPULSE_CONFIG` when set, then applies the debug toggle.
    pub fn from_env() -> Result<Self> {
        let mut settings = match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Self::load(&PathBuf::from(path))?,
            None => Self::default(),
        };

        let debug_mode = std::env::var(DEBUG_ENV_VAR)
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        if debug_mode {
            settings.sweep_interval_secs = 1;
        }

        Ok(settings)
    }

    pub fn allocation_timeout(&self) -> Duration {
        Duration::from_millis(self.allocation_timeout_ms)
    }

    pub fn session_idle_ttl(&self) -> Duration {
        Duration::from_secs(self.session_idle_ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }

    pub fn log_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }
}
