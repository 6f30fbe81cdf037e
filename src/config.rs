use anyhow::{Context, Result};
use chrono_tz::Tz;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Shell configuration from ~/.config/calsh/config.toml. Every key is optional.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Provider binary suffix (`calsh-provider-{provider}`)
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Account the provider authenticated as (e.g. a Google email)
    #[serde(default)]
    pub account: Option<String>,

    /// Calendar to browse
    #[serde(default = "default_calendar_id")]
    pub calendar_id: String,

    /// IANA zone name used for "today", listing windows and display
    #[serde(default)]
    pub timezone: Option<String>,

    #[serde(default = "default_provider_timeout_secs")]
    pub provider_timeout_secs: u64,
}

fn default_provider() -> String {
    "google".to_string()
}

fn default_calendar_id() -> String {
    // Google's alias for the user's main calendar
    "primary".to_string()
}

fn default_provider_timeout_secs() -> u64 {
    10
}

impl Default for Config {
    fn default() -> Self {
        Config {
            provider: default_provider(),
            account: None,
            calendar_id: default_calendar_id(),
            timezone: None,
            provider_timeout_secs: default_provider_timeout_secs(),
        }
    }
}

impl Config {
    /// The reference timezone: the configured one, else the system's, else UTC.
    pub fn timezone(&self) -> Result<Tz> {
        if let Some(name) = &self.timezone {
            return name
                .parse::<Tz>()
                .map_err(|e| anyhow::anyhow!("Unknown timezone '{}' in config: {}", name, e));
        }

        match iana_time_zone::get_timezone() {
            Ok(name) => Ok(name.parse::<Tz>().unwrap_or_else(|_| {
                log::warn!("System timezone '{}' is not known, using UTC", name);
                Tz::UTC
            })),
            Err(e) => {
                log::warn!("Could not determine system timezone ({}), using UTC", e);
                Ok(Tz::UTC)
            }
        }
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }
}

/// Get the config directory path (~/.config/calsh)
pub fn config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .context("Could not determine config directory")?
        .join("calsh");
    Ok(config_dir)
}

/// Get the config file path (~/.config/calsh/config.toml)
pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Load config from ~/.config/calsh/config.toml, or defaults if there is none.
pub fn load_config() -> Result<Config> {
    load_config_from(&config_path()?)
}

pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        log::debug!("No config at {}, using defaults", path.display());
        return Ok(Config::default());
    }

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file at {}", path.display()))?;

    let config: Config = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file at {}", path.display()))?;

    Ok(config)
}
