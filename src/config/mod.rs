//! Configuration management

use anyhow::{bail, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 8088;
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,

    /// Base URL of the device REST backend.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Seconds without user activity before device data is refetched.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_refresh_interval() -> u64 {
    60
}

fn default_request_timeout() -> u64 {
    10
}

impl Config {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Get config directory (XDG_CONFIG_HOME or platform default)
pub fn get_config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("HDD_CONFIG_DIR") {
        return PathBuf::from(dir);
    }

    #[cfg(target_os = "macos")]
    {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join("Library/Application Support/home-device-dashboard");
        }
    }

    #[cfg(target_os = "linux")]
    {
        if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join("home-device-dashboard");
        }
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(".config/home-device-dashboard");
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Ok(appdata) = std::env::var("APPDATA") {
            return PathBuf::from(appdata).join("home-device-dashboard");
        }
    }

    PathBuf::from(".")
}

pub fn load_config() -> Result<Config> {
    let config_dir = get_config_dir();

    let mut builder = ::config::Config::builder()
        .set_default("port", DEFAULT_PORT as i64)?
        .set_default("api_url", DEFAULT_API_URL)?
        .set_default("refresh_interval_secs", default_refresh_interval() as i64)?
        .set_default("request_timeout_secs", default_request_timeout() as i64)?
        // config.toml / config.json / config.yaml, whichever exists
        .add_source(
            ::config::File::with_name(&config_dir.join("config").to_string_lossy()).required(false),
        )
        // HDD_PORT, HDD_API_URL, HDD_REFRESH_INTERVAL_SECS, ...
        .add_source(
            ::config::Environment::with_prefix("HDD")
                .separator("__")
                .try_parsing(true),
        );

    // Precedence: HDD_PORT > PORT > config file > default
    if let Ok(port) = std::env::var("HDD_PORT") {
        if let Ok(port_num) = port.parse::<u16>() {
            builder = builder.set_override("port", port_num as i64)?;
        }
    } else if let Ok(port) = std::env::var("PORT") {
        if let Ok(port_num) = port.parse::<u16>() {
            builder = builder.set_override("port", port_num as i64)?;
        }
    }

    // Precedence: HDD_API_URL > API_URL > VITE_API_URL > config file > default
    if std::env::var("HDD_API_URL").is_err() {
        let legacy = std::env::var("API_URL").or_else(|_| std::env::var("VITE_API_URL"));
        if let Ok(url) = legacy {
            if !url.trim().is_empty() {
                builder = builder.set_override("api_url", url.trim())?;
            }
        }
    }

    let config: Config = builder.build()?.try_deserialize()?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    let url = url::Url::parse(&config.api_url)
        .map_err(|e| anyhow::anyhow!("Invalid api_url {:?}: {}", config.api_url, e))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("api_url must be http or https, got {}", url.scheme());
    }
    if config.request_timeout_secs == 0 {
        bail!("request_timeout_secs must be greater than zero");
    }
    Ok(())
}
