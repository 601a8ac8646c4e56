//! Configuration loading from TOML files
//!
//! Config file is selected via the `--config` command line argument
//! (default: config/dev.toml). Every section except the API credential has
//! working defaults.

use anyhow::Context;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Carrier API credential, sent as the `DHL-API-Key` header
    pub key: String,
    #[serde(default = "default_api_url")]
    pub url: String,
    /// Bounded per-request timeout
    #[serde(default = "default_api_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_url() -> String {
    "https://api-eu.dhl.com/track/shipments".to_string()
}

fn default_api_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackingConfig {
    /// Path of the JSON registrations document
    #[serde(default = "default_registrations_file")]
    pub registrations_file: String,
    /// Poll cadence; refresh never runs more often than this per package
    #[serde(default = "default_scan_interval_mins")]
    pub scan_interval_mins: u64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            registrations_file: default_registrations_file(),
            scan_interval_mins: default_scan_interval_mins(),
        }
    }
}

fn default_registrations_file() -> String {
    "dhl_tracking.json".to_string()
}

fn default_scan_interval_mins() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommandsConfig {
    #[serde(default = "default_commands_enabled")]
    pub enabled: bool,
    #[serde(default = "default_commands_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_commands_port")]
    pub port: u16,
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            enabled: default_commands_enabled(),
            bind_address: default_commands_bind_address(),
            port: default_commands_port(),
        }
    }
}

fn default_commands_enabled() -> bool {
    true
}

fn default_commands_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_commands_port() -> u16 {
    25840
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_interval_secs")]
    pub interval_secs: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { interval_secs: default_metrics_interval_secs() }
    }
}

fn default_metrics_interval_secs() -> u64 {
    60
}

#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    pub api: ApiConfig,
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub commands: CommandsConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Main configuration struct used throughout the application
#[derive(Debug, Clone)]
pub struct Config {
    api_key: String,
    api_url: String,
    api_timeout_secs: u64,
    registrations_file: String,
    scan_interval_mins: u64,
    commands_enabled: bool,
    commands_bind_address: String,
    commands_port: u16,
    metrics_interval_secs: u64,
    config_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_url: default_api_url(),
            api_timeout_secs: default_api_timeout_secs(),
            registrations_file: default_registrations_file(),
            scan_interval_mins: default_scan_interval_mins(),
            commands_enabled: default_commands_enabled(),
            commands_bind_address: default_commands_bind_address(),
            commands_port: default_commands_port(),
            metrics_interval_secs: default_metrics_interval_secs(),
            config_file: "default".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let toml_config: TomlConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(Self {
            api_key: toml_config.api.key,
            api_url: toml_config.api.url,
            api_timeout_secs: toml_config.api.timeout_secs,
            registrations_file: toml_config.tracking.registrations_file,
            scan_interval_mins: toml_config.tracking.scan_interval_mins,
            commands_enabled: toml_config.commands.enabled,
            commands_bind_address: toml_config.commands.bind_address,
            commands_port: toml_config.commands.port,
            metrics_interval_secs: toml_config.metrics.interval_secs,
            config_file: path.display().to_string(),
        })
    }

    /// Load configuration - tries the TOML file first, falls back to defaults
    pub fn load_from_path(path: &str) -> Self {
        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Warning: {:#}. Using defaults.", e);
                Self::default()
            }
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn api_timeout_secs(&self) -> u64 {
        self.api_timeout_secs
    }

    pub fn registrations_file(&self) -> &str {
        &self.registrations_file
    }

    pub fn scan_interval_mins(&self) -> u64 {
        self.scan_interval_mins
    }

    /// Poll cadence, floored at one minute (a zero interval cannot tick)
    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_mins.max(1) * 60)
    }

    pub fn commands_enabled(&self) -> bool {
        self.commands_enabled
    }

    pub fn commands_bind_address(&self) -> &str {
        &self.commands_bind_address
    }

    pub fn commands_port(&self) -> u16 {
        self.commands_port
    }

    pub fn metrics_interval_secs(&self) -> u64 {
        self.metrics_interval_secs.max(1)
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }
}
