use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::severity::Severity;

const DEFAULT_SERVICE_NAME: &str = "default_service";
const DEFAULT_METRICS_PORT: u16 = 9090;

// Configuration structures
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Lowest severity written to the low-priority stream
    pub level: Severity,
    /// Console encoding instead of Stackdriver JSON
    pub debug: bool,
    /// Reported as serviceContext.service on error events
    pub service_name: String,
    /// Let the trace propagation warnings through
    pub enable_ctxtrace_warns: bool,
    /// Attach error reporting metadata to records at error and above
    pub report_all_errors: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: Severity::Warn,
            debug: false,
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            enable_ctxtrace_warns: false,
            report_all_errors: true,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct MetricsConfig {
    /// Enable metrics endpoint
    pub enabled: bool,
    /// Port for metrics server
    pub port: u16,
    /// Listen address for metrics server
    pub listen_address: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        MetricsConfig {
            enabled: false,
            port: DEFAULT_METRICS_PORT,
            listen_address: "0.0.0.0".to_string(),
        }
    }
}

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config> {
    let mut config = Config::default();

    if path.exists() {
        info!("Loading configuration from file: {:?}", path);
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {:?}", path))?;
        config = parse_config(&content)?;
    } else {
        warn!("No config file found at {:?}, using defaults", path);
    }

    apply_env_overrides(config)
}

/// Parse a JSON or YAML document
pub fn parse_config(content: &str) -> Result<Config> {
    serde_json::from_str(content)
        .or_else(|_| serde_yaml::from_str(content))
        .context("Failed to parse configuration file")
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => anyhow::bail!("{} must be a boolean, got {:?}", name, value),
    }
}

/// Apply environment variable overrides to configuration
///
/// Invalid values are rejected instead of silently falling back, so a typo
/// in `LOG_LEVEL` stops the process before any logger exists.
pub fn apply_env_overrides(mut config: Config) -> Result<Config> {
    // Logging configuration overrides
    if let Ok(level) = std::env::var("LOG_LEVEL") {
        config.logging.level = level
            .parse()
            .with_context(|| format!("Invalid LOG_LEVEL: {:?}", level))?;
    }
    if let Ok(debug) = std::env::var("LOG_DEBUG") {
        config.logging.debug = parse_bool("LOG_DEBUG", &debug)?;
    }
    if let Ok(service_name) = std::env::var("LOG_SERVICE_NAME") {
        config.logging.service_name = service_name;
    }
    if let Ok(enabled) = std::env::var("LOG_ENABLE_CTXTRACE_WARNS") {
        config.logging.enable_ctxtrace_warns = parse_bool("LOG_ENABLE_CTXTRACE_WARNS", &enabled)?;
    }
    if let Ok(report) = std::env::var("LOG_REPORT_ALL_ERRORS") {
        config.logging.report_all_errors = parse_bool("LOG_REPORT_ALL_ERRORS", &report)?;
    }

    // Metrics configuration overrides
    if let Ok(metrics_enabled) = std::env::var("METRICS_ENABLED") {
        config.metrics.enabled = parse_bool("METRICS_ENABLED", &metrics_enabled)?;
    }
    if let Ok(metrics_port) = std::env::var("METRICS_PORT") {
        config.metrics.port = metrics_port
            .parse()
            .with_context(|| format!("Invalid METRICS_PORT: {:?}", metrics_port))?;
    }
    if let Ok(metrics_address) = std::env::var("METRICS_LISTEN_ADDRESS") {
        config.metrics.listen_address = metrics_address;
    }

    Ok(config)
}
