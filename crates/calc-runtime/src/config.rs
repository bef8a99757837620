//! # Runtime Configuration
//!
//! One document for the whole process: bus, gateway and worker.
//!
//! ## Sources, in order
//!
//! 1. Built-in defaults
//! 2. JSON file named by `CALC_CONFIG_FILE` (missing keys keep defaults)
//! 3. Environment overrides (`CALC_HTTP_PORT`, `CALC_TIMEOUT_MS`, ...)
//!
//! A value that is present but cannot be parsed is an error, never ignored.

use calc_01_compute_worker::{RoundingRule, WorkerConfig};
use calc_02_gateway::GatewayConfig;
use serde::{Deserialize, Serialize};
use shared_bus::DEFAULT_CHANNEL_CAPACITY;
use std::env;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Names the optional JSON config file.
pub const CONFIG_FILE_ENV: &str = "CALC_CONFIG_FILE";

/// Complete runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Messages buffered per bus subscriber.
    pub bus_capacity: usize,
    pub gateway: GatewayConfig,
    pub worker: WorkerConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            bus_capacity: DEFAULT_CHANNEL_CAPACITY,
            gateway: GatewayConfig::default(),
            worker: WorkerConfig::default(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl RuntimeConfig {
    /// Load a JSON config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `CALC_*` overrides. Channel names apply to both sides of the bus.
    pub fn apply_overrides(
        &mut self,
        lookup: &impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(host) = parse_var(lookup, "CALC_HTTP_HOST")? {
            self.gateway.http.host = host;
        }
        if let Some(port) = parse_var(lookup, "CALC_HTTP_PORT")? {
            self.gateway.http.port = port;
        }
        if let Some(channel) = lookup("CALC_REQUEST_CHANNEL") {
            self.gateway.channels.request = channel.clone();
            self.worker.request_channel = channel;
        }
        if let Some(channel) = lookup("CALC_RESPONSE_CHANNEL") {
            self.gateway.channels.response = channel.clone();
            self.worker.response_channel = channel;
        }
        if let Some(millis) = parse_var::<u64>(lookup, "CALC_TIMEOUT_MS")? {
            self.gateway.request_timeout = Duration::from_millis(millis);
        }
        if let Some(scale) = parse_var(lookup, "CALC_MULTIPLICATION_SCALE")? {
            self.worker.arithmetic.multiplication.scale = scale;
        }
        if let Some(rule) = parse_var::<RoundingRule>(lookup, "CALC_MULTIPLICATION_ROUNDING")? {
            self.worker.arithmetic.multiplication.rounding = rule;
        }
        if let Some(scale) = parse_var(lookup, "CALC_DIVISION_SCALE")? {
            self.worker.arithmetic.division.scale = scale;
        }
        if let Some(rule) = parse_var::<RoundingRule>(lookup, "CALC_DIVISION_ROUNDING")? {
            self.worker.arithmetic.division.rounding = rule;
        }
        if let Some(concurrency) = parse_var(lookup, "CALC_WORKER_CONCURRENCY")? {
            self.worker.concurrency = concurrency;
        }
        if let Some(capacity) = parse_var(lookup, "CALC_BUS_CAPACITY")? {
            self.bus_capacity = capacity;
        }
        Ok(())
    }

    /// Validate every section and the agreement between them.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bus_capacity == 0 {
            return Err(ConfigError::Invalid(
                "bus_capacity must be greater than zero".into(),
            ));
        }
        self.gateway
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        self.worker
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        if self.gateway.channels.request != self.worker.request_channel
            || self.gateway.channels.response != self.worker.response_channel
        {
            return Err(ConfigError::Invalid(format!(
                "gateway channels ({} / {}) do not match worker channels ({} / {})",
                self.gateway.channels.request,
                self.gateway.channels.response,
                self.worker.request_channel,
                self.worker.response_channel
            )));
        }
        Ok(())
    }
}

/// Load configuration from the file named by `CALC_CONFIG_FILE` (if any)
/// and the process environment.
pub fn load_config() -> Result<RuntimeConfig, ConfigError> {
    load_config_with(|key| env::var(key).ok())
}

/// [`load_config`] with an injectable variable source.
pub fn load_config_with(
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<RuntimeConfig, ConfigError> {
    let mut config = match lookup(CONFIG_FILE_ENV) {
        Some(path) => {
            info!(path = %path, "Loading configuration file");
            RuntimeConfig::from_file(Path::new(&path))?
        }
        None => RuntimeConfig::default(),
    };

    config.apply_overrides(&lookup)?;
    config.validate()?;
    Ok(config)
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    raw.trim()
        .parse()
        .map(Some)
        .map_err(|e: T::Err| ConfigError::InvalidValue {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        })
}
