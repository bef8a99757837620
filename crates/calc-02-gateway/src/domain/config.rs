//! Gateway configuration.

use serde::{Deserialize, Serialize};
use shared_bus::{DEFAULT_REQUEST_CHANNEL, DEFAULT_RESPONSE_CHANNEL};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Default per-call deadline.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(5000);

/// Main gateway configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// HTTP listener
    pub http: HttpConfig,
    /// Bus channel names
    pub channels: ChannelConfig,
    /// Deadline for a single call, measured from the moment it is published
    #[serde(rename = "request_timeout_ms", with = "duration_ms")]
    pub request_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            channels: ChannelConfig::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl GatewayConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "request_timeout must be greater than zero".into(),
            ));
        }
        self.channels.validate()
    }

    /// Get HTTP socket address
    pub fn http_addr(&self) -> SocketAddr {
        SocketAddr::new(self.http.host, self.http.port)
    }
}

/// HTTP listener configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Largest accepted request body, in bytes
    pub max_body_bytes: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8080,
            max_body_bytes: 64 * 1024,
        }
    }
}

/// Bus channel names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Channel the gateway publishes requests to
    pub request: String,
    /// Channel the gateway listens on for responses
    pub response: String,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            request: DEFAULT_REQUEST_CHANNEL.to_string(),
            response: DEFAULT_RESPONSE_CHANNEL.to_string(),
        }
    }
}

impl ChannelConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request.trim().is_empty() || self.response.trim().is_empty() {
            return Err(ConfigError::InvalidChannel(
                "channel names must not be empty".into(),
            ));
        }
        if self.request == self.response {
            return Err(ConfigError::InvalidChannel(format!(
                "request and response channels must differ (both are {:?})",
                self.request
            )));
        }
        Ok(())
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Invalid timeout value
    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),
    /// Empty or clashing channel names
    #[error("invalid channel: {0}")]
    InvalidChannel(String),
    /// General configuration error
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Serialize a `Duration` as whole milliseconds.
mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GatewayConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.http.port, 8080);
        assert_eq!(config.channels.request, "calc-requests");
        assert_eq!(config.channels.response, "calc-responses");
        assert_eq!(config.request_timeout, Duration::from_millis(5000));
    }

    #[test]
    fn test_config_address() {
        let config = GatewayConfig::default();
        assert_eq!(config.http_addr().to_string(), "0.0.0.0:8080");
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = GatewayConfig {
            request_timeout: Duration::ZERO,
            ..GatewayConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidTimeout(_))
        ));
    }

    #[test]
    fn test_channel_validation() {
        let mut config = GatewayConfig::default();
        config.channels.response = config.channels.request.clone();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidChannel(_))
        ));

        config.channels.response = "  ".into();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidChannel(_))
        ));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: GatewayConfig =
            serde_json::from_str(r#"{"request_timeout_ms": 250, "http": {"port": 9000}}"#)
                .unwrap();
        assert_eq!(config.request_timeout, Duration::from_millis(250));
        assert_eq!(config.http.port, 9000);
        assert_eq!(config.channels, ChannelConfig::default());
    }
}
