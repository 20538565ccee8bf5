//! Configuration schema definitions.
//!
//! All sections derive Serde traits for deserialization from a TOML file;
//! every field except the origin address has a usable default.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// Root configuration for the proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct ProxyConfig {
    /// Where inbound requests are accepted.
    pub listener: ListenerConfig,

    /// The single upstream every request is fetched from.
    pub origin: OriginConfig,

    /// Deadline and transport bounds.
    pub timeouts: TimeoutConfig,

    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Host or IP to bind (e.g., "0.0.0.0").
    pub host: String,

    /// TCP port to bind.
    pub port: u16,
}

impl ListenerConfig {
    /// `host:port` form handed to the TCP listener. IPv6 literals are bracketed.
    pub fn bind_address(&self) -> String {
        match self.host.parse::<IpAddr>() {
            Ok(IpAddr::V6(ip)) => SocketAddr::from((ip, self.port)).to_string(),
            _ => format!("{}:{}", self.host, self.port),
        }
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Origin configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct OriginConfig {
    /// Base address requests are forwarded to (e.g., "http://images.internal:9000").
    /// The inbound path is appended verbatim.
    pub address: String,

    /// Largest origin body that will be buffered, in bytes.
    pub max_body_bytes: usize,

    /// How long an idle pooled origin connection is kept, in seconds.
    pub pool_idle_timeout_secs: u64,
}

impl OriginConfig {
    /// Origin address without a trailing slash.
    pub fn base(&self) -> &str {
        self.address.trim_end_matches('/')
    }
}

impl Default for OriginConfig {
    fn default() -> Self {
        Self {
            address: String::new(),
            max_body_bytes: 32 * 1024 * 1024,
            pool_idle_timeout_secs: 90,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Per-request deadline covering fetch, decode and transform, in milliseconds.
    pub deadline_ms: u64,

    /// Bound on reading the inbound request, in seconds.
    pub read_secs: u64,

    /// Bound on producing the inbound response, in seconds.
    pub write_secs: u64,

    /// Origin connection establishment timeout in seconds.
    pub connect_secs: u64,
}

impl TimeoutConfig {
    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }

    pub fn read(&self) -> Duration {
        Duration::from_secs(self.read_secs)
    }

    pub fn write(&self) -> Duration {
        Duration::from_secs(self.write_secs)
    }

    pub fn connect(&self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            deadline_ms: 5_000,
            read_secs: 5,
            write_secs: 10,
            connect_secs: 5,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes precedence.
    pub log_level: String,

    /// Human-readable or JSON log lines.
    pub log_format: LogFormat,

    /// Enable the Prometheus scrape endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
