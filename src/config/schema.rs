//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML. Every section has
//! defaults, so an empty file is a valid configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::net::DEFAULT_PROBE_TIMEOUT;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct LivenessConfig {
    /// Liveness probe settings.
    pub probe: ProbeConfig,

    /// Endpoint to dial (used by the CLI).
    pub dial: DialConfig,

    /// Repeated probing (used by the CLI).
    pub watch: WatchConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Liveness probe configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Bound on a zero-length read probe, in milliseconds.
    pub timeout_ms: u64,
}

impl ProbeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_PROBE_TIMEOUT.as_millis() as u64,
        }
    }
}

/// Dial configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DialConfig {
    /// Endpoint address (e.g., "127.0.0.1:9090"). Empty means "given on the command line".
    pub address: String,

    /// Connection establishment timeout in milliseconds.
    pub connect_timeout_ms: u64,
}

impl DialConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

impl Default for DialConfig {
    fn default() -> Self {
        Self {
            address: String::new(),
            connect_timeout_ms: 5_000,
        }
    }
}

/// Watch loop configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Delay between probes in milliseconds.
    pub interval_ms: u64,

    /// Number of probes to run; 0 keeps probing until the connection closes.
    pub count: u64,
}

impl WatchConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1_000,
            count: 1,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
