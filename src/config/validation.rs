//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, interval > 0)
//! - Check address shape and log level names
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Pure function: LivenessConfig → Result<(), Vec<ValidationError>>

use thiserror::Error;

use crate::config::schema::LivenessConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    #[error("dial.address '{0}' is not in host:port form")]
    InvalidAddress(String),

    #[error("observability.log_level '{0}' is not one of trace, debug, info, warn, error")]
    InvalidLogLevel(String),
}

/// Validate a deserialized configuration.
pub fn validate_config(config: &LivenessConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.probe.timeout_ms == 0 {
        errors.push(ValidationError::ZeroDuration("probe.timeout_ms"));
    }
    if config.dial.connect_timeout_ms == 0 {
        errors.push(ValidationError::ZeroDuration("dial.connect_timeout_ms"));
    }
    if config.watch.interval_ms == 0 {
        errors.push(ValidationError::ZeroDuration("watch.interval_ms"));
    }

    let address = &config.dial.address;
    if !address.is_empty() && !is_host_port(address) {
        errors.push(ValidationError::InvalidAddress(address.clone()));
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::InvalidLogLevel(
            config.observability.log_level.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_host_port(address: &str) -> bool {
    match address.rsplit_once(':') {
        Some((host, port)) => !host.is_empty() && port.parse::<u16>().is_ok(),
        None => false,
    }
}
