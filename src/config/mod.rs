//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → LivenessConfig (validated, immutable)
//!     → ProbeConfig handed to ManagedConnection::with_config
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{DialConfig, LivenessConfig, ObservabilityConfig, ProbeConfig, WatchConfig};
pub use validation::{validate_config, ValidationError};
