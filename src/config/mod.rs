//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! optional config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → environment overrides (APP_HOST, APP_PORT, ORIGIN_SERVER)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → passed by reference into the server at construction
//! ```
//!
//! Config is built once at startup and never mutated afterwards.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{apply_env_overrides, load_config, ConfigError};
pub use schema::{
    ListenerConfig, LogFormat, ObservabilityConfig, OriginConfig, ProxyConfig, TimeoutConfig,
};
pub use validation::{validate_config, ValidationError};
