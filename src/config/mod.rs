//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults
//!     → optional TOML file named by BROADCAST_CONFIG (loader.rs)
//!     → environment overrides (BACKEND_HOST, BACKEND_PORT, RETRIES, TIMEOUT, ...)
//!     → validation.rs (semantic checks)
//!     → BroadcastConfig (validated, immutable)
//!     → shared via Arc with the HTTP handlers
//! ```
//!
//! # Design Decisions
//! - Config is built once at startup; core logic never reads the environment
//! - All fields have defaults except the backend host
//! - Malformed overrides are ignored rather than fatal

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_from_env, ConfigError};
pub use schema::{BackendConfig, BroadcastConfig, DispatchConfig, ListenerConfig, LogFormat, ObservabilityConfig};
pub use validation::ValidationError;
