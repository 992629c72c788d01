//! Error types for the playground host.
//!
//! - [`PlaygroundError`]: top-level errors returned by the host facade.
//! - [`ConfigError`]: failures loading or validating a configuration file.
//!
//! User-script failures never surface here; they are console entries.

pub mod config_error;
pub mod playground_error;

pub use config_error::ConfigError;
pub use playground_error::PlaygroundError;

/// Convenience alias for host-level results.
pub type PlaygroundResult<T> = Result<T, PlaygroundError>;
