//! Playground configuration loaded from YAML.
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! working playground:
//!
//! ```yaml
//! default_language: javascript
//! initial_code: 'console.log("Hello from sandboxed JS");'
//! log_filter: info
//! run_timeout_secs: 10
//! console:
//!   numbered: true
//! sandbox:
//!   drain_jobs: true
//!   script_name: sandbox
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use xplayground_types::Language;

use crate::error::ConfigError;
use crate::sandbox::SandboxManagerConfig;

pub const DEFAULT_INITIAL_CODE: &str = r#"console.log("Hello from sandboxed JS");"#;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaygroundConfig {
    pub default_language: Language,
    pub initial_code: String,
    /// Fallback tracing filter when `RUST_LOG` is unset
    pub log_filter: String,
    /// Upper bound used by `run_and_wait`
    pub run_timeout_secs: u64,
    pub console: ConsoleConfig,
    pub sandbox: SandboxConfig,
}

impl Default for PlaygroundConfig {
    fn default() -> Self {
        Self {
            default_language: Language::JavaScript,
            initial_code: DEFAULT_INITIAL_CODE.to_string(),
            log_filter: "info".to_string(),
            run_timeout_secs: 10,
            console: ConsoleConfig::default(),
            sandbox: SandboxConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Prefix rendered lines with `1.`, `2.`, ...
    pub numbered: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self { numbered: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    pub drain_jobs: bool,
    pub script_name: String,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            drain_jobs: true,
            script_name: "sandbox".to_string(),
        }
    }
}

impl PlaygroundConfig {
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        // An empty document means "all defaults"
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self =
            serde_saphyr::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml_str(&content)?;
        tracing::debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.run_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "run_timeout_secs must be greater than zero".into(),
            ));
        }
        if self.log_filter.trim().is_empty() {
            return Err(ConfigError::Invalid("log_filter must not be empty".into()));
        }
        if self.sandbox.script_name.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "sandbox.script_name must not be empty".into(),
            ));
        }
        Ok(())
    }

    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_secs)
    }

    pub fn sandbox_manager_config(&self) -> SandboxManagerConfig {
        #[cfg(feature = "builtin-sandbox-js")]
        {
            SandboxManagerConfig {
                builtin_config: crate::sandbox::BuiltinSandboxConfig {
                    drain_jobs: self.sandbox.drain_jobs,
                    script_name: self.sandbox.script_name.clone(),
                },
            }
        }
        #[cfg(not(feature = "builtin-sandbox-js"))]
        {
            SandboxManagerConfig::default()
        }
    }
}
