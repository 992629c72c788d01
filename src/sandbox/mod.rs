//! Sandbox Module
//!
//! Maps languages to isolated executors. The built-in JavaScript sandbox
//! (Boa engine) is registered when the `builtin-sandbox-js` feature is on.

pub mod manager;

pub use manager::{SandboxManager, SandboxManagerConfig};
pub use xplayground_types::{
    IsolatedExecutor, Language, RunCompletion, RunInstance, RunOutcome, RunReport, RunRequest,
    SandboxError, SandboxStats, SandboxType,
};

#[cfg(feature = "builtin-sandbox-js")]
pub use xplayground_sandbox_js::{BuiltinSandbox, BuiltinSandboxConfig};
