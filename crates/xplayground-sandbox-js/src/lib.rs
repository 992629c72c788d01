mod hooks;
pub mod interceptor;
pub mod sandbox;
pub mod template;

pub use sandbox::{BuiltinSandbox, BuiltinSandboxConfig};

// Re-export boa_engine for consumers that need direct access
pub use boa_engine;
