//! # XPlayground: a sandboxed code playground
//!
//! `xplayground` runs user-supplied JavaScript in a throwaway, isolated engine
//! context and streams everything the script prints back to a host-side
//! console:
//!
//! - **Fresh isolation per run**: every run gets a brand-new Boa context with
//!   no DOM, storage, timers, network or module loader.
//! - **Console capture**: `console.log/info/warn/error`, caught throws and
//!   uncaught errors are relayed as tagged messages, closed by exactly one
//!   `done` per run.
//! - **Run ids**: each run is stamped with an id; output from superseded runs
//!   is discarded by the host.
//! - **Language selector**: JavaScript is sandboxed; Python, Java and C++ are
//!   listed but answered with an explanatory notice unless an executor is
//!   registered for them.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use xplayground::{Playground, PlaygroundConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut playground = Playground::new(PlaygroundConfig::default()).unwrap();
//!     playground.set_code(r#"console.log("hi")"#);
//!     playground.run_and_wait().await.unwrap();
//!     for line in playground.lines() {
//!         println!("{}", line);
//!     }
//! }
//! ```
//!
//! # Feature Flags
//!
//! | Flag | Description |
//! |------|-------------|
//! | `builtin-sandbox-js` | Bundles the JavaScript sandbox (Boa engine), on by default |

pub mod api;
pub mod config;
pub mod controller;
pub mod core;
pub mod error;
pub mod sandbox;

pub use crate::api::Playground;
pub use crate::config::PlaygroundConfig;
pub use crate::controller::{RunController, RunDispatch, SourceDocument};
pub use crate::core::{
    Console, ConsoleEvent, ConsoleLog, LogEntry, LogKind, RelayListener, RelayOutcome,
    RelaySubscription, RunTracker,
};
pub use crate::error::{ConfigError, PlaygroundError, PlaygroundResult};
pub use crate::sandbox::{SandboxManager, SandboxManagerConfig};
pub use xplayground_types::{
    create_host_channel, ChannelMessage, HostPort, Language, MessageKind, RunId,
};
