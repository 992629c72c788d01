pub mod console;
pub mod relay;

pub use console::{Console, ConsoleEvent, ConsoleLog, LogEntry, LogKind, EMPTY_CONSOLE_PLACEHOLDER};
pub use relay::{RelayListener, RelayOutcome, RelaySubscription, RunTracker};
