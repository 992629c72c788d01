//! Ordered console log shown to the user.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::broadcast;

use xplayground_types::MessageKind;

/// Text shown in place of an empty console.
pub const EMPTY_CONSOLE_PLACEHOLDER: &str = "Console is empty. Run your code to see output.";

const EVENT_CAPACITY: usize = 256;

/// Kind tag of a console line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    Log,
    Info,
    Warn,
    Error,
    Done,
    /// Host-side guidance, never produced by a sandbox
    Hint,
}

impl LogKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogKind::Log => "log",
            LogKind::Info => "info",
            LogKind::Warn => "warn",
            LogKind::Error => "error",
            LogKind::Done => "done",
            LogKind::Hint => "hint",
        }
    }
}

impl From<MessageKind> for LogKind {
    fn from(kind: MessageKind) -> Self {
        match kind {
            MessageKind::Log => LogKind::Log,
            MessageKind::Info => LogKind::Info,
            MessageKind::Warn => LogKind::Warn,
            MessageKind::Error => LogKind::Error,
            MessageKind::Done => LogKind::Done,
        }
    }
}

impl fmt::Display for LogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of captured output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub kind: LogKind,
    pub text: String,
}

impl LogEntry {
    pub fn new(kind: LogKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.text)
    }
}

/// Append-only sequence of entries. Insertion order is display order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsoleLog {
    entries: Vec<LogEntry>,
}

impl ConsoleLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, entry: LogEntry) {
        self.entries.push(entry);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in `[kind] text` form.
    pub fn lines(&self) -> Vec<String> {
        self.entries.iter().map(ToString::to_string).collect()
    }

    /// Console panel text. Numbered lines read `3. [log] hi`.
    pub fn render(&self, numbered: bool) -> String {
        if self.entries.is_empty() {
            return EMPTY_CONSOLE_PLACEHOLDER.to_string();
        }
        self.entries
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                if numbered {
                    format!("{}. {}", i + 1, entry)
                } else {
                    entry.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Change notification for console renderers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleEvent {
    Appended(LogEntry),
    Cleared,
}

/// Host-owned console shared by the relay listener and the run controller.
#[derive(Clone)]
pub struct Console {
    log: Arc<Mutex<ConsoleLog>>,
    events: broadcast::Sender<ConsoleEvent>,
}

impl Console {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            log: Arc::new(Mutex::new(ConsoleLog::new())),
            events,
        }
    }

    pub fn append(&self, entry: LogEntry) {
        let mut log = self.log.lock();
        log.append(entry.clone());
        // Sent under the lock so events stay in log order; no subscribers is fine
        let _ = self.events.send(ConsoleEvent::Appended(entry));
    }

    pub fn clear(&self) {
        let mut log = self.log.lock();
        log.clear();
        let _ = self.events.send(ConsoleEvent::Cleared);
    }

    pub fn snapshot(&self) -> ConsoleLog {
        self.log.lock().clone()
    }

    pub fn lines(&self) -> Vec<String> {
        self.log.lock().lines()
    }

    pub fn render(&self, numbered: bool) -> String {
        self.log.lock().render(numbered)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ConsoleEvent> {
        self.events.subscribe()
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}
