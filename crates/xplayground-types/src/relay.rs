//! Relay wire format shared by sandboxed runs and the host.
//!
//! Every message crossing the isolation boundary is a JSON object carrying the
//! protocol marker, the message kind, the rendered text and the id of the run
//! that produced it:
//!
//! ```json
//! { "__xplayground_relay": true, "type": "log", "message": "hi", "runId": 3 }
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Field that must be present and `true` on every relay payload.
pub const RELAY_MARKER: &str = "__xplayground_relay";

/// Text carried by the terminal `done` message of a run.
pub const DONE_MESSAGE: &str = "Execution finished";

/// Monotonic run identifier. `0` is never assigned to a run.
pub type RunId = u64;

/// Kind tag of a relayed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Log,
    Info,
    Warn,
    Error,
    Done,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Log => "log",
            MessageKind::Info => "info",
            MessageKind::Warn => "warn",
            MessageKind::Error => "error",
            MessageKind::Done => "done",
        }
    }

    /// Whether this kind closes the log segment of its run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, MessageKind::Done)
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageKind {
    type Err = RelayRejection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "log" => Ok(MessageKind::Log),
            "info" => Ok(MessageKind::Info),
            "warn" => Ok(MessageKind::Warn),
            "error" => Ok(MessageKind::Error),
            "done" => Ok(MessageKind::Done),
            other => Err(RelayRejection::Malformed(format!(
                "unknown message type '{}'",
                other
            ))),
        }
    }
}

/// Reasons an inbound payload is not accepted as a relay message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RelayRejection {
    #[error("payload does not carry the relay marker")]
    MissingMarker,

    #[error("malformed relay payload: {0}")]
    Malformed(String),
}

/// One message sent from an isolated run back to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMessage {
    pub run_id: RunId,
    pub kind: MessageKind,
    pub text: String,
}

#[derive(Deserialize)]
struct WirePayload {
    #[serde(rename = "__xplayground_relay")]
    _marker: bool,
    #[serde(rename = "type")]
    kind: MessageKind,
    message: String,
    #[serde(rename = "runId")]
    run_id: RunId,
}

impl ChannelMessage {
    pub fn new(run_id: RunId, kind: MessageKind, text: impl Into<String>) -> Self {
        Self {
            run_id,
            kind,
            text: text.into(),
        }
    }

    /// The terminal message of a run.
    pub fn done(run_id: RunId) -> Self {
        Self::new(run_id, MessageKind::Done, DONE_MESSAGE)
    }

    /// Encode into the JSON object posted on the host channel.
    pub fn to_payload(&self) -> Value {
        json!({
            RELAY_MARKER: true,
            "type": self.kind.as_str(),
            "message": self.text,
            "runId": self.run_id,
        })
    }

    /// Decode an inbound payload.
    ///
    /// The marker is checked before anything else so that unrelated traffic on
    /// the shared channel is reported as [`RelayRejection::MissingMarker`]
    /// rather than as a malformed relay message.
    pub fn from_payload(payload: &Value) -> Result<Self, RelayRejection> {
        match payload.get(RELAY_MARKER) {
            Some(Value::Bool(true)) => {}
            _ => return Err(RelayRejection::MissingMarker),
        }

        let wire: WirePayload = serde_json::from_value(payload.clone())
            .map_err(|e| RelayRejection::Malformed(e.to_string()))?;

        Ok(Self {
            run_id: wire.run_id,
            kind: wire.kind,
            text: wire.message,
        })
    }
}
