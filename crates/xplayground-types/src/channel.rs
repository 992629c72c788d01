use serde_json::Value;
use tokio::sync::mpsc;

use crate::relay::ChannelMessage;

/// Receiving half of the host channel, owned by the relay listener.
pub type ChannelReceiver = mpsc::UnboundedReceiver<Value>;

/// Sending half of the host's shared messaging channel.
///
/// Any number of sources may hold a port: sandboxed runs post relay messages
/// through it, and unrelated components may post arbitrary JSON. Posting never
/// blocks; there is no acknowledgment or backpressure.
#[derive(Clone, Debug)]
pub struct HostPort {
    tx: mpsc::UnboundedSender<Value>,
}

impl HostPort {
    /// Post a raw payload. Returns `false` once the host side is gone.
    pub fn post(&self, payload: Value) -> bool {
        self.tx.send(payload).is_ok()
    }

    /// Post a relay message in its wire form.
    pub fn post_message(&self, message: &ChannelMessage) -> bool {
        self.post(message.to_payload())
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Create the host channel. One per host.
pub fn create_host_channel() -> (HostPort, ChannelReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (HostPort { tx }, rx)
}
