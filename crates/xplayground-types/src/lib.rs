pub mod channel;
pub mod relay;
pub mod sandbox;

pub use channel::{create_host_channel, ChannelReceiver, HostPort};
pub use relay::{
    ChannelMessage, MessageKind, RelayRejection, RunId, DONE_MESSAGE, RELAY_MARKER,
};
pub use sandbox::{
    IsolatedExecutor, Language, RunCompletion, RunInstance, RunOutcome, RunReport, RunRequest,
    SandboxError, SandboxStats, SandboxType,
};
