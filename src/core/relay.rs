//! Host-side relay: filters inbound channel payloads into the console log.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use xplayground_types::{ChannelMessage, ChannelReceiver, RelayRejection, RunId};

use super::console::{Console, LogEntry};

/// Tracks which run is current and which runs have closed their segment.
pub struct RunTracker {
    next: AtomicU64,
    current: AtomicU64,
    finished: watch::Sender<RunId>,
}

impl RunTracker {
    pub fn new() -> Self {
        let (finished, _) = watch::channel(0);
        Self {
            next: AtomicU64::new(0),
            current: AtomicU64::new(0),
            finished,
        }
    }

    /// Allocate the next run id and make it current.
    ///
    /// Ids are never handed out twice, even when a run is abandoned.
    pub fn begin_run(&self) -> RunId {
        let run_id = self.next.fetch_add(1, Ordering::SeqCst) + 1;
        self.current.fetch_max(run_id, Ordering::SeqCst);
        run_id
    }

    /// Hand "current" back to `previous` after `run_id` failed to launch.
    ///
    /// Does nothing if a later run has been started in the meantime.
    pub fn abandon_run(&self, run_id: RunId, previous: RunId) -> bool {
        self.current
            .compare_exchange(run_id, previous, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Id of the most recently started run, `0` before the first run.
    pub fn current(&self) -> RunId {
        self.current.load(Ordering::SeqCst)
    }

    pub fn is_current(&self, run_id: RunId) -> bool {
        run_id != 0 && run_id == self.current()
    }

    pub fn mark_finished(&self, run_id: RunId) {
        self.finished.send_if_modified(|last| {
            if run_id > *last {
                *last = run_id;
                true
            } else {
                false
            }
        });
    }

    /// Highest run id whose `done` reached the log.
    pub fn last_finished(&self) -> RunId {
        *self.finished.borrow()
    }

    /// Resolve once `run_id` or any later run has finished.
    ///
    /// A superseded run never reports `done`, so waiting on it resolves when
    /// the run that replaced it finishes.
    pub async fn wait_finished(&self, run_id: RunId) {
        let mut rx = self.finished.subscribe();
        // The sender lives as long as `self`, so this cannot observe a closed channel.
        let _ = rx.wait_for(|last| *last >= run_id).await;
    }
}

impl Default for RunTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// What the listener did with one inbound payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    Appended(LogEntry),
    Rejected(RelayRejection),
    Stale { run_id: RunId, current: RunId },
}

/// Validates channel payloads and appends accepted messages to the console.
#[derive(Clone)]
pub struct RelayListener {
    console: Console,
    tracker: Arc<RunTracker>,
}

impl RelayListener {
    pub fn new(console: Console, tracker: Arc<RunTracker>) -> Self {
        Self { console, tracker }
    }

    /// Handle one payload from the host channel.
    pub fn handle(&self, payload: &Value) -> RelayOutcome {
        let message = match ChannelMessage::from_payload(payload) {
            Ok(message) => message,
            Err(rejection) => {
                tracing::trace!(reason = %rejection, "ignoring inbound payload");
                return RelayOutcome::Rejected(rejection);
            }
        };

        let current = self.tracker.current();
        if !self.tracker.is_current(message.run_id) {
            tracing::debug!(
                run_id = message.run_id,
                current,
                kind = %message.kind,
                "dropping message from superseded run"
            );
            return RelayOutcome::Stale {
                run_id: message.run_id,
                current,
            };
        }

        let entry = LogEntry::new(message.kind.into(), message.text);
        self.console.append(entry.clone());
        if message.kind.is_terminal() {
            self.tracker.mark_finished(message.run_id);
            tracing::debug!(run_id = message.run_id, "run closed its log segment");
        }
        RelayOutcome::Appended(entry)
    }

    /// Start listening on `receiver` until the returned subscription is
    /// dropped or unsubscribed. Must be called inside a tokio runtime.
    pub fn subscribe(self, mut receiver: ChannelReceiver) -> RelaySubscription {
        let token = CancellationToken::new();
        let stop = token.clone();

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = stop.cancelled() => break,
                    payload = receiver.recv() => match payload {
                        Some(payload) => {
                            self.handle(&payload);
                        }
                        None => break,
                    },
                }
            }
            tracing::debug!("relay listener stopped");
        });

        RelaySubscription {
            token,
            task: Some(task),
        }
    }
}

/// Live subscription of a [`RelayListener`] to the host channel.
///
/// Dropping it stops the listener.
pub struct RelaySubscription {
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl RelaySubscription {
    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Stop listening and wait for the listener task to exit.
    pub async fn unsubscribe(mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for RelaySubscription {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::console::LogKind;
    use serde_json::json;
    use xplayground_types::{create_host_channel, MessageKind, RELAY_MARKER};

    fn listener() -> (RelayListener, Console, Arc<RunTracker>) {
        let console = Console::new();
        let tracker = Arc::new(RunTracker::new());
        (
            RelayListener::new(console.clone(), tracker.clone()),
            console,
            tracker,
        )
    }

    #[test]
    fn test_appends_current_run_messages_in_order() {
        let (listener, console, tracker) = listener();
        let run = tracker.begin_run();

        listener.handle(&ChannelMessage::new(run, MessageKind::Log, "hi").to_payload());
        listener.handle(&ChannelMessage::done(run).to_payload());

        assert_eq!(console.lines(), vec!["[log] hi", "[done] Execution finished"]);
        assert_eq!(tracker.last_finished(), run);
    }

    #[test]
    fn test_foreign_payload_ignored() {
        let (listener, console, tracker) = listener();
        tracker.begin_run();

        let outcome = listener.handle(&json!({ "foo": 1 }));
        assert_eq!(outcome, RelayOutcome::Rejected(RelayRejection::MissingMarker));
        assert_eq!(
            listener.handle(&Value::Null),
            RelayOutcome::Rejected(RelayRejection::MissingMarker)
        );
        assert!(console.snapshot().is_empty());
    }

    #[test]
    fn test_malformed_marked_payload_ignored() {
        let (listener, console, tracker) = listener();
        let run = tracker.begin_run();

        let outcome = listener.handle(&json!({ RELAY_MARKER: true, "type": "shout", "message": "x", "runId": run }));
        assert!(matches!(
            outcome,
            RelayOutcome::Rejected(RelayRejection::Malformed(_))
        ));
        assert!(console.snapshot().is_empty());
    }

    #[test]
    fn test_stale_run_dropped() {
        let (listener, console, tracker) = listener();
        let first = tracker.begin_run();
        let second = tracker.begin_run();

        let outcome = listener.handle(&ChannelMessage::new(first, MessageKind::Log, "old").to_payload());
        assert_eq!(
            outcome,
            RelayOutcome::Stale {
                run_id: first,
                current: second
            }
        );
        listener.handle(&ChannelMessage::done(first).to_payload());
        assert!(console.snapshot().is_empty());
        assert_eq!(tracker.last_finished(), 0);
    }

    #[test]
    fn test_abandoned_run_restores_previous() {
        let (listener, console, tracker) = listener();
        let first = tracker.begin_run();
        let failed = tracker.begin_run();

        assert!(tracker.abandon_run(failed, first));
        assert_eq!(tracker.current(), first);
        listener.handle(&ChannelMessage::new(first, MessageKind::Log, "still here").to_payload());
        assert_eq!(console.lines(), vec!["[log] still here"]);

        // The abandoned id is not handed out again
        assert_eq!(tracker.begin_run(), failed + 1);
    }

    #[test]
    fn test_abandon_ignored_once_superseded() {
        let (_listener, _console, tracker) = listener();
        let first = tracker.begin_run();
        let failed = tracker.begin_run();
        let third = tracker.begin_run();

        assert!(!tracker.abandon_run(failed, first));
        assert_eq!(tracker.current(), third);
    }

    #[test]
    fn test_no_run_started_means_nothing_is_current() {
        let (listener, console, _tracker) = listener();
        let outcome = listener.handle(&ChannelMessage::new(0, MessageKind::Log, "x").to_payload());
        assert!(matches!(outcome, RelayOutcome::Stale { .. }));
        assert!(console.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_subscription_delivers_and_unsubscribes() {
        let (listener, console, tracker) = listener();
        let (port, receiver) = create_host_channel();
        let subscription = listener.subscribe(receiver);
        assert!(subscription.is_active());

        let run = tracker.begin_run();
        port.post_message(&ChannelMessage::new(run, MessageKind::Warn, "w"));
        port.post_message(&ChannelMessage::done(run));
        tokio::time::timeout(std::time::Duration::from_secs(2), tracker.wait_finished(run))
            .await
            .unwrap();
        assert_eq!(
            console.snapshot().entries()[0],
            LogEntry::new(LogKind::Warn, "w")
        );

        subscription.unsubscribe().await;
        assert!(!port.post_message(&ChannelMessage::new(run, MessageKind::Log, "late")));
        assert_eq!(console.snapshot().len(), 2);
    }
}
