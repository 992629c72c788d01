use std::time::Duration;

use serde_json::json;
use xplayground::{ChannelMessage, ConsoleEvent, MessageKind, PlaygroundError};

use super::helpers::{playground, run_code, wait_for_condition, RUN_TIMEOUT};

#[tokio::test]
async fn test_foreign_message_ignored() {
    let mut playground = playground();
    assert!(playground.port().post(json!({ "foo": 1 })));

    // The channel is FIFO, so the foreign payload was handled before the run's output
    run_code(&mut playground, "console.log('after')").await;
    assert_eq!(
        playground.lines(),
        vec!["[log] after", "[done] Execution finished"]
    );
}

#[tokio::test]
async fn test_stale_run_messages_dropped() {
    let mut playground = playground();
    run_code(&mut playground, "console.log(1)").await;
    run_code(&mut playground, "console.log(2)").await;
    playground.clear_console();

    let port = playground.port();
    port.post_message(&ChannelMessage::new(1, MessageKind::Log, "stale"));
    port.post_message(&ChannelMessage::new(2, MessageKind::Log, "current"));

    wait_for_condition("current message appended", RUN_TIMEOUT, Duration::from_millis(5), || {
        !playground.console().is_empty()
    })
    .await;
    assert_eq!(playground.lines(), vec!["[log] current"]);
}

#[tokio::test]
async fn test_done_after_clear_still_appends() {
    let mut playground = playground();
    run_code(&mut playground, "console.log('x')").await;
    playground.clear_console();
    assert!(playground.console().is_empty());

    let run_id = playground.current_run();
    playground.port().post_message(&ChannelMessage::done(run_id));

    wait_for_condition("done appended", RUN_TIMEOUT, Duration::from_millis(5), || {
        playground.console().len() == 1
    })
    .await;
    assert_eq!(playground.lines(), vec!["[done] Execution finished"]);
}

#[tokio::test]
async fn test_console_events_stream() {
    let mut playground = playground();
    let mut events = playground.subscribe();

    run_code(&mut playground, "console.log('live')").await;
    playground.clear_console();

    let mut seen = Vec::new();
    for _ in 0..3 {
        seen.push(
            tokio::time::timeout(RUN_TIMEOUT, events.recv())
                .await
                .unwrap()
                .unwrap(),
        );
    }
    assert!(matches!(&seen[0], ConsoleEvent::Appended(entry) if entry.text == "live"));
    assert!(matches!(&seen[1], ConsoleEvent::Appended(entry) if entry.text == "Execution finished"));
    assert_eq!(seen[2], ConsoleEvent::Cleared);
}

#[tokio::test]
async fn test_shutdown_stops_appends() {
    let mut playground = playground();
    run_code(&mut playground, "console.log('before')").await;

    let port = playground.port();
    playground.shutdown().await;

    assert!(!port.post_message(&ChannelMessage::done(playground.current_run())));
    assert!(matches!(
        playground.run().await,
        Err(PlaygroundError::Closed)
    ));
    assert_eq!(playground.console().len(), 2);
}
