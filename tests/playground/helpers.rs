#![allow(unused)]

use std::time::Duration;

use xplayground::{Playground, PlaygroundConfig, RunDispatch};

pub const RUN_TIMEOUT: Duration = Duration::from_secs(10);

pub fn playground() -> Playground {
    Playground::new(PlaygroundConfig::default()).expect("default config is valid")
}

/// Replace the buffer, run it and wait for its `done`.
pub async fn run_code(playground: &mut Playground, code: &str) -> RunDispatch {
    playground.set_code(code);
    let dispatch = playground.run().await.expect("run dispatched");
    if let RunDispatch::Started(run_id) = dispatch {
        playground
            .wait_for_run(run_id, RUN_TIMEOUT)
            .await
            .unwrap_or_else(|err| panic!("run {} did not finish: {}", run_id, err));
    }
    dispatch
}

pub async fn wait_for_condition(
    label: &str,
    timeout: Duration,
    interval: Duration,
    condition: impl Fn() -> bool,
) {
    let start = tokio::time::Instant::now();
    while !condition() {
        if start.elapsed() > timeout {
            panic!("condition '{}' not met within {:?}", label, timeout);
        }
        tokio::time::sleep(interval).await;
    }
}
