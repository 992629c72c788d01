use std::time::{Duration, Instant};

use xplayground::{
    Language, LogKind, Playground, PlaygroundConfig, PlaygroundError, RunDispatch,
};

use super::helpers::{playground, run_code};

#[tokio::test]
async fn test_log_then_done() {
    let mut playground = playground();
    let dispatch = run_code(&mut playground, r#"console.log("hi")"#).await;

    assert!(matches!(dispatch, RunDispatch::Started(1)));
    assert_eq!(
        playground.lines(),
        vec!["[log] hi", "[done] Execution finished"]
    );
}

#[tokio::test]
async fn test_thrown_error_then_done() {
    let mut playground = playground();
    run_code(&mut playground, r#"throw new Error("boom")"#).await;

    let log = playground.console();
    assert_eq!(log.len(), 2);
    assert_eq!(log.entries()[0].kind, LogKind::Error);
    assert!(
        log.entries()[0].text.starts_with("Error: boom"),
        "unexpected error text: {}",
        log.entries()[0].text
    );
    assert_eq!(log.lines()[1], "[done] Execution finished");
}

#[tokio::test]
async fn test_structured_value_is_serialized() {
    let mut playground = playground();
    run_code(&mut playground, "console.log({a:1})").await;

    assert_eq!(playground.lines()[0], r#"[log] {"a":1}"#);
}

#[tokio::test]
async fn test_kinds_keep_call_order() {
    let mut playground = playground();
    run_code(
        &mut playground,
        "console.info('one');\nconsole.log('two', 2);\nconsole.warn('three');\nconsole.error('four');",
    )
    .await;

    assert_eq!(
        playground.lines(),
        vec![
            "[info] one",
            "[log] two 2",
            "[warn] three",
            "[error] four",
            "[done] Execution finished",
        ]
    );
}

#[tokio::test]
async fn test_syntax_error_reported_once() {
    let mut playground = playground();
    run_code(&mut playground, "console.log('x';").await;

    let log = playground.console();
    assert_eq!(log.len(), 2);
    assert_eq!(log.entries()[0].kind, LogKind::Error);
    assert!(log.entries()[0].text.contains(" (at "));
    assert_eq!(log.entries()[1].kind, LogKind::Done);
}

#[tokio::test]
async fn test_runs_do_not_share_globals() {
    let mut playground = playground();
    run_code(&mut playground, "globalThis.leak = 1; console.log('set');").await;
    run_code(&mut playground, "console.log(typeof leak);").await;

    assert_eq!(
        playground.lines(),
        vec![
            "[log] set",
            "[done] Execution finished",
            "[log] undefined",
            "[done] Execution finished",
        ]
    );
}

#[tokio::test]
async fn test_host_capabilities_absent() {
    let mut playground = playground();
    run_code(
        &mut playground,
        "console.log(typeof fetch, typeof document, typeof require, typeof localStorage);",
    )
    .await;

    assert_eq!(
        playground.lines()[0],
        "[log] undefined undefined undefined undefined"
    );
}

#[tokio::test]
async fn test_unsupported_language_logs_notice() {
    let mut playground = playground();
    playground.set_language(Language::Cpp);
    let dispatch = run_code(&mut playground, "int main() { return 0; }").await;

    assert_eq!(dispatch, RunDispatch::Unsupported(Language::Cpp));
    assert_eq!(playground.current_run(), 0);
    assert_eq!(
        playground.lines(),
        vec![
            "[info] Running C++ is not supported in the sandbox.",
            "[hint] For C++ you can hook up a server-side executor (e.g. Judge0) or an in-process interpreter such as Pyodide for Python.",
        ]
    );
}

#[tokio::test]
async fn test_run_and_wait_uses_config_timeout() {
    let mut playground = playground();
    playground.set_code("console.warn('careful')");
    let dispatch = playground.run_and_wait().await.unwrap();

    assert!(matches!(dispatch, RunDispatch::Started(_)));
    assert_eq!(
        playground.render(),
        "1. [warn] careful\n2. [done] Execution finished"
    );
}

#[tokio::test]
async fn test_unhandled_rejection_logged_as_error() {
    let mut playground = playground();
    run_code(
        &mut playground,
        "async function m() { throw new Error('async'); }\nm();\nconsole.log('after');",
    )
    .await;

    assert_eq!(
        playground.lines(),
        vec![
            "[log] after",
            "[error] Uncaught (in promise) Error: async (at 0:0)",
            "[done] Execution finished",
        ]
    );
}

#[tokio::test]
async fn test_settled_promises_log_inside_their_run() {
    let mut playground = playground();
    run_code(
        &mut playground,
        "Promise.resolve(2).then(function (v) { console.log('value', v); });",
    )
    .await;

    assert_eq!(
        playground.lines(),
        vec!["[log] value 2", "[done] Execution finished"]
    );
}

#[test]
fn test_runaway_run_times_out_and_is_orphaned() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let started = Instant::now();

    runtime.block_on(async {
        let mut config = PlaygroundConfig::default();
        config.run_timeout_secs = 1;
        let mut playground = Playground::new(config).unwrap();

        playground.set_code("console.log('start'); while (true) {}");
        let err = playground.run_and_wait().await.unwrap_err();
        assert!(matches!(err, PlaygroundError::Timeout { run_id: 1 }));
        assert_eq!(playground.lines(), vec!["[log] start"]);

        // A new run supersedes the looping one
        playground.set_code("console.log('next')");
        playground.run_and_wait().await.unwrap();
        assert_eq!(
            playground.lines(),
            vec!["[log] start", "[log] next", "[done] Execution finished"]
        );
        playground.shutdown().await;
    });
    drop(runtime);

    assert!(started.elapsed() < Duration::from_secs(8));
}
