use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;
use tokio::runtime::Runtime;

use xplayground::core::{Console, RelayListener, RunTracker};
use xplayground::sandbox::{Language, RunRequest, SandboxManager, SandboxManagerConfig};
use xplayground::{create_host_channel, ChannelMessage, MessageKind};

fn bench_runtime() -> Runtime {
    Runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to build runtime")
}

fn bench_isolated_runs(c: &mut Criterion) {
    let rt = bench_runtime();
    let manager = SandboxManager::new(SandboxManagerConfig::default());
    let executor = manager
        .executor_for(Language::JavaScript)
        .expect("javascript sandbox registered");

    let cases = vec![
        ("empty", String::new()),
        ("log_once", r#"console.log("hi")"#.to_string()),
        ("log_object", "console.log({a: 1, b: [1, 2, 3]})".to_string()),
        (
            "log_loop_100",
            "for (let i = 0; i < 100; i++) { console.log(i); }".to_string(),
        ),
        ("throw", r#"throw new Error("boom")"#.to_string()),
        ("syntax_error", "console.log('x';".to_string()),
    ];

    for (name, code) in cases {
        c.bench_with_input(BenchmarkId::new("sandbox_run", name), &code, |b, code| {
            let (port, mut receiver) = create_host_channel();
            rt.spawn(async move { while receiver.recv().await.is_some() {} });
            b.to_async(&rt).iter(|| async {
                let request = RunRequest {
                    run_id: 1,
                    language: Language::JavaScript,
                    code: code.clone(),
                };
                let instance = executor.launch(request, port.clone()).await.unwrap();
                let report = instance.join().await.unwrap();
                black_box(report.messages_posted);
            });
        });
    }
}

fn bench_relay_handle(c: &mut Criterion) {
    let console = Console::new();
    let tracker = Arc::new(RunTracker::new());
    let listener = RelayListener::new(console.clone(), tracker.clone());
    let run_id = tracker.begin_run();

    let current = ChannelMessage::new(run_id, MessageKind::Log, "x".repeat(64)).to_payload();
    let stale = ChannelMessage::new(run_id + 1, MessageKind::Log, "stale").to_payload();
    let foreign = serde_json::json!({ "foo": 1 });

    c.bench_function("relay_append", |b| {
        b.iter(|| {
            black_box(listener.handle(&current));
            console.clear();
        });
    });
    c.bench_function("relay_stale", |b| {
        b.iter(|| black_box(listener.handle(&stale)));
    });
    c.bench_function("relay_foreign", |b| {
        b.iter(|| black_box(listener.handle(&foreign)));
    });
}

criterion_group!(benches, bench_isolated_runs, bench_relay_handle);
criterion_main!(benches);
