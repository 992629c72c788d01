//! Built-in JavaScript sandbox implementation using boa_engine.
//!
//! Provides an isolated execution environment with:
//! - A fresh context per run (nothing survives between runs)
//! - No document, storage, timers, network or module loader
//! - Console and error capture relayed to the host as tagged messages
//! - Exactly one `done` message per run

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::RwLock;

use boa_engine::{js_string, Context, JsNativeError, JsResult, JsValue, Source};

use xplayground_types::*;

use crate::hooks;
use crate::interceptor::{self, OutletGuard};
use crate::template;

/// Built-in sandbox configuration
#[derive(Clone, Debug)]
pub struct BuiltinSandboxConfig {
    /// Run settled promise jobs before posting `done`
    pub drain_jobs: bool,

    /// Source name handed to the global error hook
    pub script_name: String,
}

impl Default for BuiltinSandboxConfig {
    fn default() -> Self {
        Self {
            drain_jobs: true,
            script_name: "sandbox".into(),
        }
    }
}

/// Built-in JavaScript sandbox using boa_engine
pub struct BuiltinSandbox {
    config: BuiltinSandboxConfig,
    stats: Arc<RwLock<SandboxStats>>,
}

impl BuiltinSandbox {
    pub fn new(config: BuiltinSandboxConfig) -> Self {
        Self {
            config,
            stats: Arc::new(RwLock::new(SandboxStats::default())),
        }
    }

    pub fn config(&self) -> &BuiltinSandboxConfig {
        &self.config
    }
}

/// Run `code` to completion on the current thread.
///
/// Every failure is reported through the outlet; nothing is returned to the
/// caller except the run summary.
pub(crate) fn execute_isolated(
    config: &BuiltinSandboxConfig,
    run_id: RunId,
    code: &str,
    port: HostPort,
) -> RunReport {
    let start_time = Instant::now();
    let outlet = OutletGuard::bind(run_id, port);

    let mut uncaught = false;
    match fresh_context() {
        Ok(mut context) => {
            let script = template::render(code);
            if let Err(err) = context.eval(Source::from_bytes(&script)) {
                uncaught = true;
                let location = template::locate(&err.to_string());
                report_uncaught(&mut context, &outlet, &location, &config.script_name);
            }
            if config.drain_jobs {
                context.run_jobs();
            }
            for reason in hooks::take_unhandled(&mut context) {
                uncaught = true;
                let location = template::ErrorLocation {
                    message: format!("Uncaught (in promise) {}", reason),
                    line: 0,
                    column: 0,
                };
                report_uncaught(&mut context, &outlet, &location, &config.script_name);
            }
        }
        Err(err) => {
            uncaught = true;
            tracing::warn!(run_id, error = %err, "failed to prepare sandbox context");
            outlet.post(
                MessageKind::Error,
                format!("Sandbox setup failed: {}", err),
            );
        }
    }

    outlet.post(MessageKind::Done, DONE_MESSAGE);

    let summary = outlet.summary();
    let outcome = if uncaught {
        RunOutcome::Uncaught
    } else if summary.caught_throw {
        RunOutcome::Threw
    } else {
        RunOutcome::Completed
    };
    let execution_time = start_time.elapsed();
    tracing::debug!(
        run_id = outlet.run_id(),
        ?outcome,
        messages = summary.posted,
        elapsed_ms = execution_time.as_millis() as u64,
        "sandbox run finished"
    );

    RunReport {
        run_id,
        outcome,
        messages_posted: summary.posted,
        execution_time,
    }
}

/// A brand-new realm with the interceptor installed.
fn fresh_context() -> JsResult<Context> {
    hooks::reset();
    let mut context = Context::builder().host_hooks(&hooks::SANDBOX_HOOKS).build()?;
    interceptor::install(&mut context)?;
    Ok(context)
}

/// Route an error that escaped the user's code through the context's `onerror`.
fn report_uncaught(
    context: &mut Context,
    outlet: &OutletGuard,
    location: &template::ErrorLocation,
    script_name: &str,
) {
    if let Err(hook_err) = invoke_onerror(context, location, script_name) {
        tracing::debug!(error = %hook_err, "global error hook unavailable, reporting directly");
        outlet.post(
            MessageKind::Error,
            format!(
                "{} (at {}:{})",
                location.message, location.line, location.column
            ),
        );
    }
}

fn invoke_onerror(
    context: &mut Context,
    location: &template::ErrorLocation,
    script_name: &str,
) -> JsResult<()> {
    let handler = context
        .global_object()
        .get(js_string!("onerror"), context)?;
    let Some(callable) = handler.as_callable() else {
        return Err(JsNativeError::typ()
            .with_message("onerror is not callable")
            .into());
    };
    callable.call(
        &JsValue::undefined(),
        &[
            JsValue::from(js_string!(location.message.as_str())),
            JsValue::from(js_string!(script_name)),
            JsValue::from(location.line),
            JsValue::from(location.column),
            JsValue::null(),
        ],
        context,
    )?;
    Ok(())
}

#[async_trait::async_trait]
impl IsolatedExecutor for BuiltinSandbox {
    fn sandbox_type(&self) -> SandboxType {
        SandboxType::Builtin
    }

    fn supported_languages(&self) -> Vec<Language> {
        vec![Language::JavaScript]
    }

    async fn launch(
        &self,
        request: RunRequest,
        port: HostPort,
    ) -> Result<RunInstance, SandboxError> {
        // Validate language
        if request.language != Language::JavaScript {
            return Err(SandboxError::UnsupportedLanguage(request.language));
        }

        let run_id = request.run_id;
        let config = self.config.clone();
        let stats = self.stats.clone();
        tracing::debug!(run_id, bytes = request.code.len(), "launching sandbox run");

        // boa's Context is !Send; each run owns a detached thread that the
        // runtime never waits on.
        let (instance, completion) = RunInstance::pending(run_id);
        std::thread::Builder::new()
            .name(format!("sandbox-run-{}", run_id))
            .spawn(move || {
                let report = execute_isolated(&config, run_id, &request.code, port);
                stats.blocking_write().record(&report);
                completion.finish(report);
            })
            .map_err(|e| {
                SandboxError::InternalError(format!("Failed to start run thread: {}", e))
            })?;

        Ok(instance)
    }

    async fn stats(&self) -> SandboxStats {
        self.stats.read().await.clone()
    }
}

// ================================
// Tests
// ================================
