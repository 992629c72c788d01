//! Run controller: turns a "Run" action into a fresh sandboxed run.
//!
//! The controller does not track Idle/Running explicitly. A run is
//! fire-and-forget; its `done` entry in the console is informational only.

mod document;

pub use document::SourceDocument;

use std::sync::Arc;

use xplayground_types::{HostPort, Language, RunId, RunInstance, RunRequest};

use crate::core::console::{Console, LogEntry, LogKind};
use crate::core::relay::RunTracker;
use crate::error::PlaygroundResult;
use crate::sandbox::SandboxManager;

/// Result of a "Run" action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunDispatch {
    /// A fresh isolated run was launched.
    Started(RunId),
    /// The language has no sandbox; explanatory entries were logged instead.
    Unsupported(Language),
}

/// First entry logged when a language cannot run in the sandbox.
pub fn unsupported_notice(language: Language) -> String {
    format!("Running {} is not supported in the sandbox.", language.label())
}

/// Second entry logged when a language cannot run in the sandbox.
pub fn unsupported_hint(language: Language) -> String {
    format!(
        "For {} you can hook up a server-side executor (e.g. Judge0) or an in-process interpreter such as Pyodide for Python.",
        language.label()
    )
}

pub struct RunController {
    document: SourceDocument,
    sandboxes: Arc<SandboxManager>,
    port: HostPort,
    console: Console,
    tracker: Arc<RunTracker>,
    current: Option<RunInstance>,
}

impl RunController {
    pub fn new(
        document: SourceDocument,
        sandboxes: Arc<SandboxManager>,
        port: HostPort,
        console: Console,
        tracker: Arc<RunTracker>,
    ) -> Self {
        Self {
            document,
            sandboxes,
            port,
            console,
            tracker,
            current: None,
        }
    }

    pub fn document(&self) -> &SourceDocument {
        &self.document
    }

    pub fn set_code(&mut self, text: impl Into<String>) {
        self.document.set_text(text);
    }

    pub fn code(&self) -> &str {
        self.document.text()
    }

    pub fn set_language(&mut self, language: Language) {
        self.document.set_language(language);
    }

    pub fn language(&self) -> Language {
        self.document.language()
    }

    /// Run the current document.
    ///
    /// Languages without a registered sandbox never reach an executor; two
    /// explanatory entries are appended instead. Otherwise a new run id is
    /// made current and a brand-new isolated run is launched, replacing the
    /// previous run handle. If the launch fails, the previous run stays
    /// current and keeps its handle.
    pub async fn run(&mut self) -> PlaygroundResult<RunDispatch> {
        let language = self.document.language();
        let Some(executor) = self.sandboxes.executor_for(language) else {
            tracing::info!(language = language.id(), "no sandbox for language, run skipped");
            self.console
                .append(LogEntry::new(LogKind::Info, unsupported_notice(language)));
            self.console
                .append(LogEntry::new(LogKind::Hint, unsupported_hint(language)));
            return Ok(RunDispatch::Unsupported(language));
        };

        let previous_id = self.tracker.current();
        let run_id = self.tracker.begin_run();
        let request = RunRequest {
            run_id,
            language,
            code: self.document.text().to_string(),
        };
        let instance = match executor.launch(request, self.port.clone()).await {
            Ok(instance) => instance,
            Err(err) => {
                self.tracker.abandon_run(run_id, previous_id);
                tracing::warn!(
                    run_id,
                    language = language.id(),
                    error = %err,
                    "run failed to launch"
                );
                return Err(err.into());
            }
        };
        tracing::info!(run_id, language = language.id(), "run started");

        if let Some(previous) = self.current.replace(instance) {
            if !previous.is_finished() {
                tracing::debug!(
                    run_id = previous.run_id(),
                    "previous run still executing, orphaned"
                );
            }
        }
        Ok(RunDispatch::Started(run_id))
    }

    /// Reset the console. Runs and the relay subscription are unaffected.
    pub fn clear(&self) {
        self.console.clear();
    }

    /// Id of the most recently launched run.
    pub fn current_run(&self) -> Option<RunId> {
        self.current.as_ref().map(RunInstance::run_id)
    }

    /// Take the handle of the most recent run, e.g. to join it.
    pub fn take_current(&mut self) -> Option<RunInstance> {
        self.current.take()
    }
}
