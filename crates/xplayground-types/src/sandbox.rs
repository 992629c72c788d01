use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::channel::HostPort;
use crate::relay::RunId;

// ================================
// IsolatedExecutor Trait
// ================================

/// An execution environment that runs user code with no access to the host.
///
/// Every call to [`launch`](IsolatedExecutor::launch) must construct a brand-new
/// context; nothing may carry over from earlier runs. The executor reports
/// output only through the given [`HostPort`], tagging each message with the
/// request's run id, and posts exactly one `done` message per launched run.
#[async_trait::async_trait]
pub trait IsolatedExecutor: Send + Sync {
    /// Sandbox type identifier
    fn sandbox_type(&self) -> SandboxType;

    /// Languages this executor can run
    fn supported_languages(&self) -> Vec<Language>;

    /// Start a run and return without waiting for it.
    ///
    /// # Returns
    /// - `Ok(RunInstance)`: the run was started; its output arrives on `port`
    /// - `Err(SandboxError)`: nothing was started and nothing will be posted
    async fn launch(&self, request: RunRequest, port: HostPort)
        -> Result<RunInstance, SandboxError>;

    /// Aggregate statistics over finished runs
    async fn stats(&self) -> SandboxStats {
        SandboxStats::default()
    }
}

// ================================
// Enums
// ================================

/// Sandbox type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SandboxType {
    /// In-process JavaScript interpreter
    Builtin,
    /// Executor living outside the host process
    Remote,
}

/// Languages offered by the playground's language selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    #[serde(alias = "js")]
    JavaScript,
    #[serde(alias = "py")]
    Python,
    Java,
    #[serde(alias = "c++")]
    Cpp,
}

impl Language {
    pub const ALL: [Language; 4] = [
        Language::JavaScript,
        Language::Python,
        Language::Java,
        Language::Cpp,
    ];

    /// Stable identifier, e.g. `cpp`.
    pub fn id(&self) -> &'static str {
        match self {
            Language::JavaScript => "javascript",
            Language::Python => "python",
            Language::Java => "java",
            Language::Cpp => "cpp",
        }
    }

    /// Display label, e.g. `C++`.
    pub fn label(&self) -> &'static str {
        match self {
            Language::JavaScript => "JavaScript",
            Language::Python => "Python",
            Language::Java => "Java",
            Language::Cpp => "C++",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Language {
    type Err = SandboxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        match wanted.as_str() {
            "js" => return Ok(Language::JavaScript),
            "py" => return Ok(Language::Python),
            _ => {}
        }
        Language::ALL
            .into_iter()
            .find(|lang| lang.id() == wanted || lang.label().to_ascii_lowercase() == wanted)
            .ok_or_else(|| SandboxError::UnknownLanguage(s.to_string()))
    }
}

/// How a run ended, from the executor's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The script body ran to its end.
    Completed,
    /// The script threw and the throw was caught inside the context.
    Threw,
    /// Evaluation failed outside the script's own control flow (syntax
    /// errors, engine failures) and went through the global error hook.
    Uncaught,
}

// ================================
// Request / Handle / Stats
// ================================

/// One run to launch.
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// Id stamped on every message of the run
    pub run_id: RunId,

    /// Programming language
    pub language: Language,

    /// Source text, embedded verbatim
    pub code: String,
}

/// Summary produced by a run once it has posted its `done` message.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: RunId,
    pub outcome: RunOutcome,
    /// Messages posted, including `done`
    pub messages_posted: usize,
    pub execution_time: Duration,
}

/// Host-side handle to a launched run.
///
/// Dropping the handle orphans the run: it keeps executing and posting, but
/// nothing waits for it any more.
#[derive(Debug)]
pub struct RunInstance {
    run_id: RunId,
    report: oneshot::Receiver<RunReport>,
}

/// Executor-side half of a [`RunInstance`]. The run's worker hands its
/// report back through it once `done` has been posted.
#[derive(Debug)]
pub struct RunCompletion {
    sender: oneshot::Sender<RunReport>,
}

impl RunCompletion {
    pub fn finish(self, report: RunReport) {
        // The host may have dropped its handle already
        let _ = self.sender.send(report);
    }
}

impl RunInstance {
    /// A handle for `run_id` and the completion its worker must finish.
    pub fn pending(run_id: RunId) -> (Self, RunCompletion) {
        let (sender, report) = oneshot::channel();
        (Self { run_id, report }, RunCompletion { sender })
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Whether the run has handed back its report.
    pub fn is_finished(&self) -> bool {
        !self.report.is_empty()
    }

    /// Wait for the run's worker to finish.
    pub async fn join(self) -> Result<RunReport, SandboxError> {
        let run_id = self.run_id;
        self.report.await.map_err(|_| {
            SandboxError::InternalError(format!("run {} ended without a report", run_id))
        })
    }
}

/// Sandbox statistics
#[derive(Debug, Clone, Default)]
pub struct SandboxStats {
    /// Total runs finished
    pub total_runs: u64,

    /// Runs whose script body completed
    pub completed_runs: u64,

    /// Runs that threw or failed to evaluate
    pub faulted_runs: u64,

    /// Average run time
    pub avg_execution_time: Duration,
}

impl SandboxStats {
    /// Fold one finished run into the running averages.
    pub fn record(&mut self, report: &RunReport) {
        self.total_runs += 1;
        match report.outcome {
            RunOutcome::Completed => self.completed_runs += 1,
            RunOutcome::Threw | RunOutcome::Uncaught => self.faulted_runs += 1,
        }
        if self.total_runs == 1 {
            self.avg_execution_time = report.execution_time;
        } else {
            let total_ns = self.avg_execution_time.as_nanos() as u64 * (self.total_runs - 1)
                + report.execution_time.as_nanos() as u64;
            self.avg_execution_time = Duration::from_nanos(total_ns / self.total_runs);
        }
    }
}

// ================================
// Errors
// ================================

/// Sandbox errors
#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(Language),

    #[error("Unknown language: {0}")]
    UnknownLanguage(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}
