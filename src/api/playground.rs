//! Host facade.
//!
//! A [`Playground`] owns one host channel for its whole lifetime. The relay
//! listener is subscribed on construction and stays subscribed until
//! [`Playground::shutdown`] (or drop), independent of how many runs happen.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;

use xplayground_types::{create_host_channel, HostPort, Language, RunId};

use crate::config::PlaygroundConfig;
use crate::controller::{RunController, RunDispatch, SourceDocument};
use crate::core::console::{Console, ConsoleEvent, ConsoleLog};
use crate::core::relay::{RelayListener, RelaySubscription, RunTracker};
use crate::error::{PlaygroundError, PlaygroundResult};
use crate::sandbox::SandboxManager;

pub struct Playground {
    config: PlaygroundConfig,
    controller: RunController,
    console: Console,
    tracker: Arc<RunTracker>,
    port: HostPort,
    sandboxes: Arc<SandboxManager>,
    subscription: Option<RelaySubscription>,
}

impl Playground {
    /// Build a playground with the built-in sandboxes. Must be called inside
    /// a tokio runtime.
    pub fn new(config: PlaygroundConfig) -> PlaygroundResult<Self> {
        config.validate()?;
        let sandboxes = SandboxManager::new(config.sandbox_manager_config());
        Ok(Self::with_sandboxes(config, sandboxes))
    }

    /// Build a playground around an existing sandbox registry.
    pub fn with_sandboxes(config: PlaygroundConfig, sandboxes: SandboxManager) -> Self {
        let sandboxes = Arc::new(sandboxes);
        let (port, receiver) = create_host_channel();
        let console = Console::new();
        let tracker = Arc::new(RunTracker::new());
        let subscription = RelayListener::new(console.clone(), tracker.clone()).subscribe(receiver);

        let document = SourceDocument::new(config.initial_code.clone(), config.default_language);
        let controller = RunController::new(
            document,
            sandboxes.clone(),
            port.clone(),
            console.clone(),
            tracker.clone(),
        );
        tracing::debug!(
            language = config.default_language.id(),
            "playground ready"
        );

        Self {
            config,
            controller,
            console,
            tracker,
            port,
            sandboxes,
            subscription: Some(subscription),
        }
    }

    pub fn config(&self) -> &PlaygroundConfig {
        &self.config
    }

    pub fn sandboxes(&self) -> &SandboxManager {
        &self.sandboxes
    }

    pub fn set_code(&mut self, text: impl Into<String>) {
        self.controller.set_code(text);
    }

    pub fn code(&self) -> &str {
        self.controller.code()
    }

    /// Restore the configured starter code.
    pub fn reset_code(&mut self) {
        let initial = self.config.initial_code.clone();
        self.controller.set_code(initial);
    }

    pub fn set_language(&mut self, language: Language) {
        self.controller.set_language(language);
    }

    pub fn language(&self) -> Language {
        self.controller.language()
    }

    /// Start a run of the current buffer without waiting for it.
    pub async fn run(&mut self) -> PlaygroundResult<RunDispatch> {
        if self.subscription.is_none() {
            return Err(PlaygroundError::Closed);
        }
        self.controller.run().await
    }

    /// Wait until `run_id` (or a run that replaced it) has posted `done`.
    pub async fn wait_for_run(&self, run_id: RunId, timeout: Duration) -> PlaygroundResult<()> {
        tokio::time::timeout(timeout, self.tracker.wait_finished(run_id))
            .await
            .map_err(|_| PlaygroundError::Timeout { run_id })
    }

    /// Run and wait for the run's `done` using the configured timeout.
    pub async fn run_and_wait(&mut self) -> PlaygroundResult<RunDispatch> {
        let dispatch = self.run().await?;
        if let RunDispatch::Started(run_id) = dispatch {
            self.wait_for_run(run_id, self.config.run_timeout()).await?;
        }
        Ok(dispatch)
    }

    pub fn clear_console(&self) {
        self.controller.clear();
    }

    /// Snapshot of the console log.
    pub fn console(&self) -> ConsoleLog {
        self.console.snapshot()
    }

    pub fn lines(&self) -> Vec<String> {
        self.console.lines()
    }

    /// Console panel text, numbered according to the configuration.
    pub fn render(&self) -> String {
        self.console.render(self.config.console.numbered)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ConsoleEvent> {
        self.console.subscribe()
    }

    /// Sender side of the host channel. Anything posted here goes through the
    /// same filtering as sandbox output.
    pub fn port(&self) -> HostPort {
        self.port.clone()
    }

    /// Id of the current run, `0` before the first run.
    pub fn current_run(&self) -> RunId {
        self.tracker.current()
    }

    pub fn is_listening(&self) -> bool {
        self.subscription
            .as_ref()
            .is_some_and(RelaySubscription::is_active)
    }

    /// Unsubscribe the relay listener. Later runs are refused.
    pub async fn shutdown(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe().await;
            tracing::debug!("playground shut down");
        }
    }
}
