use std::collections::HashMap;
use std::sync::Arc;

use xplayground_types::{IsolatedExecutor, Language, SandboxError};

#[cfg(feature = "builtin-sandbox-js")]
use super::BuiltinSandboxConfig;

/// Sandbox manager configuration
#[derive(Clone, Debug, Default)]
pub struct SandboxManagerConfig {
    /// Built-in sandbox configuration
    #[cfg(feature = "builtin-sandbox-js")]
    pub builtin_config: BuiltinSandboxConfig,
}

/// Sandbox manager - decides which languages can run and where
pub struct SandboxManager {
    /// Executors registered by language
    sandboxes: HashMap<Language, Arc<dyn IsolatedExecutor>>,

    #[allow(dead_code)]
    config: SandboxManagerConfig,
}

impl SandboxManager {
    /// Create a manager with the built-in executors registered
    pub fn new(config: SandboxManagerConfig) -> Self {
        #[allow(unused_mut)]
        let mut manager = Self::new_empty(config);

        #[cfg(feature = "builtin-sandbox-js")]
        {
            let sandbox = Arc::new(super::BuiltinSandbox::new(
                manager.config.builtin_config.clone(),
            )) as Arc<dyn IsolatedExecutor>;
            manager
                .sandboxes
                .insert(Language::JavaScript, sandbox);
        }

        manager
    }

    /// Create a manager without any executor
    pub fn new_empty(config: SandboxManagerConfig) -> Self {
        Self {
            sandboxes: HashMap::new(),
            config,
        }
    }

    /// Register an executor for `language`, replacing any previous one
    pub fn register_sandbox(
        &mut self,
        language: Language,
        sandbox: Arc<dyn IsolatedExecutor>,
    ) -> Result<(), SandboxError> {
        if !sandbox.supported_languages().contains(&language) {
            return Err(SandboxError::UnsupportedLanguage(language));
        }
        tracing::debug!(
            language = language.id(),
            sandbox_type = ?sandbox.sandbox_type(),
            "sandbox registered"
        );
        self.sandboxes.insert(language, sandbox);
        Ok(())
    }

    pub fn executor_for(&self, language: Language) -> Option<Arc<dyn IsolatedExecutor>> {
        self.sandboxes.get(&language).cloned()
    }

    pub fn is_sandboxed(&self, language: Language) -> bool {
        self.sandboxes.contains_key(&language)
    }

    /// Every selectable language with its sandbox availability, in display order
    pub fn languages(&self) -> Vec<(Language, bool)> {
        Language::ALL
            .iter()
            .map(|language| (*language, self.is_sandboxed(*language)))
            .collect()
    }
}
