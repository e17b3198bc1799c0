use std::sync::Arc;

use crate::{config::RetConfig, envelope::RetResp, value::Value};

/// Builds a `RetConfig`.
///
/// Every hook is optional; an unset hook is simply skipped at dispatch time.
#[derive(Default)]
pub struct RetConfigBuilder {
    config: RetConfig,
}

impl RetConfigBuilder {
    /// Creates a builder with no hooks set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the hook that receives the argument list of a `Fallback::Args`
    /// continuation when supervised work fails.
    pub fn with_on_failure<F>(mut self, hook: F) -> Self
    where
        F: Fn(&[Value]) + Send + Sync + 'static,
    {
        self.config.on_failure = Some(Arc::new(hook));
        self
    }

    /// Sets the hook invoked with the envelope of every scheduled task once it
    /// completes, after the caller's own callback.
    pub fn with_on_task_complete<F>(mut self, hook: F) -> Self
    where
        F: Fn(&RetResp) + Send + Sync + 'static,
    {
        self.config.on_task_complete = Some(Arc::new(hook));
        self
    }

    /// Sets the hook invoked with the full envelope of every failed call,
    /// before any fallback runs.
    pub fn with_on_error<F>(mut self, hook: F) -> Self
    where
        F: Fn(&RetResp) + Send + Sync + 'static,
    {
        self.config.on_error = Some(Arc::new(hook));
        self
    }

    /// Constructs the `RetConfig`.
    pub fn build(self) -> RetConfig {
        self.config
    }
}
