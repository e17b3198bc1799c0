pub(crate) mod builder;

use std::{
    fmt,
    sync::{Arc, LazyLock},
};

use arc_swap::ArcSwap;

use crate::{envelope::RetResp, value::Value};

pub use builder::RetConfigBuilder;

/// Receives the argument list of a [`Fallback::Args`](crate::Fallback::Args).
pub type FailureHook = Arc<dyn Fn(&[Value]) + Send + Sync>;
/// Receives the envelope of a finished scheduled task.
pub type CompletionHook = Arc<dyn Fn(&RetResp) + Send + Sync>;
/// Receives the envelope of every failed supervised call.
pub type ErrorHook = Arc<dyn Fn(&RetResp) + Send + Sync>;

/// The three optional hooks consulted by supervisors.
///
/// Cloning is shallow: the copy shares the same callbacks.
#[derive(Clone, Default)]
pub struct RetConfig {
    pub(crate) on_failure: Option<FailureHook>,
    pub(crate) on_task_complete: Option<CompletionHook>,
    pub(crate) on_error: Option<ErrorHook>,
}

impl RetConfig {
    pub fn builder() -> RetConfigBuilder {
        RetConfigBuilder::new()
    }

    pub fn on_failure(&self) -> Option<&FailureHook> {
        self.on_failure.as_ref()
    }

    pub fn on_task_complete(&self) -> Option<&CompletionHook> {
        self.on_task_complete.as_ref()
    }

    pub fn on_error(&self) -> Option<&ErrorHook> {
        self.on_error.as_ref()
    }
}

impl fmt::Debug for RetConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetConfig")
            .field("on_failure", &self.on_failure.is_some())
            .field("on_task_complete", &self.on_task_complete.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

static GLOBAL_CONFIG: LazyLock<ArcSwap<RetConfig>> =
    LazyLock::new(|| ArcSwap::from_pointee(RetConfig::default()));

/// Replaces the process-wide configuration.
///
/// Last writer wins. Calls already past their dispatch point keep the
/// snapshot they loaded; everything after sees the new value on any thread.
pub fn init(config: RetConfig) {
    GLOBAL_CONFIG.store(Arc::new(config));
}

/// Snapshot of the process-wide configuration.
pub fn current() -> Arc<RetConfig> {
    GLOBAL_CONFIG.load_full()
}
