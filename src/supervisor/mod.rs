pub(crate) mod decorate;
pub(crate) mod fallback;

use std::{future::Future, panic::AssertUnwindSafe, sync::Arc};

use futures::FutureExt;
use tokio::runtime::Handle;

use crate::{
    config::{self, CompletionHook, RetConfig},
    envelope::RetResp,
    macros::{debug, warning},
    task::{
        completion::Completion, event_loop::BackgroundLoop, ScheduledTask, SchedulerError, Work,
    },
    value::{Payload, Value},
};

use decorate::{AsyncRet, DefRet};
use fallback::{AsyncFallback, Fallback};

/// Runs work and turns every outcome into a [`RetResp`].
///
/// A `Supervisor` either pins its own [`RetConfig`] or follows the
/// process-wide one set through [`init`](crate::init). In the latter case the
/// configuration is loaded at dispatch time, so a swap made while work is
/// running is seen by that work's failure handling.
#[derive(Clone, Default)]
pub struct Supervisor {
    config: Option<Arc<RetConfig>>,
}

impl Supervisor {
    /// A supervisor reading the process-wide configuration.
    pub fn global() -> Self {
        Self { config: None }
    }

    /// A supervisor bound to `config`, ignoring the process-wide slot.
    pub fn with_config(config: RetConfig) -> Self {
        Self {
            config: Some(Arc::new(config)),
        }
    }

    pub(crate) fn config(&self) -> Arc<RetConfig> {
        match &self.config {
            Some(config) => Arc::clone(config),
            None => config::current(),
        }
    }

    /// Calls `func` and captures its outcome.
    ///
    /// Both `Err` returns and panics become a failed envelope; neither escapes.
    /// On failure the `on_error` hook runs first, then `fallback`, both on
    /// the calling thread. A panic inside either of those is not caught.
    pub fn run<F, T, E>(&self, func: F, fallback: &Fallback) -> RetResp
    where
        F: FnOnce() -> Result<T, E>,
        T: Payload,
        E: Into<anyhow::Error>,
    {
        let call = || -> Result<Value, anyhow::Error> {
            func().map(|v| Arc::new(v) as Value).map_err(Into::into)
        };
        let outcome = std::panic::catch_unwind(AssertUnwindSafe(call));
        let resp = RetResp::capture(outcome);
        if resp.failed() {
            let config = self.config();
            Self::report(&config, &resp);
            Self::dispatch_fallback(&config, fallback);
        }
        resp
    }

    /// Awaits `work` once and captures its outcome.
    ///
    /// Same contract as [`run`](Self::run). An [`AsyncFallback::Await`]
    /// continuation is awaited in place, and its own panics propagate.
    pub async fn run_async<Fut, T, E>(&self, work: Fut, fallback: &AsyncFallback) -> RetResp
    where
        Fut: Future<Output = Result<T, E>>,
        T: Payload,
        E: Into<anyhow::Error>,
    {
        let work = work.map(|res| -> Result<Value, anyhow::Error> {
            res.map(|v| Arc::new(v) as Value).map_err(Into::into)
        });
        self.supervise(work, fallback).await
    }

    pub(crate) async fn supervise<Fut>(&self, work: Fut, fallback: &AsyncFallback) -> RetResp
    where
        Fut: Future<Output = Result<Value, anyhow::Error>>,
    {
        let outcome = AssertUnwindSafe(work).catch_unwind().await;
        let resp = RetResp::capture(outcome);
        if resp.failed() {
            let config = self.config();
            Self::report(&config, &resp);
            match fallback {
                AsyncFallback::None => {}
                AsyncFallback::Sync(fallback) => Self::dispatch_fallback(&config, fallback),
                AsyncFallback::Await(make) => {
                    debug!("awaiting async fallback");
                    make().await;
                }
            }
        }
        resp
    }

    fn report(config: &RetConfig, resp: &RetResp) {
        warning!(failure = %resp.message(), "supervised work failed");
        if let Some(on_error) = config.on_error() {
            on_error(resp);
        }
    }

    fn dispatch_fallback(config: &RetConfig, fallback: &Fallback) {
        match fallback {
            Fallback::None => {}
            Fallback::Call { callback, args } => {
                debug!(args = args.len(), "invoking fallback callback");
                callback(args.as_slice());
            }
            Fallback::Args(args) => {
                if let Some(on_failure) = config.on_failure() {
                    debug!(args = args.len(), "forwarding fallback args to on_failure");
                    on_failure(args.as_slice());
                }
            }
        }
    }

    /// Wraps `func` so every call goes through [`run`](Self::run) with `fallback`.
    pub fn def_ret<F>(&self, fallback: Fallback, func: F) -> DefRet<F> {
        DefRet::new(self.clone(), fallback, func)
    }

    /// Wraps an async `func` so every call goes through
    /// [`run_async`](Self::run_async) with `fallback`.
    pub fn async_ret<F>(&self, fallback: impl Into<AsyncFallback>, func: F) -> AsyncRet<F> {
        AsyncRet::new(self.clone(), fallback.into(), func)
    }

    /// Schedules `work` without blocking.
    ///
    /// The runtime is picked in order: `runtime` if given, the runtime the
    /// calling thread is inside of, or a new single-threaded runtime started on
    /// its own thread. Only that last one is owned by the task, and it is
    /// stopped once the task completes.
    ///
    /// "Inside" means [`Handle::try_current`] succeeds, which includes a
    /// [`Runtime::enter`](tokio::runtime::Runtime::enter) guard. A
    /// multi-threaded runtime drives the task from its workers, but an entered
    /// current-thread runtime that nobody is blocking on never runs it. Pass
    /// `runtime` explicitly, or call from outside any runtime, in that case.
    pub fn create_task(
        &self,
        work: Work,
        callback: Option<CompletionHook>,
        runtime: Option<Handle>,
    ) -> Result<ScheduledTask, SchedulerError> {
        match runtime.or_else(|| Handle::try_current().ok()) {
            Some(handle) => Ok(self.schedule(work, callback, handle, None)),
            None => {
                let background = BackgroundLoop::spawn()?;
                let handle = background.handle().clone();
                Ok(self.schedule(work, callback, handle, Some(background)))
            }
        }
    }

    /// Runs `work` on a fresh background runtime and blocks until it is done.
    ///
    /// Every call starts its own runtime thread. There is no timeout: if
    /// `work` never settles, neither does this call.
    pub fn wait_task(
        &self,
        work: Work,
        callback: Option<CompletionHook>,
    ) -> Result<RetResp, SchedulerError> {
        let background = BackgroundLoop::spawn()?;
        let handle = background.handle().clone();
        self.schedule(work, callback, handle, Some(background)).wait()
    }

    fn schedule(
        &self,
        work: Work,
        callback: Option<CompletionHook>,
        handle: Handle,
        background: Option<BackgroundLoop>,
    ) -> ScheduledTask {
        let completion = Completion::new(
            callback,
            self.config().on_task_complete().cloned(),
            background.as_ref().map(BackgroundLoop::stopper),
        );
        let work = match work {
            Work::Supervised(work) => work,
            Work::Raw(work) => {
                let supervisor = self.clone();
                async move {
                    let fallback = AsyncFallback::None;
                    supervisor.supervise(work, &fallback).await
                }
                .boxed()
            }
        };
        debug!(
            background_owned = background.is_some(),
            "scheduling supervised task"
        );
        let join = handle.spawn(completion.settle(work));
        ScheduledTask::new(join, handle, background)
    }
}
