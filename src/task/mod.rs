pub(crate) mod completion;
pub(crate) mod event_loop;

use std::{fmt, future::Future, sync::Arc};

use futures::{future::BoxFuture, FutureExt};
use thiserror::Error;
use tokio::{
    runtime::Handle,
    task::{JoinError, JoinHandle},
};

use crate::{
    envelope::RetResp,
    value::{Payload, Value},
};

use event_loop::BackgroundLoop;

/// Errors raised while placing work on a runtime or collecting its result.
///
/// Failures of the work itself never show up here; they are inside the
/// returned [`RetResp`].
#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("failed to build background runtime: {0}")]
    Runtime(#[source] std::io::Error),
    #[error("failed to spawn background loop thread: {0}")]
    Thread(#[source] std::io::Error),
    #[error("background loop thread panicked")]
    LoopPanicked,
    #[error("task was dropped before completing")]
    Cancelled,
}

/// A unit of asynchronous work handed to the scheduler.
pub enum Work {
    /// Plain work; the scheduler supervises it with no fallback.
    Raw(BoxFuture<'static, Result<Value, anyhow::Error>>),
    /// Work that already yields an envelope, e.g. from [`AsyncRet::task`](crate::AsyncRet::task).
    Supervised(BoxFuture<'static, RetResp>),
}

impl Work {
    pub fn raw<Fut, T, E>(work: Fut) -> Self
    where
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Payload,
        E: Into<anyhow::Error> + Send + 'static,
    {
        let work = work.map(|res| -> Result<Value, anyhow::Error> {
            res.map(|v| Arc::new(v) as Value).map_err(Into::into)
        });
        Self::Raw(work.boxed())
    }

    pub fn supervised<Fut>(work: Fut) -> Self
    where
        Fut: Future<Output = RetResp> + Send + 'static,
    {
        Self::Supervised(work.boxed())
    }

    pub fn is_supervised(&self) -> bool {
        matches!(self, Self::Supervised(_))
    }
}

impl fmt::Debug for Work {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Raw(_) => f.write_str("Work::Raw(..)"),
            Self::Supervised(_) => f.write_str("Work::Supervised(..)"),
        }
    }
}

/// Handle to work placed on a runtime by [`create_task`](crate::Supervisor::create_task).
///
/// Dropping it detaches the task; completion callbacks still fire and an
/// owned background runtime still stops on its own.
#[derive(Debug)]
pub struct ScheduledTask {
    join: JoinHandle<RetResp>,
    runtime: Handle,
    background: Option<BackgroundLoop>,
}

impl ScheduledTask {
    pub(crate) fn new(
        join: JoinHandle<RetResp>,
        runtime: Handle,
        background: Option<BackgroundLoop>,
    ) -> Self {
        Self {
            join,
            runtime,
            background,
        }
    }

    /// `true` when the task runs on a runtime this crate started for it.
    pub fn is_background_owned(&self) -> bool {
        self.background.is_some()
    }

    pub fn runtime(&self) -> &Handle {
        &self.runtime
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Waits for the envelope asynchronously.
    ///
    /// A panic raised by a fallback or a completion callback resumes here.
    pub async fn join(self) -> Result<RetResp, SchedulerError> {
        settle(self.join.await)
    }

    /// Blocks the calling thread until the envelope is available.
    ///
    /// For an owned background runtime this first waits for its thread to
    /// exit. Must not be called from inside the runtime the task runs on.
    pub fn wait(self) -> Result<RetResp, SchedulerError> {
        if let Some(background) = self.background {
            background.join()?;
        }
        settle(futures::executor::block_on(self.join))
    }
}

fn settle(res: Result<RetResp, JoinError>) -> Result<RetResp, SchedulerError> {
    match res {
        Ok(resp) => Ok(resp),
        Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
        Err(_) => Err(SchedulerError::Cancelled),
    }
}
