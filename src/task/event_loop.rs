use std::{
    sync::atomic::{AtomicUsize, Ordering},
    thread,
};

use tokio::runtime::{Builder, Handle};
use tokio_util::sync::CancellationToken;

use crate::{macros::debug, task::SchedulerError};

/// Name prefix of every background loop thread.
pub const LOOP_THREAD_PREFIX: &str = "ret-loop";

static NEXT_LOOP_ID: AtomicUsize = AtomicUsize::new(0);

/// A single-threaded runtime running on a dedicated thread until stopped.
#[derive(Debug)]
pub(crate) struct BackgroundLoop {
    handle: Handle,
    stop: CancellationToken,
    thread: thread::JoinHandle<()>,
}

impl BackgroundLoop {
    /// Builds the runtime and starts it right away, so work can be spawned
    /// onto it from any thread through [`handle`](Self::handle).
    pub(crate) fn spawn() -> Result<Self, SchedulerError> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(SchedulerError::Runtime)?;
        let handle = runtime.handle().clone();
        let stop = CancellationToken::new();
        let stopped = stop.clone();

        let id = NEXT_LOOP_ID.fetch_add(1, Ordering::Relaxed);
        let thread = thread::Builder::new()
            .name(format!("{LOOP_THREAD_PREFIX}-{id}"))
            .spawn(move || {
                runtime.block_on(stopped.cancelled());
                debug!(loop_id = id, "background loop stopped");
            })
            .map_err(SchedulerError::Thread)?;
        debug!(loop_id = id, "background loop started");

        Ok(Self {
            handle,
            stop,
            thread,
        })
    }

    pub(crate) fn handle(&self) -> &Handle {
        &self.handle
    }

    /// Thread-safe stop request; cancelling it ends the loop's run.
    pub(crate) fn stopper(&self) -> CancellationToken {
        self.stop.clone()
    }

    /// Blocks until the loop thread has exited.
    pub(crate) fn join(self) -> Result<(), SchedulerError> {
        self.thread.join().map_err(|_| SchedulerError::LoopPanicked)
    }
}
