use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use crate::{config::CompletionHook, envelope::RetResp, macros::debug};

/// Completion metadata for one scheduled task, fixed at scheduling time.
pub(crate) struct Completion {
    callback: Option<CompletionHook>,
    configured: Option<CompletionHook>,
    stop: Option<CancellationToken>,
}

impl Completion {
    pub(crate) fn new(
        callback: Option<CompletionHook>,
        configured: Option<CompletionHook>,
        stop: Option<CancellationToken>,
    ) -> Self {
        Self {
            callback,
            configured,
            stop,
        }
    }

    /// Drives `work` to completion, then dispatches exactly once: caller
    /// callback, configured callback, then the stop request for an owned loop.
    ///
    /// The stop request is tied to a guard, so an owned loop is stopped even
    /// when `work` or a callback panics.
    pub(crate) async fn settle(self, work: BoxFuture<'static, RetResp>) -> RetResp {
        let Self {
            callback,
            configured,
            stop,
        } = self;
        let _stop = StopOnDrop(stop);

        let resp = work.await;
        debug!(succeeded = resp.succeeded(), "scheduled task settled");
        if let Some(callback) = callback {
            callback(&resp);
        }
        if let Some(configured) = configured {
            configured(&resp);
        }
        resp
    }
}

struct StopOnDrop(Option<CancellationToken>);

impl Drop for StopOnDrop {
    fn drop(&mut self) {
        if let Some(token) = self.0.take() {
            debug!("requesting background loop stop");
            token.cancel();
        }
    }
}
