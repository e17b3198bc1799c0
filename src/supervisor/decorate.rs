use std::future::Future;

use futures::FutureExt;

use crate::{
    envelope::RetResp,
    supervisor::{
        fallback::{AsyncFallback, Fallback},
        Supervisor,
    },
    task::Work,
    value::Payload,
};

/// A synchronous function bound to a supervisor and a fixed fallback.
///
/// Calling it never returns an error or unwinds from the wrapped function;
/// the outcome always comes back as a [`RetResp`].
#[derive(Clone)]
pub struct DefRet<F> {
    supervisor: Supervisor,
    fallback: Fallback,
    func: F,
}

impl<F> DefRet<F> {
    pub(crate) fn new(supervisor: Supervisor, fallback: Fallback, func: F) -> Self {
        Self {
            supervisor,
            fallback,
            func,
        }
    }

    /// Calls the wrapped function with `args`.
    ///
    /// Several arguments are passed as a tuple.
    pub fn call<A, T, E>(&self, args: A) -> RetResp
    where
        F: Fn(A) -> Result<T, E>,
        T: Payload,
        E: Into<anyhow::Error>,
    {
        self.supervisor.run(|| (self.func)(args), &self.fallback)
    }
}

/// An async function bound to a supervisor and a fixed fallback.
#[derive(Clone)]
pub struct AsyncRet<F> {
    supervisor: Supervisor,
    fallback: AsyncFallback,
    func: F,
}

impl<F> AsyncRet<F> {
    pub(crate) fn new(supervisor: Supervisor, fallback: AsyncFallback, func: F) -> Self {
        Self {
            supervisor,
            fallback,
            func,
        }
    }

    /// Calls the wrapped function with `args` and awaits its result.
    pub async fn call<A, Fut, T, E>(&self, args: A) -> RetResp
    where
        F: Fn(A) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        T: Payload,
        E: Into<anyhow::Error>,
    {
        self.supervisor
            .run_async((self.func)(args), &self.fallback)
            .await
    }

    /// Turns one call into schedulable [`Work`].
    ///
    /// The result is already supervised, so the scheduler runs it as is with
    /// this wrapper's fallback instead of wrapping it again.
    pub fn task<A, Fut, T, E>(&self, args: A) -> Work
    where
        F: Fn(A) -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Payload,
        E: Into<anyhow::Error> + Send + 'static,
    {
        let supervisor = self.supervisor.clone();
        let fallback = self.fallback.clone();
        let work = (self.func)(args);
        Work::Supervised(async move { supervisor.run_async(work, &fallback).await }.boxed())
    }
}
