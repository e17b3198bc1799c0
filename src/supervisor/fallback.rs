use std::{future::Future, sync::Arc};

use futures::{future::BoxFuture, FutureExt};

use crate::{config::FailureHook, value::Value};

/// What to run after supervised work fails.
#[derive(Clone, Default)]
pub enum Fallback {
    /// Nothing beyond the `on_error` hook.
    #[default]
    None,
    /// Invoke `callback` with its own fixed `args`.
    Call {
        callback: FailureHook,
        args: Vec<Value>,
    },
    /// Forward `args` to the configured `on_failure` hook, if one is set.
    Args(Vec<Value>),
}

impl Fallback {
    pub fn call<F>(callback: F, args: Vec<Value>) -> Self
    where
        F: Fn(&[Value]) + Send + Sync + 'static,
    {
        Self::Call {
            callback: Arc::new(callback),
            args,
        }
    }

    pub fn args(args: Vec<Value>) -> Self {
        Self::Args(args)
    }
}

pub type AwaitFallbackFn = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// Continuation for asynchronous work: either a synchronous [`Fallback`] or a
/// future produced on demand and awaited in place.
#[derive(Clone, Default)]
pub enum AsyncFallback {
    #[default]
    None,
    Sync(Fallback),
    Await(AwaitFallbackFn),
}

impl AsyncFallback {
    /// Awaits the future returned by `make` after a failure.
    ///
    /// `make` is called once per failure.
    pub fn awaiting<F, Fut>(make: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self::Await(Arc::new(move || make().boxed()))
    }
}

impl From<Fallback> for AsyncFallback {
    fn from(fallback: Fallback) -> Self {
        match fallback {
            Fallback::None => Self::None,
            other => Self::Sync(other),
        }
    }
}
