//! # 🛟 ret-supervisor
//!
//! `ret-supervisor` runs work under a supervisor that never lets it fail loudly.
//! Every call, sync or async, returns a [`RetResp`] envelope: whether it
//! succeeded, the captured failure and its trace, and the returned value.
//! Failures are routed through configurable hooks, and async work can be
//! scheduled on an ambient Tokio runtime or on a background one started just
//! for it.
//!
//! ## Install
//!
//! ```bash
//! cargo add ret-supervisor
//! ```
//!
//! ## Quick example
//!
//! ```rust
//! use ret_supervisor::{args, def_ret, Fallback, Value};
//!
//! let fallback = Fallback::call(
//!     |args: &[Value]| eprintln!("fallback: {args:?}"),
//!     args!["parse", "failed"],
//! );
//! let parse = def_ret(fallback, |input: &str| input.parse::<u32>());
//!
//! let ok = parse.call("42");
//! assert!(ok.succeeded());
//! assert_eq!(ok.payload::<u32>(), Some(42));
//!
//! let bad = parse.call("forty-two"); // fallback prints ["parse", "failed"]
//! assert!(bad.failed());
//! assert!(bad.trace().is_some());
//! ```
//!
//! ## What you get
//!
//! * **Uniform envelopes** – `Err` returns and panics both become a failed [`RetResp`].
//! * **Failure hooks** – `on_error` sees every failed envelope, fallbacks run right after.
//! * **Scheduling** – [`create_task`] reuses the current runtime or starts a background one,
//!   [`wait_task`] blocks a synchronous caller until async work is done.
//!
//! ## API overview
//!
//! | Function                         | Purpose                                                  |
//! | -------------------------------- | -------------------------------------------------------- |
//! | `init(config)`                   | Replace the process-wide [`RetConfig`]                   |
//! | `run(func, &fallback)`           | Call `func`, capture its outcome                         |
//! | `run_async(fut, &fallback)`      | Await `fut`, capture its outcome                         |
//! | `def_ret(fallback, func)`        | Bind a function to a fallback                            |
//! | `async_ret(fallback, func)`      | Bind an async function to a fallback                     |
//! | `create_task(work, cb, runtime)` | Schedule work without blocking, returns [`ScheduledTask`] |
//! | `wait_task(work, cb)`            | Run work on a fresh background runtime and block for it  |
//!
//! Build a [`Supervisor`] with [`Supervisor::with_config`] to pass configuration
//! explicitly instead of using the process-wide slot.
//!
//! ## License
//!
//! [MIT](./LICENSE)

use std::future::Future;

use tokio::runtime::Handle;

pub use config::{
    current, init, CompletionHook, ErrorHook, FailureHook, RetConfig, RetConfigBuilder,
};
pub use envelope::{Field, FieldError, FieldValue, Message, RetResp};
pub use failure::Failure;
pub use supervisor::{
    decorate::{AsyncRet, DefRet},
    fallback::{AsyncFallback, AwaitFallbackFn, Fallback},
    Supervisor,
};
pub use task::{event_loop::LOOP_THREAD_PREFIX, ScheduledTask, SchedulerError, Work};
pub use value::{value, Payload, Value};

mod config;
mod envelope;
mod failure;
mod macros;
mod supervisor;
mod task;
mod value;

/// [`Supervisor::run`] with the process-wide configuration.
pub fn run<F, T, E>(func: F, fallback: &Fallback) -> RetResp
where
    F: FnOnce() -> Result<T, E>,
    T: Payload,
    E: Into<anyhow::Error>,
{
    Supervisor::global().run(func, fallback)
}

/// [`Supervisor::run_async`] with the process-wide configuration.
pub async fn run_async<Fut, T, E>(work: Fut, fallback: &AsyncFallback) -> RetResp
where
    Fut: Future<Output = Result<T, E>>,
    T: Payload,
    E: Into<anyhow::Error>,
{
    Supervisor::global().run_async(work, fallback).await
}

/// [`Supervisor::def_ret`] with the process-wide configuration.
pub fn def_ret<F>(fallback: Fallback, func: F) -> DefRet<F> {
    Supervisor::global().def_ret(fallback, func)
}

/// [`Supervisor::async_ret`] with the process-wide configuration.
pub fn async_ret<F>(fallback: impl Into<AsyncFallback>, func: F) -> AsyncRet<F> {
    Supervisor::global().async_ret(fallback, func)
}

/// [`Supervisor::create_task`] with the process-wide configuration.
pub fn create_task(
    work: Work,
    callback: Option<CompletionHook>,
    runtime: Option<Handle>,
) -> Result<ScheduledTask, SchedulerError> {
    Supervisor::global().create_task(work, callback, runtime)
}

/// [`Supervisor::wait_task`] with the process-wide configuration.
pub fn wait_task(work: Work, callback: Option<CompletionHook>) -> Result<RetResp, SchedulerError> {
    Supervisor::global().wait_task(work, callback)
}
