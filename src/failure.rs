use std::{any::Any, backtrace::Backtrace};

use thiserror::Error;

/// A failure captured at the supervisor boundary.
#[derive(Error, Debug)]
pub enum Failure {
    /// The work returned `Err`.
    #[error(transparent)]
    Error(anyhow::Error),
    /// The work panicked.
    #[error("{message}")]
    Panic { message: String },
}

impl Failure {
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "Box<dyn Any>".to_string()
        };
        Self::Panic { message }
    }

    pub fn is_panic(&self) -> bool {
        matches!(self, Self::Panic { .. })
    }

    /// Returns the underlying error if it is of type `E`.
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: std::fmt::Display + std::fmt::Debug + Send + Sync + 'static,
    {
        match self {
            Self::Error(err) => err.downcast_ref::<E>(),
            Self::Panic { .. } => None,
        }
    }

    /// Renders the failure as a multi-line trace.
    ///
    /// Errors print their cause chain (and the backtrace anyhow captured, if
    /// enabled). Panics get a backtrace taken at the supervisor boundary, not
    /// at the panic site, which is `disabled` unless `RUST_BACKTRACE` is set.
    /// A captured panic still goes through the process panic hook first, so
    /// the default hook prints it to stderr.
    pub(crate) fn format_trace(&self) -> String {
        match self {
            Self::Error(err) => format!("error: {err:?}"),
            Self::Panic { message } => {
                let backtrace = Backtrace::capture();
                format!("panicked: {message}\n\nStack backtrace:\n{backtrace}")
            }
        }
    }
}

impl From<anyhow::Error> for Failure {
    fn from(err: anyhow::Error) -> Self {
        Self::Error(err)
    }
}
