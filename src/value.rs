use std::{any::Any, fmt, sync::Arc};

/// Anything a supervised call can hand back, or a fallback can receive.
///
/// Blanket-implemented for every `'static` type that is `Debug + Send + Sync`,
/// so callers never implement it by hand.
pub trait Payload: Any + fmt::Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;
}

impl<T> Payload for T
where
    T: Any + fmt::Debug + Send + Sync,
{
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl dyn Payload {
    /// Returns a reference to the inner value if it is of type `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        Payload::as_any(self).downcast_ref::<T>()
    }

    pub fn is<T: Any>(&self) -> bool {
        Payload::as_any(self).is::<T>()
    }
}

/// Shared, type-erased value.
pub type Value = Arc<dyn Payload>;

/// Erases `v` into a [`Value`].
pub fn value<T: Payload>(v: T) -> Value {
    Arc::new(v)
}

/// Builds a `Vec<Value>` argument list for a [`Fallback`](crate::Fallback).
///
/// ```rust
/// use ret_supervisor::args;
///
/// let args = args!["func", "failed"];
/// assert_eq!(args[1].downcast_ref::<&str>(), Some(&"failed"));
/// ```
#[macro_export]
macro_rules! args {
    ($($v:expr),* $(,)?) => {
        ::std::vec![$($crate::value($v)),*]
    };
}
