// Logging shims: forward to `tracing` with the `with_tracing` feature, vanish otherwise.

macro_rules! debug {
    ($($arg:tt)*) => {
        #[cfg(feature = "with_tracing")]
        ::tracing::debug!($($arg)*);
    };
}

macro_rules! warning {
    ($($arg:tt)*) => {
        #[cfg(feature = "with_tracing")]
        ::tracing::warn!($($arg)*);
    };
}

pub(crate) use debug;
pub(crate) use warning;
