//! Fatal internal-invariant failures
//! 
//! Corruption and logic bugs (unknown envelope tags, re-binding a program,
//! consolidating a non-coalescible type) are not caller-facing errors. They
//! are logged and then abort the current operation by panicking.

/// Report an internal invariant violation and panic.
#[macro_export]
macro_rules! fatal {
    ($($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::fatal::report(&message);
        panic!("internal invariant violated: {}", message)
    }};
}

#[doc(hidden)]
pub fn report(message: &str) {
    log::error!("internal invariant violated: {message}");
}
