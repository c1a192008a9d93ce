//! Utility macros used across the crate.

/// Returns early with an error if a condition is not met.
///
/// Like `assert!`, but returns `Err($error)` instead of panicking.
///
/// # Example
///
/// ```ignore
/// ensure!(matches!(*observed, StreamState::Open), StreamError::invalid_state(StreamStateKind::Open, observed.kind()));
/// ```
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;
