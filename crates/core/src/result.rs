//! Result type definition and extension traits.
//!
//! Provides combinators for Result types so callers can observe failures
//! without unwrap/expect/panic.

use crate::error::Error;

/// The standard Result type for journeysim operations.
///
/// # Examples
///
/// ```ignore
/// fn load() -> Result<RuleCatalog> {
///     let tasks = source.task_definitions("onboarding").await?;
///     RuleCatalog::new("onboarding", tasks)
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait providing safe combinators for Results.
pub trait ResultExt<T> {
    /// Inspect the error without consuming the Result.
    fn inspect_error<F: FnOnce(&Error)>(self, f: F) -> Self;
}

impl<T> ResultExt<T> for Result<T> {
    fn inspect_error<F: FnOnce(&Error)>(self, f: F) -> Self {
        if let Err(ref e) = self {
            f(e);
        }
        self
    }
}
