//! core::cancel
//!
//! Cooperative cancellation for long-running scans.
//!
//! Every resolver entry point takes a `&Cancellation`. Commit listings and
//! worktree walks check it between entries; a cancelled request fails with
//! [`Cancelled`], which the error taxonomy carries as an ordinary error.
//!
//! # Example
//!
//! ```
//! use giterminism::core::cancel::Cancellation;
//!
//! let cancel = Cancellation::new();
//! let handle = cancel.clone();
//! assert!(cancel.check().is_ok());
//!
//! handle.cancel();
//! assert!(cancel.is_cancelled());
//! assert!(cancel.check().is_err());
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;

/// The request was cancelled by its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation cancelled")]
pub struct Cancelled;

/// A shareable cancellation flag.
///
/// Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    flag: Arc<AtomicBool>,
}

impl Cancellation {
    /// Create a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Fail with [`Cancelled`] if cancellation was requested.
    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_flag() {
        let a = Cancellation::new();
        let b = a.clone();
        b.cancel();
        assert!(a.is_cancelled());
        assert_eq!(a.check(), Err(Cancelled));
    }

    #[test]
    fn independent_tokens_do_not_interfere() {
        let a = Cancellation::new();
        let b = Cancellation::new();
        a.cancel();
        assert!(!b.is_cancelled());
    }
}
