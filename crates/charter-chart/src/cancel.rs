//! Cooperative cancellation of a running chart pipeline
//!
//! The pipeline runs synchronously on a blocking thread, so it cannot be
//! aborted from the outside. It checks a [`CancelFlag`] before every stage
//! transition instead and stops there once the flag is raised.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared flag raised when the pipeline's owner gives up on it
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Guard raising the flag when dropped
    ///
    /// Hold it in the future awaiting the pipeline: if that future is
    /// dropped (e.g. by a timeout), the pipeline stops at its next stage.
    pub fn drop_guard(&self) -> CancelGuard {
        CancelGuard(self.clone())
    }
}

#[derive(Debug)]
pub struct CancelGuard(CancelFlag);

impl Drop for CancelGuard {
    fn drop(&mut self) {
        self.0.cancel();
    }
}
