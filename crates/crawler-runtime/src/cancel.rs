//! Cooperative cancellation shared between the control thread and whoever
//! may ask it to stop (a Ctrl-C handler, a supervising test, an operator).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cloneable stop flag checked once per control tick.
///
/// ```rust
/// use crawler_runtime::CancelToken;
///
/// let token = CancelToken::new();
/// let handle = token.clone();
/// handle.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing flag, e.g. one already owned by a signal handler.
    pub fn from_flag(flag: Arc<AtomicBool>) -> Self {
        Self(flag)
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clear a previous request so the next primitive may run.
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
