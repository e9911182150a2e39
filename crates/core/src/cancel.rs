//! Cooperative cancellation for scan sessions.
//!
//! The controller holds one clone of the token and calls
//! [`CancellationToken::request`]; the worker polls
//! [`CancellationToken::is_requested`] between emissions. The flag is
//! monotonic: once set it stays set for the life of the token, so a fresh
//! session needs a fresh token.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared, monotonic abort signal.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    requested: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token in the not-requested state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the session to stop. Idempotent.
    #[inline]
    pub fn request(&self) {
        self.requested.store(true, Ordering::Release);
    }

    /// Non-blocking poll.
    #[inline]
    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }
}
