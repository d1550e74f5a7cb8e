//! Per-call deadlines and cancellation.
//!
//! Every network-facing `NorainaClient` method takes a `Context`. The remaining time
//! until its deadline becomes the request timeout, so a blocked call gives up
//! as soon as the deadline passes. A cancellable context can additionally be
//! cancelled from any thread holding a clone of it; the pending call then
//! returns `ApiError::Cancelled` without waiting for the server.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Default)]
pub struct Context {
    deadline: Option<Instant>,
    cancelled: Option<Arc<AtomicBool>>,
}

impl Context {
    /// A context without a deadline that cannot be cancelled.
    pub fn background() -> Self {
        Self::default()
    }

    /// A context without a deadline that can be cancelled.
    pub fn cancellable() -> Self {
        Self::background().with_cancellation()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            cancelled: None,
        }
    }

    /// Attach a fresh cancellation flag. Clones made afterwards share it.
    #[must_use]
    pub fn with_cancellation(mut self) -> Self {
        self.cancelled = Some(Arc::new(AtomicBool::new(false)));
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, `Some(ZERO)` once it has passed.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    pub fn is_expired(&self) -> bool {
        self.remaining() == Some(Duration::ZERO)
    }

    pub fn is_cancellable(&self) -> bool {
        self.cancelled.is_some()
    }

    /// Cancel every call bound to this context or its clones.
    ///
    /// Has no effect on a context built without cancellation.
    pub fn cancel(&self) {
        if let Some(flag) = &self.cancelled {
            flag.store(true, Ordering::SeqCst);
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }
}
