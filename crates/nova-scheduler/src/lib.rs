//! Cooperative cancellation for Nova's search pipeline.
//!
//! Long-running work (index builds, multi-project searches, remote calls)
//! polls a [`CancellationToken`] at its own boundaries and bails out with
//! [`Cancelled`]. CPU-heavy work is moved off the async runtime with
//! [`spawn_blocking`], whose handle stops waiting as soon as the token fires.

use std::fmt;

mod task;

pub use task::{spawn_blocking, BlockingTask};
pub use tokio_util::sync::CancellationToken;

/// Marker error: the caller's [`CancellationToken`] was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cancelled;

impl Cancelled {
    /// Returns `Err(Cancelled)` once `token` has been cancelled.
    #[inline]
    pub fn check(token: &CancellationToken) -> Result<(), Cancelled> {
        if token.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}

impl fmt::Display for Cancelled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("operation cancelled")
    }
}

impl std::error::Error for Cancelled {}

/// Failure of a task spawned through [`spawn_blocking`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskError {
    Cancelled,
    Panicked,
}

impl From<Cancelled> for TaskError {
    fn from(_: Cancelled) -> Self {
        TaskError::Cancelled
    }
}

impl fmt::Display for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskError::Cancelled => f.write_str("task cancelled"),
            TaskError::Panicked => f.write_str("task panicked"),
        }
    }
}

impl std::error::Error for TaskError {}
