//! Abort and cancellation signal
//!
//! Cancellation is cooperative: translated code polls [`AbortSignal::check`]
//! after every action call. The flag can be raised from any thread holding a
//! clone of the signal.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tracing::debug;

use crate::bridge::error::{BridgeError, BridgeResult};

/// Why a script instance was aborted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    /// The host reported failure from an action service.
    ActionFailed,
    /// The cancellation flag was raised.
    Cancelled,
}

impl fmt::Display for AbortReason {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            AbortReason::ActionFailed => write!(f, "action service invocation failed"),
            AbortReason::Cancelled => write!(f, "cancellation requested"),
        }
    }
}

#[derive(Debug, Default)]
struct AbortState {
    requested: AtomicBool,
    requests: AtomicU64,
}

/// Shared cancellation flag for one script instance.
#[derive(Debug, Clone, Default)]
pub struct AbortSignal {
    state: Arc<AbortState>,
}

impl AbortSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the cancellation flag.
    pub fn request(&self) {
        self.state.requested.store(true, Ordering::SeqCst);
        self.state.requests.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_requested(&self) -> bool {
        self.state.requested.load(Ordering::SeqCst)
    }

    /// Lower the flag.
    pub fn clear(&self) {
        self.state.requested.store(false, Ordering::SeqCst);
    }

    /// Total number of requests ever made.
    pub fn request_count(&self) -> u64 {
        self.state.requests.load(Ordering::Relaxed)
    }

    /// Convert a failed action or a raised flag into `AbortRequested`.
    pub fn check(
        &self,
        action_succeeded: bool,
    ) -> BridgeResult<()> {
        let reason = if !action_succeeded {
            AbortReason::ActionFailed
        } else if self.is_requested() {
            AbortReason::Cancelled
        } else {
            return Ok(());
        };
        debug!("script abort: {}", reason);
        Err(BridgeError::AbortRequested(reason))
    }
}

#[cfg(test)]
mod tests;
