//! Error reporter for unscoped subscription failures.

use std::sync::atomic::{AtomicU64, Ordering};

use seatgate_core::Status;

/// Which subscription path produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorContext {
    Datapoint,
    Topic,
}

impl std::fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Datapoint => write!(f, "Datapoint"),
            Self::Topic => write!(f, "Topic"),
        }
    }
}

/// Logging sink; never alters control flow.
#[derive(Debug, Default)]
pub struct ErrorReporter {
    reported: AtomicU64,
}

impl ErrorReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&self, context: ErrorContext, source: &str, status: &Status) {
        self.reported.fetch_add(1, Ordering::Relaxed);
        tracing::error!(
            "{}: Error occurred during async invocation on {}: {}",
            context,
            source,
            status.error_message()
        );
    }

    /// Number of errors reported so far.
    pub fn reported(&self) -> u64 {
        self.reported.load(Ordering::Relaxed)
    }
}
