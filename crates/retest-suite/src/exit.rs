//! Cooperative shutdown flag

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct ExitState {
    requested: AtomicBool,
    acknowledged: AtomicBool,
}

/// Process-wide shutdown request.
///
/// Setting the flag never interrupts a running worker; the pipeline stops
/// launching new work, drains what is running and then acknowledges.
#[derive(Debug, Clone, Default)]
pub struct ExitHandler {
    state: Arc<ExitState>,
}

impl ExitHandler {
    /// New handler with the flag cleared
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the pipeline to stop
    pub fn request_exit(&self) {
        self.state.requested.store(true, Ordering::SeqCst);
    }

    /// Whether a stop was requested
    pub fn should_exit(&self) -> bool {
        self.state.requested.load(Ordering::SeqCst)
    }

    /// Called by the pipeline once in-flight work has drained
    pub fn could_exit(&self) {
        self.state.acknowledged.store(true, Ordering::SeqCst);
    }

    /// Whether the pipeline has drained after a stop request
    pub fn acknowledged(&self) -> bool {
        self.state.acknowledged.load(Ordering::SeqCst)
    }
}
