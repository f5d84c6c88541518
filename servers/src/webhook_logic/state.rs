use std::sync::Arc;

use lib_common::{BoundedSignalBuffer, SignalStore};

/// # Application State
///
/// Holds all shared state required by the webhook server's routes.
///
/// The state is explicitly constructed at startup and injected into handlers
/// via Axum's `State` extractor; there are no ambient globals, so tests can
/// spin up isolated instances freely.
#[derive(Clone)]
pub struct AppState {
    /// The bounded in-memory buffer. The single source of truth for queued
    /// signals and the only component with concurrency guarantees.
    pub buffer: Arc<BoundedSignalBuffer>,
    /// Optional persistence mirror (Redis list or JSON file). Writes to it
    /// are best-effort; a mirror failure never fails the webhook request.
    pub mirror: Option<Arc<dyn SignalStore>>,
}

impl AppState {
    /// Creates a state with a fresh buffer of the given capacity and no
    /// persistence mirror.
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: Arc::new(BoundedSignalBuffer::with_capacity(capacity)),
            mirror: None,
        }
    }

    /// Attaches a persistence mirror.
    pub fn with_mirror(mut self, mirror: Arc<dyn SignalStore>) -> Self {
        self.mirror = Some(mirror);
        self
    }
}
