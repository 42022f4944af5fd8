//! Correlation-id bookkeeping
//!
//! Maps a backend correlation id to the region-tree node of the host call
//! that launched the work. Written by the host-call interceptor, consumed
//! (read + erase) by the activity flusher, which may run on a different
//! thread. This is the only shared mutable state in the tracer.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use roclens_shared::types::activity::CorrelationId;

use crate::framework::NodeId;

/// Thread-safe correlation id → context node map.
///
/// The mutex is held only for the map operation itself; callers build
/// records and emit them outside the lock.
#[derive(Debug, Default)]
pub struct CorrelationStore {
    map: Mutex<HashMap<CorrelationId, NodeId>>,
}

impl CorrelationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a correlation entry. A repeated id before the first entry is
    /// consumed is a backend anomaly; the later insert overwrites silently.
    pub fn store(&self, id: CorrelationId, node: NodeId) {
        self.lock().insert(id, node);
    }

    /// Look up and remove the entry for `id`. Returns `None` if it was
    /// never stored or was already taken; that is an expected outcome, the
    /// matching host call may not have been recorded.
    pub fn take(&self, id: CorrelationId) -> Option<NodeId> {
        self.lock().remove(&id)
    }

    /// Number of pending (stored, not yet taken) entries.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<CorrelationId, NodeId>> {
        // No code path panics while holding the lock; recover rather than
        // poison the whole trace stream.
        self.map.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
