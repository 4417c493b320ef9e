// ==========================================
// Mission Match Engine - Per-Mission Lock Registry
// ==========================================
// Serializes mutating operations on one mission (dispatch, respond,
// confirm, expire, cancel, complete). Locks are created lazily per
// mission id; work on different missions never contends. The SQL
// status compare-and-set stays in place as the second line of defense.
// ==========================================

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub struct MissionLocks {
    registry: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl MissionLocks {
    pub fn new() -> Self {
        Self {
            registry: Mutex::new(HashMap::new()),
        }
    }

    /// Handle for the mission's lock, created on first use. Callers
    /// hold the returned Arc and lock it for the full
    /// read-check-write of their operation.
    pub fn lock_handle(&self, mission_id: &str) -> Arc<Mutex<()>> {
        let mut registry = match self.registry.lock() {
            Ok(guard) => guard,
            // registry itself only stores Arcs; a poisoned map is safe to reuse
            Err(poisoned) => poisoned.into_inner(),
        };

        registry
            .entry(mission_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

impl Default for MissionLocks {
    fn default() -> Self {
        Self::new()
    }
}
