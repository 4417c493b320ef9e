// ==========================================
// Mission Match Engine - Audit Journal Model
// ==========================================
// Append-only. `seq` is per-mission and strictly increasing; readers
// order by it, never by timestamp.
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::types::JournalEventType;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEvent {
    pub seq: i64,                  // per-mission sequence, assigned on append
    pub ts: NaiveDateTime,
    pub mission_id: String,
    pub event_type: JournalEventType,
    pub actor: String,             // requester, provider id, or "system"
    pub payload: Option<JsonValue>,
}

impl JournalEvent {
    /// New unsequenced event; the repository assigns `seq` on append.
    pub fn new(mission_id: &str, event_type: JournalEventType, actor: &str) -> Self {
        Self {
            seq: 0,
            ts: chrono::Utc::now().naive_utc(),
            mission_id: mission_id.to_string(),
            event_type,
            actor: actor.to_string(),
            payload: None,
        }
    }

    /// Attach a JSON payload.
    pub fn with_payload<T: Serialize>(mut self, payload: &T) -> Self {
        self.payload = serde_json::to_value(payload).ok();
        self
    }
}
