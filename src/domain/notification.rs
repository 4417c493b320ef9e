// ==========================================
// Mission Match Engine - Notification Queue Model
// ==========================================
// Outbound provider notifications. Core flows only enqueue; delivery
// runs out-of-band with bounded retries and never blocks a transition.
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::types::{NotificationKind, NotificationStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationMessage {
    pub message_id: String,        // UUID
    pub provider_id: String,
    pub mission_id: String,
    pub kind: NotificationKind,
    pub body: String,              // rendered message text
    pub status: NotificationStatus,
    pub retry_count: i32,
    pub max_retries: i32,
    pub created_at: NaiveDateTime,
    pub sent_at: Option<NaiveDateTime>,
    pub last_error: Option<String>,
}

impl NotificationMessage {
    pub fn new(
        provider_id: &str,
        mission_id: &str,
        kind: NotificationKind,
        body: &str,
        max_retries: i32,
    ) -> Self {
        Self {
            message_id: uuid::Uuid::new_v4().to_string(),
            provider_id: provider_id.to_string(),
            mission_id: mission_id.to_string(),
            kind,
            body: body.to_string(),
            status: NotificationStatus::Pending,
            retry_count: 0,
            max_retries,
            created_at: chrono::Utc::now().naive_utc(),
            sent_at: None,
            last_error: None,
        }
    }

    pub fn can_retry(&self) -> bool {
        self.retry_count < self.max_retries
    }
}
