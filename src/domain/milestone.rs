// ==========================================
// Mission Match Engine - Milestone Domain Model
// ==========================================
// Peripheral to matching: milestones track delivery after confirmation
// and appear in the mission export.
// ==========================================

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::types::MilestoneStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Milestone {
    pub milestone_id: String,      // UUID
    pub mission_id: String,
    pub title: String,
    pub due_date: Option<NaiveDate>,
    pub status: MilestoneStatus,
    pub created_at: NaiveDateTime,
}

impl Milestone {
    pub fn new(mission_id: &str, title: &str) -> Self {
        Self {
            milestone_id: uuid::Uuid::new_v4().to_string(),
            mission_id: mission_id.to_string(),
            title: title.to_string(),
            due_date: None,
            status: MilestoneStatus::Todo,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }

    pub fn with_due_date(mut self, due: NaiveDate) -> Self {
        self.due_date = Some(due);
        self
    }

    pub fn is_validated(&self) -> bool {
        self.status == MilestoneStatus::Validated
    }
}
