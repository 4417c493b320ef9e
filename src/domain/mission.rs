// ==========================================
// Mission Match Engine - Mission Domain Model
// ==========================================
// A mission is the unit of demand: scoped work a requester wants
// matched to exactly one provider through offer waves.
// ==========================================

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::types::{MissionStatus, WorkMode};

// ==========================================
// Budget - money range for the mission
// ==========================================
// Either bound may be absent (open-ended negotiation); when both are
// present minimum <= maximum is enforced at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub minimum: Option<f64>,  // lower bound, mission currency
    pub maximum: Option<f64>,  // upper bound, mission currency
    pub currency: String,      // ISO 4217 code, e.g. "EUR"
}

impl Budget {
    pub fn new(minimum: Option<f64>, maximum: Option<f64>, currency: &str) -> Self {
        Self {
            minimum,
            maximum,
            currency: currency.to_string(),
        }
    }

    /// Ordering holds whenever both bounds are present.
    pub fn is_ordered(&self) -> bool {
        match (self.minimum, self.maximum) {
            (Some(lo), Some(hi)) => lo <= hi,
            _ => true,
        }
    }
}

// ==========================================
// Mission - the demand aggregate
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mission {
    // ===== Identity =====
    pub mission_id: String,        // UUID
    pub requester: String,         // audit actor who created the mission

    // ===== Scope =====
    pub title: String,
    pub description: String,
    pub deliverables: Vec<String>, // expected outputs, stored as JSON
    pub keywords: Vec<String>,     // matching tags scored against provider skills
    pub summary: Option<String>,   // reformulated text from an external collaborator, opaque

    // ===== Constraints =====
    pub deadline: Option<NaiveDate>,
    pub duration_days: i32,        // >= 1
    pub budget: Budget,
    pub language: String,          // working language, e.g. "en"
    pub work_mode: WorkMode,
    pub location_hint: Option<String>, // free text, relevant for local/hybrid

    // ===== Matching flags =====
    pub allow_expansion: bool,          // expired providers may be re-invited
    pub collect_multiple_quotes: bool,  // keep the wave open after first accept

    // ===== State =====
    pub status: MissionStatus,
    pub archived: bool,            // soft delete, journal retained
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Mission {
    /// New draft mission with generated id and current timestamps.
    pub fn new(requester: &str, title: &str, description: &str) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            mission_id: uuid::Uuid::new_v4().to_string(),
            requester: requester.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            deliverables: vec![],
            keywords: vec![],
            summary: None,
            deadline: None,
            duration_days: 1,
            budget: Budget::new(None, None, "EUR"),
            language: "en".to_string(),
            work_mode: WorkMode::Remote,
            location_hint: None,
            allow_expansion: false,
            collect_multiple_quotes: true,
            status: MissionStatus::Draft,
            archived: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_keywords(mut self, keywords: Vec<String>) -> Self {
        self.keywords = keywords;
        self
    }

    pub fn with_deliverables(mut self, deliverables: Vec<String>) -> Self {
        self.deliverables = deliverables;
        self
    }

    pub fn with_budget(mut self, minimum: Option<f64>, maximum: Option<f64>, currency: &str) -> Self {
        self.budget = Budget::new(minimum, maximum, currency);
        self
    }

    pub fn with_work_mode(mut self, mode: WorkMode) -> Self {
        self.work_mode = mode;
        self
    }

    pub fn with_language(mut self, language: &str) -> Self {
        self.language = language.to_string();
        self
    }

    pub fn with_deadline(mut self, deadline: NaiveDate) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_duration_days(mut self, days: i32) -> Self {
        self.duration_days = days;
        self
    }

    pub fn with_location_hint(mut self, hint: &str) -> Self {
        self.location_hint = Some(hint.to_string());
        self
    }

    pub fn with_allow_expansion(mut self, allow: bool) -> Self {
        self.allow_expansion = allow;
        self
    }

    pub fn with_collect_multiple_quotes(mut self, collect: bool) -> Self {
        self.collect_multiple_quotes = collect;
        self
    }

    pub fn is_draft(&self) -> bool {
        self.status == MissionStatus::Draft
    }

    pub fn is_matching(&self) -> bool {
        self.status == MissionStatus::Matching
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

// ==========================================
// MissionExport - portable snapshot
// ==========================================
// Read-only aggregate for interoperability: the mission, every offer it
// ever produced, its milestones and the full journal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionExport {
    pub mission: Mission,
    pub offers: Vec<super::offer::Offer>,
    pub milestones: Vec<super::milestone::Milestone>,
    pub journal: Vec<super::journal::JournalEvent>,
    pub exported_at: NaiveDateTime,
}
