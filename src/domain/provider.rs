// ==========================================
// Mission Match Engine - Provider Directory Model
// ==========================================
// Read model of the provider directory. The engine only reads these
// rows; writes come from the importer and seeding paths.
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::types::WorkMode;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderProfile {
    // ===== Identity =====
    pub provider_id: String,
    pub display_name: String,

    // ===== Capabilities =====
    pub skills: Vec<String>,       // matched against mission keywords
    pub languages: Vec<String>,    // working languages
    pub work_modes: Vec<WorkMode>, // modes the provider serves

    // ===== Availability & rates =====
    pub available: bool,
    pub typical_rate: Option<f64>, // usual day rate
    pub floor_rate: Option<f64>,   // minimum acceptable day rate
    pub timezone_offset_hours: Option<i32>, // UTC offset, [-12, 14]

    // ===== Track record =====
    pub completion_rate: f64,      // [0,1], share of confirmed missions completed
    pub completed_missions: i32,

    pub updated_at: NaiveDateTime,
}

impl ProviderProfile {
    pub fn new(provider_id: &str, display_name: &str) -> Self {
        Self {
            provider_id: provider_id.to_string(),
            display_name: display_name.to_string(),
            skills: vec![],
            languages: vec![],
            work_modes: vec![WorkMode::Remote],
            available: true,
            typical_rate: None,
            floor_rate: None,
            timezone_offset_hours: None,
            completion_rate: 0.0,
            completed_missions: 0,
            updated_at: chrono::Utc::now().naive_utc(),
        }
    }

    pub fn with_skills(mut self, skills: Vec<String>) -> Self {
        self.skills = skills;
        self
    }

    pub fn with_languages(mut self, languages: Vec<String>) -> Self {
        self.languages = languages;
        self
    }

    pub fn with_work_modes(mut self, modes: Vec<WorkMode>) -> Self {
        self.work_modes = modes;
        self
    }

    pub fn with_rates(mut self, typical: Option<f64>, floor: Option<f64>) -> Self {
        self.typical_rate = typical;
        self.floor_rate = floor;
        self
    }

    pub fn with_timezone_offset(mut self, hours: i32) -> Self {
        self.timezone_offset_hours = Some(hours);
        self
    }

    pub fn with_track_record(mut self, completion_rate: f64, completed: i32) -> Self {
        self.completion_rate = completion_rate;
        self.completed_missions = completed;
        self
    }

    pub fn with_available(mut self, available: bool) -> Self {
        self.available = available;
        self
    }

    pub fn serves_mode(&self, mode: WorkMode) -> bool {
        self.work_modes.contains(&mode)
    }

    pub fn speaks(&self, language: &str) -> bool {
        self.languages
            .iter()
            .any(|l| l.eq_ignore_ascii_case(language))
    }
}
