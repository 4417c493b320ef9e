// ==========================================
// Mission Match Engine - Mission API
// ==========================================
// Transport-agnostic surface over the engines, one method per external
// operation. Input shaping and parse errors live here; lifecycle rules
// stay in the engine layer and arrive as RepositoryError, converted by
// From into ApiError.
// ==========================================

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::domain::journal::JournalEvent;
use crate::domain::milestone::Milestone;
use crate::domain::mission::{Mission, MissionExport};
use crate::domain::offer::Offer;
use crate::domain::types::{MilestoneStatus, MissionStatus, OfferDecision, WorkMode};
use crate::engine::{
    ConfirmationGuard, DispatchOutcome, MatchRepositories, MissionEventBus, MissionRegistry,
    OfferLedger, WaveDispatcher,
};
use crate::repository::OutboxStats;

// ==========================================
// Request / view types
// ==========================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMissionRequest {
    pub requester: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub deliverables: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub deadline: Option<NaiveDate>,
    pub duration_days: Option<i32>,
    pub budget_min: Option<f64>,
    pub budget_max: Option<f64>,
    pub currency: Option<String>,
    pub language: Option<String>,
    pub work_mode: Option<String>,
    pub location_hint: Option<String>,
    #[serde(default)]
    pub allow_expansion: bool,
    pub collect_multiple_quotes: Option<bool>,
}

/// Mission plus its offer board and milestones.
#[derive(Debug, Clone, Serialize)]
pub struct MissionDetail {
    pub mission: Mission,
    pub offers: Vec<Offer>,
    pub milestones: Vec<Milestone>,
}

// ==========================================
// MissionApi
// ==========================================

pub struct MissionApi {
    repos: MatchRepositories,
    registry: Arc<MissionRegistry>,
    dispatcher: Arc<WaveDispatcher>,
    ledger: Arc<OfferLedger>,
    guard: Arc<ConfirmationGuard>,
    events: Arc<MissionEventBus>,
    config: Arc<ConfigManager>,
}

impl MissionApi {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        repos: MatchRepositories,
        registry: Arc<MissionRegistry>,
        dispatcher: Arc<WaveDispatcher>,
        ledger: Arc<OfferLedger>,
        guard: Arc<ConfirmationGuard>,
        events: Arc<MissionEventBus>,
        config: Arc<ConfigManager>,
    ) -> Self {
        Self {
            repos,
            registry,
            dispatcher,
            ledger,
            guard,
            events,
            config,
        }
    }

    // ===== Requester side =====

    pub fn create_mission(&self, request: CreateMissionRequest) -> ApiResult<Mission> {
        let mission = Self::build_mission(request)?;
        Ok(self.registry.create(mission)?)
    }

    pub fn get_mission(&self, mission_id: &str) -> ApiResult<Mission> {
        Ok(self.registry.get(mission_id)?)
    }

    pub fn get_mission_detail(&self, mission_id: &str) -> ApiResult<MissionDetail> {
        let mission = self.registry.get(mission_id)?;
        let offers = self.ledger.list_by_mission(mission_id)?;
        let milestones = self.repos.milestone_repo.list_by_mission(mission_id)?;
        Ok(MissionDetail {
            mission,
            offers,
            milestones,
        })
    }

    pub fn list_missions(&self, status: MissionStatus) -> ApiResult<Vec<Mission>> {
        Ok(self.registry.list_by_status(status)?)
    }

    /// Open the next offer wave. Omitted sizing falls back to the
    /// configured defaults.
    pub fn dispatch(
        &self,
        mission_id: &str,
        wave_size: Option<i32>,
        timeout_minutes: Option<i32>,
        actor: &str,
    ) -> ApiResult<DispatchOutcome> {
        let wave_size = match wave_size {
            Some(n) => n,
            None => self.config.get_default_wave_size()?,
        };
        let timeout_minutes = match timeout_minutes {
            Some(n) => n,
            None => self.config.get_default_timeout_minutes()?,
        };
        Ok(self
            .dispatcher
            .dispatch(mission_id, wave_size, timeout_minutes, actor)?)
    }

    pub fn confirm(&self, mission_id: &str, offer_id: &str, actor: &str) -> ApiResult<Mission> {
        Ok(self.guard.confirm(mission_id, offer_id, actor)?)
    }

    pub fn cancel_mission(&self, mission_id: &str, actor: &str) -> ApiResult<Mission> {
        Ok(self.registry.cancel(mission_id, actor)?)
    }

    pub fn complete_mission(&self, mission_id: &str, actor: &str) -> ApiResult<Mission> {
        Ok(self.registry.complete(mission_id, actor)?)
    }

    pub fn archive_mission(&self, mission_id: &str) -> ApiResult<()> {
        Ok(self.registry.archive(mission_id)?)
    }

    // ===== Provider side =====

    /// Record an accept or decline on an open offer. `decision` parses
    /// case-insensitively as ACCEPT or DECLINE.
    pub fn respond(
        &self,
        offer_id: &str,
        decision: &str,
        message: Option<&str>,
    ) -> ApiResult<Offer> {
        let decision = OfferDecision::from_str(decision).ok_or_else(|| ApiError::Validation {
            field: "decision".to_string(),
            message: format!("expected ACCEPT or DECLINE, got '{}'", decision),
        })?;
        Ok(self.ledger.respond(offer_id, decision, message)?)
    }

    // ===== Audit =====

    /// Per-mission history ordered by seq. Archived missions stay
    /// readable here: archiving hides the mission, never its audit
    /// trail.
    pub fn journal(&self, mission_id: &str) -> ApiResult<Vec<JournalEvent>> {
        self.repos.mission_repo.require(mission_id)?;
        Ok(self.repos.journal_repo.list_by_mission(mission_id)?)
    }

    pub fn export_mission(&self, mission_id: &str) -> ApiResult<MissionExport> {
        let mission = self.repos.mission_repo.require(mission_id)?;
        let offers = self.repos.offer_repo.list_by_mission(mission_id)?;
        let milestones = self.repos.milestone_repo.list_by_mission(mission_id)?;
        let journal = self.repos.journal_repo.list_by_mission(mission_id)?;
        Ok(MissionExport {
            mission,
            offers,
            milestones,
            journal,
            exported_at: chrono::Utc::now().naive_utc(),
        })
    }

    pub fn export_mission_json(&self, mission_id: &str) -> ApiResult<String> {
        let export = self.export_mission(mission_id)?;
        serde_json::to_string_pretty(&export)
            .map_err(|e| ApiError::InternalError(format!("export serialization failed: {}", e)))
    }

    /// Live journal feed for one mission.
    pub fn subscribe(&self, mission_id: &str) -> broadcast::Receiver<JournalEvent> {
        self.events.subscribe(mission_id)
    }

    // ===== Milestones =====

    /// Create or update a milestone on an active mission.
    pub fn upsert_milestone(
        &self,
        mission_id: &str,
        milestone_id: Option<&str>,
        title: &str,
        due_date: Option<NaiveDate>,
        status: Option<MilestoneStatus>,
    ) -> ApiResult<Milestone> {
        if title.trim().is_empty() {
            return Err(ApiError::Validation {
                field: "title".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        self.registry.get(mission_id)?;

        let mut milestone = match milestone_id {
            Some(id) => {
                let existing = self.repos.milestone_repo.find_by_id(id)?.ok_or_else(|| {
                    ApiError::NotFound {
                        entity: "Milestone".to_string(),
                        id: id.to_string(),
                    }
                })?;
                if existing.mission_id != mission_id {
                    return Err(ApiError::Conflict(format!(
                        "milestone {} belongs to another mission",
                        id
                    )));
                }
                existing
            }
            None => Milestone::new(mission_id, title),
        };

        milestone.title = title.to_string();
        milestone.due_date = due_date;
        if let Some(status) = status {
            milestone.status = status;
        }

        self.repos.milestone_repo.upsert(&milestone)?;
        Ok(milestone)
    }

    // ===== Operations =====

    pub fn get_config_value(&self, key: &str) -> ApiResult<Option<String>> {
        Ok(self.config.get_config_value(key)?)
    }

    pub fn set_config_value(&self, key: &str, value: &str) -> ApiResult<()> {
        Ok(self.config.set_config_value(key, value)?)
    }

    pub fn get_config_snapshot(&self) -> ApiResult<String> {
        Ok(self.config.get_config_snapshot()?)
    }

    pub fn outbox_stats(&self) -> ApiResult<OutboxStats> {
        Ok(self.repos.outbox_repo.stats()?)
    }

    // ===== Input shaping =====

    fn build_mission(request: CreateMissionRequest) -> ApiResult<Mission> {
        let mut mission = Mission::new(&request.requester, &request.title, &request.description)
            .with_deliverables(request.deliverables)
            .with_keywords(request.keywords)
            .with_allow_expansion(request.allow_expansion);

        if let Some(deadline) = request.deadline {
            mission = mission.with_deadline(deadline);
        }
        if let Some(days) = request.duration_days {
            mission = mission.with_duration_days(days);
        }

        let currency = request.currency.as_deref().unwrap_or("EUR");
        mission = mission.with_budget(request.budget_min, request.budget_max, currency);

        if let Some(language) = request.language.as_deref() {
            mission = mission.with_language(language);
        }
        if let Some(raw) = request.work_mode.as_deref() {
            let mode = WorkMode::from_str(raw).ok_or_else(|| ApiError::Validation {
                field: "work_mode".to_string(),
                message: format!("expected REMOTE, LOCAL or HYBRID, got '{}'", raw),
            })?;
            mission = mission.with_work_mode(mode);
        }
        if let Some(hint) = request.location_hint.as_deref() {
            mission = mission.with_location_hint(hint);
        }
        if let Some(collect) = request.collect_multiple_quotes {
            mission = mission.with_collect_multiple_quotes(collect);
        }

        Ok(mission)
    }
}
