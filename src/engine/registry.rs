// ==========================================
// Mission Match Engine - Mission Registry
// ==========================================
// Mission lifecycle owner: create with field validation, visibility
// (archived missions read as absent), and the transitions that are not
// driven by offers (complete, cancel, archive). Transition legality is
// MissionStatus::can_transition; persistence is compare-and-set.
// ==========================================

use std::sync::Arc;

use tracing::info;

use crate::domain::mission::Mission;
use crate::domain::types::MissionStatus;
use crate::engine::repositories::MatchRepositories;
use crate::engine::timer::WaveTimer;
use crate::engine::{MissionEventBus, MissionLocks};
use crate::repository::{RepositoryError, RepositoryResult};

pub struct MissionRegistry {
    repos: MatchRepositories,
    locks: Arc<MissionLocks>,
    events: Arc<MissionEventBus>,
    timer: Arc<dyn WaveTimer>,
}

impl MissionRegistry {
    pub fn new(
        repos: MatchRepositories,
        locks: Arc<MissionLocks>,
        events: Arc<MissionEventBus>,
        timer: Arc<dyn WaveTimer>,
    ) -> Self {
        Self {
            repos,
            locks,
            events,
            timer,
        }
    }

    /// Validate and persist a new draft mission.
    ///
    /// The id is freshly generated, so no lock is needed; insert and
    /// the `mission_created` journal entry commit together.
    pub fn create(&self, mut mission: Mission) -> RepositoryResult<Mission> {
        Self::validate_new(&mission)?;
        mission.status = MissionStatus::Draft;
        mission.archived = false;

        let actor = mission.requester.clone();
        let outcome = self.repos.mission_repo.create_cascade(&mission, &actor)?;
        self.events.publish_all(&outcome.events);

        info!(
            mission_id = %outcome.mission.mission_id,
            title = %outcome.mission.title,
            "mission created"
        );
        Ok(outcome.mission)
    }

    /// Fetch a mission; archived ones read as absent.
    pub fn get(&self, mission_id: &str) -> RepositoryResult<Mission> {
        match self.repos.mission_repo.find_by_id(mission_id)? {
            Some(mission) if !mission.archived => Ok(mission),
            _ => Err(RepositoryError::NotFound {
                entity: "Mission".to_string(),
                id: mission_id.to_string(),
            }),
        }
    }

    pub fn list_by_status(&self, status: MissionStatus) -> RepositoryResult<Vec<Mission>> {
        self.repos.mission_repo.list_by_status(status)
    }

    /// Confirmed -> completed, requester signs the work off.
    pub fn complete(&self, mission_id: &str, actor: &str) -> RepositoryResult<Mission> {
        let handle = self.locks.lock_handle(mission_id);
        let _guard = handle
            .lock()
            .map_err(|e| RepositoryError::LockError(format!("mission lock poisoned: {}", e)))?;

        let (mission, events) = self.repos.mission_repo.transition_with_journal(
            mission_id,
            MissionStatus::Confirmed,
            MissionStatus::Completed,
            actor,
        )?;
        self.events.publish_all(&events);

        info!(mission_id = %mission_id, "mission completed");
        Ok(mission)
    }

    /// Cancel from any non-terminal status.
    ///
    /// One transaction expires all unresolved offers, closes any open
    /// wave and moves the mission terminal; then the wave timer is
    /// cancelled so the stale expiry never fires.
    pub fn cancel(&self, mission_id: &str, actor: &str) -> RepositoryResult<Mission> {
        let handle = self.locks.lock_handle(mission_id);
        let _guard = handle
            .lock()
            .map_err(|e| RepositoryError::LockError(format!("mission lock poisoned: {}", e)))?;

        let outcome = self.repos.mission_repo.cancel_cascade(mission_id, actor)?;

        if let Some(wave_number) = outcome.closed_wave {
            self.timer.cancel(mission_id, wave_number);
        }
        self.events.publish_all(&outcome.events);

        info!(
            mission_id = %mission_id,
            expired_offers = outcome.expired_offers.len(),
            closed_wave = ?outcome.closed_wave,
            "mission cancelled"
        );
        Ok(outcome.mission)
    }

    /// Soft delete; terminal states only. The journal survives.
    pub fn archive(&self, mission_id: &str) -> RepositoryResult<()> {
        self.repos.mission_repo.set_archived(mission_id)?;
        info!(mission_id = %mission_id, "mission archived");
        Ok(())
    }

    fn validate_new(mission: &Mission) -> RepositoryResult<()> {
        if mission.title.trim().is_empty() {
            return Err(RepositoryError::FieldValueError {
                field: "title".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        if mission.duration_days < 1 {
            return Err(RepositoryError::FieldValueError {
                field: "duration_days".to_string(),
                message: format!("must be at least 1, got {}", mission.duration_days),
            });
        }
        if !mission.budget.is_ordered() {
            return Err(RepositoryError::FieldValueError {
                field: "budget".to_string(),
                message: "minimum exceeds maximum".to_string(),
            });
        }
        if let Some(deadline) = mission.deadline {
            let today = chrono::Utc::now().date_naive();
            if deadline < today && !mission.allow_expansion {
                return Err(RepositoryError::FieldValueError {
                    field: "deadline".to_string(),
                    message: format!("{} is in the past", deadline),
                });
            }
        }
        Ok(())
    }
}
