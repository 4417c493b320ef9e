// ==========================================
// Mission Match Engine - Confirmation Guard
// ==========================================
// Requester-side confirmation of one accepted offer. The repository
// cascade does the heavy lifting in a single transaction; this layer
// adds the mission lock, cancels the wave timer, queues outcome
// notifications, and pushes the journal events to subscribers.
// ==========================================

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::ConfigManager;
use crate::domain::mission::Mission;
use crate::domain::notification::NotificationMessage;
use crate::domain::types::NotificationKind;
use crate::engine::notify;
use crate::engine::repositories::MatchRepositories;
use crate::engine::timer::WaveTimer;
use crate::engine::{MissionEventBus, MissionLocks};
use crate::repository::{RepositoryError, RepositoryResult};

pub struct ConfirmationGuard {
    repos: MatchRepositories,
    locks: Arc<MissionLocks>,
    config: Arc<ConfigManager>,
    events: Arc<MissionEventBus>,
    timer: Arc<dyn WaveTimer>,
}

impl ConfirmationGuard {
    pub fn new(
        repos: MatchRepositories,
        locks: Arc<MissionLocks>,
        config: Arc<ConfigManager>,
        events: Arc<MissionEventBus>,
        timer: Arc<dyn WaveTimer>,
    ) -> Self {
        Self {
            repos,
            locks,
            config,
            events,
            timer,
        }
    }

    /// Confirm one accepted offer as the final match.
    ///
    /// Under the mission lock, one transaction confirms the target,
    /// rejects every unresolved sibling, closes the open wave and moves
    /// the mission to confirmed. Two racing confirms serialize on the
    /// lock; the loser fails the offer-status guard inside the cascade.
    pub fn confirm(
        &self,
        mission_id: &str,
        offer_id: &str,
        actor: &str,
    ) -> RepositoryResult<Mission> {
        let handle = self.locks.lock_handle(mission_id);
        let _guard = handle
            .lock()
            .map_err(|e| RepositoryError::LockError(format!("mission lock poisoned: {}", e)))?;

        let outcome = self
            .repos
            .offer_repo
            .confirm_cascade(mission_id, offer_id, actor)?;

        // the wave has already closed in the transaction, the timer
        // only needs to stop firing
        if let Some(wave_number) = outcome.closed_wave {
            self.timer.cancel(mission_id, wave_number);
        }

        let max_retries = self.config.get_notify_max_retries().unwrap_or(3);
        self.enqueue_outcome(
            &outcome.mission,
            &outcome.confirmed.provider_id,
            true,
            max_retries,
        );
        for sibling in &outcome.rejected {
            self.enqueue_outcome(&outcome.mission, &sibling.provider_id, false, max_retries);
        }

        self.events.publish_all(&outcome.events);

        info!(
            mission_id = %mission_id,
            offer_id = %offer_id,
            provider_id = %outcome.confirmed.provider_id,
            displaced = outcome.rejected.len(),
            closed_wave = ?outcome.closed_wave,
            "offer confirmed"
        );

        Ok(outcome.mission)
    }

    fn enqueue_outcome(&self, mission: &Mission, provider_id: &str, won: bool, max_retries: i32) {
        let body = notify::render_outcome(mission, won);
        let message = NotificationMessage::new(
            provider_id,
            &mission.mission_id,
            NotificationKind::OfferOutcome,
            &body,
            max_retries,
        );
        if let Err(e) = self.repos.outbox_repo.enqueue(&message) {
            warn!(
                mission_id = %mission.mission_id,
                provider_id = %provider_id,
                error = %e,
                "outcome notification enqueue failed"
            );
        }
    }
}
