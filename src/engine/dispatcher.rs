// ==========================================
// Mission Match Engine - Wave Dispatcher
// ==========================================
// Opens one offer wave per dispatch call: rank the provider pool,
// persist wave + offers + journal atomically, then arm the expiry
// timer and queue invite notifications. Serialized per mission via
// MissionLocks so two dispatches can never open two waves.
// ==========================================

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::ConfigManager;
use crate::domain::notification::NotificationMessage;
use crate::domain::offer::Offer;
use crate::domain::types::NotificationKind;
use crate::engine::notify;
use crate::engine::repositories::MatchRepositories;
use crate::engine::selector::CandidateSelector;
use crate::engine::selector_core::SelectorCore;
use crate::engine::scoring::ScoringEngine;
use crate::engine::timer::WaveTimer;
use crate::engine::{MissionEventBus, MissionLocks};
use crate::repository::{RepositoryError, RepositoryResult};

// ==========================================
// DispatchOutcome
// ==========================================

/// What a single dispatch call produced.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchOutcome {
    pub wave_number: i32,
    /// Providers actually invited. May be below wave_size, including zero.
    pub invited: usize,
    /// True when fewer candidates were found than requested; the caller
    /// may retry later with a widened pool or relax the mission terms.
    pub pool_exhausted: bool,
}

// ==========================================
// WaveDispatcher
// ==========================================

pub struct WaveDispatcher {
    repos: MatchRepositories,
    locks: Arc<MissionLocks>,
    config: Arc<ConfigManager>,
    events: Arc<MissionEventBus>,
    timer: Arc<dyn WaveTimer>,
}

impl WaveDispatcher {
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

    /// Open the next wave for a mission.
    ///
    /// Preconditions checked under the mission lock: the mission exists,
    /// its status allows dispatch (draft or matching), and no wave is
    /// currently open. A second dispatch while a wave is open is rejected
    /// with a state conflict instead of silently stacking waves.
    ///
    /// A wave with zero invitations still opens and still times out, so
    /// the journal records that matching was attempted against an
    /// exhausted pool.
    pub fn dispatch(
        &self,
        mission_id: &str,
        wave_size: i32,
        timeout_minutes: i32,
        actor: &str,
    ) -> RepositoryResult<DispatchOutcome> {
        if wave_size < 1 {
            return Err(RepositoryError::FieldValueError {
                field: "wave_size".to_string(),
                message: format!("must be at least 1, got {}", wave_size),
            });
        }
        if timeout_minutes < 1 {
            return Err(RepositoryError::FieldValueError {
                field: "timeout_minutes".to_string(),
                message: format!("must be at least 1, got {}", timeout_minutes),
            });
        }

        let handle = self.locks.lock_handle(mission_id);
        let _guard = handle
            .lock()
            .map_err(|e| RepositoryError::LockError(format!("mission lock poisoned: {}", e)))?;

        // ==========================================
        // Step 1: preconditions
        // ==========================================
        let mission = self.repos.mission_repo.require(mission_id)?;

        if !mission.status.can_dispatch() {
            return Err(RepositoryError::StateConflict {
                message: format!(
                    "mission {} cannot dispatch from status {}",
                    mission_id, mission.status
                ),
            });
        }
        if let Some(open) = self.repos.wave_repo.find_open(mission_id)? {
            return Err(RepositoryError::StateConflict {
                message: format!(
                    "mission {} already has open wave {}",
                    mission_id, open.wave_number
                ),
            });
        }

        // ==========================================
        // Step 2: rank the provider pool
        // ==========================================
        let prior = self.repos.offer_repo.provider_statuses(mission_id)?;
        let excluded: HashSet<String> =
            SelectorCore::excluded_providers(&prior, mission.allow_expansion);

        // Weights are re-read on every dispatch so config changes take
        // effect without a restart.
        let weights = self.config.get_scoring_weights()?;
        let selector = CandidateSelector::new(ScoringEngine::new(weights));

        let pool = self.repos.provider_repo.list_all()?;
        let ranked = selector.select(&mission, &pool, &excluded, wave_size as usize);
        let pool_exhausted = ranked.len() < wave_size as usize;

        debug!(
            mission_id = %mission_id,
            pool_size = pool.len(),
            excluded = excluded.len(),
            ranked = ranked.len(),
            "candidate selection finished"
        );

        // ==========================================
        // Step 3: persist wave + offers + journal
        // ==========================================
        // Wave numbers are stamped inside the cascade; the placeholder
        // here is never stored.
        let offers: Vec<Offer> = ranked
            .iter()
            .map(|c| Offer::invite(mission_id, 0, &c.provider_id, c.score, c.reasons.clone()))
            .collect();

        let outcome = self.repos.wave_repo.open_wave_cascade(
            &mission,
            offers,
            wave_size,
            timeout_minutes,
            actor,
        )?;

        // ==========================================
        // Step 4: timer, notifications, events
        // ==========================================
        self.timer.schedule(
            mission_id,
            outcome.wave.wave_number,
            Duration::from_secs(timeout_minutes as u64 * 60),
        );

        // Invite delivery is best-effort: a full outbox or broken queue
        // must not roll back an already-committed wave.
        let max_retries = self.config.get_notify_max_retries().unwrap_or(3);
        for offer in &outcome.offers {
            let body = notify::render_invite(&mission, offer);
            let message = NotificationMessage::new(
                &offer.provider_id,
                mission_id,
                NotificationKind::OfferInvite,
                &body,
                max_retries,
            );
            if let Err(e) = self.repos.outbox_repo.enqueue(&message) {
                warn!(
                    mission_id = %mission_id,
                    provider_id = %offer.provider_id,
                    error = %e,
                    "invite notification enqueue failed"
                );
            }
        }

        self.events.publish_all(&outcome.events);

        info!(
            mission_id = %mission_id,
            wave_number = outcome.wave.wave_number,
            invited = outcome.offers.len(),
            pool_exhausted,
            "wave dispatched"
        );

        Ok(DispatchOutcome {
            wave_number: outcome.wave.wave_number,
            invited: outcome.offers.len(),
            pool_exhausted,
        })
    }
}
