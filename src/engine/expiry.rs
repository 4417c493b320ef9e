// ==========================================
// Mission Match Engine - Wave Expiry Service
// ==========================================
// Sweep handler for wave timeouts. Runs under the mission lock and
// re-reads wave state inside the cascade transaction, so a timer that
// fires after the wave was closed by confirm or cancel does nothing.
// Expired offers drop only the pending ones; an accepted offer
// survives the timeout and stays confirmable. The mission remains
// `matching` after a timeout; opening a follow-up wave is the
// caller's decision.
// ==========================================

use std::sync::Arc;

use crate::engine::events::MissionEventBus;
use crate::engine::locks::MissionLocks;
use crate::engine::repositories::MatchRepositories;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::WaveExpireOutcome;

pub struct WaveExpiryService {
    repos: MatchRepositories,
    locks: Arc<MissionLocks>,
    events: Arc<MissionEventBus>,
}

impl WaveExpiryService {
    pub fn new(
        repos: MatchRepositories,
        locks: Arc<MissionLocks>,
        events: Arc<MissionEventBus>,
    ) -> Self {
        Self {
            repos,
            locks,
            events,
        }
    }

    /// Expire one wave if it is still open.
    ///
    /// Returns `Ok(None)` when the wave was already closed (late timer
    /// losing the race against confirm or cancel); that outcome is a
    /// no-op, not an error.
    pub fn expire_wave(
        &self,
        mission_id: &str,
        wave_number: i32,
    ) -> RepositoryResult<Option<WaveExpireOutcome>> {
        let handle = self.locks.lock_handle(mission_id);
        let _guard = handle
            .lock()
            .map_err(|e| RepositoryError::LockError(format!("mission lock poisoned: {}", e)))?;

        let outcome = self
            .repos
            .wave_repo
            .expire_wave_cascade(mission_id, wave_number, "system")?;

        match outcome {
            None => {
                tracing::debug!(
                    "wave expiry skipped, already closed: mission_id={}, wave_number={}",
                    mission_id,
                    wave_number
                );
                Ok(None)
            }
            Some(outcome) => {
                tracing::info!(
                    "wave expired: mission_id={}, wave_number={}, offers_expired={}",
                    mission_id,
                    wave_number,
                    outcome.expired_offers.len()
                );
                self.events.publish_all(&outcome.events);
                Ok(Some(outcome))
            }
        }
    }
}
