// ==========================================
// Mission Match Engine - Offer Ledger
// ==========================================
// Provider-side entry point: accept or decline an open offer. The
// actual state check and update run inside OfferRepository under the
// mission lock, so a response racing the wave timeout resolves to
// exactly one winner.
// ==========================================

use std::sync::Arc;

use tracing::info;

use crate::domain::offer::Offer;
use crate::domain::types::OfferDecision;
use crate::engine::repositories::MatchRepositories;
use crate::engine::{MissionEventBus, MissionLocks};
use crate::repository::{RepositoryError, RepositoryResult};

pub struct OfferLedger {
    repos: MatchRepositories,
    locks: Arc<MissionLocks>,
    events: Arc<MissionEventBus>,
}

impl OfferLedger {
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

    /// Record a provider's accept or decline.
    ///
    /// The offer is resolved first to learn which mission's lock to
    /// take; the repository re-reads it inside the transaction, so a
    /// concurrent expiry between lookup and lock is caught there.
    pub fn respond(
        &self,
        offer_id: &str,
        decision: OfferDecision,
        message: Option<&str>,
    ) -> RepositoryResult<Offer> {
        let offer = self
            .repos
            .offer_repo
            .find_by_id(offer_id)?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "Offer".to_string(),
                id: offer_id.to_string(),
            })?;

        let handle = self.locks.lock_handle(&offer.mission_id);
        let _guard = handle
            .lock()
            .map_err(|e| RepositoryError::LockError(format!("mission lock poisoned: {}", e)))?;

        let outcome = self
            .repos
            .offer_repo
            .record_response(offer_id, decision, message)?;

        self.events.publish_all(&outcome.events);

        info!(
            offer_id = %offer_id,
            mission_id = %offer.mission_id,
            provider_id = %offer.provider_id,
            decision = ?decision,
            "offer response recorded"
        );

        Ok(outcome.offer)
    }

    /// All offers for a mission in display order.
    pub fn list_by_mission(&self, mission_id: &str) -> RepositoryResult<Vec<Offer>> {
        self.repos.offer_repo.list_by_mission(mission_id)
    }
}
