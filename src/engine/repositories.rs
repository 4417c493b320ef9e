// ==========================================
// Mission Match Engine - Engine-Layer Repository Aggregate
// ==========================================
// Bundles every repository the matching engines need, so engine
// constructors take one parameter instead of seven and all engines
// share the same connection.
// ==========================================

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::repository::{
    JournalRepository, MilestoneRepository, MissionRepository, NotificationOutboxRepository,
    OfferRepository, ProviderRepository, WaveRepository,
};

/// Repository bundle for the matching engines.
#[derive(Clone)]
pub struct MatchRepositories {
    pub mission_repo: Arc<MissionRepository>,
    pub wave_repo: Arc<WaveRepository>,
    pub offer_repo: Arc<OfferRepository>,
    pub journal_repo: Arc<JournalRepository>,
    pub provider_repo: Arc<ProviderRepository>,
    pub milestone_repo: Arc<MilestoneRepository>,
    pub outbox_repo: Arc<NotificationOutboxRepository>,
}

impl MatchRepositories {
    /// Wire every repository onto one shared connection.
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            mission_repo: Arc::new(MissionRepository::new(conn.clone())),
            wave_repo: Arc::new(WaveRepository::new(conn.clone())),
            offer_repo: Arc::new(OfferRepository::new(conn.clone())),
            journal_repo: Arc::new(JournalRepository::new(conn.clone())),
            provider_repo: Arc::new(ProviderRepository::new(conn.clone())),
            milestone_repo: Arc::new(MilestoneRepository::new(conn.clone())),
            outbox_repo: Arc::new(NotificationOutboxRepository::new(conn)),
        }
    }
}
