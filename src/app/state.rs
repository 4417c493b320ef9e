// ==========================================
// Mission Match Engine - Application State
// ==========================================
// Wires the full stack once: one shared connection, the repository
// bundle, the matching engines, and the API facade. Binaries and
// integration tests construct everything through here.
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::MissionApi;
use crate::config::config_manager::ConfigManager;
use crate::db;
use crate::engine::{
    ConfirmationGuard, LogNotificationSender, MatchRepositories, MissionEventBus, MissionLocks,
    MissionRegistry, NoOpWaveTimer, NotificationWorker, OfferLedger, TokioWaveTimer,
    WaveDispatcher, WaveExpiryService, WaveTimer,
};
use crate::importer::ProviderImporter;
use crate::repository::error::RepositoryResult;

/// Shared application state.
///
/// Holds the API facade plus the pieces that outlive a single request:
/// the outbox worker, the expiry service, the repository bundle and
/// the config manager.
pub struct AppState {
    pub db_path: String,

    /// Requester- and provider-facing operations.
    pub mission_api: Arc<MissionApi>,

    /// Drains the notification outbox.
    pub notification_worker: Arc<NotificationWorker>,

    /// CSV intake for the provider directory.
    pub provider_importer: Arc<ProviderImporter>,

    /// Wave timeout handler, also callable from an external sweep.
    pub expiry: Arc<WaveExpiryService>,

    /// Direct repository access for seeding and diagnostics.
    pub repos: MatchRepositories,

    pub config: Arc<ConfigManager>,
}

impl AppState {
    /// Build the full stack with tokio-backed wave timers.
    ///
    /// Must run inside a tokio runtime; dispatching a wave spawns its
    /// timeout task.
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        Self::build(db_path, true)
    }

    /// Build the stack without background timers. Wave timeouts then
    /// only happen when `expiry.expire_wave` is called, which suits
    /// sweep-driven deployments and synchronous tests.
    pub fn with_noop_timer(db_path: &str) -> RepositoryResult<Self> {
        Self::build(db_path, false)
    }

    fn build(db_path: &str, arm_timers: bool) -> RepositoryResult<Self> {
        tracing::info!("initializing AppState: db_path={}", db_path);

        let conn = db::open_sqlite_connection(db_path)?;
        db::init_schema(&conn)?;
        if let Some(found) = db::read_schema_version(&conn)? {
            if found != db::CURRENT_SCHEMA_VERSION {
                tracing::warn!(
                    "schema version mismatch: found={}, expected={}",
                    found,
                    db::CURRENT_SCHEMA_VERSION
                );
            }
        }
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // Repository layer
        // ==========================================

        let repos = MatchRepositories::from_connection(conn.clone());
        let config = Arc::new(ConfigManager::from_connection(conn)?);

        // ==========================================
        // Engine layer
        // ==========================================

        let locks = Arc::new(MissionLocks::new());
        let events = Arc::new(MissionEventBus::new());

        let expiry = Arc::new(WaveExpiryService::new(
            repos.clone(),
            locks.clone(),
            events.clone(),
        ));

        let timer: Arc<dyn WaveTimer> = if arm_timers {
            Arc::new(TokioWaveTimer::new(expiry.clone()))
        } else {
            Arc::new(NoOpWaveTimer)
        };

        let registry = Arc::new(MissionRegistry::new(
            repos.clone(),
            locks.clone(),
            events.clone(),
            timer.clone(),
        ));

        let dispatcher = Arc::new(WaveDispatcher::new(
            repos.clone(),
            locks.clone(),
            config.clone(),
            events.clone(),
            timer.clone(),
        ));

        let ledger = Arc::new(OfferLedger::new(
            repos.clone(),
            locks.clone(),
            events.clone(),
        ));

        let guard = Arc::new(ConfirmationGuard::new(
            repos.clone(),
            locks.clone(),
            config.clone(),
            events.clone(),
            timer,
        ));

        // ==========================================
        // API layer
        // ==========================================

        let mission_api = Arc::new(MissionApi::new(
            repos.clone(),
            registry,
            dispatcher,
            ledger,
            guard,
            events,
            config.clone(),
        ));

        let notification_worker = Arc::new(NotificationWorker::new(
            repos.outbox_repo.clone(),
            Arc::new(LogNotificationSender),
        ));

        let provider_importer = Arc::new(ProviderImporter::new(repos.provider_repo.clone()));

        tracing::info!("AppState ready: db_path={}", db_path);

        Ok(Self {
            db_path: db_path.to_string(),
            mission_api,
            notification_worker,
            provider_importer,
            expiry,
            repos,
            config,
        })
    }
}
