// ==========================================
// Mission Match Engine - Repository Layer
// ==========================================
// Data access only; lifecycle rules live in the engine layer. The one
// exception is the multi-table cascades (dispatch, confirm, expire,
// cancel), which must commit atomically and so live as transaction
// methods on the repository that owns the triggering row.
// ==========================================
// All queries are parameterized.
// ==========================================

pub mod error;
pub mod journal_repo;
pub mod milestone_repo;
pub mod mission_repo;
pub mod offer_repo;
pub mod outbox_repo;
pub mod provider_repo;
pub mod wave_repo;

pub use error::{RepositoryError, RepositoryResult};
pub use journal_repo::JournalRepository;
pub use milestone_repo::MilestoneRepository;
pub use mission_repo::{CancelOutcome, CreateOutcome, MissionRepository};
pub use offer_repo::{ConfirmOutcome, OfferRef, OfferRepository, RespondOutcome};
pub use outbox_repo::{NotificationOutboxRepository, OutboxStats};
pub use provider_repo::ProviderRepository;
pub use wave_repo::{WaveExpireOutcome, WaveOpenOutcome, WaveRepository};
