// ==========================================
// Mission Match Engine - Engine Layer
// ==========================================
// Lifecycle rules live here, SQL lives in the repositories. Engines
// serialize per mission through MissionLocks, and every filter or
// scoring decision carries a human-readable reason.
// ==========================================

pub mod dispatcher;
pub mod events;
pub mod expiry;
pub mod guard;
pub mod ledger;
pub mod locks;
pub mod notify;
pub mod registry;
pub mod repositories;
pub mod scoring;
pub mod selector;
pub mod selector_core;
pub mod timer;

pub use dispatcher::{DispatchOutcome, WaveDispatcher};
pub use events::MissionEventBus;
pub use expiry::WaveExpiryService;
pub use guard::ConfirmationGuard;
pub use ledger::OfferLedger;
pub use locks::MissionLocks;
pub use notify::{
    DrainReport, LogNotificationSender, NoOpNotificationSender, NotificationSender,
    NotificationWorker,
};
pub use registry::MissionRegistry;
pub use repositories::MatchRepositories;
pub use scoring::{ScoringEngine, ScoringWeights};
pub use selector::{CandidateSelector, RankedCandidate};
pub use selector_core::SelectorCore;
pub use timer::{NoOpWaveTimer, TokioWaveTimer, WaveTimer};
