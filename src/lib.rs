// ==========================================
// Mission Match Engine - Core Library
// ==========================================
// Stack: Rust + SQLite + Tokio
// Role: mission/provider matching with wave dispatch,
//       exclusive confirmation and a per-mission audit journal
// ==========================================

// ==========================================
// Module declarations
// ==========================================

// Domain layer - entities & types
pub mod domain;

// Repository layer - data access
pub mod repository;

// Engine layer - business rules
pub mod engine;

// Importer layer - external data
pub mod importer;

// Config layer - runtime configuration
pub mod config;

// Database infrastructure (connection init / unified PRAGMAs)
pub mod db;

// Logging
pub mod logging;

// API layer - operation surface
pub mod api;

// App layer - wiring
pub mod app;

// ==========================================
// Core type re-exports
// ==========================================

// Domain types
pub use domain::types::{
    JournalEventType, MilestoneStatus, MissionStatus, NotificationKind, NotificationStatus,
    OfferDecision, OfferStatus, WaveCloseReason, WorkMode,
};

// Domain entities
pub use domain::offer::Offer;
pub use domain::{
    Budget, JournalEvent, Milestone, Mission, MissionExport, NotificationMessage,
    ProviderProfile, Wave,
};

// Engines
pub use engine::{
    CandidateSelector, ConfirmationGuard, MissionEventBus, MissionLocks, MissionRegistry,
    NotificationWorker, OfferLedger, ScoringEngine, ScoringWeights, WaveDispatcher,
    WaveExpiryService,
};

// API
pub use api::MissionApi;

// ==========================================
// Constants
// ==========================================

// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Service name
pub const APP_NAME: &str = "Mission Match Engine";

// Database schema version
pub const DB_VERSION: &str = "v0.1";

// ==========================================
// Compile-time sanity
// ==========================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
