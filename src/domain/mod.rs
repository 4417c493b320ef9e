// ==========================================
// Mission Match Engine - Domain Layer
// ==========================================
// Entities, types and pure business predicates.
// No data access here, no engine logic.
// ==========================================

pub mod journal;
pub mod milestone;
pub mod mission;
pub mod notification;
pub mod offer;
pub mod provider;
pub mod types;
pub mod wave;

// Core re-exports
pub use journal::JournalEvent;
pub use milestone::Milestone;
pub use mission::{Budget, Mission, MissionExport};
pub use notification::NotificationMessage;
pub use offer::Offer;
pub use provider::ProviderProfile;
pub use types::{
    JournalEventType, MilestoneStatus, MissionStatus, NotificationKind, NotificationStatus,
    OfferDecision, OfferStatus, WaveCloseReason, WorkMode,
};
pub use wave::Wave;
