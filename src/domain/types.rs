// ==========================================
// Mission Match Engine - Domain Types
// ==========================================
// Serialization format: SCREAMING_SNAKE_CASE (matches database storage)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// Mission Status
// ==========================================
// Lifecycle: draft -> dispatched -> matching -> confirmed -> completed
// Terminal branches: cancelled (from any non-terminal state)
// `matching` is re-entrant across waves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MissionStatus {
    Draft,      // created, not yet dispatched
    Dispatched, // first wave requested
    Matching,   // offers open / collecting responses
    Confirmed,  // exactly one offer confirmed
    Completed,  // work delivered and validated
    Cancelled,  // terminated by the requester
}

impl fmt::Display for MissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissionStatus::Draft => write!(f, "DRAFT"),
            MissionStatus::Dispatched => write!(f, "DISPATCHED"),
            MissionStatus::Matching => write!(f, "MATCHING"),
            MissionStatus::Confirmed => write!(f, "CONFIRMED"),
            MissionStatus::Completed => write!(f, "COMPLETED"),
            MissionStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

impl MissionStatus {
    /// Parse from a database string.
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "DRAFT" => MissionStatus::Draft,
            "DISPATCHED" => MissionStatus::Dispatched,
            "MATCHING" => MissionStatus::Matching,
            "CONFIRMED" => MissionStatus::Confirmed,
            "COMPLETED" => MissionStatus::Completed,
            "CANCELLED" => MissionStatus::Cancelled,
            _ => MissionStatus::Draft, // default
        }
    }

    /// Database storage string.
    pub fn to_db_str(&self) -> &'static str {
        match self {
            MissionStatus::Draft => "DRAFT",
            MissionStatus::Dispatched => "DISPATCHED",
            MissionStatus::Matching => "MATCHING",
            MissionStatus::Confirmed => "CONFIRMED",
            MissionStatus::Completed => "COMPLETED",
            MissionStatus::Cancelled => "CANCELLED",
        }
    }

    /// Terminal states accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, MissionStatus::Completed | MissionStatus::Cancelled)
    }

    /// States from which a wave may be dispatched.
    pub fn can_dispatch(&self) -> bool {
        matches!(self, MissionStatus::Draft | MissionStatus::Matching)
    }

    /// Forward-only transition check. Cancel is legal from every
    /// non-terminal state; everything else follows the lifecycle order.
    pub fn can_transition(&self, to: MissionStatus) -> bool {
        use MissionStatus::*;
        match (self, to) {
            (Draft, Dispatched) => true,
            (Dispatched, Matching) => true,
            (Matching, Matching) => true, // re-entrant across waves
            (Matching, Confirmed) => true,
            (Confirmed, Completed) => true,
            (from, Cancelled) => !from.is_terminal(),
            _ => false,
        }
    }
}

// ==========================================
// Work Mode
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkMode {
    Remote, // fully remote delivery
    Local,  // on-site at the mission location
    Hybrid, // mixed
}

impl fmt::Display for WorkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkMode::Remote => write!(f, "REMOTE"),
            WorkMode::Local => write!(f, "LOCAL"),
            WorkMode::Hybrid => write!(f, "HYBRID"),
        }
    }
}

impl WorkMode {
    /// Parse from a database or import string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "REMOTE" => Some(WorkMode::Remote),
            "LOCAL" => Some(WorkMode::Local),
            "HYBRID" => Some(WorkMode::Hybrid),
            _ => None,
        }
    }

    /// Database storage string.
    pub fn to_db_str(&self) -> &'static str {
        match self {
            WorkMode::Remote => "REMOTE",
            WorkMode::Local => "LOCAL",
            WorkMode::Hybrid => "HYBRID",
        }
    }
}

// ==========================================
// Offer Status
// ==========================================
// pending -> accepted | rejected (provider response)
// pending -> expired (wave timeout / mission cancel)
// accepted -> confirmed (requester pick) | rejected (confirm cascade)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OfferStatus {
    Pending,   // invited, no response yet
    Accepted,  // provider accepted, awaiting confirmation
    Rejected,  // declined by provider or displaced by confirmation
    Expired,   // wave timed out or mission cancelled before resolution
    Confirmed, // exclusive winner
}

impl fmt::Display for OfferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OfferStatus::Pending => write!(f, "PENDING"),
            OfferStatus::Accepted => write!(f, "ACCEPTED"),
            OfferStatus::Rejected => write!(f, "REJECTED"),
            OfferStatus::Expired => write!(f, "EXPIRED"),
            OfferStatus::Confirmed => write!(f, "CONFIRMED"),
        }
    }
}

impl OfferStatus {
    /// Parse from a database string.
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "PENDING" => OfferStatus::Pending,
            "ACCEPTED" => OfferStatus::Accepted,
            "REJECTED" => OfferStatus::Rejected,
            "EXPIRED" => OfferStatus::Expired,
            "CONFIRMED" => OfferStatus::Confirmed,
            _ => OfferStatus::Pending, // default
        }
    }

    /// Database storage string.
    pub fn to_db_str(&self) -> &'static str {
        match self {
            OfferStatus::Pending => "PENDING",
            OfferStatus::Accepted => "ACCEPTED",
            OfferStatus::Rejected => "REJECTED",
            OfferStatus::Expired => "EXPIRED",
            OfferStatus::Confirmed => "CONFIRMED",
        }
    }

    /// Unresolved offers are swept to `expired` on mission cancel.
    pub fn is_unresolved(&self) -> bool {
        matches!(self, OfferStatus::Pending | OfferStatus::Accepted)
    }

    /// A provider holding a non-expired offer is excluded from later waves.
    pub fn blocks_reinvite(&self) -> bool {
        !matches!(self, OfferStatus::Expired)
    }
}

// ==========================================
// Offer Decision (provider response input)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OfferDecision {
    Accept,
    Decline,
}

impl OfferDecision {
    /// Parse from caller input.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "ACCEPT" => Some(OfferDecision::Accept),
            "DECLINE" => Some(OfferDecision::Decline),
            _ => None,
        }
    }
}

// ==========================================
// Wave Close Reason
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WaveCloseReason {
    Timeout,   // timer expired with no confirmation
    Confirmed, // closed by the confirm cascade
    Cancelled, // closed by mission cancellation
}

impl fmt::Display for WaveCloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaveCloseReason::Timeout => write!(f, "TIMEOUT"),
            WaveCloseReason::Confirmed => write!(f, "CONFIRMED"),
            WaveCloseReason::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

impl WaveCloseReason {
    /// Parse from a database string (column is NULL while the wave is open).
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "TIMEOUT" => Some(WaveCloseReason::Timeout),
            "CONFIRMED" => Some(WaveCloseReason::Confirmed),
            "CANCELLED" => Some(WaveCloseReason::Cancelled),
            _ => None,
        }
    }

    /// Database storage string.
    pub fn to_db_str(&self) -> &'static str {
        match self {
            WaveCloseReason::Timeout => "TIMEOUT",
            WaveCloseReason::Confirmed => "CONFIRMED",
            WaveCloseReason::Cancelled => "CANCELLED",
        }
    }
}

// ==========================================
// Journal Event Type
// ==========================================
// One event per transition; the journal is append-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JournalEventType {
    MissionCreated,
    StatusChanged,
    WaveOpened,
    WaveClosed,
    OfferCreated,
    OfferResponded,
    OfferConfirmed,
    OfferRejected,
    OfferExpired,
    MissionCancelled,
}

impl fmt::Display for JournalEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl JournalEventType {
    /// Parse from a database string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "MISSION_CREATED" => Some(JournalEventType::MissionCreated),
            "STATUS_CHANGED" => Some(JournalEventType::StatusChanged),
            "WAVE_OPENED" => Some(JournalEventType::WaveOpened),
            "WAVE_CLOSED" => Some(JournalEventType::WaveClosed),
            "OFFER_CREATED" => Some(JournalEventType::OfferCreated),
            "OFFER_RESPONDED" => Some(JournalEventType::OfferResponded),
            "OFFER_CONFIRMED" => Some(JournalEventType::OfferConfirmed),
            "OFFER_REJECTED" => Some(JournalEventType::OfferRejected),
            "OFFER_EXPIRED" => Some(JournalEventType::OfferExpired),
            "MISSION_CANCELLED" => Some(JournalEventType::MissionCancelled),
            _ => None,
        }
    }

    /// Database storage string.
    pub fn to_db_str(&self) -> &'static str {
        match self {
            JournalEventType::MissionCreated => "MISSION_CREATED",
            JournalEventType::StatusChanged => "STATUS_CHANGED",
            JournalEventType::WaveOpened => "WAVE_OPENED",
            JournalEventType::WaveClosed => "WAVE_CLOSED",
            JournalEventType::OfferCreated => "OFFER_CREATED",
            JournalEventType::OfferResponded => "OFFER_RESPONDED",
            JournalEventType::OfferConfirmed => "OFFER_CONFIRMED",
            JournalEventType::OfferRejected => "OFFER_REJECTED",
            JournalEventType::OfferExpired => "OFFER_EXPIRED",
            JournalEventType::MissionCancelled => "MISSION_CANCELLED",
        }
    }
}

// ==========================================
// Milestone Status
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MilestoneStatus {
    Todo,
    InProgress,
    Delivered,
    Validated,
}

impl fmt::Display for MilestoneStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl MilestoneStatus {
    /// Parse from a database string.
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "TODO" => MilestoneStatus::Todo,
            "IN_PROGRESS" => MilestoneStatus::InProgress,
            "DELIVERED" => MilestoneStatus::Delivered,
            "VALIDATED" => MilestoneStatus::Validated,
            _ => MilestoneStatus::Todo, // default
        }
    }

    /// Database storage string.
    pub fn to_db_str(&self) -> &'static str {
        match self {
            MilestoneStatus::Todo => "TODO",
            MilestoneStatus::InProgress => "IN_PROGRESS",
            MilestoneStatus::Delivered => "DELIVERED",
            MilestoneStatus::Validated => "VALIDATED",
        }
    }
}

// ==========================================
// Notification Status (outbound queue)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationStatus {
    Pending, // queued, not yet delivered
    Sent,    // handed to the sender
    Failed,  // retries exhausted
}

impl fmt::Display for NotificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl NotificationStatus {
    /// Parse from a database string.
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "PENDING" => NotificationStatus::Pending,
            "SENT" => NotificationStatus::Sent,
            "FAILED" => NotificationStatus::Failed,
            _ => NotificationStatus::Pending, // default
        }
    }

    /// Database storage string.
    pub fn to_db_str(&self) -> &'static str {
        match self {
            NotificationStatus::Pending => "PENDING",
            NotificationStatus::Sent => "SENT",
            NotificationStatus::Failed => "FAILED",
        }
    }
}

// ==========================================
// Notification Kind
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    OfferInvite,  // a wave invited the provider
    OfferOutcome, // the offer was confirmed / rejected / expired
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl NotificationKind {
    /// Parse from a database string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "OFFER_INVITE" => Some(NotificationKind::OfferInvite),
            "OFFER_OUTCOME" => Some(NotificationKind::OfferOutcome),
            _ => None,
        }
    }

    /// Database storage string.
    pub fn to_db_str(&self) -> &'static str {
        match self {
            NotificationKind::OfferInvite => "OFFER_INVITE",
            NotificationKind::OfferOutcome => "OFFER_OUTCOME",
        }
    }
}

// ==========================================
// Transition table tests
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_forward_transitions() {
        assert!(MissionStatus::Draft.can_transition(MissionStatus::Dispatched));
        assert!(MissionStatus::Dispatched.can_transition(MissionStatus::Matching));
        assert!(MissionStatus::Matching.can_transition(MissionStatus::Matching));
        assert!(MissionStatus::Matching.can_transition(MissionStatus::Confirmed));
        assert!(MissionStatus::Confirmed.can_transition(MissionStatus::Completed));
    }

    #[test]
    fn test_no_backward_transitions() {
        assert!(!MissionStatus::Matching.can_transition(MissionStatus::Draft));
        assert!(!MissionStatus::Confirmed.can_transition(MissionStatus::Matching));
        assert!(!MissionStatus::Completed.can_transition(MissionStatus::Matching));
        assert!(!MissionStatus::Draft.can_transition(MissionStatus::Matching));
        assert!(!MissionStatus::Draft.can_transition(MissionStatus::Confirmed));
    }

    #[test]
    fn test_cancel_from_non_terminal_only() {
        assert!(MissionStatus::Draft.can_transition(MissionStatus::Cancelled));
        assert!(MissionStatus::Dispatched.can_transition(MissionStatus::Cancelled));
        assert!(MissionStatus::Matching.can_transition(MissionStatus::Cancelled));
        assert!(MissionStatus::Confirmed.can_transition(MissionStatus::Cancelled));
        assert!(!MissionStatus::Completed.can_transition(MissionStatus::Cancelled));
        assert!(!MissionStatus::Cancelled.can_transition(MissionStatus::Cancelled));
    }

    #[test]
    fn test_dispatchable_states() {
        assert!(MissionStatus::Draft.can_dispatch());
        assert!(MissionStatus::Matching.can_dispatch());
        assert!(!MissionStatus::Dispatched.can_dispatch());
        assert!(!MissionStatus::Confirmed.can_dispatch());
        assert!(!MissionStatus::Cancelled.can_dispatch());
    }

    #[test]
    fn test_offer_status_db_round_trip() {
        for status in [
            OfferStatus::Pending,
            OfferStatus::Accepted,
            OfferStatus::Rejected,
            OfferStatus::Expired,
            OfferStatus::Confirmed,
        ] {
            assert_eq!(OfferStatus::from_str(status.to_db_str()), status);
        }
    }

    #[test]
    fn test_reinvite_blocking() {
        assert!(OfferStatus::Pending.blocks_reinvite());
        assert!(OfferStatus::Accepted.blocks_reinvite());
        assert!(OfferStatus::Rejected.blocks_reinvite());
        assert!(OfferStatus::Confirmed.blocks_reinvite());
        assert!(!OfferStatus::Expired.blocks_reinvite());
    }
}
