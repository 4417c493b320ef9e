// ==========================================
// Mission Match Engine - Notification Delivery
// ==========================================
// Core transitions only enqueue; this module owns the other half of
// the outbox pattern. The NotificationWorker drains pending messages
// and hands each one to a NotificationSender, the async seam where a
// real channel (mail, webhook, chat) plugs in. Delivery failures feed
// the outbox retry bookkeeping and never reach the caller that
// triggered the notification.
// ==========================================

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::domain::mission::Mission;
use crate::domain::notification::NotificationMessage;
use crate::domain::offer::Offer;
use crate::repository::{NotificationOutboxRepository, RepositoryResult};

// ==========================================
// NotificationSender trait
// ==========================================

/// Delivery seam for outbound provider notifications.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// Deliver one message. An `Err` counts as a failed attempt and
    /// goes through the outbox retry budget.
    async fn send(&self, message: &NotificationMessage) -> anyhow::Result<()>;
}

/// Swallows every message. Test wiring and headless runs.
#[derive(Debug, Clone, Default)]
pub struct NoOpNotificationSender;

#[async_trait]
impl NotificationSender for NoOpNotificationSender {
    async fn send(&self, _message: &NotificationMessage) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Logs each delivery instead of sending it. Default wiring until a
/// real channel is configured.
#[derive(Debug, Clone, Default)]
pub struct LogNotificationSender;

#[async_trait]
impl NotificationSender for LogNotificationSender {
    async fn send(&self, message: &NotificationMessage) -> anyhow::Result<()> {
        info!(
            message_id = %message.message_id,
            provider_id = %message.provider_id,
            mission_id = %message.mission_id,
            kind = %message.kind,
            "notification delivered (log channel)"
        );
        Ok(())
    }
}

// ==========================================
// NotificationWorker
// ==========================================

/// Counts for one drain pass over the outbox.
#[derive(Debug, Clone, Default)]
pub struct DrainReport {
    pub attempted: usize,
    pub sent: usize,
    pub failed: usize,
}

pub struct NotificationWorker {
    outbox_repo: Arc<NotificationOutboxRepository>,
    sender: Arc<dyn NotificationSender>,
}

impl NotificationWorker {
    pub fn new(
        outbox_repo: Arc<NotificationOutboxRepository>,
        sender: Arc<dyn NotificationSender>,
    ) -> Self {
        Self {
            outbox_repo,
            sender,
        }
    }

    /// Drain up to `limit` pending messages, oldest first.
    ///
    /// Outbox reads and status updates are short single-row statements,
    /// so they run inline; only the delivery itself awaits. A message
    /// that fails here goes back to pending until its retry budget runs
    /// out, then parks as failed.
    pub async fn process_pending(&self, limit: usize) -> RepositoryResult<DrainReport> {
        let batch = self.outbox_repo.fetch_pending(limit)?;
        let mut report = DrainReport {
            attempted: batch.len(),
            ..Default::default()
        };

        for message in &batch {
            match self.sender.send(message).await {
                Ok(()) => {
                    self.outbox_repo.mark_sent(&message.message_id)?;
                    report.sent += 1;
                }
                Err(e) => {
                    self.outbox_repo
                        .mark_failed(&message.message_id, &e.to_string())?;
                    report.failed += 1;
                }
            }
        }

        if report.attempted > 0 {
            debug!(
                attempted = report.attempted,
                sent = report.sent,
                failed = report.failed,
                "outbox drain pass finished"
            );
        }
        Ok(report)
    }
}

// ==========================================
// Message bodies
// ==========================================

fn budget_text(mission: &Mission) -> String {
    match (mission.budget.minimum, mission.budget.maximum) {
        (Some(lo), Some(hi)) => format!("{:.0}-{:.0} {}", lo, hi, mission.budget.currency),
        (Some(lo), None) => format!("from {:.0} {}", lo, mission.budget.currency),
        (None, Some(hi)) => format!("up to {:.0} {}", hi, mission.budget.currency),
        (None, None) => "to be negotiated".to_string(),
    }
}

/// Invite body for a freshly dispatched offer.
pub fn render_invite(mission: &Mission, offer: &Offer) -> String {
    format!(
        "You are invited to quote for mission '{}' (wave {}). Budget: {}. Reply before the wave closes.",
        mission.title,
        offer.wave_number,
        budget_text(mission),
    )
}

/// Outcome body sent after confirmation: one winner, the rest stand down.
pub fn render_outcome(mission: &Mission, confirmed: bool) -> String {
    if confirmed {
        format!(
            "Your offer for mission '{}' was confirmed. The requester will contact you to start.",
            mission.title,
        )
    } else {
        format!(
            "Mission '{}' has been assigned to another provider. Thank you for your quote.",
            mission.title,
        )
    }
}
