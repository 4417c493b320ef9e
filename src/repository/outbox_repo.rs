// ==========================================
// Mission Match Engine - Notification Outbox Repository
// ==========================================
// Durable queue for outbound provider messages. Enqueue happens next
// to the state change that produced the message; delivery runs later
// with bounded retries. A message that exhausts its retries parks as
// FAILED and stays visible for inspection.
// ==========================================

use crate::domain::notification::NotificationMessage;
use crate::domain::types::{NotificationKind, NotificationStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection};
use serde::Serialize;
use std::sync::{Arc, Mutex};

/// Queue counters, grouped by delivery status.
#[derive(Debug, Clone, Serialize)]
pub struct OutboxStats {
    pub pending: i64,
    pub sent: i64,
    pub failed: i64,
}

pub struct NotificationOutboxRepository {
    conn: Arc<Mutex<Connection>>,
}

impl NotificationOutboxRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// Queue a message for delivery.
    pub fn enqueue(&self, message: &NotificationMessage) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO notification_outbox (
                message_id, provider_id, mission_id, kind, body,
                status, retry_count, max_retries, created_at, sent_at, last_error
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"#,
            params![
                &message.message_id,
                &message.provider_id,
                &message.mission_id,
                message.kind.to_db_str(),
                &message.body,
                message.status.to_db_str(),
                message.retry_count,
                message.max_retries,
                message.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                message
                    .sent_at
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string()),
                &message.last_error,
            ],
        )?;

        tracing::debug!(
            "notification queued: message_id={}, provider_id={}, kind={}",
            message.message_id,
            message.provider_id,
            message.kind.to_db_str()
        );

        Ok(message.message_id.clone())
    }

    pub fn find_by_id(&self, message_id: &str) -> RepositoryResult<Option<NotificationMessage>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            &format!("{} WHERE message_id = ?", Self::SELECT_BASE),
            params![message_id],
            |row| Self::map_row(row),
        ) {
            Ok(m) => Ok(Some(m)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Oldest-first batch of undelivered messages.
    pub fn fetch_pending(&self, limit: usize) -> RepositoryResult<Vec<NotificationMessage>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            "{} WHERE status = 'PENDING' ORDER BY created_at ASC LIMIT ?",
            Self::SELECT_BASE
        ))?;

        let messages = stmt
            .query_map(params![limit as i64], |row| Self::map_row(row))?
            .collect::<Result<Vec<NotificationMessage>, _>>()?;

        Ok(messages)
    }

    pub fn list_by_mission(&self, mission_id: &str) -> RepositoryResult<Vec<NotificationMessage>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            "{} WHERE mission_id = ? ORDER BY created_at ASC",
            Self::SELECT_BASE
        ))?;

        let messages = stmt
            .query_map(params![mission_id], |row| Self::map_row(row))?
            .collect::<Result<Vec<NotificationMessage>, _>>()?;

        Ok(messages)
    }

    /// Record a successful delivery.
    pub fn mark_sent(&self, message_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        let rows_affected = conn.execute(
            "UPDATE notification_outbox
             SET status = 'SENT', sent_at = ?1, last_error = NULL
             WHERE message_id = ?2",
            params![
                Utc::now().naive_utc().format("%Y-%m-%d %H:%M:%S").to_string(),
                message_id
            ],
        )?;

        if rows_affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "NotificationMessage".to_string(),
                id: message_id.to_string(),
            });
        }

        Ok(())
    }

    /// Record a failed delivery attempt. The message stays PENDING while
    /// retries remain, otherwise parks as FAILED. Returns the resulting
    /// status so the worker can log the terminal case.
    pub fn mark_failed(
        &self,
        message_id: &str,
        error: &str,
    ) -> RepositoryResult<NotificationStatus> {
        let conn = self.get_conn()?;

        let (retry_count, max_retries): (i32, i32) = conn
            .query_row(
                "SELECT retry_count, max_retries FROM notification_outbox WHERE message_id = ?",
                params![message_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound {
                    entity: "NotificationMessage".to_string(),
                    id: message_id.to_string(),
                },
                other => other.into(),
            })?;

        let next_count = retry_count + 1;
        let next_status = if next_count < max_retries {
            NotificationStatus::Pending
        } else {
            NotificationStatus::Failed
        };

        conn.execute(
            "UPDATE notification_outbox
             SET status = ?1, retry_count = ?2, last_error = ?3
             WHERE message_id = ?4",
            params![next_status.to_db_str(), next_count, error, message_id],
        )?;

        match next_status {
            NotificationStatus::Failed => {
                tracing::error!(
                    "notification delivery gave up: message_id={}, retries={}, error={}",
                    message_id,
                    next_count,
                    error
                );
            }
            _ => {
                tracing::warn!(
                    "notification delivery failed, will retry: message_id={}, retries={}, error={}",
                    message_id,
                    next_count,
                    error
                );
            }
        }

        Ok(next_status)
    }

    pub fn stats(&self) -> RepositoryResult<OutboxStats> {
        let conn = self.get_conn()?;

        let count_for = |status: &str| -> RepositoryResult<i64> {
            conn.query_row(
                "SELECT COUNT(*) FROM notification_outbox WHERE status = ?",
                params![status],
                |row| row.get(0),
            )
            .map_err(Into::into)
        };

        Ok(OutboxStats {
            pending: count_for("PENDING")?,
            sent: count_for("SENT")?,
            failed: count_for("FAILED")?,
        })
    }

    const SELECT_BASE: &'static str = r#"SELECT
        message_id, provider_id, mission_id, kind, body,
        status, retry_count, max_retries, created_at, sent_at, last_error
        FROM notification_outbox"#;

    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<NotificationMessage> {
        let kind_str: String = row.get(3)?;
        let status_str: String = row.get(5)?;

        Ok(NotificationMessage {
            message_id: row.get(0)?,
            provider_id: row.get(1)?,
            mission_id: row.get(2)?,
            kind: NotificationKind::from_str(&kind_str)
                .unwrap_or(NotificationKind::OfferInvite),
            body: row.get(4)?,
            status: NotificationStatus::from_str(&status_str),
            retry_count: row.get(6)?,
            max_retries: row.get(7)?,
            created_at: NaiveDateTime::parse_from_str(
                &row.get::<_, String>(8)?,
                "%Y-%m-%d %H:%M:%S",
            )
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    8,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?,
            sent_at: row
                .get::<_, Option<String>>(9)?
                .and_then(|s| NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S").ok()),
            last_error: row.get(10)?,
        })
    }
}
