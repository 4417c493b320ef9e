// ==========================================
// Mission Match Engine - Journal Repository
// ==========================================
// Append-only event store. `seq` is allocated as MAX+1 per mission
// inside the appending transaction, so readers get a gap-free,
// strictly ordered history per mission.
// ==========================================

use crate::domain::journal::JournalEvent;
use crate::domain::types::JournalEventType;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Transaction};
use std::sync::{Arc, Mutex};

pub struct JournalRepository {
    conn: Arc<Mutex<Connection>>,
}

impl JournalRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// Append inside an existing transaction, allocating the next seq.
    ///
    /// Cascade operations (dispatch, confirm, expire, cancel) call this
    /// so their journal rows commit atomically with the state change.
    pub fn append_in_tx(tx: &Transaction, event: &JournalEvent) -> RepositoryResult<i64> {
        let next_seq: i64 = tx.query_row(
            "SELECT COALESCE(MAX(seq), 0) + 1 FROM journal_events WHERE mission_id = ?",
            params![&event.mission_id],
            |row| row.get(0),
        )?;

        tx.execute(
            r#"INSERT INTO journal_events (
                mission_id, seq, ts, event_type, actor, payload_json
            ) VALUES (?, ?, ?, ?, ?, ?)"#,
            params![
                &event.mission_id,
                next_seq,
                event.ts.format("%Y-%m-%d %H:%M:%S").to_string(),
                event.event_type.to_db_str(),
                &event.actor,
                event.payload.as_ref().map(|p| p.to_string()),
            ],
        )?;

        Ok(next_seq)
    }

    /// Append a single event in its own transaction. Returns the event
    /// with its assigned seq.
    pub fn append(&self, event: &JournalEvent) -> RepositoryResult<JournalEvent> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let seq = Self::append_in_tx(&tx, event)?;
        tx.commit()?;

        let mut stored = event.clone();
        stored.seq = seq;
        Ok(stored)
    }

    /// Full history for a mission, ordered by seq.
    pub fn list_by_mission(&self, mission_id: &str) -> RepositoryResult<Vec<JournalEvent>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT mission_id, seq, ts, event_type, actor, payload_json
               FROM journal_events
               WHERE mission_id = ?
               ORDER BY seq ASC"#,
        )?;

        let events = stmt
            .query_map(params![mission_id], |row| Self::map_row(row))?
            .collect::<Result<Vec<JournalEvent>, _>>()?;

        Ok(events)
    }

    /// Events of one type for a mission, ordered by seq. Used by tests
    /// and by invariant checks.
    pub fn list_by_type(
        &self,
        mission_id: &str,
        event_type: JournalEventType,
    ) -> RepositoryResult<Vec<JournalEvent>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT mission_id, seq, ts, event_type, actor, payload_json
               FROM journal_events
               WHERE mission_id = ? AND event_type = ?
               ORDER BY seq ASC"#,
        )?;

        let events = stmt
            .query_map(params![mission_id, event_type.to_db_str()], |row| {
                Self::map_row(row)
            })?
            .collect::<Result<Vec<JournalEvent>, _>>()?;

        Ok(events)
    }

    /// Highest seq for a mission (0 when empty).
    pub fn latest_seq(&self, mission_id: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;

        let seq: i64 = conn.query_row(
            "SELECT COALESCE(MAX(seq), 0) FROM journal_events WHERE mission_id = ?",
            params![mission_id],
            |row| row.get(0),
        )?;

        Ok(seq)
    }

    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<JournalEvent> {
        let type_str: String = row.get(3)?;
        let payload_str: Option<String> = row.get(5)?;

        Ok(JournalEvent {
            mission_id: row.get(0)?,
            seq: row.get(1)?,
            ts: NaiveDateTime::parse_from_str(&row.get::<_, String>(2)?, "%Y-%m-%d %H:%M:%S")
                .map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        2,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?,
            event_type: JournalEventType::from_str(&type_str)
                .unwrap_or(JournalEventType::StatusChanged),
            actor: row.get(4)?,
            payload: payload_str.and_then(|s| serde_json::from_str(&s).ok()),
        })
    }
}
