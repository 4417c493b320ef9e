// ==========================================
// Mission Match Engine - Wave Repository
// ==========================================
// Owns the waves table plus the two wave-lifecycle cascades:
// - open_wave_cascade: wave number allocation (MAX+1 inside the tx),
//   wave + offer inserts, first-dispatch status moves and journaling
// - expire_wave_cascade: timeout sweep with a defensive re-check, so a
//   timer firing after confirm/cancel is a no-op
// ==========================================

use crate::domain::journal::JournalEvent;
use crate::domain::mission::Mission;
use crate::domain::offer::Offer;
use crate::domain::types::{JournalEventType, MissionStatus, WaveCloseReason};
use crate::domain::wave::Wave;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::journal_repo::JournalRepository;
use crate::repository::mission_repo::MissionRepository;
use crate::repository::offer_repo::{OfferRef, OfferRepository};
use chrono::{Duration, NaiveDateTime};
use rusqlite::{params, Connection};
use serde_json::json;
use std::sync::{Arc, Mutex};

/// Result of opening a wave.
#[derive(Debug, Clone)]
pub struct WaveOpenOutcome {
    pub wave: Wave,
    pub offers: Vec<Offer>,
    pub events: Vec<JournalEvent>,
}

/// Result of expiring a wave. `None` from the cascade means the wave
/// was already closed and nothing happened.
#[derive(Debug, Clone)]
pub struct WaveExpireOutcome {
    pub wave_number: i32,
    pub expired_offers: Vec<OfferRef>,
    pub events: Vec<JournalEvent>,
}

pub struct WaveRepository {
    conn: Arc<Mutex<Connection>>,
}

impl WaveRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn find(&self, mission_id: &str, wave_number: i32) -> RepositoryResult<Option<Wave>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            &format!(
                "{} WHERE mission_id = ? AND wave_number = ?",
                Self::SELECT_BASE
            ),
            params![mission_id, wave_number],
            |row| Self::map_row(row),
        ) {
            Ok(wave) => Ok(Some(wave)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// The open wave for a mission, if any. At most one exists.
    pub fn find_open(&self, mission_id: &str) -> RepositoryResult<Option<Wave>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            &format!("{} WHERE mission_id = ? AND closed_at IS NULL", Self::SELECT_BASE),
            params![mission_id],
            |row| Self::map_row(row),
        ) {
            Ok(wave) => Ok(Some(wave)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn list_by_mission(&self, mission_id: &str) -> RepositoryResult<Vec<Wave>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            "{} WHERE mission_id = ? ORDER BY wave_number ASC",
            Self::SELECT_BASE
        ))?;

        let waves = stmt
            .query_map(params![mission_id], |row| Self::map_row(row))?
            .collect::<Result<Vec<Wave>, _>>()?;

        Ok(waves)
    }

    /// Open a wave, one transaction:
    /// allocates wave_number as MAX+1 for the mission, inserts the wave
    /// and its pending offers, applies the first-dispatch status moves
    /// (draft -> dispatched -> matching) and journals everything.
    ///
    /// The caller validates preconditions under the mission lock; the
    /// in-tx open-wave guard and the status CAS are the backstop.
    /// Offers arrive with a placeholder wave_number and are stamped
    /// with the allocated one.
    pub fn open_wave_cascade(
        &self,
        mission: &Mission,
        mut offers: Vec<Offer>,
        wave_size: i32,
        timeout_minutes: i32,
        actor: &str,
    ) -> RepositoryResult<WaveOpenOutcome> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let now = chrono::Utc::now().naive_utc();

        // backstop: one open wave max
        let open_count: i32 = tx.query_row(
            "SELECT COUNT(*) FROM waves WHERE mission_id = ? AND closed_at IS NULL",
            params![&mission.mission_id],
            |row| row.get(0),
        )?;
        if open_count > 0 {
            return Err(RepositoryError::StateConflict {
                message: format!("mission {} already has an open wave", mission.mission_id),
            });
        }

        // wave_number allocation inside the tx keeps numbers gap-free
        let max_wave: Option<i32> = tx.query_row(
            "SELECT MAX(wave_number) FROM waves WHERE mission_id = ?",
            params![&mission.mission_id],
            |row| row.get(0),
        )?;
        let wave_number = max_wave.unwrap_or(0) + 1;

        let wave = Wave {
            mission_id: mission.mission_id.clone(),
            wave_number,
            wave_size,
            timeout_minutes,
            opened_at: now,
            expires_at: now + Duration::minutes(timeout_minutes as i64),
            closed_at: None,
            close_reason: None,
        };

        tx.execute(
            r#"INSERT INTO waves (
                mission_id, wave_number, wave_size, timeout_minutes,
                opened_at, expires_at, closed_at, close_reason
            ) VALUES (?, ?, ?, ?, ?, ?, NULL, NULL)"#,
            params![
                &wave.mission_id,
                wave.wave_number,
                wave.wave_size,
                wave.timeout_minutes,
                wave.opened_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                wave.expires_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            ],
        )?;

        for offer in offers.iter_mut() {
            offer.wave_number = wave_number;
            OfferRepository::insert_in_tx(&tx, offer)?;
        }

        let mut events = Vec::new();

        // first dispatch moves the mission through dispatched to matching
        if mission.status == MissionStatus::Draft {
            MissionRepository::update_status_on(
                &tx,
                &mission.mission_id,
                MissionStatus::Draft,
                MissionStatus::Dispatched,
            )?;
            let mut event =
                JournalEvent::new(&mission.mission_id, JournalEventType::StatusChanged, actor)
                    .with_payload(&json!({
                        "from": MissionStatus::Draft.to_db_str(),
                        "to": MissionStatus::Dispatched.to_db_str(),
                    }));
            event.seq = JournalRepository::append_in_tx(&tx, &event)?;
            events.push(event);

            MissionRepository::update_status_on(
                &tx,
                &mission.mission_id,
                MissionStatus::Dispatched,
                MissionStatus::Matching,
            )?;
            let mut event =
                JournalEvent::new(&mission.mission_id, JournalEventType::StatusChanged, actor)
                    .with_payload(&json!({
                        "from": MissionStatus::Dispatched.to_db_str(),
                        "to": MissionStatus::Matching.to_db_str(),
                    }));
            event.seq = JournalRepository::append_in_tx(&tx, &event)?;
            events.push(event);
        }

        let mut event = JournalEvent::new(&mission.mission_id, JournalEventType::WaveOpened, actor)
            .with_payload(&json!({
                "wave_number": wave_number,
                "wave_size": wave_size,
                "timeout_minutes": timeout_minutes,
                "invited": offers.len(),
            }));
        event.seq = JournalRepository::append_in_tx(&tx, &event)?;
        events.push(event);

        for offer in &offers {
            let mut event =
                JournalEvent::new(&mission.mission_id, JournalEventType::OfferCreated, actor)
                    .with_payload(&json!({
                        "offer_id": offer.offer_id,
                        "provider_id": offer.provider_id,
                        "wave_number": wave_number,
                        "match_score": offer.match_score,
                    }));
            event.seq = JournalRepository::append_in_tx(&tx, &event)?;
            events.push(event);
        }

        tx.commit()?;

        Ok(WaveOpenOutcome {
            wave,
            offers,
            events,
        })
    }

    /// Expire a wave, one transaction. Returns `Ok(None)` when the wave
    /// is already closed (late timer, lost race with confirm/cancel).
    ///
    /// Pending offers become expired; accepted offers survive and stay
    /// eligible for confirmation. The mission stays in matching.
    pub fn expire_wave_cascade(
        &self,
        mission_id: &str,
        wave_number: i32,
        actor: &str,
    ) -> RepositoryResult<Option<WaveExpireOutcome>> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let now = chrono::Utc::now().naive_utc();

        let closed_at: Option<String> = match tx.query_row(
            "SELECT closed_at FROM waves WHERE mission_id = ? AND wave_number = ?",
            params![mission_id, wave_number],
            |row| row.get(0),
        ) {
            Ok(v) => v,
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                return Err(RepositoryError::NotFound {
                    entity: "Wave".to_string(),
                    id: format!("{mission_id}/{wave_number}"),
                })
            }
            Err(e) => return Err(e.into()),
        };

        if closed_at.is_some() {
            return Ok(None);
        }

        let expired_offers: Vec<OfferRef> = {
            let mut stmt = tx.prepare(
                r#"SELECT offer_id, provider_id, wave_number FROM offers
                   WHERE mission_id = ? AND wave_number = ? AND status = 'PENDING'
                   ORDER BY created_at"#,
            )?;
            let refs = stmt
                .query_map(params![mission_id, wave_number], |row| {
                    Ok(OfferRef {
                        offer_id: row.get(0)?,
                        provider_id: row.get(1)?,
                        wave_number: row.get(2)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            refs
        };

        tx.execute(
            r#"UPDATE offers SET status = 'EXPIRED'
               WHERE mission_id = ? AND wave_number = ? AND status = 'PENDING'"#,
            params![mission_id, wave_number],
        )?;

        tx.execute(
            r#"UPDATE waves SET closed_at = ?, close_reason = ?
               WHERE mission_id = ? AND wave_number = ?"#,
            params![
                now.format("%Y-%m-%d %H:%M:%S").to_string(),
                WaveCloseReason::Timeout.to_db_str(),
                mission_id,
                wave_number,
            ],
        )?;

        let mut events = Vec::new();

        for offer in &expired_offers {
            let mut event = JournalEvent::new(mission_id, JournalEventType::OfferExpired, actor)
                .with_payload(&json!({
                    "offer_id": offer.offer_id,
                    "provider_id": offer.provider_id,
                    "wave_number": wave_number,
                    "reason": "wave_timeout",
                }));
            event.seq = JournalRepository::append_in_tx(&tx, &event)?;
            events.push(event);
        }

        let mut event = JournalEvent::new(mission_id, JournalEventType::WaveClosed, actor)
            .with_payload(&json!({
                "wave_number": wave_number,
                "close_reason": WaveCloseReason::Timeout.to_db_str(),
            }));
        event.seq = JournalRepository::append_in_tx(&tx, &event)?;
        events.push(event);

        tx.commit()?;

        Ok(Some(WaveExpireOutcome {
            wave_number,
            expired_offers,
            events,
        }))
    }

    const SELECT_BASE: &'static str = r#"SELECT
        mission_id, wave_number, wave_size, timeout_minutes,
        opened_at, expires_at, closed_at, close_reason
        FROM waves"#;

    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<Wave> {
        let close_reason_str: Option<String> = row.get(7)?;

        Ok(Wave {
            mission_id: row.get(0)?,
            wave_number: row.get(1)?,
            wave_size: row.get(2)?,
            timeout_minutes: row.get(3)?,
            opened_at: parse_ts(row, 4)?,
            expires_at: parse_ts(row, 5)?,
            closed_at: row
                .get::<_, Option<String>>(6)?
                .and_then(|s| NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S").ok()),
            close_reason: close_reason_str.and_then(|s| WaveCloseReason::from_str(&s)),
        })
    }
}

fn parse_ts(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(&row.get::<_, String>(idx)?, "%Y-%m-%d %H:%M:%S").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}
