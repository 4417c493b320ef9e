// ==========================================
// Mission Match Engine - Mission Repository
// ==========================================
// Status updates are compare-and-set: the UPDATE carries the expected
// current status, and zero affected rows is disambiguated into
// NotFound vs StatusCasFailure. The mission lock in the engine layer
// serializes writers in-process; the CAS catches everything else.
// ==========================================

use crate::domain::journal::JournalEvent;
use crate::domain::mission::{Budget, Mission};
use crate::domain::types::{JournalEventType, MissionStatus, WaveCloseReason, WorkMode};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::journal_repo::JournalRepository;
use crate::repository::offer_repo::OfferRef;
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection};
use serde_json::json;
use std::sync::{Arc, Mutex};

/// Result of the cancel cascade.
#[derive(Debug, Clone)]
pub struct CancelOutcome {
    pub mission: Mission,
    pub expired_offers: Vec<OfferRef>,
    pub closed_wave: Option<i32>,
    pub events: Vec<JournalEvent>,
}

/// Result of creating a mission.
#[derive(Debug, Clone)]
pub struct CreateOutcome {
    pub mission: Mission,
    pub events: Vec<JournalEvent>,
}

pub struct MissionRepository {
    conn: Arc<Mutex<Connection>>,
}

impl MissionRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// Insert a new mission and its `mission_created` journal entry in
    /// one transaction.
    pub fn create_cascade(&self, mission: &Mission, actor: &str) -> RepositoryResult<CreateOutcome> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        Self::insert_on(&tx, mission)?;

        let mut event = JournalEvent::new(
            &mission.mission_id,
            JournalEventType::MissionCreated,
            actor,
        )
        .with_payload(&json!({
            "title": mission.title,
            "status": mission.status.to_db_str(),
        }));
        event.seq = JournalRepository::append_in_tx(&tx, &event)?;

        tx.commit()?;

        Ok(CreateOutcome {
            mission: mission.clone(),
            events: vec![event],
        })
    }

    pub fn insert(&self, mission: &Mission) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        Self::insert_on(&conn, mission)?;
        Ok(mission.mission_id.clone())
    }

    fn insert_on(conn: &Connection, mission: &Mission) -> RepositoryResult<()> {
        conn.execute(
            r#"INSERT INTO missions (
                mission_id, requester, title, description,
                deliverables_json, keywords_json, summary,
                deadline, duration_days, budget_min, budget_max, currency,
                language, work_mode, location_hint,
                allow_expansion, collect_multiple_quotes,
                status, archived, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &mission.mission_id,
                &mission.requester,
                &mission.title,
                &mission.description,
                serde_json::to_string(&mission.deliverables).unwrap_or_else(|_| "[]".into()),
                serde_json::to_string(&mission.keywords).unwrap_or_else(|_| "[]".into()),
                &mission.summary,
                &mission.deadline.map(|d| d.format("%Y-%m-%d").to_string()),
                &mission.duration_days,
                &mission.budget.minimum,
                &mission.budget.maximum,
                &mission.budget.currency,
                &mission.language,
                mission.work_mode.to_db_str(),
                &mission.location_hint,
                mission.allow_expansion as i32,
                mission.collect_multiple_quotes as i32,
                mission.status.to_db_str(),
                mission.archived as i32,
                mission.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                mission.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            ],
        )?;

        Ok(())
    }

    pub fn find_by_id(&self, mission_id: &str) -> RepositoryResult<Option<Mission>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            &format!("{} WHERE mission_id = ?", Self::SELECT_BASE),
            params![mission_id],
            |row| Self::map_row(row),
        ) {
            Ok(mission) => Ok(Some(mission)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// `find_by_id` that treats absence as an error with entity context.
    pub fn require(&self, mission_id: &str) -> RepositoryResult<Mission> {
        self.find_by_id(mission_id)?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "Mission".to_string(),
                id: mission_id.to_string(),
            })
    }

    pub fn list_by_status(&self, status: MissionStatus) -> RepositoryResult<Vec<Mission>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            "{} WHERE status = ? AND archived = 0 ORDER BY created_at",
            Self::SELECT_BASE
        ))?;

        let missions = stmt
            .query_map(params![status.to_db_str()], |row| Self::map_row(row))?
            .collect::<Result<Vec<Mission>, _>>()?;

        Ok(missions)
    }

    /// Compare-and-set status update.
    ///
    /// # Errors
    /// - `RepositoryError::StatusCasFailure`: another writer moved the
    ///   mission first
    /// - `RepositoryError::NotFound`: mission_id does not exist
    pub fn update_status(
        &self,
        mission_id: &str,
        expected: MissionStatus,
        next: MissionStatus,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        Self::update_status_on(&conn, mission_id, expected, next)
    }

    /// CAS update against a borrowed connection (or transaction).
    pub fn update_status_on(
        conn: &Connection,
        mission_id: &str,
        expected: MissionStatus,
        next: MissionStatus,
    ) -> RepositoryResult<()> {
        let now = chrono::Utc::now().naive_utc();
        let rows_affected = conn.execute(
            "UPDATE missions SET status = ?, updated_at = ? WHERE mission_id = ? AND status = ?",
            params![
                next.to_db_str(),
                now.format("%Y-%m-%d %H:%M:%S").to_string(),
                mission_id,
                expected.to_db_str(),
            ],
        )?;

        if rows_affected == 0 {
            let actual: Result<String, _> = conn.query_row(
                "SELECT status FROM missions WHERE mission_id = ?",
                params![mission_id],
                |row| row.get(0),
            );

            match actual {
                Ok(actual_status) => {
                    return Err(RepositoryError::StatusCasFailure {
                        entity: "Mission".to_string(),
                        id: mission_id.to_string(),
                        expected: expected.to_db_str().to_string(),
                        actual: actual_status,
                    });
                }
                Err(_) => {
                    return Err(RepositoryError::NotFound {
                        entity: "Mission".to_string(),
                        id: mission_id.to_string(),
                    });
                }
            }
        }

        Ok(())
    }

    /// CAS transition plus its `status_changed` journal entry, one
    /// transaction. Returns the mission as committed.
    pub fn transition_with_journal(
        &self,
        mission_id: &str,
        expected: MissionStatus,
        next: MissionStatus,
        actor: &str,
    ) -> RepositoryResult<(Mission, Vec<JournalEvent>)> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        Self::update_status_on(&tx, mission_id, expected, next)?;

        let mut event = JournalEvent::new(mission_id, JournalEventType::StatusChanged, actor)
            .with_payload(&json!({
                "from": expected.to_db_str(),
                "to": next.to_db_str(),
            }));
        event.seq = JournalRepository::append_in_tx(&tx, &event)?;

        let mission = tx.query_row(
            &format!("{} WHERE mission_id = ?", Self::SELECT_BASE),
            params![mission_id],
            |row| Self::map_row(row),
        )?;

        tx.commit()?;

        Ok((mission, vec![event]))
    }

    /// Soft delete. Legal from terminal states only; the journal stays.
    pub fn set_archived(&self, mission_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        let mission = match conn.query_row(
            &format!("{} WHERE mission_id = ?", Self::SELECT_BASE),
            params![mission_id],
            |row| Self::map_row(row),
        ) {
            Ok(m) => m,
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                return Err(RepositoryError::NotFound {
                    entity: "Mission".to_string(),
                    id: mission_id.to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        };

        if !mission.status.is_terminal() {
            return Err(RepositoryError::BusinessRuleViolation(format!(
                "cannot archive mission in status {}",
                mission.status
            )));
        }

        conn.execute(
            "UPDATE missions SET archived = 1 WHERE mission_id = ?",
            params![mission_id],
        )?;

        Ok(())
    }

    /// Cancel cascade, one transaction:
    /// unresolved offers -> expired, the open wave (if any) closes with
    /// reason CANCELLED, the mission goes terminal, and every step is
    /// journaled in order.
    pub fn cancel_cascade(&self, mission_id: &str, actor: &str) -> RepositoryResult<CancelOutcome> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let now = chrono::Utc::now().naive_utc();

        let current_str: String = tx
            .query_row(
                "SELECT status FROM missions WHERE mission_id = ?",
                params![mission_id],
                |row| row.get(0),
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound {
                    entity: "Mission".to_string(),
                    id: mission_id.to_string(),
                },
                other => other.into(),
            })?;
        let current = MissionStatus::from_str(&current_str);

        if !current.can_transition(MissionStatus::Cancelled) {
            return Err(RepositoryError::InvalidStateTransition {
                from: current.to_db_str().to_string(),
                to: MissionStatus::Cancelled.to_db_str().to_string(),
            });
        }

        // 1. sweep unresolved offers to expired
        let expired_offers: Vec<OfferRef> = {
            let mut stmt = tx.prepare(
                r#"SELECT offer_id, provider_id, wave_number FROM offers
                   WHERE mission_id = ? AND status IN ('PENDING', 'ACCEPTED')
                   ORDER BY wave_number, created_at"#,
            )?;
            let refs = stmt
                .query_map(params![mission_id], |row| {
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
               WHERE mission_id = ? AND status IN ('PENDING', 'ACCEPTED')"#,
            params![mission_id],
        )?;

        // 2. close the open wave, if one exists
        let open_wave: Option<i32> = {
            let result = tx.query_row(
                "SELECT wave_number FROM waves WHERE mission_id = ? AND closed_at IS NULL",
                params![mission_id],
                |row| row.get(0),
            );
            match result {
                Ok(n) => Some(n),
                Err(rusqlite::Error::QueryReturnedNoRows) => None,
                Err(e) => return Err(e.into()),
            }
        };

        if open_wave.is_some() {
            tx.execute(
                r#"UPDATE waves SET closed_at = ?, close_reason = ?
                   WHERE mission_id = ? AND closed_at IS NULL"#,
                params![
                    now.format("%Y-%m-%d %H:%M:%S").to_string(),
                    WaveCloseReason::Cancelled.to_db_str(),
                    mission_id,
                ],
            )?;
        }

        // 3. terminal status
        Self::update_status_on(&tx, mission_id, current, MissionStatus::Cancelled)?;

        // 4. journal, leaf first
        let mut events = Vec::new();

        for offer in &expired_offers {
            let mut event = JournalEvent::new(mission_id, JournalEventType::OfferExpired, actor)
                .with_payload(&json!({
                    "offer_id": offer.offer_id,
                    "provider_id": offer.provider_id,
                    "wave_number": offer.wave_number,
                    "reason": "mission_cancelled",
                }));
            event.seq = JournalRepository::append_in_tx(&tx, &event)?;
            events.push(event);
        }

        if let Some(wave_number) = open_wave {
            let mut event = JournalEvent::new(mission_id, JournalEventType::WaveClosed, actor)
                .with_payload(&json!({
                    "wave_number": wave_number,
                    "close_reason": WaveCloseReason::Cancelled.to_db_str(),
                }));
            event.seq = JournalRepository::append_in_tx(&tx, &event)?;
            events.push(event);
        }

        let mut event = JournalEvent::new(mission_id, JournalEventType::MissionCancelled, actor)
            .with_payload(&json!({
                "from_status": current.to_db_str(),
            }));
        event.seq = JournalRepository::append_in_tx(&tx, &event)?;
        events.push(event);

        let mission = tx.query_row(
            &format!("{} WHERE mission_id = ?", Self::SELECT_BASE),
            params![mission_id],
            |row| Self::map_row(row),
        )?;

        tx.commit()?;

        Ok(CancelOutcome {
            mission,
            expired_offers,
            closed_wave: open_wave,
            events,
        })
    }

    pub(crate) const SELECT_BASE: &'static str = r#"SELECT
        mission_id, requester, title, description,
        deliverables_json, keywords_json, summary,
        deadline, duration_days, budget_min, budget_max, currency,
        language, work_mode, location_hint,
        allow_expansion, collect_multiple_quotes,
        status, archived, created_at, updated_at
        FROM missions"#;

    pub(crate) fn map_row(row: &rusqlite::Row) -> rusqlite::Result<Mission> {
        let deliverables_str: String = row.get(4)?;
        let keywords_str: String = row.get(5)?;
        let work_mode_str: String = row.get(13)?;
        let status_str: String = row.get(17)?;

        Ok(Mission {
            mission_id: row.get(0)?,
            requester: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            deliverables: serde_json::from_str(&deliverables_str).unwrap_or_default(),
            keywords: serde_json::from_str(&keywords_str).unwrap_or_default(),
            summary: row.get(6)?,
            deadline: row
                .get::<_, Option<String>>(7)?
                .and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()),
            duration_days: row.get(8)?,
            budget: Budget {
                minimum: row.get(9)?,
                maximum: row.get(10)?,
                currency: row.get(11)?,
            },
            language: row.get(12)?,
            work_mode: WorkMode::from_str(&work_mode_str).unwrap_or(WorkMode::Remote),
            location_hint: row.get(14)?,
            allow_expansion: row.get::<_, i32>(15)? != 0,
            collect_multiple_quotes: row.get::<_, i32>(16)? != 0,
            status: MissionStatus::from_str(&status_str),
            archived: row.get::<_, i32>(18)? != 0,
            created_at: parse_ts(row, 19)?,
            updated_at: parse_ts(row, 20)?,
        })
    }
}

fn parse_ts(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(&row.get::<_, String>(idx)?, "%Y-%m-%d %H:%M:%S").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}
