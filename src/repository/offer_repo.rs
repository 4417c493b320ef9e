// ==========================================
// Mission Match Engine - Offer Repository
// ==========================================
// Owns the offers table plus the confirm cascade: confirming one offer
// and rejecting every unresolved sibling must commit atomically, in the
// same transaction that closes the wave and moves the mission.
// ==========================================

use crate::domain::journal::JournalEvent;
use crate::domain::mission::Mission;
use crate::domain::offer::Offer;
use crate::domain::types::{
    JournalEventType, MissionStatus, OfferDecision, OfferStatus, WaveCloseReason,
};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::journal_repo::JournalRepository;
use crate::repository::mission_repo::MissionRepository;
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Transaction};
use serde_json::json;
use std::sync::{Arc, Mutex};

/// Lightweight offer reference used by cascade outcomes.
#[derive(Debug, Clone)]
pub struct OfferRef {
    pub offer_id: String,
    pub provider_id: String,
    pub wave_number: i32,
}

/// Result of the confirm cascade.
#[derive(Debug, Clone)]
pub struct ConfirmOutcome {
    pub mission: Mission,
    pub confirmed: Offer,
    pub rejected: Vec<OfferRef>,
    pub closed_wave: Option<i32>,
    pub events: Vec<JournalEvent>,
}

/// Result of a provider response.
#[derive(Debug, Clone)]
pub struct RespondOutcome {
    pub offer: Offer,
    pub events: Vec<JournalEvent>,
}

pub struct OfferRepository {
    conn: Arc<Mutex<Connection>>,
}

impl OfferRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// Insert inside an existing transaction (wave dispatch path).
    pub fn insert_in_tx(tx: &Transaction, offer: &Offer) -> RepositoryResult<()> {
        tx.execute(
            r#"INSERT INTO offers (
                offer_id, mission_id, wave_number, provider_id,
                match_score, score_reasons_json, message, status,
                created_at, responded_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &offer.offer_id,
                &offer.mission_id,
                &offer.wave_number,
                &offer.provider_id,
                &offer.match_score,
                serde_json::to_string(&offer.score_reasons).unwrap_or_else(|_| "[]".into()),
                &offer.message,
                offer.status.to_db_str(),
                offer.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                &offer
                    .responded_at
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string()),
            ],
        )?;
        Ok(())
    }

    pub fn find_by_id(&self, offer_id: &str) -> RepositoryResult<Option<Offer>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            &format!("{} WHERE offer_id = ?", Self::SELECT_BASE),
            params![offer_id],
            |row| Self::map_row(row),
        ) {
            Ok(offer) => Ok(Some(offer)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// All offers for a mission in ranking display order:
    /// wave ascending, then score descending, then creation time.
    pub fn list_by_mission(&self, mission_id: &str) -> RepositoryResult<Vec<Offer>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            "{} WHERE mission_id = ? ORDER BY wave_number ASC, match_score DESC, created_at ASC",
            Self::SELECT_BASE
        ))?;

        let offers = stmt
            .query_map(params![mission_id], |row| Self::map_row(row))?
            .collect::<Result<Vec<Offer>, _>>()?;

        Ok(offers)
    }

    pub fn list_by_wave(&self, mission_id: &str, wave_number: i32) -> RepositoryResult<Vec<Offer>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            "{} WHERE mission_id = ? AND wave_number = ? ORDER BY match_score DESC, created_at ASC",
            Self::SELECT_BASE
        ))?;

        let offers = stmt
            .query_map(params![mission_id, wave_number], |row| Self::map_row(row))?
            .collect::<Result<Vec<Offer>, _>>()?;

        Ok(offers)
    }

    /// (provider_id, status) for every offer the mission ever produced.
    /// The selector derives its exclusion set from this.
    pub fn provider_statuses(&self, mission_id: &str) -> RepositoryResult<Vec<(String, OfferStatus)>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            "SELECT provider_id, status FROM offers WHERE mission_id = ?",
        )?;

        let rows = stmt
            .query_map(params![mission_id], |row| {
                let status_str: String = row.get(1)?;
                Ok((row.get::<_, String>(0)?, OfferStatus::from_str(&status_str)))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// The confirmed offer, when one exists. At most one per mission.
    pub fn find_confirmed(&self, mission_id: &str) -> RepositoryResult<Option<Offer>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            &format!("{} WHERE mission_id = ? AND status = 'CONFIRMED'", Self::SELECT_BASE),
            params![mission_id],
            |row| Self::map_row(row),
        ) {
            Ok(offer) => Ok(Some(offer)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Record a provider response.
    ///
    /// Legal only while the offer is pending and its wave still accepts
    /// responses; a response racing the timeout loses here, not in the
    /// timer.
    pub fn record_response(
        &self,
        offer_id: &str,
        decision: OfferDecision,
        message: Option<&str>,
    ) -> RepositoryResult<RespondOutcome> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let now = chrono::Utc::now().naive_utc();

        let offer = match tx.query_row(
            &format!("{} WHERE offer_id = ?", Self::SELECT_BASE),
            params![offer_id],
            |row| Self::map_row(row),
        ) {
            Ok(o) => o,
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                return Err(RepositoryError::NotFound {
                    entity: "Offer".to_string(),
                    id: offer_id.to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        };

        if offer.status != OfferStatus::Pending {
            return Err(RepositoryError::InvalidStateTransition {
                from: offer.status.to_db_str().to_string(),
                to: "responded".to_string(),
            });
        }

        let (expires_at_str, closed_at_str): (String, Option<String>) = tx.query_row(
            "SELECT expires_at, closed_at FROM waves WHERE mission_id = ? AND wave_number = ?",
            params![&offer.mission_id, offer.wave_number],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let expires_at = NaiveDateTime::parse_from_str(&expires_at_str, "%Y-%m-%d %H:%M:%S")
            .map_err(|e| RepositoryError::InternalError(format!("bad expires_at: {e}")))?;

        if closed_at_str.is_some() || now >= expires_at {
            return Err(RepositoryError::StateConflict {
                message: format!(
                    "wave {} of mission {} no longer accepts responses",
                    offer.wave_number, offer.mission_id
                ),
            });
        }

        let new_status = match decision {
            OfferDecision::Accept => OfferStatus::Accepted,
            OfferDecision::Decline => OfferStatus::Rejected,
        };

        let rows_affected = tx.execute(
            r#"UPDATE offers SET status = ?, message = ?, responded_at = ?
               WHERE offer_id = ? AND status = 'PENDING'"#,
            params![
                new_status.to_db_str(),
                message,
                now.format("%Y-%m-%d %H:%M:%S").to_string(),
                offer_id,
            ],
        )?;

        if rows_affected == 0 {
            return Err(RepositoryError::StateConflict {
                message: format!("offer {offer_id} was resolved by another writer"),
            });
        }

        let mut events = Vec::new();
        let mut event = JournalEvent::new(
            &offer.mission_id,
            JournalEventType::OfferResponded,
            &offer.provider_id,
        )
        .with_payload(&json!({
            "offer_id": offer_id,
            "provider_id": offer.provider_id,
            "wave_number": offer.wave_number,
            "decision": new_status.to_db_str(),
        }));
        event.seq = JournalRepository::append_in_tx(&tx, &event)?;
        events.push(event);

        let updated = tx.query_row(
            &format!("{} WHERE offer_id = ?", Self::SELECT_BASE),
            params![offer_id],
            |row| Self::map_row(row),
        )?;

        tx.commit()?;

        Ok(RespondOutcome {
            offer: updated,
            events,
        })
    }

    /// Confirm cascade, one transaction:
    /// the target accepted offer becomes confirmed, every other
    /// unresolved offer is rejected, the open wave closes with reason
    /// CONFIRMED, the mission moves matching -> confirmed, and the
    /// journal records each step.
    pub fn confirm_cascade(
        &self,
        mission_id: &str,
        offer_id: &str,
        actor: &str,
    ) -> RepositoryResult<ConfirmOutcome> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let now = chrono::Utc::now().naive_utc();

        let target = match tx.query_row(
            &format!("{} WHERE offer_id = ?", Self::SELECT_BASE),
            params![offer_id],
            |row| Self::map_row(row),
        ) {
            Ok(o) => o,
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                return Err(RepositoryError::NotFound {
                    entity: "Offer".to_string(),
                    id: offer_id.to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        };

        if target.mission_id != mission_id {
            return Err(RepositoryError::BusinessRuleViolation(format!(
                "offer {offer_id} does not belong to mission {mission_id}"
            )));
        }

        // target must be accepted; guarded update is the backstop
        let rows_affected = tx.execute(
            "UPDATE offers SET status = 'CONFIRMED' WHERE offer_id = ? AND status = 'ACCEPTED'",
            params![offer_id],
        )?;
        if rows_affected == 0 {
            return Err(RepositoryError::InvalidStateTransition {
                from: target.status.to_db_str().to_string(),
                to: OfferStatus::Confirmed.to_db_str().to_string(),
            });
        }

        // displace every unresolved sibling
        let rejected: Vec<OfferRef> = {
            let mut stmt = tx.prepare(
                r#"SELECT offer_id, provider_id, wave_number FROM offers
                   WHERE mission_id = ? AND offer_id != ? AND status IN ('PENDING', 'ACCEPTED')
                   ORDER BY wave_number, created_at"#,
            )?;
            let refs = stmt
                .query_map(params![mission_id, offer_id], |row| {
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
            r#"UPDATE offers SET status = 'REJECTED'
               WHERE mission_id = ? AND offer_id != ? AND status IN ('PENDING', 'ACCEPTED')"#,
            params![mission_id, offer_id],
        )?;

        // close the open wave
        let closed_wave: Option<i32> = {
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

        if closed_wave.is_some() {
            tx.execute(
                r#"UPDATE waves SET closed_at = ?, close_reason = ?
                   WHERE mission_id = ? AND closed_at IS NULL"#,
                params![
                    now.format("%Y-%m-%d %H:%M:%S").to_string(),
                    WaveCloseReason::Confirmed.to_db_str(),
                    mission_id,
                ],
            )?;
        }

        // mission CAS: any concurrent confirm already moved it and fails here
        MissionRepository::update_status_on(
            &tx,
            mission_id,
            MissionStatus::Matching,
            MissionStatus::Confirmed,
        )?;

        // journal: winner, displaced siblings, wave, status
        let mut events = Vec::new();

        let mut event = JournalEvent::new(mission_id, JournalEventType::OfferConfirmed, actor)
            .with_payload(&json!({
                "offer_id": offer_id,
                "provider_id": target.provider_id,
                "wave_number": target.wave_number,
            }));
        event.seq = JournalRepository::append_in_tx(&tx, &event)?;
        events.push(event);

        for sibling in &rejected {
            let mut event = JournalEvent::new(mission_id, JournalEventType::OfferRejected, actor)
                .with_payload(&json!({
                    "offer_id": sibling.offer_id,
                    "provider_id": sibling.provider_id,
                    "wave_number": sibling.wave_number,
                    "displaced_by": offer_id,
                }));
            event.seq = JournalRepository::append_in_tx(&tx, &event)?;
            events.push(event);
        }

        if let Some(wave_number) = closed_wave {
            let mut event = JournalEvent::new(mission_id, JournalEventType::WaveClosed, actor)
                .with_payload(&json!({
                    "wave_number": wave_number,
                    "close_reason": WaveCloseReason::Confirmed.to_db_str(),
                }));
            event.seq = JournalRepository::append_in_tx(&tx, &event)?;
            events.push(event);
        }

        let mut event = JournalEvent::new(mission_id, JournalEventType::StatusChanged, actor)
            .with_payload(&json!({
                "from": MissionStatus::Matching.to_db_str(),
                "to": MissionStatus::Confirmed.to_db_str(),
            }));
        event.seq = JournalRepository::append_in_tx(&tx, &event)?;
        events.push(event);

        let confirmed = tx.query_row(
            &format!("{} WHERE offer_id = ?", Self::SELECT_BASE),
            params![offer_id],
            |row| Self::map_row(row),
        )?;

        let mission = tx.query_row(
            &format!("{} WHERE mission_id = ?", MissionRepository::SELECT_BASE),
            params![mission_id],
            |row| MissionRepository::map_row(row),
        )?;

        tx.commit()?;

        Ok(ConfirmOutcome {
            mission,
            confirmed,
            rejected,
            closed_wave,
            events,
        })
    }

    const SELECT_BASE: &'static str = r#"SELECT
        offer_id, mission_id, wave_number, provider_id,
        match_score, score_reasons_json, message, status,
        created_at, responded_at
        FROM offers"#;

    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<Offer> {
        let reasons_str: String = row.get(5)?;
        let status_str: String = row.get(7)?;

        Ok(Offer {
            offer_id: row.get(0)?,
            mission_id: row.get(1)?,
            wave_number: row.get(2)?,
            provider_id: row.get(3)?,
            match_score: row.get(4)?,
            score_reasons: serde_json::from_str(&reasons_str).unwrap_or_default(),
            message: row.get(6)?,
            status: OfferStatus::from_str(&status_str),
            created_at: parse_ts(row, 8)?,
            responded_at: row
                .get::<_, Option<String>>(9)?
                .and_then(|s| NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S").ok()),
        })
    }
}

fn parse_ts(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(&row.get::<_, String>(idx)?, "%Y-%m-%d %H:%M:%S").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}
