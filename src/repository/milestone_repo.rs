// ==========================================
// Mission Match Engine - Milestone Repository
// ==========================================

use crate::domain::milestone::Milestone;
use crate::domain::types::MilestoneStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

pub struct MilestoneRepository {
    conn: Arc<Mutex<Connection>>,
}

impl MilestoneRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn upsert(&self, milestone: &Milestone) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO milestones (
                milestone_id, mission_id, title, due_date, status, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(milestone_id) DO UPDATE SET
                title = ?3, due_date = ?4, status = ?5"#,
            params![
                &milestone.milestone_id,
                &milestone.mission_id,
                &milestone.title,
                &milestone.due_date.map(|d| d.format("%Y-%m-%d").to_string()),
                milestone.status.to_db_str(),
                milestone.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            ],
        )?;

        Ok(())
    }

    pub fn find_by_id(&self, milestone_id: &str) -> RepositoryResult<Option<Milestone>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            &format!("{} WHERE milestone_id = ?", Self::SELECT_BASE),
            params![milestone_id],
            |row| Self::map_row(row),
        ) {
            Ok(m) => Ok(Some(m)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn list_by_mission(&self, mission_id: &str) -> RepositoryResult<Vec<Milestone>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            "{} WHERE mission_id = ? ORDER BY due_date IS NULL, due_date, created_at",
            Self::SELECT_BASE
        ))?;

        let milestones = stmt
            .query_map(params![mission_id], |row| Self::map_row(row))?
            .collect::<Result<Vec<Milestone>, _>>()?;

        Ok(milestones)
    }

    const SELECT_BASE: &'static str = r#"SELECT
        milestone_id, mission_id, title, due_date, status, created_at
        FROM milestones"#;

    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<Milestone> {
        let status_str: String = row.get(4)?;

        Ok(Milestone {
            milestone_id: row.get(0)?,
            mission_id: row.get(1)?,
            title: row.get(2)?,
            due_date: row
                .get::<_, Option<String>>(3)?
                .and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()),
            status: MilestoneStatus::from_str(&status_str),
            created_at: NaiveDateTime::parse_from_str(
                &row.get::<_, String>(5)?,
                "%Y-%m-%d %H:%M:%S",
            )
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    5,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?,
        })
    }
}
