// ==========================================
// Mission Match Engine - Provider Repository
// ==========================================
// Directory read model. The engine reads the pool; writes come from
// the CSV importer and from seeding.
// ==========================================

use crate::domain::provider::ProviderProfile;
use crate::domain::types::WorkMode;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

pub struct ProviderRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ProviderRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// Insert or replace a directory row (importer upsert semantics).
    pub fn upsert(&self, provider: &ProviderProfile) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        let work_modes: Vec<&str> = provider.work_modes.iter().map(|m| m.to_db_str()).collect();

        conn.execute(
            r#"INSERT INTO provider_directory (
                provider_id, display_name, skills_json, languages_json,
                work_modes_json, available, typical_rate, floor_rate,
                timezone_offset_hours, completion_rate, completed_missions, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            ON CONFLICT(provider_id) DO UPDATE SET
                display_name = ?2, skills_json = ?3, languages_json = ?4,
                work_modes_json = ?5, available = ?6, typical_rate = ?7,
                floor_rate = ?8, timezone_offset_hours = ?9,
                completion_rate = ?10, completed_missions = ?11, updated_at = ?12"#,
            params![
                &provider.provider_id,
                &provider.display_name,
                serde_json::to_string(&provider.skills).unwrap_or_else(|_| "[]".into()),
                serde_json::to_string(&provider.languages).unwrap_or_else(|_| "[]".into()),
                serde_json::to_string(&work_modes).unwrap_or_else(|_| "[]".into()),
                provider.available as i32,
                &provider.typical_rate,
                &provider.floor_rate,
                &provider.timezone_offset_hours,
                &provider.completion_rate,
                &provider.completed_missions,
                provider.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            ],
        )?;

        Ok(())
    }

    pub fn find_by_id(&self, provider_id: &str) -> RepositoryResult<Option<ProviderProfile>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            &format!("{} WHERE provider_id = ?", Self::SELECT_BASE),
            params![provider_id],
            |row| Self::map_row(row),
        ) {
            Ok(provider) => Ok(Some(provider)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// The whole directory. Hard filtering happens in the selector, so
    /// this returns unavailable providers too.
    pub fn list_all(&self) -> RepositoryResult<Vec<ProviderProfile>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!("{} ORDER BY provider_id", Self::SELECT_BASE))?;

        let providers = stmt
            .query_map([], |row| Self::map_row(row))?
            .collect::<Result<Vec<ProviderProfile>, _>>()?;

        Ok(providers)
    }

    pub fn count(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM provider_directory", [], |row| {
            row.get(0)
        })?;
        Ok(n)
    }

    const SELECT_BASE: &'static str = r#"SELECT
        provider_id, display_name, skills_json, languages_json,
        work_modes_json, available, typical_rate, floor_rate,
        timezone_offset_hours, completion_rate, completed_missions, updated_at
        FROM provider_directory"#;

    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<ProviderProfile> {
        let skills_str: String = row.get(2)?;
        let languages_str: String = row.get(3)?;
        let work_modes_str: String = row.get(4)?;

        let work_mode_names: Vec<String> =
            serde_json::from_str(&work_modes_str).unwrap_or_default();
        let work_modes: Vec<WorkMode> = work_mode_names
            .iter()
            .filter_map(|s| WorkMode::from_str(s))
            .collect();

        Ok(ProviderProfile {
            provider_id: row.get(0)?,
            display_name: row.get(1)?,
            skills: serde_json::from_str(&skills_str).unwrap_or_default(),
            languages: serde_json::from_str(&languages_str).unwrap_or_default(),
            work_modes,
            available: row.get::<_, i32>(5)? != 0,
            typical_rate: row.get(6)?,
            floor_rate: row.get(7)?,
            timezone_offset_hours: row.get(8)?,
            completion_rate: row.get(9)?,
            completed_missions: row.get(10)?,
            updated_at: NaiveDateTime::parse_from_str(
                &row.get::<_, String>(11)?,
                "%Y-%m-%d %H:%M:%S",
            )
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    11,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?,
        })
    }
}
