// ==========================================
// Mission Match Engine - Configuration Manager
// ==========================================
// Operator-tunable settings, stored in the config_kv table under the
// 'global' scope. Readers always get a usable value: a missing or
// malformed entry falls back to the built-in default with a warning.
// The dispatcher re-reads scoring weights on every dispatch, so
// retuning needs no restart.
// ==========================================

use crate::db::open_sqlite_connection;
use crate::engine::scoring::ScoringWeights;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Share an existing connection. Re-applies the unified PRAGMA set
    /// (idempotent) so behavior does not depend on who opened it.
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            crate::db::configure_sqlite_connection(&guard)?;
        }
        Ok(Self { conn })
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// Raw value for a key in the global scope.
    pub fn get_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn get_config_or_default(&self, key: &str, default: &str) -> RepositoryResult<String> {
        Ok(self
            .get_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// Upsert a value in the global scope.
    pub fn set_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2",
            params![key, value],
        )?;

        Ok(())
    }

    /// JSON snapshot of every global entry, keys sorted.
    pub fn get_config_snapshot(&self) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        serde_json::to_string(&json!(config_map))
            .map_err(|e| RepositoryError::InternalError(format!("snapshot serialization: {}", e)))
    }

    // ===== Typed getters =====

    fn get_f64_or(&self, key: &str, default: f64) -> RepositoryResult<f64> {
        let raw = self.get_config_or_default(key, &default.to_string())?;
        Ok(raw.parse::<f64>().unwrap_or_else(|_| {
            tracing::warn!(
                config_key = key,
                raw_value = %raw,
                "config value is not a number, using default"
            );
            default
        }))
    }

    fn get_i32_or(&self, key: &str, default: i32) -> RepositoryResult<i32> {
        let raw = self.get_config_or_default(key, &default.to_string())?;
        Ok(raw.parse::<i32>().unwrap_or_else(|_| {
            tracing::warn!(
                config_key = key,
                raw_value = %raw,
                "config value is not an integer, using default"
            );
            default
        }))
    }

    /// Current scoring weights. Values are raw; the scoring engine
    /// normalizes them by their sum.
    pub fn get_scoring_weights(&self) -> RepositoryResult<ScoringWeights> {
        let defaults = ScoringWeights::default();
        Ok(ScoringWeights {
            skill: self.get_f64_or(config_keys::SCORING_WEIGHT_SKILL, defaults.skill)?,
            budget: self.get_f64_or(config_keys::SCORING_WEIGHT_BUDGET, defaults.budget)?,
            availability: self.get_f64_or(
                config_keys::SCORING_WEIGHT_AVAILABILITY,
                defaults.availability,
            )?,
            reliability: self.get_f64_or(
                config_keys::SCORING_WEIGHT_RELIABILITY,
                defaults.reliability,
            )?,
        })
    }

    /// Wave size used when a dispatch request does not name one.
    pub fn get_default_wave_size(&self) -> RepositoryResult<i32> {
        self.get_i32_or(config_keys::DEFAULT_WAVE_SIZE, 3)
    }

    /// Wave timeout used when a dispatch request does not name one.
    pub fn get_default_timeout_minutes(&self) -> RepositoryResult<i32> {
        self.get_i32_or(config_keys::DEFAULT_TIMEOUT_MINUTES, 60)
    }

    /// Delivery attempts before a notification parks as FAILED.
    pub fn get_notify_max_retries(&self) -> RepositoryResult<i32> {
        self.get_i32_or(config_keys::NOTIFY_MAX_RETRIES, 3)
    }
}

// ==========================================
// Configuration keys
// ==========================================
pub mod config_keys {
    // scoring weights (raw; normalized by sum at use)
    pub const SCORING_WEIGHT_SKILL: &str = "scoring_weight_skill";
    pub const SCORING_WEIGHT_BUDGET: &str = "scoring_weight_budget";
    pub const SCORING_WEIGHT_AVAILABILITY: &str = "scoring_weight_availability";
    pub const SCORING_WEIGHT_RELIABILITY: &str = "scoring_weight_reliability";

    // wave dispatch defaults
    pub const DEFAULT_WAVE_SIZE: &str = "default_wave_size";
    pub const DEFAULT_TIMEOUT_MINUTES: &str = "default_timeout_minutes";

    // notification delivery
    pub const NOTIFY_MAX_RETRIES: &str = "notify_max_retries";
}
