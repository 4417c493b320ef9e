// ==========================================
// Mission Match Engine - SQLite Connection Init
// ==========================================
// Goals:
// - one PRAGMA policy for every Connection::open in the codebase
// - one busy_timeout so concurrent writers see fewer spurious busy errors
// - idempotent schema bootstrap (CREATE TABLE IF NOT EXISTS)
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// Default busy_timeout (milliseconds).
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Schema version this code expects. Used for a startup warning only;
/// there is no automatic migration.
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// Apply the unified PRAGMA set.
///
/// foreign_keys and busy_timeout are per-connection settings, so every
/// open path must go through here.
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// Open a connection with the unified configuration applied.
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// Default database location under the user data directory.
pub fn default_db_path() -> String {
    let base = dirs::data_dir().unwrap_or_else(std::env::temp_dir);
    base.join("mission-match")
        .join("mission_match.db")
        .to_string_lossy()
        .to_string()
}

/// Read schema_version (None when the table does not exist yet).
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// Create every table the engine needs. Idempotent; safe to run on an
/// existing database.
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS missions (
            mission_id TEXT PRIMARY KEY,
            requester TEXT NOT NULL,
            title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            deliverables_json TEXT NOT NULL DEFAULT '[]',
            keywords_json TEXT NOT NULL DEFAULT '[]',
            summary TEXT,
            deadline TEXT,
            duration_days INTEGER NOT NULL DEFAULT 1,
            budget_min REAL,
            budget_max REAL,
            currency TEXT NOT NULL DEFAULT 'EUR',
            language TEXT NOT NULL DEFAULT 'en',
            work_mode TEXT NOT NULL DEFAULT 'REMOTE',
            location_hint TEXT,
            allow_expansion INTEGER NOT NULL DEFAULT 0,
            collect_multiple_quotes INTEGER NOT NULL DEFAULT 1,
            status TEXT NOT NULL DEFAULT 'DRAFT',
            archived INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS waves (
            mission_id TEXT NOT NULL,
            wave_number INTEGER NOT NULL,
            wave_size INTEGER NOT NULL,
            timeout_minutes INTEGER NOT NULL,
            opened_at TEXT NOT NULL,
            expires_at TEXT NOT NULL,
            closed_at TEXT,
            close_reason TEXT,
            PRIMARY KEY (mission_id, wave_number),
            FOREIGN KEY (mission_id) REFERENCES missions(mission_id)
        );

        CREATE TABLE IF NOT EXISTS offers (
            offer_id TEXT PRIMARY KEY,
            mission_id TEXT NOT NULL,
            wave_number INTEGER NOT NULL,
            provider_id TEXT NOT NULL,
            match_score REAL NOT NULL DEFAULT 0,
            score_reasons_json TEXT NOT NULL DEFAULT '[]',
            message TEXT,
            status TEXT NOT NULL DEFAULT 'PENDING',
            created_at TEXT NOT NULL,
            responded_at TEXT,
            FOREIGN KEY (mission_id) REFERENCES missions(mission_id),
            UNIQUE (mission_id, provider_id, wave_number)
        );

        CREATE INDEX IF NOT EXISTS idx_offers_mission
            ON offers(mission_id, wave_number);
        CREATE INDEX IF NOT EXISTS idx_offers_provider
            ON offers(provider_id);

        CREATE TABLE IF NOT EXISTS journal_events (
            mission_id TEXT NOT NULL,
            seq INTEGER NOT NULL,
            ts TEXT NOT NULL,
            event_type TEXT NOT NULL,
            actor TEXT NOT NULL,
            payload_json TEXT,
            PRIMARY KEY (mission_id, seq),
            FOREIGN KEY (mission_id) REFERENCES missions(mission_id)
        );

        CREATE TABLE IF NOT EXISTS provider_directory (
            provider_id TEXT PRIMARY KEY,
            display_name TEXT NOT NULL,
            skills_json TEXT NOT NULL DEFAULT '[]',
            languages_json TEXT NOT NULL DEFAULT '[]',
            work_modes_json TEXT NOT NULL DEFAULT '[\"REMOTE\"]',
            available INTEGER NOT NULL DEFAULT 1,
            typical_rate REAL,
            floor_rate REAL,
            timezone_offset_hours INTEGER,
            completion_rate REAL NOT NULL DEFAULT 0,
            completed_missions INTEGER NOT NULL DEFAULT 0,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS milestones (
            milestone_id TEXT PRIMARY KEY,
            mission_id TEXT NOT NULL,
            title TEXT NOT NULL,
            due_date TEXT,
            status TEXT NOT NULL DEFAULT 'TODO',
            created_at TEXT NOT NULL,
            FOREIGN KEY (mission_id) REFERENCES missions(mission_id)
        );

        CREATE TABLE IF NOT EXISTS notification_outbox (
            message_id TEXT PRIMARY KEY,
            provider_id TEXT NOT NULL,
            mission_id TEXT NOT NULL,
            kind TEXT NOT NULL,
            body TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'PENDING',
            retry_count INTEGER NOT NULL DEFAULT 0,
            max_retries INTEGER NOT NULL DEFAULT 3,
            created_at TEXT NOT NULL,
            sent_at TEXT,
            last_error TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_outbox_status
            ON notification_outbox(status, created_at);

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            PRIMARY KEY (scope_id, key)
        );

        INSERT OR IGNORE INTO schema_version (version) VALUES (1);
        ",
    )
}
