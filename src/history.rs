use chrono::{DateTime, Local};
use log::debug;
use rusqlite::{params, Connection, Row};
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::clock::Millis;
use crate::error::Result;
use crate::score::{Grade, Report};

/// One finished session as stored on disk
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub id: i64,
    pub played_at: DateTime<Local>,
    pub mean_ms: Millis,
    pub std_dev_ms: Millis,
    pub grade: Grade,
    pub latencies: Vec<Millis>,
}

/// Result of storing a session, with the best mean from before it
#[derive(Debug, Clone, PartialEq)]
pub struct RecordOutcome {
    pub record: SessionRecord,
    pub previous_best: Option<Millis>,
}

impl RecordOutcome {
    /// Strictly faster than every earlier session
    pub fn is_new_best(&self) -> bool {
        self.previous_best.map_or(true, |best| self.record.mean_ms < best)
    }

    pub fn best_ms(&self) -> Millis {
        self.previous_best
            .map_or(self.record.mean_ms, |best| best.min(self.record.mean_ms))
    }
}

/// Session history backed by SQLite
#[derive(Debug)]
pub struct HistoryDb {
    conn: Connection,
}

impl HistoryDb {
    /// Open the database at the default state path
    pub fn open_default() -> Result<Self> {
        let path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("flinch_history.db"));
        Self::open(&path)
    }

    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        debug!("history database at {}", path.display());
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                played_at TEXT NOT NULL,
                mean_ms INTEGER NOT NULL,
                std_dev_ms INTEGER NOT NULL,
                grade TEXT NOT NULL,
                latencies TEXT NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_sessions_mean ON sessions(mean_ms)",
            [],
        )?;

        Ok(HistoryDb { conn })
    }

    /// Store a finished session
    pub fn record_session(&self, report: &Report, latencies: &[Millis]) -> Result<RecordOutcome> {
        let previous_best = self.best_mean()?;
        let played_at = Local::now();

        self.conn.execute(
            r#"
            INSERT INTO sessions (played_at, mean_ms, std_dev_ms, grade, latencies)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                played_at.to_rfc3339(),
                report.mean_ms as i64,
                report.std_dev_ms as i64,
                report.grade.to_string(),
                serde_json::to_string(latencies)?,
            ],
        )?;

        let record = SessionRecord {
            id: self.conn.last_insert_rowid(),
            played_at,
            mean_ms: report.mean_ms,
            std_dev_ms: report.std_dev_ms,
            grade: report.grade,
            latencies: latencies.to_vec(),
        };

        Ok(RecordOutcome {
            record,
            previous_best,
        })
    }

    /// Lowest mean ever recorded
    pub fn best_mean(&self) -> Result<Option<Millis>> {
        let best: Option<i64> = self
            .conn
            .query_row("SELECT MIN(mean_ms) FROM sessions", [], |row| row.get(0))?;
        Ok(best.map(|ms| ms as Millis))
    }

    /// Most recent sessions first
    pub fn recent(&self, limit: usize) -> Result<Vec<SessionRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, played_at, mean_ms, std_dev_ms, grade, latencies
            FROM sessions
            ORDER BY id DESC
            LIMIT ?1
            "#,
        )?;

        let rows = stmt.query_map([limit as i64], row_to_record)?;

        let mut records = Vec::new();
        for record in rows {
            records.push(record?);
        }

        Ok(records)
    }

    pub fn session_count(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Clear all history (for testing or reset purposes)
    pub fn clear(&self) -> Result<()> {
        self.conn.execute("DELETE FROM sessions", [])?;
        Ok(())
    }
}

fn conversion_error(
    column: usize,
    e: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
}

fn row_to_record(row: &Row) -> rusqlite::Result<SessionRecord> {
    let played_at: String = row.get(1)?;
    let played_at = DateTime::parse_from_rfc3339(&played_at)
        .map_err(|e| conversion_error(1, e))?
        .with_timezone(&Local);

    let grade: String = row.get(4)?;
    let grade = Grade::from_key(&grade).ok_or_else(|| {
        rusqlite::Error::InvalidColumnType(4, "grade".to_string(), rusqlite::types::Type::Text)
    })?;

    let latencies: String = row.get(5)?;
    let latencies = serde_json::from_str(&latencies).map_err(|e| conversion_error(5, e))?;

    Ok(SessionRecord {
        id: row.get(0)?,
        played_at,
        mean_ms: row.get::<_, i64>(2)? as Millis,
        std_dev_ms: row.get::<_, i64>(3)? as Millis,
        grade,
        latencies,
    })
}
