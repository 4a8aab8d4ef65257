use chrono::{DateTime, Local, NaiveDate};
use rusqlite::{params, Connection, Result};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use time_humanize::{Accuracy, HumanTime, Tense};

use crate::app_dirs::AppDirs;
use crate::difficulty::{Difficulty, ToneMode};
use crate::session::SessionSummary;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS sessions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        difficulty TEXT NOT NULL,
        tone_mode TEXT NOT NULL,
        score INTEGER NOT NULL,
        correct_count INTEGER NOT NULL,
        wrong_count INTEGER NOT NULL,
        skipped_count INTEGER NOT NULL,
        finished_at TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS card_results (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        session_id INTEGER NOT NULL REFERENCES sessions(id) ON DELETE CASCADE,
        position INTEGER NOT NULL,
        prompt TEXT NOT NULL,
        display_answer TEXT NOT NULL,
        outcome TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_sessions_finished_at ON sessions(finished_at);
    CREATE INDEX IF NOT EXISTS idx_card_results_prompt ON card_results(prompt);
"#;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("history query failed: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("csv write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// One finished drill as stored on disk
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionRecord {
    pub id: i64,
    pub difficulty: Difficulty,
    pub tone_mode: ToneMode,
    pub score: u32,
    pub correct_count: u32,
    pub wrong_count: u32,
    pub skipped_count: u32,
    pub finished_at: DateTime<Local>,
}

/// Prompt that was missed (wrong or skipped) across all sessions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissedPrompt {
    pub prompt: String,
    pub display_answer: String,
    pub misses: i64,
}

/// SQLite store of finished sessions
#[derive(Debug)]
pub struct HistoryDb {
    conn: Connection,
}

impl HistoryDb {
    /// Open the database under the state directory, creating it if needed
    pub fn new() -> Result<Self> {
        let db_path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("pinyin_drill_history.db"));
        Self::open(db_path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
                    Some(format!("Failed to create directory: {e}")),
                )
            })?;
        }
        Self::with_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Store a finished session and every judged card, returning the new session id
    pub fn record_summary(
        &mut self,
        summary: &SessionSummary,
        finished_at: DateTime<Local>,
    ) -> Result<i64> {
        let tx = self.conn.transaction()?;

        tx.execute(
            r#"
            INSERT INTO sessions
            (difficulty, tone_mode, score, correct_count, wrong_count, skipped_count, finished_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                summary.difficulty.to_string(),
                summary.tone_mode.to_string(),
                summary.score,
                summary.correct_count,
                summary.wrong_count,
                summary.skipped_count,
                finished_at.to_rfc3339(),
            ],
        )?;
        let session_id = tx.last_insert_rowid();

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO card_results (session_id, position, prompt, display_answer, outcome)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )?;
            for (position, entry) in summary.log.iter().enumerate() {
                stmt.execute(params![
                    session_id,
                    position as i64,
                    entry.card.prompt,
                    entry.card.display_answer,
                    entry.outcome.to_string()
                ])?;
            }
        }

        tx.commit()?;
        Ok(session_id)
    }

    /// Most recent sessions first
    pub fn recent_sessions(&self, limit: usize) -> Result<Vec<SessionRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, difficulty, tone_mode, score, correct_count, wrong_count, skipped_count, finished_at
            FROM sessions
            ORDER BY finished_at DESC, id DESC
            LIMIT ?1
            "#,
        )?;

        let rows = stmt.query_map([limit as i64], row_to_record)?;
        rows.collect()
    }

    /// Every session, oldest first
    pub fn all_sessions(&self) -> Result<Vec<SessionRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, difficulty, tone_mode, score, correct_count, wrong_count, skipped_count, finished_at
            FROM sessions
            ORDER BY finished_at ASC, id ASC
            "#,
        )?;

        let rows = stmt.query_map([], row_to_record)?;
        rows.collect()
    }

    /// Highest score ever reached for a tier and tone mode
    pub fn best_score(&self, difficulty: Difficulty, tone_mode: ToneMode) -> Result<Option<u32>> {
        self.conn
            .query_row(
                "SELECT MAX(score) FROM sessions WHERE difficulty = ?1 AND tone_mode = ?2",
                params![difficulty.to_string(), tone_mode.to_string()],
                |row| row.get(0),
            )
    }

    /// Highest score on a given local calendar day
    pub fn best_score_on(
        &self,
        difficulty: Difficulty,
        tone_mode: ToneMode,
        day: NaiveDate,
    ) -> Result<Option<u32>> {
        self.conn.query_row(
            r#"
            SELECT MAX(score) FROM sessions
            WHERE difficulty = ?1 AND tone_mode = ?2 AND substr(finished_at, 1, 10) = ?3
            "#,
            params![
                difficulty.to_string(),
                tone_mode.to_string(),
                day.format("%Y-%m-%d").to_string()
            ],
            |row| row.get(0),
        )
    }

    /// Prompts with the most wrong or skipped judgements
    pub fn most_missed(&self, limit: usize) -> Result<Vec<MissedPrompt>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT prompt, display_answer, COUNT(*) AS misses
            FROM card_results
            WHERE outcome != 'correct'
            GROUP BY prompt, display_answer
            ORDER BY misses DESC, prompt ASC
            LIMIT ?1
            "#,
        )?;

        let rows = stmt.query_map([limit as i64], |row| {
            Ok(MissedPrompt {
                prompt: row.get(0)?,
                display_answer: row.get(1)?,
                misses: row.get(2)?,
            })
        })?;
        rows.collect()
    }

    /// Remove every stored session and its cards, returning how many sessions were removed
    pub fn clear_all(&self) -> Result<usize> {
        self.conn.execute("DELETE FROM card_results", [])?;
        self.conn.execute("DELETE FROM sessions", [])
    }

    /// Write every session as CSV rows, returning how many were written
    pub fn export_csv<W: Write>(&self, writer: W) -> std::result::Result<usize, ExportError> {
        let sessions = self.all_sessions()?;
        let mut wtr = csv::Writer::from_writer(writer);
        for record in &sessions {
            wtr.serialize(record)?;
        }
        wtr.flush()?;
        Ok(sessions.len())
    }

    pub fn export_csv_to_path<P: AsRef<Path>>(&self, path: P) -> std::result::Result<usize, ExportError> {
        let file = std::fs::File::create(path)?;
        self.export_csv(file)
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> Result<SessionRecord> {
    let difficulty: String = row.get(1)?;
    let tone_mode: String = row.get(2)?;
    let finished_at: String = row.get(7)?;
    let finished_at = DateTime::parse_from_rfc3339(&finished_at)
        .map_err(|_| {
            rusqlite::Error::InvalidColumnType(
                7,
                "finished_at".to_string(),
                rusqlite::types::Type::Text,
            )
        })?
        .with_timezone(&Local);

    Ok(SessionRecord {
        id: row.get(0)?,
        difficulty: Difficulty::from_name(&difficulty),
        tone_mode: ToneMode::from_name(&tone_mode),
        score: row.get(3)?,
        correct_count: row.get(4)?,
        wrong_count: row.get(5)?,
        skipped_count: row.get(6)?,
        finished_at,
    })
}

/// "3 minutes ago" style description of a past moment
pub fn humanize_since(then: DateTime<Local>, now: DateTime<Local>) -> String {
    let secs = (now - then).num_seconds().max(0) as u64;
    HumanTime::from(Duration::from_secs(secs)).to_text_en(Accuracy::Rough, Tense::Past)
}
