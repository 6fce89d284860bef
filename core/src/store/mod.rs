//! SQLite persistence layer.
//!
//! RULE: Only store/ talks to the database.
//! The engine calls store methods; model code never sees SQL.

use crate::{error::ImpactResult, event::EventLogEntry};
mod inputs;
mod results;
use rusqlite::{params, Connection, OptionalExtension};

/// Lifecycle state of a run row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl RunStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Running   => "running",
            RunStatus::Succeeded => "succeeded",
            RunStatus::Failed    => "failed",
            RunStatus::Cancelled => "cancelled",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "running"   => Some(RunStatus::Running),
            "succeeded" => Some(RunStatus::Succeeded),
            "failed"    => Some(RunStatus::Failed),
            "cancelled" => Some(RunStatus::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunRecord {
    pub run_id:      String,
    pub version:     String,
    pub status:      RunStatus,
    pub started_at:  String,
    pub finished_at: Option<String>,
    pub message:     Option<String>,
}

pub struct ImpactStore {
    conn: Connection,
}

impl ImpactStore {
    pub fn open(path: &str) -> ImpactResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> ImpactResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> ImpactResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_foundation.sql"))?;
        Ok(())
    }

    // ── Run ────────────────────────────────────────────────────

    pub fn insert_run(&self, run_id: &str, version: &str) -> ImpactResult<()> {
        self.conn.execute(
            "INSERT INTO run (run_id, version, status, started_at) VALUES (?1, ?2, ?3, ?4)",
            params![run_id, version, RunStatus::Running.as_str(), now()],
        )?;
        Ok(())
    }

    pub fn finish_run(
        &self,
        run_id: &str,
        status: RunStatus,
        message: Option<&str>,
    ) -> ImpactResult<()> {
        self.conn.execute(
            "UPDATE run SET status = ?1, finished_at = ?2, message = ?3 WHERE run_id = ?4",
            params![status.as_str(), now(), message, run_id],
        )?;
        Ok(())
    }

    pub fn run(&self, run_id: &str) -> ImpactResult<Option<RunRecord>> {
        let row = self
            .conn
            .query_row(
                "SELECT run_id, version, status, started_at, finished_at, message
                 FROM run WHERE run_id = ?1",
                params![run_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, Option<String>>(4)?,
                        row.get::<_, Option<String>>(5)?,
                    ))
                },
            )
            .optional()?;
        Ok(row.map(|(run_id, version, status, started_at, finished_at, message)| RunRecord {
            run_id,
            version,
            status: RunStatus::parse(&status).unwrap_or(RunStatus::Failed),
            started_at,
            finished_at,
            message,
        }))
    }

    pub fn run_ids(&self) -> ImpactResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT run_id FROM run ORDER BY started_at ASC, run_id ASC")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(ids)
    }

    // ── Event log ──────────────────────────────────────────────

    pub fn append_event(&self, entry: &EventLogEntry) -> ImpactResult<()> {
        self.conn.execute(
            "INSERT INTO event_log (run_id, seq, event_type, payload, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![entry.run_id, entry.seq, entry.event_type, entry.payload, now()],
        )?;
        Ok(())
    }

    pub fn events_for_run(&self, run_id: &str) -> ImpactResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, run_id, seq, event_type, payload
             FROM event_log WHERE run_id = ?1
             ORDER BY seq ASC, id ASC",
        )?;
        let entries = stmt
            .query_map(params![run_id], |row| {
                Ok(EventLogEntry {
                    id: Some(row.get(0)?),
                    run_id: row.get(1)?,
                    seq: row.get(2)?,
                    event_type: row.get(3)?,
                    payload: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}
