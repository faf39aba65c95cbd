// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Analysis ledger — append-only SQLite log with one row per analysis.
//
// Schema:
//   analyses(
//     id             INTEGER PRIMARY KEY AUTOINCREMENT,
//     timestamp      TEXT    NOT NULL,   -- RFC 3339
//     analysis_id    TEXT    NOT NULL,   -- UUID of the run
//     upload_name    TEXT    NOT NULL,   -- stored upload file name
//     content_digest TEXT    NOT NULL,   -- MD5 hex of the raw upload
//     sha256         TEXT    NOT NULL,   -- SHA-256 hex of the raw upload
//     verdict        TEXT    NOT NULL,   -- "Real" | "Fake" | "Error"
//     rule           TEXT,               -- classifier rule that fired
//     report_name    TEXT,               -- NULL when the report failed
//     details        TEXT                -- error message, if any
//   )

use std::path::Path;

use chrono::Utc;
use rusqlite::{Connection, Row, params};
use serde::{Deserialize, Serialize};
use slipcheck_core::error::SlipcheckError;
use slipcheck_core::types::Verdict;
use tracing::{debug, instrument};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS analyses (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp      TEXT    NOT NULL,
    analysis_id    TEXT    NOT NULL,
    upload_name    TEXT    NOT NULL,
    content_digest TEXT    NOT NULL,
    sha256         TEXT    NOT NULL,
    verdict        TEXT    NOT NULL,
    rule           TEXT,
    report_name    TEXT,
    details        TEXT
);";

const SELECT_COLUMNS: &str = "SELECT id, timestamp, analysis_id, upload_name, content_digest,
        sha256, verdict, rule, report_name, details
 FROM analyses";

/// Convert a `rusqlite::Error` into a `SlipcheckError::Database`.
fn db_err(e: rusqlite::Error) -> SlipcheckError {
    SlipcheckError::Database(e.to_string())
}

/// A row read back from the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: i64,
    pub timestamp: String,
    pub analysis_id: String,
    pub upload_name: String,
    pub content_digest: String,
    pub sha256: String,
    pub verdict: Verdict,
    pub rule: Option<String>,
    pub report_name: Option<String>,
    pub details: Option<String>,
}

/// Values for a row about to be appended.
#[derive(Debug, Clone)]
pub struct NewLedgerEntry<'a> {
    pub analysis_id: &'a str,
    pub upload_name: &'a str,
    pub content_digest: &'a str,
    pub sha256: &'a str,
    pub verdict: Verdict,
    pub rule: Option<&'a str>,
    pub report_name: Option<&'a str>,
    pub details: Option<&'a str>,
}

/// Append-only analysis history backed by a SQLite database.
pub struct AnalysisLedger {
    conn: Connection,
}

impl AnalysisLedger {
    /// Open (or create) the ledger database at `path`.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SlipcheckError> {
        let conn = Connection::open(path).map_err(db_err)?;

        // Enable WAL for concurrent readers.
        conn.execute_batch("PRAGMA journal_mode = WAL;")
            .map_err(db_err)?;
        conn.execute_batch(SCHEMA).map_err(db_err)?;

        debug!("analysis ledger opened");
        Ok(Self { conn })
    }

    /// Open an in-memory ledger (useful for tests).
    pub fn open_in_memory() -> Result<Self, SlipcheckError> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        conn.execute_batch(SCHEMA).map_err(db_err)?;

        debug!("in-memory analysis ledger opened");
        Ok(Self { conn })
    }

    /// Append one analysis.
    #[instrument(skip(self, entry), fields(upload = entry.upload_name, verdict = %entry.verdict))]
    pub fn record(&self, entry: &NewLedgerEntry<'_>) -> Result<(), SlipcheckError> {
        let timestamp = Utc::now().to_rfc3339();

        self.conn
            .execute(
                "INSERT INTO analyses (timestamp, analysis_id, upload_name, content_digest,
                                       sha256, verdict, rule, report_name, details)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    timestamp,
                    entry.analysis_id,
                    entry.upload_name,
                    entry.content_digest,
                    entry.sha256,
                    entry.verdict.as_str(),
                    entry.rule,
                    entry.report_name,
                    entry.details,
                ],
            )
            .map_err(db_err)?;

        debug!("ledger entry recorded");
        Ok(())
    }

    /// All analyses of a given content digest, oldest first.
    pub fn for_digest(&self, content_digest: &str) -> Result<Vec<LedgerEntry>, SlipcheckError> {
        let sql = format!("{SELECT_COLUMNS} WHERE content_digest = ?1 ORDER BY id ASC");
        let mut stmt = self.conn.prepare(&sql).map_err(db_err)?;
        let rows = stmt
            .query_map(params![content_digest], read_entry)
            .map_err(db_err)?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row.map_err(db_err)?);
        }
        Ok(entries)
    }

    /// The most recent `limit` analyses, newest first.
    pub fn recent(&self, limit: u32) -> Result<Vec<LedgerEntry>, SlipcheckError> {
        let sql = format!("{SELECT_COLUMNS} ORDER BY id DESC LIMIT ?1");
        let mut stmt = self.conn.prepare(&sql).map_err(db_err)?;
        let rows = stmt.query_map(params![limit], read_entry).map_err(db_err)?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row.map_err(db_err)?);
        }
        Ok(entries)
    }

    /// Total number of recorded analyses.
    pub fn count(&self) -> Result<u64, SlipcheckError> {
        self.conn
            .query_row("SELECT COUNT(*) FROM analyses", [], |row| row.get(0))
            .map_err(db_err)
    }
}

fn read_entry(row: &Row<'_>) -> rusqlite::Result<LedgerEntry> {
    let verdict: String = row.get(6)?;
    Ok(LedgerEntry {
        id: row.get(0)?,
        timestamp: row.get(1)?,
        analysis_id: row.get(2)?,
        upload_name: row.get(3)?,
        content_digest: row.get(4)?,
        sha256: row.get(5)?,
        verdict: Verdict::parse(&verdict).unwrap_or(Verdict::Error),
        rule: row.get(7)?,
        report_name: row.get(8)?,
        details: row.get(9)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_ledger() -> AnalysisLedger {
        AnalysisLedger::open_in_memory().expect("open in-memory ledger")
    }

    fn entry<'a>(upload: &'a str, digest: &'a str, verdict: Verdict) -> NewLedgerEntry<'a> {
        NewLedgerEntry {
            analysis_id: "00000000-0000-0000-0000-000000000000",
            upload_name: upload,
            content_digest: digest,
            sha256: "ff",
            verdict,
            rule: Some("success-marker"),
            report_name: Some("r.pdf"),
            details: None,
        }
    }

    #[test]
    fn record_and_count() {
        let ledger = make_ledger();
        assert_eq!(ledger.count().unwrap(), 0);

        ledger.record(&entry("a.png", "aaa", Verdict::Real)).unwrap();
        ledger.record(&entry("b.png", "bbb", Verdict::Fake)).unwrap();

        assert_eq!(ledger.count().unwrap(), 2);
    }

    #[test]
    fn entries_for_digest() {
        let ledger = make_ledger();
        ledger.record(&entry("a.png", "aaa", Verdict::Real)).unwrap();
        ledger.record(&entry("b.png", "bbb", Verdict::Fake)).unwrap();
        ledger.record(&entry("c.png", "aaa", Verdict::Fake)).unwrap();

        let entries = ledger.for_digest("aaa").unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].upload_name, "a.png");
        assert_eq!(entries[0].verdict, Verdict::Real);
        assert_eq!(entries[1].upload_name, "c.png");
        assert_eq!(entries[1].verdict, Verdict::Fake);
    }

    #[test]
    fn recent_entries_ordering() {
        let ledger = make_ledger();
        for i in 0..5 {
            let name = format!("upload_{i}.png");
            ledger.record(&entry(&name, "d", Verdict::Fake)).unwrap();
        }

        let recent = ledger.recent(3).unwrap();
        assert_eq!(recent.len(), 3);
        // Newest first.
        assert!(recent[0].id > recent[1].id);
        assert!(recent[1].id > recent[2].id);
        assert_eq!(recent[0].upload_name, "upload_4.png");
    }

    #[test]
    fn error_entry_keeps_details() {
        let ledger = make_ledger();
        let mut failed = entry("x.png", "dead", Verdict::Error);
        failed.rule = None;
        failed.report_name = None;
        failed.details = Some("text recognition engine unavailable");
        ledger.record(&failed).unwrap();

        let entries = ledger.for_digest("dead").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].verdict, Verdict::Error);
        assert!(entries[0].report_name.is_none());
        assert_eq!(
            entries[0].details.as_deref(),
            Some("text recognition engine unavailable")
        );
    }
}
