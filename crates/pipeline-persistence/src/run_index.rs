//! The relational run index (spec.md §4.4): `pipeline_runs` /
//! `pipeline_results`, split so index queries stay cheap without loading
//! full payloads.
//!
//! The teacher carries no SQL dependency of its own; `rusqlite` (bundled
//! SQLite) is sourced from `taskdaemon-taskdaemon`'s `ts`/`cs` crates, the
//! only repo in the pack that persists structured state relationally.

use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};

use pipeline_types::{RunIndexRow, Verdict};

use crate::error::PersistenceError;

/// A single-writer SQLite-backed run index.
///
/// `Connection` is wrapped in a [`Mutex`] because spec.md §5 requires
/// single-row transactions under concurrent insert: SQLite itself only
/// allows one writer at a time regardless, so the mutex just makes that
/// serialization explicit instead of relying on SQLite's busy-retry.
pub struct RunIndexStore {
    conn: Mutex<Connection>,
}

impl RunIndexStore {
    /// Open (or create) the run index at `path`. Pass `":memory:"` for an
    /// ephemeral in-test store.
    pub fn open(path: &str) -> Result<Self, PersistenceError> {
        let conn = Connection::open(path).map_err(|e| PersistenceError::Store(e.to_string()))?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS pipeline_runs (
                run_id TEXT PRIMARY KEY,
                issue_id TEXT NOT NULL,
                verdict TEXT,
                started_at TEXT,
                completed_at TEXT NOT NULL,
                error TEXT,
                result_filename TEXT
            );
            CREATE TABLE IF NOT EXISTS pipeline_results (
                run_id TEXT PRIMARY KEY REFERENCES pipeline_runs(run_id),
                result_json TEXT NOT NULL
            );",
        )
        .map_err(|e| PersistenceError::Store(e.to_string()))?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Insert one row, and its result payload (if any), in a single
    /// transaction. Duplicate run ids are rejected via the primary key.
    pub fn index_run(&self, row: &RunIndexRow, result_json: Option<&str>) -> Result<(), PersistenceError> {
        let mut conn = self.conn.lock().expect("run index mutex poisoned");
        let tx = conn.transaction().map_err(|e| PersistenceError::Store(e.to_string()))?;

        let verdict = row.verdict.map(|v| v.to_string());
        let insert = tx.execute(
            "INSERT INTO pipeline_runs (run_id, issue_id, verdict, started_at, completed_at, error, result_filename)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![row.run_id, row.issue_id, verdict, row.started_at.to_rfc3339(), row.completed_at.to_rfc3339(), row.error, row.result_filename],
        );

        match insert {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == rusqlite::ErrorCode::ConstraintViolation => {
                return Err(PersistenceError::DuplicateRunId(row.run_id.clone()));
            }
            Err(e) => return Err(PersistenceError::Store(e.to_string())),
        }

        if let Some(json) = result_json {
            tx.execute(
                "INSERT INTO pipeline_results (run_id, result_json) VALUES (?1, ?2)",
                params![row.run_id, json],
            )
            .map_err(|e| PersistenceError::Store(e.to_string()))?;
        }

        tx.commit().map_err(|e| PersistenceError::Store(e.to_string()))?;
        Ok(())
    }

    /// Look up a row by run id, for diagnostics and tests.
    pub fn get_row(&self, run_id: &str) -> Result<Option<RunIndexRow>, PersistenceError> {
        let conn = self.conn.lock().expect("run index mutex poisoned");
        conn.query_row(
            "SELECT run_id, issue_id, verdict, started_at, completed_at, error, result_filename FROM pipeline_runs WHERE run_id = ?1",
            params![run_id],
            |r| {
                let verdict: Option<String> = r.get(2)?;
                let started_at: String = r.get(3)?;
                let completed_at: String = r.get(4)?;
                Ok(RunIndexRow {
                    run_id: r.get(0)?,
                    issue_id: r.get(1)?,
                    verdict: verdict.and_then(|v| parse_verdict(&v)),
                    started_at: started_at.parse().unwrap_or_else(|_| chrono::Utc::now()),
                    completed_at: completed_at.parse().unwrap_or_else(|_| chrono::Utc::now()),
                    error: r.get(5)?,
                    result_filename: r.get(6)?,
                })
            },
        )
        .optional()
        .map_err(|e| PersistenceError::Store(e.to_string()))
    }
}

fn parse_verdict(s: &str) -> Option<Verdict> {
    match s {
        "pass" => Some(Verdict::Pass),
        "fail" => Some(Verdict::Fail),
        "needs-human" => Some(Verdict::NeedsHuman),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn row(run_id: &str, verdict: Option<Verdict>, error: Option<&str>) -> RunIndexRow {
        RunIndexRow {
            run_id: run_id.to_string(),
            issue_id: "x/y#1".to_string(),
            verdict,
            started_at: Utc::now(),
            completed_at: Utc::now(),
            error: error.map(str::to_string),
            result_filename: Some("result_x.json".to_string()),
        }
    }

    #[test]
    fn indexes_and_reads_back_a_row() {
        let store = RunIndexStore::open(":memory:").unwrap();
        store.index_run(&row("run-1", Some(Verdict::Pass), None), Some("{}")).unwrap();
        let fetched = store.get_row("run-1").unwrap().unwrap();
        assert_eq!(fetched.verdict, Some(Verdict::Pass));
        assert!(fetched.error.is_none());
    }

    #[test]
    fn rejects_duplicate_run_id() {
        let store = RunIndexStore::open(":memory:").unwrap();
        store.index_run(&row("run-1", Some(Verdict::Pass), None), Some("{}")).unwrap();
        let err = store.index_run(&row("run-1", Some(Verdict::Fail), None), Some("{}")).unwrap_err();
        assert!(matches!(err, PersistenceError::DuplicateRunId(_)));
    }

    #[test]
    fn error_terminated_run_has_null_verdict() {
        let store = RunIndexStore::open(":memory:").unwrap();
        store.index_run(&row("run-2", None, Some("dev stage failed")), None).unwrap();
        let fetched = store.get_row("run-2").unwrap().unwrap();
        assert!(fetched.verdict.is_none());
        assert_eq!(fetched.error.as_deref(), Some("dev stage failed"));
    }

    #[test]
    fn missing_row_is_none_not_error() {
        let store = RunIndexStore::open(":memory:").unwrap();
        assert!(store.get_row("nope").unwrap().is_none());
    }

    #[test]
    fn result_filename_round_trips_through_the_store() {
        let store = RunIndexStore::open(":memory:").unwrap();
        store.index_run(&row("run-3", Some(Verdict::Pass), None), Some("{}")).unwrap();
        let fetched = store.get_row("run-3").unwrap().unwrap();
        assert_eq!(fetched.result_filename.as_deref(), Some("result_x.json"));
    }

    #[test]
    fn started_at_and_completed_at_are_stored_distinctly() {
        let store = RunIndexStore::open(":memory:").unwrap();
        let mut input = row("run-4", Some(Verdict::Pass), None);
        input.started_at = Utc::now() - chrono::Duration::seconds(30);
        store.index_run(&input, Some("{}")).unwrap();

        let fetched = store.get_row("run-4").unwrap().unwrap();
        assert_ne!(fetched.started_at, fetched.completed_at);
        assert_eq!(fetched.started_at.to_rfc3339(), input.started_at.to_rfc3339());
    }
}
