//! Read-only access to the initial-cohort SQLite store of a run.
//!
//! RULE: Only this module talks to the cohort database.
//! Callers get aggregates back; they never execute SQL directly.

use crate::error::{PostsimError, PostsimResult};
use rusqlite::{Connection, OpenFlags};
use std::path::Path;

/// Aggregates of the cohort as it stood at simulation start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InitialCohortSummary {
    pub initial_infections: i64,
    pub initial_identified: i64,
}

/// `hcv_status` codes counted as infected (1 = acute, 2 = chronic).
const INFECTED_STATUS_CODES: &str = "(1, 2)";

pub struct CohortStore {
    conn: Connection,
}

impl CohortStore {
    /// Open an existing store read-only. Never creates a file.
    pub fn open(path: &Path) -> PostsimResult<Self> {
        if !path.is_file() {
            return Err(PostsimError::MissingStore {
                path: path.to_path_buf(),
            });
        }
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self { conn })
    }

    /// Number of people infected (acute or chronic) at simulation start.
    pub fn initial_infections(&self) -> PostsimResult<i64> {
        let count: i64 = self.conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM init_cohort WHERE hcv_status IN {INFECTED_STATUS_CODES}"
            ),
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Number of people already identified at simulation start.
    /// An empty table sums to NULL in SQL; that reads back as 0.
    pub fn initial_identified(&self) -> PostsimResult<i64> {
        let sum: Option<i64> = self.conn.query_row(
            "SELECT CAST(SUM(identified_as_hcv_positive) AS INTEGER) FROM init_cohort",
            [],
            |row| row.get(0),
        )?;
        Ok(sum.unwrap_or(0))
    }

    pub fn summary(&self) -> PostsimResult<InitialCohortSummary> {
        Ok(InitialCohortSummary {
            initial_infections: self.initial_infections()?,
            initial_identified: self.initial_identified()?,
        })
    }
}

/// Both cohort aggregates for one run.
///
/// A missing store is not fatal: the run falls back to `(0, 0)` and a
/// warning is logged. The connection is dropped before returning on every
/// path.
pub fn read_initial_cohort(path: &Path) -> PostsimResult<InitialCohortSummary> {
    match CohortStore::open(path) {
        Ok(store) => store.summary(),
        Err(PostsimError::MissingStore { path }) => {
            log::warn!(
                "cohort: {} not found; initial infections and identifications set to 0",
                path.display()
            );
            Ok(InitialCohortSummary::default())
        }
        Err(e) => Err(e),
    }
}
