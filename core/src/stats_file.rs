//! The per-run `general_stats<ID>` artifact: a `metric,value` table.
//!
//! The comparison table is built by reading these files back, not from
//! in-memory statistics, so the table can be rebuilt from existing
//! artifacts alone.

use crate::{
    error::{PostsimError, PostsimResult},
    io::{atomic_write, csv_bytes},
    metrics::MetricValue,
};
use std::path::Path;

pub const HEADER: [&str; 2] = ["metric", "value"];

pub fn write_stats(path: &Path, entries: &[(String, MetricValue)]) -> PostsimResult<()> {
    let header = std::iter::once([HEADER[0].to_string(), HEADER[1].to_string()]);
    let rows = entries
        .iter()
        .map(|(name, value)| [name.clone(), value.to_string()]);
    let bytes = csv_bytes(header.chain(rows))?;
    atomic_write(path, &bytes)?;
    Ok(())
}

/// Metric names compare equal when they differ only in whitespace.
fn normalize(name: &str) -> String {
    name.trim_matches('"')
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

/// A per-run artifact read back from disk.
#[derive(Debug, Clone, Default)]
pub struct StatsFile {
    entries: Vec<(String, String)>,
}

impl StatsFile {
    pub fn read(path: &Path) -> PostsimResult<Self> {
        if !path.is_file() {
            return Err(PostsimError::MissingInput {
                path: path.to_path_buf(),
            });
        }
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)?;
        let mut entries = Vec::new();
        for record in reader.records() {
            let record = record?;
            if let (Some(name), Some(value)) = (record.get(0), record.get(1)) {
                entries.push((name.to_string(), value.trim().to_string()));
            }
        }
        Ok(Self { entries })
    }

    /// First value recorded under `name`.
    pub fn lookup(&self, name: &str) -> Option<&str> {
        let wanted = normalize(name);
        self.entries
            .iter()
            .find(|(k, _)| normalize(k) == wanted)
            .map(|(_, v)| v.as_str())
    }
}
