//! The aggregator: per-run statistics in, one comparison table out.
//!
//! STAGES (either can run on its own):
//!   1. Extract: population table + cohort store -> `general_stats<ID>`.
//!   2. Organize: re-read every `general_stats<ID>` -> `organized_outputs`.
//!
//! RULES:
//!   - Runs are processed one at a time, to completion, in sorted order.
//!   - An error inside one run skips that run. It never stops the others.
//!   - Only a root-level failure (unlistable root, unwritable table)
//!     aborts the invocation.
//!   - The table is built in memory and written once, at the end.

use crate::{
    cohort_store::read_initial_cohort,
    config::PostsimConfig,
    discovery::{discover_runs, RunLayout, RunNumbering},
    error::PostsimResult,
    io::{atomic_write, csv_bytes},
    metrics::{extract, RunStatistics},
    population::PopulationTable,
    stats_file::StatsFile,
    types::{RunNumber, StrategyId, NA},
};
use std::path::{Path, PathBuf};

// ── Comparison table ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRow {
    pub strategy_id: StrategyId,
    pub run_number: RunNumber,
    /// Aligned with `ComparisonTable::datapoints`.
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonTable {
    pub datapoints: Vec<String>,
    pub rows: Vec<ComparisonRow>,
}

impl ComparisonTable {
    pub fn new(datapoints: &[String]) -> Self {
        Self {
            datapoints: datapoints.to_vec(),
            rows: Vec::new(),
        }
    }

    pub fn header(&self) -> Vec<String> {
        ["strategy", "run number"]
            .into_iter()
            .map(String::from)
            .chain(self.datapoints.iter().cloned())
            .collect()
    }

    pub fn to_csv(&self) -> PostsimResult<Vec<u8>> {
        let body = self.rows.iter().map(|row| {
            [row.strategy_id.clone(), row.run_number.to_string()]
                .into_iter()
                .chain(row.values.iter().cloned())
                .collect::<Vec<_>>()
        });
        csv_bytes(std::iter::once(self.header()).chain(body))
    }

    /// Replace the artifact at `path` in one step.
    pub fn write(&self, path: &Path) -> PostsimResult<()> {
        atomic_write(path, &self.to_csv()?)?;
        Ok(())
    }
}

// ── Report ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRun {
    pub folder_name: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct AggregationReport {
    pub table_path: PathBuf,
    pub table: ComparisonTable,
    pub skipped: Vec<SkippedRun>,
}

// ── Aggregator ───────────────────────────────────────────────────────────────

pub struct Aggregator {
    root: PathBuf,
    config: PostsimConfig,
}

impl Aggregator {
    pub fn new(root: impl Into<PathBuf>, config: PostsimConfig) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    /// Both stages: recompute every run's statistics, then build the table.
    pub fn run(&self) -> PostsimResult<AggregationReport> {
        self.assemble(true)
    }

    /// Stage 2 only: build the table from statistics already on disk.
    pub fn organize(&self) -> PostsimResult<AggregationReport> {
        self.assemble(false)
    }

    /// Stage 1 for a single run.
    pub fn extract_run(&self, run: &RunLayout) -> PostsimResult<RunStatistics> {
        let table = PopulationTable::load(&run.population_path)?;
        let cohort = read_initial_cohort(&run.store_path)?;
        let stats = extract(&table, cohort)?;
        log::info!(
            "strategy={} extract: {} people, saving {}",
            run.strategy_id,
            table.len(),
            run.stats_path.display()
        );
        stats.write(&run.stats_path)?;
        Ok(stats)
    }

    /// The comparison datapoints of one run, read from its artifact.
    /// Absent datapoints become `NA`.
    pub fn row_values(&self, run: &RunLayout) -> PostsimResult<Vec<String>> {
        let stats = StatsFile::read(&run.stats_path)?;
        let values = self
            .config
            .datapoints
            .iter()
            .map(|dp| match stats.lookup(dp) {
                Some(v) => v.to_string(),
                None => {
                    log::debug!(
                        "strategy={} organize: '{dp}' absent from {}; using {NA}",
                        run.strategy_id,
                        run.stats_path.display()
                    );
                    NA.to_string()
                }
            })
            .collect();
        Ok(values)
    }

    fn assemble(&self, recompute: bool) -> PostsimResult<AggregationReport> {
        let runs = discover_runs(&self.root, &self.config)?;
        let mut table = ComparisonTable::new(&self.config.datapoints);
        let mut numbering = RunNumbering::default();
        let mut skipped = Vec::new();

        for run in &runs {
            let values = if recompute {
                self.extract_run(run).and_then(|_| self.row_values(run))
            } else {
                self.row_values(run)
            };
            match values {
                Ok(values) => {
                    let run_number = numbering.next(&run.strategy_id);
                    log::info!(
                        "strategy={} organize: added as run {run_number}",
                        run.strategy_id
                    );
                    table.rows.push(ComparisonRow {
                        strategy_id: run.strategy_id.clone(),
                        run_number,
                        values,
                    });
                }
                Err(e) => {
                    log::warn!("strategy={} skipped {}: {e}", run.strategy_id, run.folder_name);
                    skipped.push(SkippedRun {
                        folder_name: run.folder_name.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        let table_path = self.config.table_path(&self.root);
        table.write(&table_path)?;
        log::info!(
            "organize: wrote {} row(s) to {} ({} skipped)",
            table.rows.len(),
            table_path.display(),
            skipped.len()
        );
        Ok(AggregationReport {
            table_path,
            table,
            skipped,
        })
    }
}
