//! Run discovery: find every `output<ID>` folder under the root.
//!
//! Folder names are sorted lexicographically (byte order). That order is
//! both the processing order and the row order of the comparison table,
//! and it decides run numbering within a strategy.

use crate::{
    config::PostsimConfig,
    error::{PostsimError, PostsimResult},
    types::{RunNumber, StrategyId},
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Where one run's inputs and outputs live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunLayout {
    pub folder_name: String,
    pub strategy_id: StrategyId,
    pub output_dir: PathBuf,
    pub population_path: PathBuf,
    /// `input<ID>/inputs.db`, a sibling of the output folder.
    pub store_path: PathBuf,
    pub stats_path: PathBuf,
}

impl RunLayout {
    pub fn new(root: &Path, folder_name: &str, config: &PostsimConfig) -> Option<Self> {
        let strategy_id = folder_name.strip_prefix(config.output_prefix.as_str())?;
        let output_dir = root.join(folder_name);
        Some(Self {
            folder_name: folder_name.to_string(),
            strategy_id: strategy_id.to_string(),
            population_path: output_dir.join(&config.population_file),
            store_path: root
                .join(format!("{}{strategy_id}", config.input_prefix))
                .join(&config.store_file),
            stats_path: output_dir.join(config.stats_file_name(strategy_id)),
            output_dir,
        })
    }
}

/// Every run directory directly under `root`, sorted by folder name.
///
/// Fails only when the root itself cannot be listed.
pub fn discover_runs(root: &Path, config: &PostsimConfig) -> PostsimResult<Vec<RunLayout>> {
    let unreadable = |source: std::io::Error| PostsimError::RootUnreadable {
        path: root.to_path_buf(),
        source,
    };
    let mut names = Vec::new();
    for entry in std::fs::read_dir(root).map_err(unreadable)? {
        let entry = entry.map_err(unreadable)?;
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            log::debug!("discovery: skipping non-UTF-8 entry {:?}", entry.file_name());
            continue;
        };
        if name.starts_with(config.output_prefix.as_str()) && entry.path().is_dir() {
            names.push(name);
        }
    }
    names.sort();

    let runs: Vec<RunLayout> = names
        .iter()
        .filter_map(|name| RunLayout::new(root, name, config))
        .collect();
    log::info!(
        "discovery: {} run folder(s) under {}",
        runs.len(),
        root.display()
    );
    Ok(runs)
}

/// Hands out run numbers: 1 for the first run of a strategy, then 2, 3, …
#[derive(Debug, Default)]
pub struct RunNumbering {
    seen: HashMap<StrategyId, RunNumber>,
}

impl RunNumbering {
    pub fn next(&mut self, strategy_id: &str) -> RunNumber {
        let count = self.seen.entry(strategy_id.to_string()).or_insert(0);
        *count += 1;
        *count
    }
}
