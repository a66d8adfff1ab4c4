use crate::error::PostsimResult;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Metrics pulled into the comparison table, in column order.
pub const DEFAULT_DATAPOINTS: [&str; 12] = [
    "Avg Life Span per person in Years",
    "Avg Cost per person in USD",
    "Avg Discounted Cost per person in USD",
    "Avg QALY per person minimal method",
    "Avg QALY per person multiplicative method",
    "Avg Discounted QALY per person minimal method",
    "Avg Discounted QALY per person multiplicative method",
    "number of total HCV infections",
    "number of total HCV identifications",
    "number of SVR cases",
    "number of cirrhotic people",
    "number of liver related deaths",
];

/// Name of the optional config file looked up in the root directory.
pub const CONFIG_FILE_NAME: &str = "postsim.json";

/// Folder and file naming conventions plus the comparison-table layout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PostsimConfig {
    pub output_prefix: String,
    pub input_prefix: String,
    pub population_file: String,
    /// SQLite file inside `input<ID>`.
    pub store_file: String,
    pub stats_prefix: String,
    pub stats_suffix: String,
    pub table_name: String,
    pub datapoints: Vec<String>,
}

impl Default for PostsimConfig {
    fn default() -> Self {
        Self {
            output_prefix: "output".into(),
            input_prefix: "input".into(),
            population_file: "population.csv".into(),
            store_file: "inputs.db".into(),
            stats_prefix: "general_stats".into(),
            stats_suffix: ".csv".into(),
            table_name: "organized_outputs.csv".into(),
            datapoints: DEFAULT_DATAPOINTS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl PostsimConfig {
    /// Load from a JSON file. Keys left out keep their default value.
    pub fn load(path: &Path) -> PostsimResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {}: {e}", path.display()))?;
        let config: PostsimConfig = serde_json::from_str(&content)?;
        if config.output_prefix.is_empty() {
            return Err(
                anyhow::anyhow!("{}: output_prefix must not be empty", path.display()).into(),
            );
        }
        Ok(config)
    }

    /// `<root>/postsim.json` when it exists, defaults otherwise.
    pub fn load_or_default(root: &Path) -> PostsimResult<Self> {
        let path = root.join(CONFIG_FILE_NAME);
        if path.is_file() {
            log::info!("config: loading {}", path.display());
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn table_path(&self, root: &Path) -> PathBuf {
        root.join(&self.table_name)
    }

    pub fn stats_file_name(&self, strategy_id: &str) -> String {
        format!("{}{strategy_id}{}", self.stats_prefix, self.stats_suffix)
    }
}
