//! postsim: summarize HEP-CE simulation outputs into one comparison table.
//!
//! Usage (from the folder holding output1, output2, ...):
//!   postsim
//!   postsim --root /data/hepce --organize-only
//!   postsim --config postsim.json

use anyhow::Result;
use postsim_core::{
    aggregator::{AggregationReport, Aggregator},
    config::PostsimConfig,
};
use std::env;
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    let organize_only = args.iter().any(|a| a == "--organize-only");
    let root = match flag_value(&args, "--root") {
        Some(dir) => PathBuf::from(dir),
        None => env::current_dir()?,
    };
    let config = match flag_value(&args, "--config") {
        Some(path) => PostsimConfig::load(Path::new(path))?,
        None => PostsimConfig::load_or_default(&root)?,
    };

    println!("HEP-CE postsim");
    println!("  root:   {}", root.display());
    println!(
        "  stages: {}",
        if organize_only { "organize" } else { "extract + organize" }
    );
    println!();

    let aggregator = Aggregator::new(root, config);
    let report = if organize_only {
        aggregator.organize()?
    } else {
        aggregator.run()?
    };
    print_summary(&report);
    Ok(())
}

fn print_summary(report: &AggregationReport) {
    println!("=== AGGREGATION SUMMARY ===");
    println!("  table:   {}", report.table_path.display());
    println!("  rows:    {}", report.table.rows.len());
    println!("  skipped: {}", report.skipped.len());
    for skip in &report.skipped {
        println!("    {}: {}", skip.folder_name, skip.reason);
    }
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}
