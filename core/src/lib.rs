//! Post-simulation aggregation for HEP-CE outputs.
//!
//! Per run: `output<ID>/population.csv` + `input<ID>/inputs.db`
//! -> `output<ID>/general_stats<ID>.csv`.
//! Per invocation: every `general_stats<ID>.csv` -> `organized_outputs.csv`.

pub mod aggregator;
pub mod cohort_store;
pub mod config;
pub mod discovery;
pub mod error;
pub mod io;
pub mod metrics;
pub mod population;
pub mod stats_file;
pub mod types;
