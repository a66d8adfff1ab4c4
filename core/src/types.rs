//! Shared primitive types used across the aggregation pipeline.

/// Suffix of an `output<ID>` folder. One strategy may own several folders.
pub type StrategyId = String;

/// 1-based position of a run within its strategy, by first-seen order.
pub type RunNumber = u32;

/// Literal written wherever a value is absent or undefined.
pub const NA: &str = "NA";
