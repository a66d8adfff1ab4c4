use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PostsimError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Per-individual table not found: {}", .path.display())]
    MissingInput { path: PathBuf },

    #[error("Cohort store not found: {}", .path.display())]
    MissingStore { path: PathBuf },

    #[error("Column '{column}' missing from {}", .path.display())]
    Schema { column: String, path: PathBuf },

    #[error("Invalid value '{value}' in column '{column}' at row {row}")]
    InvalidValue {
        column: String,
        row: usize,
        value: String,
    },

    #[error("Total of '{metric}' does not fit in a 64-bit count")]
    Overflow { metric: String },

    #[error("Root directory {} is not readable: {source}", .path.display())]
    RootUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type PostsimResult<T> = Result<T, PostsimError>;
