//! Error types for the co-occurrence network pipeline.
//!
//! Empty results (no text, no pairs, empty graph) are not errors. They are
//! reported as [`crate::SkipReason`] values instead.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NetworkError {
    /// Invalid run parameters.
    #[error("configuration error: {0}")]
    Config(String),

    /// No loader strategy could read the file.
    #[error("could not read '{path}' with any supported format ({attempts})")]
    Load { path: PathBuf, attempts: String },

    /// Requested text column does not exist in the table.
    #[error("column {index} not found (table has {available} columns)")]
    Column { index: usize, available: usize },

    /// Drawing the network image failed.
    #[error("render error: {0}")]
    Render(String),

    /// Writing the edge table failed.
    #[error("export error: {0}")]
    Export(String),

    /// Nothing to process in the source directory.
    #[error("No source files (.csv, .xlsx) found in '{0}'")]
    NoSourceFiles(PathBuf),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, NetworkError>;
