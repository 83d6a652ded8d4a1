//! # Transformation Errors

use thiserror::Error;

/// Result type for data transformation
pub type TransformResult<T> = Result<T, TransformError>;

/// Data transformation errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformError {
    #[error("Cannot fit on an empty dataset")]
    EmptyDataset,

    #[error("Schema mismatch: fitted on {expected}, got {found}")]
    SchemaMismatch { expected: String, found: String },

    #[error("Invalid test size {0}: must be in (0, 1)")]
    InvalidTestSize(f64),

    #[error("Split leaves no {0} examples")]
    EmptyPartition(&'static str),

    #[error("Row {row} has {actual} values, expected {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        actual: usize,
    },
}
