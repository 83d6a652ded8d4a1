//! # Model Errors

use thiserror::Error;

/// Result type for model operations
pub type ModelResult<T> = Result<T, ModelError>;

/// Classifier errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("Cannot train on an empty dataset")]
    EmptyTrainingSet,

    #[error("Rows and labels differ in length: {rows} rows, {labels} labels")]
    LengthMismatch { rows: usize, labels: usize },

    #[error("Row {row} has {actual} features, expected {expected}")]
    FeatureCount {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Model is not trained")]
    NotTrained,

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}
