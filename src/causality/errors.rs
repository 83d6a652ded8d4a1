//! # Causality Errors

use thiserror::Error;

/// Result type for hypothesis evaluation
pub type CausalityResult<T> = Result<T, CausalityError>;

/// Hypothesis evaluation errors
///
/// Configuration and reference-table errors abort a run. Everything that
/// goes wrong while testing one hypothesis is turned into a result with
/// status `ERROR` instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CausalityError {
    #[error("Invalid evaluator configuration: {0}")]
    InvalidConfig(String),

    #[error("Reference table unreadable at {path}: {reason}")]
    ReferenceUnreadable { path: String, reason: String },

    #[error("Reference table malformed: {0}")]
    ReferenceMalformed(String),

    #[error("Condition references unknown feature: {0}")]
    UnknownFeature(String),

    #[error("Evaluation set misaligned: {0}")]
    Misaligned(String),
}
