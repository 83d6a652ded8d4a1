//! Causal hypothesis evaluation
//!
//! Decides per hypothesis whether a feature group is a meaningful driver
//! of an outcome group, using the model's own importances (importance
//! style) or predicted outcome rates (conditional style). Mispredicted
//! transitions are profiled over the model's most important features.
//!
//! # Guarantees
//!
//! - `run_tests` returns exactly one result per hypothesis, in order
//! - A problem with one hypothesis never affects another
//! - A verdict taken from the reference table always carries a
//!   `Fallback` with both the calculated and the reference figures
//! - Conditions read encoded, unscaled features; refits use scaled rows

mod catalogue;
mod condition;
mod config;
mod errors;
mod evaluator;
mod hypothesis;
mod reference;
mod stats;
mod transitions;

pub use condition::{CompareOp, Condition};
pub use config::{EvaluatorConfig, FallbackPolicy};
pub use errors::{CausalityError, CausalityResult};
pub use evaluator::{
    importance_verdict, rate_verdict, CausalityEvaluator, EvaluationSet, INSUFFICIENT_DATA,
    MISSING_FEATURES, TARGET_NOT_FOUND,
};
pub use hypothesis::{
    Analysis, Fallback, FallbackReason, Hypothesis, HypothesisKind, HypothesisResult,
    HypothesisSummary, ImportanceFigures, OutcomeGroup, RateFigures, ReferenceCheck, Status,
    TargetGroup,
};
pub use reference::{ReferenceResult, ReferenceTable};
pub use stats::{
    mean, one_sample_t_test, population_std, sample_std, two_sided_t_p_value, TTest,
};
pub use transitions::{analyze_transitions, FeaturePattern, TransitionCause};
