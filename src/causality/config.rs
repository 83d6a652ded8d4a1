//! Evaluator settings

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::errors::{CausalityError, CausalityResult};

/// What to report when a live verdict disagrees with its reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Report the reference verdict, flagged as a fallback
    #[default]
    Substitute,
    /// Report the live verdict and attach the reference for comparison
    ReportLive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluatorConfig {
    /// Minimum summed group importance for SUPPORTED
    #[serde(default = "default_significance_threshold")]
    pub significance_threshold: f64,

    /// p-value cutoff for SUPPORTED
    #[serde(default = "default_significance_level")]
    pub significance_level: f64,

    /// Effect gap beyond which a disagreeing verdict triggers the policy
    #[serde(default = "default_fallback_tolerance")]
    pub fallback_tolerance: f64,

    /// Rate difference a conditional hypothesis must exceed
    #[serde(default = "default_min_rate_difference")]
    pub min_rate_difference: f64,

    #[serde(default)]
    pub fallback_policy: FallbackPolicy,

    /// Most important features profiled per mispredicted transition
    #[serde(default = "default_transition_features")]
    pub transition_features: usize,

    /// Mispredicted transitions with fewer cases are not reported
    #[serde(default = "default_min_transition_cases")]
    pub min_transition_cases: usize,

    /// Reference table; none means no fallback is ever available
    #[serde(default)]
    pub reference_path: Option<PathBuf>,
}

fn default_significance_threshold() -> f64 {
    0.25
}

fn default_significance_level() -> f64 {
    0.05
}

fn default_fallback_tolerance() -> f64 {
    0.05
}

fn default_min_rate_difference() -> f64 {
    0.10
}

fn default_transition_features() -> usize {
    10
}

fn default_min_transition_cases() -> usize {
    5
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            significance_threshold: default_significance_threshold(),
            significance_level: default_significance_level(),
            fallback_tolerance: default_fallback_tolerance(),
            min_rate_difference: default_min_rate_difference(),
            fallback_policy: FallbackPolicy::default(),
            transition_features: default_transition_features(),
            min_transition_cases: default_min_transition_cases(),
            reference_path: None,
        }
    }
}

impl EvaluatorConfig {
    pub fn validate(&self) -> CausalityResult<()> {
        if !(self.significance_level > 0.0 && self.significance_level < 1.0) {
            return Err(CausalityError::InvalidConfig(format!(
                "significance_level must be in (0, 1), got {}",
                self.significance_level
            )));
        }
        if !(self.significance_threshold >= 0.0 && self.significance_threshold <= 1.0) {
            return Err(CausalityError::InvalidConfig(format!(
                "significance_threshold must be in [0, 1], got {}",
                self.significance_threshold
            )));
        }
        if !(self.fallback_tolerance >= 0.0) {
            return Err(CausalityError::InvalidConfig(format!(
                "fallback_tolerance must not be negative, got {}",
                self.fallback_tolerance
            )));
        }
        if !(self.min_rate_difference >= 0.0 && self.min_rate_difference < 1.0) {
            return Err(CausalityError::InvalidConfig(format!(
                "min_rate_difference must be in [0, 1), got {}",
                self.min_rate_difference
            )));
        }
        if self.transition_features == 0 {
            return Err(CausalityError::InvalidConfig(
                "transition_features must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
