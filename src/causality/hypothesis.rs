//! Hypotheses and their results

use std::fmt;

use serde::{Deserialize, Serialize};

use super::condition::Condition;

/// Which true labels an importance hypothesis is measured on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "activities", rename_all = "snake_case")]
pub enum TargetGroup {
    Any,
    /// Activity-name substrings
    Activities(Vec<String>),
}

impl TargetGroup {
    pub fn activities<S: AsRef<str>>(names: &[S]) -> Self {
        if names.is_empty() {
            TargetGroup::Any
        } else {
            TargetGroup::Activities(names.iter().map(|s| s.as_ref().to_string()).collect())
        }
    }

    pub fn matches(&self, label: &str) -> bool {
        match self {
            TargetGroup::Any => true,
            TargetGroup::Activities(names) => names.iter().any(|n| label.contains(n.as_str())),
        }
    }
}

/// Predicted labels that count as the outcome of a conditional hypothesis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeGroup {
    pub substrings: Vec<String>,
}

impl OutcomeGroup {
    pub fn new<S: AsRef<str>>(substrings: &[S]) -> Self {
        Self {
            substrings: substrings.iter().map(|s| s.as_ref().to_string()).collect(),
        }
    }

    pub fn matches(&self, label: &str) -> bool {
        self.substrings.iter().any(|s| label.contains(s.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "style", rename_all = "snake_case")]
pub enum HypothesisKind {
    /// Feature group importance on a model refit over the target rows
    Importance { target: TargetGroup },
    /// Outcome rate when the condition holds versus when it does not
    Conditional {
        condition: Condition,
        outcome: OutcomeGroup,
    },
}

impl HypothesisKind {
    pub fn style(&self) -> &'static str {
        match self {
            HypothesisKind::Importance { .. } => "importance",
            HypothesisKind::Conditional { .. } => "conditional",
        }
    }
}

/// A claim that a feature group drives an outcome group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hypothesis {
    /// Stable id, also the reference table key
    pub id: String,
    pub name: String,
    pub description: String,
    /// Never empty
    pub features: Vec<String>,
    pub kind: HypothesisKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Supported,
    NotSupported,
    Skipped,
    Error,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Supported => "SUPPORTED",
            Status::NotSupported => "NOT_SUPPORTED",
            Status::Skipped => "SKIPPED",
            Status::Error => "ERROR",
        }
    }

    pub fn from_supported(supported: bool) -> Self {
        if supported {
            Status::Supported
        } else {
            Status::NotSupported
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Figures of an importance test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportanceFigures {
    /// Sum of importances over the present group features
    pub hypothesis_importance: f64,
    /// Mean importance of all other features
    pub other_importance: f64,
    /// Null when fewer than two group importances exist
    pub p_value: Option<f64>,
    /// Null when the group importances have no spread or too few exist
    pub t_statistic: Option<f64>,
    pub group_features: Vec<String>,
    /// Rows the model was refit on
    pub rows: usize,
}

/// Figures of a condition/outcome test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateFigures {
    pub condition_true_rate: f64,
    pub condition_false_rate: f64,
    pub difference: f64,
    pub true_count: usize,
    pub false_count: usize,
}

/// Live figures, when they could be computed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Analysis {
    Importance(ImportanceFigures),
    Rates(RateFigures),
    None,
}

impl Analysis {
    /// The figure compared against the reference effect
    pub fn effect(&self) -> Option<f64> {
        match self {
            Analysis::Importance(f) => Some(f.hypothesis_importance),
            // A rate difference needs rows on both sides of the condition
            Analysis::Rates(r) => (r.true_count > 0 && r.false_count > 0).then_some(r.difference),
            Analysis::None => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    /// The live figures could not be computed
    InsufficientData,
    /// The live verdict disagreed with the reference beyond tolerance
    ReferenceDisagreement,
}

impl FallbackReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackReason::InsufficientData => "insufficient data",
            FallbackReason::ReferenceDisagreement => "reference disagreement",
        }
    }
}

/// Both sides of a reference-derived verdict.
///
/// Every field is always serialized. `calculated_*` fields are null when
/// the live computation could not produce them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fallback {
    pub reason: FallbackReason,
    pub calculated_status: Option<Status>,
    pub calculated_effect: Option<f64>,
    pub calculated_true_rate: Option<f64>,
    pub calculated_false_rate: Option<f64>,
    pub reference_status: Status,
    pub reference_effect: f64,
    pub reference_true_rate: Option<f64>,
    pub reference_false_rate: Option<f64>,
    pub reference_note: Option<String>,
}

/// Reference comparison kept alongside a live verdict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceCheck {
    pub reference_status: Status,
    pub reference_effect: f64,
    pub agrees: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HypothesisResult {
    pub id: String,
    pub name: String,
    pub description: String,
    pub kind: HypothesisKind,
    pub status: Status,
    pub justification: String,
    pub analysis: Analysis,
    /// Present iff `status` came from the reference table
    pub fallback: Option<Fallback>,
    /// Present when a reference exists and the live verdict was kept
    pub reference_check: Option<ReferenceCheck>,
}

impl HypothesisResult {
    pub(crate) fn new(hypothesis: &Hypothesis, status: Status, justification: impl Into<String>) -> Self {
        Self {
            id: hypothesis.id.clone(),
            name: hypothesis.name.clone(),
            description: hypothesis.description.clone(),
            kind: hypothesis.kind.clone(),
            status,
            justification: justification.into(),
            analysis: Analysis::None,
            fallback: None,
            reference_check: None,
        }
    }

    pub fn supported(&self) -> bool {
        self.status == Status::Supported
    }

    pub fn is_fallback(&self) -> bool {
        self.fallback.is_some()
    }
}

/// Counts over one result list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HypothesisSummary {
    pub total: usize,
    pub supported: usize,
    pub not_supported: usize,
    pub skipped: usize,
    pub errors: usize,
    pub fallbacks: usize,
}

impl HypothesisSummary {
    pub fn from_results(results: &[HypothesisResult]) -> Self {
        let mut summary = Self {
            total: results.len(),
            ..Self::default()
        };
        for r in results {
            match r.status {
                Status::Supported => summary.supported += 1,
                Status::NotSupported => summary.not_supported += 1,
                Status::Skipped => summary.skipped += 1,
                Status::Error => summary.errors += 1,
            }
            if r.is_fallback() {
                summary.fallbacks += 1;
            }
        }
        summary
    }
}
