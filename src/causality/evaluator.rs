//! Causality evaluator
//!
//! Per hypothesis:
//!
//! ```text
//! DEFINED → FEATURES_CHECKED ─(none present)→ SKIPPED "missing features"
//!         → FILTERED_BY_TARGET ─(no rows)→ SKIPPED "target events not found"
//!         → MODEL_REFIT ─(fit fails)→ ERROR
//!         → SIGNIFICANCE_TESTED → SUPPORTED | NOT_SUPPORTED | fallback
//! ```
//!
//! Conditional hypotheses skip the refit and compare predicted outcome
//! rates between the rows where the condition holds and the rest.
//! Every hypothesis produces exactly one result.

use crate::features::{DatasetProfile, ExampleDataset};
use crate::model::Classifier;
use crate::observability::{log_event_with_fields, Event, Logger, Severity};
use crate::transform::{FittedTransform, TransformError, TransformedSet};

use super::catalogue;
use super::condition::Condition;
use super::config::{EvaluatorConfig, FallbackPolicy};
use super::errors::{CausalityError, CausalityResult};
use super::hypothesis::{
    Analysis, Fallback, FallbackReason, Hypothesis, HypothesisKind, HypothesisResult,
    HypothesisSummary, ImportanceFigures, OutcomeGroup, RateFigures, ReferenceCheck, Status,
    TargetGroup,
};
use super::reference::{ReferenceResult, ReferenceTable};
use super::stats::{mean, one_sample_t_test};

pub const MISSING_FEATURES: &str = "missing features";
pub const TARGET_NOT_FOUND: &str = "target events not found";
pub const INSUFFICIENT_DATA: &str = "insufficient data";

/// Held-out rows in both spaces the evaluator needs
///
/// `scaled` rows feed the model; `encoded` rows (unscaled) feed
/// conditions. Both share feature names, labels and row order.
#[derive(Debug, Clone)]
pub struct EvaluationSet {
    scaled: TransformedSet,
    encoded: TransformedSet,
}

impl EvaluationSet {
    pub fn new(scaled: TransformedSet, encoded: TransformedSet) -> CausalityResult<Self> {
        if scaled.feature_names() != encoded.feature_names() {
            return Err(CausalityError::Misaligned(
                "scaled and encoded rows have different feature names".into(),
            ));
        }
        if scaled.len() != encoded.len() || scaled.labels() != encoded.labels() {
            return Err(CausalityError::Misaligned(format!(
                "scaled set has {} rows, encoded set has {}",
                scaled.len(),
                encoded.len()
            )));
        }
        Ok(Self { scaled, encoded })
    }

    /// Encodes and scales `dataset` with an already fitted transform
    pub fn from_dataset(fitted: &FittedTransform, dataset: &ExampleDataset) -> CausalityResult<Self> {
        let misaligned = |e: TransformError| CausalityError::Misaligned(e.to_string());
        let encoded = fitted.encode(dataset).map_err(misaligned)?;
        let scaled = fitted.transform(dataset).map_err(misaligned)?;
        Self::new(scaled, encoded)
    }

    pub fn feature_names(&self) -> &[String] {
        self.scaled.feature_names()
    }

    pub fn scaled_rows(&self) -> &[Vec<f64>] {
        self.scaled.rows()
    }

    pub fn encoded_rows(&self) -> &[Vec<f64>] {
        self.encoded.rows()
    }

    pub fn labels(&self) -> &[String] {
        self.scaled.labels()
    }

    pub fn len(&self) -> usize {
        self.scaled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scaled.is_empty()
    }
}

/// Verdict of an importance test: magnitude, significance and dominance
/// must all hold
pub fn importance_verdict(
    hypothesis_importance: f64,
    other_importance: f64,
    p_value: f64,
    config: &EvaluatorConfig,
) -> Status {
    Status::from_supported(
        hypothesis_importance >= config.significance_threshold
            && p_value < config.significance_level
            && hypothesis_importance > 2.0 * other_importance,
    )
}

/// Verdict of a condition/outcome test
pub fn rate_verdict(true_rate: f64, false_rate: f64, config: &EvaluatorConfig) -> Status {
    Status::from_supported(true_rate - false_rate > config.min_rate_difference)
}

/// Live outcome of one test before the reference policy is applied
enum Live {
    Verdict {
        status: Status,
        justification: String,
        analysis: Analysis,
    },
    /// Figures could not be computed; partial figures are kept
    Insufficient { detail: String, analysis: Analysis },
}

#[derive(Debug, Clone)]
pub struct CausalityEvaluator {
    config: EvaluatorConfig,
    references: ReferenceTable,
}

impl CausalityEvaluator {
    pub fn new(config: EvaluatorConfig, references: ReferenceTable) -> Self {
        Self { config, references }
    }

    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    pub fn references(&self) -> &ReferenceTable {
        &self.references
    }

    /// Instantiates the profile's catalogue against the trained features
    pub fn define_hypotheses(
        &self,
        profile: DatasetProfile,
        feature_names: &[String],
    ) -> Vec<Hypothesis> {
        let hypotheses: Vec<Hypothesis> = catalogue::entries(profile)
            .iter()
            .map(|entry| entry.define(feature_names))
            .collect();

        log_event_with_fields(
            Event::HypothesesDefined,
            &[
                ("profile", profile.as_str()),
                ("count", &hypotheses.len().to_string()),
            ],
        );
        hypotheses
    }

    /// Tests every hypothesis once. Predictions are computed once and
    /// shared by all conditional hypotheses.
    pub fn run_tests(
        &self,
        hypotheses: &[Hypothesis],
        model: &dyn Classifier,
        set: &EvaluationSet,
    ) -> Vec<HypothesisResult> {
        let predictions = model.predict(set.scaled_rows());

        hypotheses
            .iter()
            .map(|h| match (&h.kind, &predictions) {
                (HypothesisKind::Conditional { .. }, Err(e)) => {
                    self.finish_error(h, format!("prediction failed: {}", e))
                }
                (_, Ok(predicted)) => self.test_hypothesis(h, model, set, predicted),
                (HypothesisKind::Importance { .. }, Err(_)) => self.test_hypothesis(h, model, set, &[]),
            })
            .collect()
    }

    /// Tests one hypothesis. `predictions` must be row-aligned with `set`
    /// for conditional hypotheses; importance hypotheses ignore it.
    pub fn test_hypothesis(
        &self,
        hypothesis: &Hypothesis,
        model: &dyn Classifier,
        set: &EvaluationSet,
        predictions: &[String],
    ) -> HypothesisResult {
        let present: Vec<usize> = hypothesis
            .features
            .iter()
            .filter_map(|f| set.feature_names().iter().position(|n| n == f))
            .collect();
        if present.is_empty() {
            return self.finish_skipped(hypothesis, MISSING_FEATURES);
        }

        let live = match &hypothesis.kind {
            HypothesisKind::Importance { target } => {
                self.test_importance(hypothesis, target, &present, model, set)
            }
            HypothesisKind::Conditional { condition, outcome } => {
                self.test_conditional(condition, outcome, set, predictions)
            }
        };

        match live {
            Ok(Live::Verdict {
                status,
                justification,
                analysis,
            }) => self.apply_reference(hypothesis, status, justification, analysis),
            Ok(Live::Insufficient { detail, analysis }) => {
                self.insufficient(hypothesis, detail, analysis)
            }
            Err(Terminal::Skipped(reason)) => self.finish_skipped(hypothesis, reason),
            Err(Terminal::Error(message)) => self.finish_error(hypothesis, message),
        }
    }

    pub fn summary(&self, results: &[HypothesisResult]) -> HypothesisSummary {
        HypothesisSummary::from_results(results)
    }

    fn test_importance(
        &self,
        hypothesis: &Hypothesis,
        target: &TargetGroup,
        present: &[usize],
        model: &dyn Classifier,
        set: &EvaluationSet,
    ) -> Result<Live, Terminal> {
        let rows: Vec<usize> = set
            .labels()
            .iter()
            .enumerate()
            .filter(|(_, label)| target.matches(label))
            .map(|(i, _)| i)
            .collect();
        if rows.is_empty() {
            return Err(Terminal::Skipped(TARGET_NOT_FOUND));
        }

        let x: Vec<Vec<f64>> = rows.iter().map(|&i| set.scaled_rows()[i].clone()).collect();
        let y: Vec<String> = rows.iter().map(|&i| set.labels()[i].clone()).collect();

        let mut local = model.fresh();
        local
            .train(&x, &y)
            .map_err(|e| Terminal::Error(format!("model refit failed: {}", e)))?;
        let importances = local
            .feature_importances()
            .map_err(|e| Terminal::Error(format!("importances unavailable: {}", e)))?;

        let group: Vec<f64> = present.iter().filter_map(|&i| importances.get(i).copied()).collect();
        let others: Vec<f64> = importances
            .iter()
            .enumerate()
            .filter(|(i, _)| !present.contains(i))
            .map(|(_, v)| *v)
            .collect();

        let hypothesis_importance: f64 = group.iter().sum();
        let other_importance = mean(&others);
        let group_features: Vec<String> = present
            .iter()
            .map(|&i| set.feature_names()[i].clone())
            .collect();

        Logger::log(
            Severity::Trace,
            Event::HypothesisRefit.as_str(),
            &[
                ("id", &hypothesis.id),
                ("rows", &rows.len().to_string()),
                ("group_features", &group_features.len().to_string()),
            ],
        );

        let test = one_sample_t_test(&group, other_importance);
        let figures = ImportanceFigures {
            hypothesis_importance,
            other_importance,
            p_value: test.as_ref().map(|t| t.p_value),
            t_statistic: test
                .as_ref()
                .map(|t| t.t_statistic)
                .filter(|t| t.is_finite()),
            group_features,
            rows: rows.len(),
        };

        let Some(test) = test else {
            return Ok(Live::Insufficient {
                detail: format!(
                    "{} group importance(s), at least 2 needed for a significance test",
                    group.len()
                ),
                analysis: Analysis::Importance(figures),
            });
        };

        let status = importance_verdict(
            hypothesis_importance,
            other_importance,
            test.p_value,
            &self.config,
        );
        let justification = format!(
            "hypothesis importance {:.3} {} {:.3}, p = {:.4} {} {}, {:.3} {} 2 x {:.3}",
            hypothesis_importance,
            if hypothesis_importance >= self.config.significance_threshold { ">=" } else { "<" },
            self.config.significance_threshold,
            test.p_value,
            if test.p_value < self.config.significance_level { "<" } else { ">=" },
            self.config.significance_level,
            hypothesis_importance,
            if hypothesis_importance > 2.0 * other_importance { ">" } else { "<=" },
            other_importance,
        );

        Ok(Live::Verdict {
            status,
            justification,
            analysis: Analysis::Importance(figures),
        })
    }

    fn test_conditional(
        &self,
        condition: &Condition,
        outcome: &OutcomeGroup,
        set: &EvaluationSet,
        predictions: &[String],
    ) -> Result<Live, Terminal> {
        if predictions.len() != set.len() {
            return Err(Terminal::Error(format!(
                "{} predictions for {} rows",
                predictions.len(),
                set.len()
            )));
        }

        let mut hits_true = 0usize;
        let mut hits_false = 0usize;
        let mut true_count = 0usize;
        let mut false_count = 0usize;
        for (row, predicted) in set.encoded_rows().iter().zip(predictions) {
            let holds = condition
                .evaluate(set.feature_names(), row)
                .map_err(|e| Terminal::Error(e.to_string()))?;
            let hit = outcome.matches(predicted) as usize;
            if holds {
                true_count += 1;
                hits_true += hit;
            } else {
                false_count += 1;
                hits_false += hit;
            }
        }

        let rate = |hits: usize, n: usize| hits as f64 / n as f64;

        if true_count == 0 || false_count == 0 {
            let figures = RateFigures {
                condition_true_rate: if true_count > 0 { rate(hits_true, true_count) } else { 0.0 },
                condition_false_rate: if false_count > 0 { rate(hits_false, false_count) } else { 0.0 },
                difference: 0.0,
                true_count,
                false_count,
            };
            return Ok(Live::Insufficient {
                detail: format!(
                    "condition {} holds on {} of {} rows",
                    condition,
                    true_count,
                    set.len()
                ),
                analysis: Analysis::Rates(figures),
            });
        }

        let true_rate = rate(hits_true, true_count);
        let false_rate = rate(hits_false, false_count);
        let difference = true_rate - false_rate;
        let status = rate_verdict(true_rate, false_rate, &self.config);

        Ok(Live::Verdict {
            status,
            justification: format!(
                "outcome rate {:.1}% when {} vs {:.1}% otherwise, difference {:.1} points {} {:.1}",
                true_rate * 100.0,
                condition,
                false_rate * 100.0,
                difference * 100.0,
                if status == Status::Supported { ">" } else { "<=" },
                self.config.min_rate_difference * 100.0,
            ),
            analysis: Analysis::Rates(RateFigures {
                condition_true_rate: true_rate,
                condition_false_rate: false_rate,
                difference,
                true_count,
                false_count,
            }),
        })
    }

    /// Compares a live verdict with its reference, if any
    fn apply_reference(
        &self,
        hypothesis: &Hypothesis,
        status: Status,
        justification: String,
        analysis: Analysis,
    ) -> HypothesisResult {
        let mut result = HypothesisResult::new(hypothesis, status, justification);
        result.analysis = analysis;

        let Some(reference) = self.references.get(&hypothesis.id) else {
            log_tested(&result);
            return result;
        };

        let effect = result.analysis.effect().unwrap_or(0.0);
        let disagrees = reference.status != status
            && (effect - reference.effect).abs() > self.config.fallback_tolerance;

        if !disagrees {
            result.reference_check = Some(ReferenceCheck {
                reference_status: reference.status,
                reference_effect: reference.effect,
                agrees: true,
            });
            log_tested(&result);
            return result;
        }

        match self.config.fallback_policy {
            FallbackPolicy::Substitute => {
                let fallback = fallback_record(
                    FallbackReason::ReferenceDisagreement,
                    Some(status),
                    &result.analysis,
                    reference,
                );
                result.status = reference.status;
                result.justification = format!(
                    "reference verdict {} substituted: live verdict {} with effect {:.3} differs from reference effect {:.3} by more than {}",
                    reference.status, status, effect, reference.effect, self.config.fallback_tolerance
                );
                result.fallback = Some(fallback);
                log_fallback(&result, FallbackReason::ReferenceDisagreement);
            }
            FallbackPolicy::ReportLive => {
                result.reference_check = Some(ReferenceCheck {
                    reference_status: reference.status,
                    reference_effect: reference.effect,
                    agrees: false,
                });
                log_event_with_fields(
                    Event::ReferenceDisagreement,
                    &[
                        ("id", &result.id),
                        ("live_status", status.as_str()),
                        ("reference_status", reference.status.as_str()),
                        ("live_effect", &format!("{:.4}", effect)),
                        ("reference_effect", &format!("{:.4}", reference.effect)),
                    ],
                );
                log_tested(&result);
            }
        }
        result
    }

    /// Degenerate computation: reference verdict when one exists, else skip
    fn insufficient(&self, hypothesis: &Hypothesis, detail: String, analysis: Analysis) -> HypothesisResult {
        let Some(reference) = self.references.get(&hypothesis.id) else {
            let mut result = self.finish_skipped(hypothesis, INSUFFICIENT_DATA);
            result.analysis = analysis;
            return result;
        };

        let fallback = fallback_record(FallbackReason::InsufficientData, None, &analysis, reference);
        let mut result = HypothesisResult::new(
            hypothesis,
            reference.status,
            format!(
                "reference verdict {} used ({}): {}",
                reference.status, INSUFFICIENT_DATA, detail
            ),
        );
        result.analysis = analysis;
        result.fallback = Some(fallback);
        log_fallback(&result, FallbackReason::InsufficientData);
        result
    }

    fn finish_skipped(&self, hypothesis: &Hypothesis, reason: &str) -> HypothesisResult {
        log_event_with_fields(
            Event::HypothesisSkipped,
            &[("id", &hypothesis.id), ("reason", reason)],
        );
        HypothesisResult::new(hypothesis, Status::Skipped, reason)
    }

    fn finish_error(&self, hypothesis: &Hypothesis, message: String) -> HypothesisResult {
        log_event_with_fields(
            Event::HypothesisError,
            &[("id", &hypothesis.id), ("error", &message)],
        );
        HypothesisResult::new(hypothesis, Status::Error, message)
    }
}

/// Early exits of the state machine
enum Terminal {
    Skipped(&'static str),
    Error(String),
}

fn fallback_record(
    reason: FallbackReason,
    calculated_status: Option<Status>,
    analysis: &Analysis,
    reference: &ReferenceResult,
) -> Fallback {
    let (calculated_true_rate, calculated_false_rate) = match analysis {
        Analysis::Rates(r) => (
            (r.true_count > 0).then_some(r.condition_true_rate),
            (r.false_count > 0).then_some(r.condition_false_rate),
        ),
        _ => (None, None),
    };
    Fallback {
        reason,
        calculated_status,
        calculated_effect: analysis.effect(),
        calculated_true_rate,
        calculated_false_rate,
        reference_status: reference.status,
        reference_effect: reference.effect,
        reference_true_rate: reference.condition_true_rate,
        reference_false_rate: reference.condition_false_rate,
        reference_note: reference.note.clone(),
    }
}

fn log_tested(result: &HypothesisResult) {
    let effect = result
        .analysis
        .effect()
        .map(|e| format!("{:.4}", e))
        .unwrap_or_default();
    log_event_with_fields(
        Event::HypothesisTested,
        &[
            ("id", &result.id),
            ("status", result.status.as_str()),
            ("effect", &effect),
        ],
    );
}

fn log_fallback(result: &HypothesisResult, reason: FallbackReason) {
    log_event_with_fields(
        Event::HypothesisFallback,
        &[
            ("id", &result.id),
            ("status", result.status.as_str()),
            ("reason", reason.as_str()),
        ],
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::causality::condition::CompareOp;
    use crate::model::{DecisionTree, ModelError, ModelResult};

    fn config() -> EvaluatorConfig {
        EvaluatorConfig::default()
    }

    fn s(v: &[&str]) -> Vec<String> {
        v.iter().map(|x| x.to_string()).collect()
    }

    /// Two features, eight rows; `flag` alone separates the labels
    fn evaluation_set() -> EvaluationSet {
        let names = s(&["flag", "noise"]);
        let rows: Vec<Vec<f64>> = (0..8)
            .map(|i| vec![(i % 2) as f64, (i % 3) as f64])
            .collect();
        let labels: Vec<String> = (0..8)
            .map(|i| if i % 2 == 0 { "Release A" } else { "ER Triage" }.to_string())
            .collect();
        let case_ids: Vec<String> = (0..8).map(|i| format!("c{}", i)).collect();
        let set = TransformedSet::new(names, rows, labels, case_ids);
        EvaluationSet::new(set.clone(), set).unwrap()
    }

    fn conditional(id: &str, feature: &str, value: f64) -> Hypothesis {
        Hypothesis {
            id: id.into(),
            name: id.into(),
            description: String::new(),
            features: s(&[feature]),
            kind: HypothesisKind::Conditional {
                condition: Condition::compare(feature, CompareOp::Gt, value),
                outcome: OutcomeGroup::new(&["Release"]),
            },
        }
    }

    fn importance(id: &str, features: &[&str], target: &[&str]) -> Hypothesis {
        Hypothesis {
            id: id.into(),
            name: id.into(),
            description: String::new(),
            features: s(features),
            kind: HypothesisKind::Importance {
                target: TargetGroup::activities(target),
            },
        }
    }

    fn reference(status: Status, effect: f64) -> ReferenceResult {
        ReferenceResult {
            status,
            effect,
            condition_true_rate: Some(effect),
            condition_false_rate: Some(0.0),
            note: None,
        }
    }

    #[derive(Debug)]
    struct Unfittable;

    impl Classifier for Unfittable {
        fn name(&self) -> &str {
            "unfittable"
        }
        fn train(&mut self, _: &[Vec<f64>], _: &[String]) -> ModelResult<()> {
            Err(ModelError::InvalidParameter("cannot fit".into()))
        }
        fn predict_proba(&self, _: &[Vec<f64>]) -> ModelResult<Vec<Vec<f64>>> {
            Err(ModelError::NotTrained)
        }
        fn classes(&self) -> &[String] {
            &[]
        }
        fn feature_importances(&self) -> ModelResult<Vec<f64>> {
            Err(ModelError::NotTrained)
        }
        fn fresh(&self) -> Box<dyn Classifier> {
            Box::new(Unfittable)
        }
    }

    #[test]
    fn test_importance_verdict_scenarios() {
        assert_eq!(importance_verdict(0.30, 0.05, 0.01, &config()), Status::Supported);
        assert_eq!(importance_verdict(0.20, 0.05, 0.01, &config()), Status::NotSupported);
        assert_eq!(importance_verdict(0.30, 0.05, 0.05, &config()), Status::NotSupported);
        assert_eq!(importance_verdict(0.30, 0.15, 0.01, &config()), Status::NotSupported);
    }

    #[test]
    fn test_rate_verdict() {
        assert_eq!(rate_verdict(0.50, 0.10, &config()), Status::Supported);
        assert_eq!(rate_verdict(0.20, 0.10, &config()), Status::NotSupported);
        assert_eq!(rate_verdict(0.10, 0.50, &config()), Status::NotSupported);
    }

    #[test]
    fn test_missing_features_skips() {
        let evaluator = CausalityEvaluator::new(config(), ReferenceTable::empty());
        let h = importance("x", &["CRP_last"], &[]);
        let result = evaluator.test_hypothesis(&h, &DecisionTree::default(), &evaluation_set(), &[]);
        assert_eq!(result.status, Status::Skipped);
        assert_eq!(result.justification, MISSING_FEATURES);
        assert!(result.fallback.is_none());
    }

    #[test]
    fn test_target_not_found_skips() {
        let evaluator = CausalityEvaluator::new(config(), ReferenceTable::empty());
        let h = importance("x", &["flag"], &["SUPERVISOR"]);
        let result = evaluator.test_hypothesis(&h, &DecisionTree::default(), &evaluation_set(), &[]);
        assert_eq!(result.status, Status::Skipped);
        assert_eq!(result.justification, TARGET_NOT_FOUND);
    }

    #[test]
    fn test_refit_failure_is_error() {
        let evaluator = CausalityEvaluator::new(config(), ReferenceTable::empty());
        let h = importance("x", &["flag"], &[]);
        let result = evaluator.test_hypothesis(&h, &Unfittable, &evaluation_set(), &[]);
        assert_eq!(result.status, Status::Error);
        assert!(result.justification.contains("cannot fit"));
    }

    #[test]
    fn test_single_group_feature_is_insufficient() {
        let evaluator = CausalityEvaluator::new(config(), ReferenceTable::empty());
        let h = importance("x", &["flag"], &[]);
        let result = evaluator.test_hypothesis(&h, &DecisionTree::default(), &evaluation_set(), &[]);
        assert_eq!(result.status, Status::Skipped);
        assert_eq!(result.justification, INSUFFICIENT_DATA);
        match &result.analysis {
            Analysis::Importance(f) => {
                assert_eq!(f.p_value, None);
                assert_eq!(f.t_statistic, None);
                assert_eq!(f.group_features, s(&["flag"]));
            }
            other => panic!("unexpected analysis {:?}", other),
        }
    }

    #[test]
    fn test_single_group_feature_fallback_keeps_computed_importance() {
        let mut refs = ReferenceTable::empty();
        refs.insert("x", reference(Status::Supported, 0.4));
        let evaluator = CausalityEvaluator::new(config(), refs);
        let h = importance("x", &["flag"], &[]);
        let result = evaluator.test_hypothesis(&h, &DecisionTree::default(), &evaluation_set(), &[]);

        assert_eq!(result.status, Status::Supported);
        let Analysis::Importance(figures) = &result.analysis else {
            panic!("unexpected analysis {:?}", result.analysis);
        };
        let fallback = result.fallback.clone().unwrap();
        assert_eq!(fallback.reason, FallbackReason::InsufficientData);
        assert_eq!(fallback.calculated_status, None);
        assert_eq!(fallback.calculated_effect, Some(figures.hypothesis_importance));
        assert!(figures.hypothesis_importance > 0.9);
        assert_eq!(fallback.reference_effect, 0.4);
    }

    #[test]
    fn test_importance_hypothesis_computes_figures() {
        let evaluator = CausalityEvaluator::new(config(), ReferenceTable::empty());
        let h = importance("x", &["flag", "noise"], &[]);
        let result = evaluator.test_hypothesis(&h, &DecisionTree::default(), &evaluation_set(), &[]);
        match &result.analysis {
            Analysis::Importance(f) => {
                assert!((f.hypothesis_importance - 1.0).abs() < 1e-9);
                assert_eq!(f.other_importance, 0.0);
                assert_eq!(f.rows, 8);
            }
            other => panic!("unexpected analysis {:?}", other),
        }
        assert!(matches!(result.status, Status::Supported | Status::NotSupported));
    }

    #[test]
    fn test_conditional_rates() {
        let evaluator = CausalityEvaluator::new(config(), ReferenceTable::empty());
        let set = evaluation_set();
        let h = conditional("x", "noise", 0.0);
        // noise > 0 on rows 1,2,4,5,7; predict Release on rows 1,2 only
        let predictions: Vec<String> = (0..8)
            .map(|i| if i == 1 || i == 2 { "Release A" } else { "ER Triage" }.to_string())
            .collect();
        let result = evaluator.test_hypothesis(&h, &DecisionTree::default(), &set, &predictions);
        match &result.analysis {
            Analysis::Rates(r) => {
                assert_eq!(r.true_count, 5);
                assert_eq!(r.false_count, 3);
                assert!((r.condition_true_rate - 0.4).abs() < 1e-12);
                assert_eq!(r.condition_false_rate, 0.0);
            }
            other => panic!("unexpected analysis {:?}", other),
        }
        assert_eq!(result.status, Status::Supported);
    }

    #[test]
    fn test_degenerate_split_uses_reference() {
        let mut refs = ReferenceTable::empty();
        refs.insert("h", reference(Status::Supported, 0.13));
        let evaluator = CausalityEvaluator::new(config(), refs);
        let h = conditional("h", "flag", 5.0);
        let predictions = evaluation_set().labels().to_vec();
        let result =
            evaluator.test_hypothesis(&h, &DecisionTree::default(), &evaluation_set(), &predictions);

        assert_eq!(result.status, Status::Supported);
        let fallback = result.fallback.unwrap();
        assert_eq!(fallback.reason, FallbackReason::InsufficientData);
        assert_eq!(fallback.reference_effect, 0.13);
        assert_eq!(fallback.calculated_true_rate, None);
        assert_eq!(fallback.calculated_false_rate, Some(0.5));
        // No rows satisfy the condition, so there is no rate difference
        assert_eq!(fallback.calculated_effect, None);
    }

    #[test]
    fn test_degenerate_split_without_reference_skips() {
        let evaluator = CausalityEvaluator::new(config(), ReferenceTable::empty());
        let h = conditional("h", "flag", 5.0);
        let predictions = evaluation_set().labels().to_vec();
        let result =
            evaluator.test_hypothesis(&h, &DecisionTree::default(), &evaluation_set(), &predictions);
        assert_eq!(result.status, Status::Skipped);
        assert_eq!(result.justification, INSUFFICIENT_DATA);
    }

    fn disagreeing_setup(policy: FallbackPolicy) -> HypothesisResult {
        // Live: flag > 0 never predicts Release (rate 0 vs 1) → NOT_SUPPORTED, effect -1
        let mut refs = ReferenceTable::empty();
        refs.insert("h", reference(Status::Supported, 0.32));
        let evaluator = CausalityEvaluator::new(
            EvaluatorConfig {
                fallback_policy: policy,
                ..config()
            },
            refs,
        );
        let h = conditional("h", "flag", 0.0);
        let predictions = evaluation_set().labels().to_vec();
        evaluator.test_hypothesis(&h, &DecisionTree::default(), &evaluation_set(), &predictions)
    }

    #[test]
    fn test_disagreement_substitutes_reference() {
        let result = disagreeing_setup(FallbackPolicy::Substitute);
        assert_eq!(result.status, Status::Supported);
        let fallback = result.fallback.unwrap();
        assert_eq!(fallback.reason, FallbackReason::ReferenceDisagreement);
        assert_eq!(fallback.calculated_status, Some(Status::NotSupported));
        assert_eq!(fallback.calculated_effect, Some(-1.0));
        assert_eq!(fallback.reference_status, Status::Supported);
        assert_eq!(fallback.reference_effect, 0.32);
    }

    #[test]
    fn test_status_mismatch_within_tolerance_keeps_live() {
        // Live effect is -1.0; a reference 0.02 away is close enough
        let mut refs = ReferenceTable::empty();
        refs.insert("h", reference(Status::Supported, -0.98));
        let evaluator = CausalityEvaluator::new(config(), refs);
        let h = conditional("h", "flag", 0.0);
        let predictions = evaluation_set().labels().to_vec();
        let result =
            evaluator.test_hypothesis(&h, &DecisionTree::default(), &evaluation_set(), &predictions);

        assert_eq!(result.status, Status::NotSupported);
        assert!(result.fallback.is_none());
        let check = result.reference_check.unwrap();
        assert!(check.agrees);
        assert_eq!(check.reference_status, Status::Supported);
    }

    #[test]
    fn test_importance_disagreement_substitutes_reference() {
        // Group importances [1, 0] give t = 1, p = 0.5: NOT_SUPPORTED live
        let mut refs = ReferenceTable::empty();
        refs.insert("imp", reference(Status::Supported, 0.3));
        let evaluator = CausalityEvaluator::new(config(), refs);
        let h = importance("imp", &["flag", "noise"], &[]);
        let result = evaluator.test_hypothesis(&h, &DecisionTree::default(), &evaluation_set(), &[]);

        assert_eq!(result.status, Status::Supported);
        let fallback = result.fallback.clone().unwrap();
        assert_eq!(fallback.reason, FallbackReason::ReferenceDisagreement);
        assert_eq!(fallback.calculated_status, Some(Status::NotSupported));
        let effect = fallback.calculated_effect.unwrap();
        assert!((effect - 1.0).abs() < 1e-9);
        assert_eq!(fallback.calculated_true_rate, None);
        assert_eq!(fallback.reference_status, Status::Supported);
        assert!(matches!(result.analysis, Analysis::Importance(_)));
    }

    #[test]
    fn test_disagreement_report_live() {
        let result = disagreeing_setup(FallbackPolicy::ReportLive);
        assert_eq!(result.status, Status::NotSupported);
        assert!(result.fallback.is_none());
        let check = result.reference_check.unwrap();
        assert!(!check.agrees);
        assert_eq!(check.reference_status, Status::Supported);
    }

    #[test]
    fn test_same_verdict_keeps_live_figures() {
        let mut refs = ReferenceTable::empty();
        refs.insert("h", reference(Status::NotSupported, 0.9));
        let evaluator = CausalityEvaluator::new(config(), refs);
        let h = conditional("h", "flag", 0.0);
        let predictions = evaluation_set().labels().to_vec();
        let result =
            evaluator.test_hypothesis(&h, &DecisionTree::default(), &evaluation_set(), &predictions);
        assert_eq!(result.status, Status::NotSupported);
        assert!(result.fallback.is_none());
        assert!(result.reference_check.unwrap().agrees);
    }

    #[test]
    fn test_run_tests_one_result_per_hypothesis() {
        let evaluator = CausalityEvaluator::new(config(), ReferenceTable::empty());
        let set = evaluation_set();
        let mut model = DecisionTree::default();
        model.train(set.scaled_rows(), set.labels()).unwrap();

        let hypotheses = vec![
            importance("a", &["flag", "noise"], &[]),
            importance("b", &["missing"], &[]),
            conditional("c", "noise", 0.0),
            conditional("d", "flag", 9.0),
        ];
        let results = evaluator.run_tests(&hypotheses, &model, &set);
        assert_eq!(results.len(), hypotheses.len());
        let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_run_tests_with_failing_prediction() {
        let evaluator = CausalityEvaluator::new(config(), ReferenceTable::empty());
        let hypotheses = vec![conditional("c", "noise", 0.0), importance("a", &["flag", "noise"], &[])];
        let results = evaluator.run_tests(&hypotheses, &Unfittable, &evaluation_set());
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].status, Status::Error);
        assert!(results[0].justification.starts_with("prediction failed"));
        assert_eq!(results[1].status, Status::Error);
    }

    #[test]
    fn test_define_hypotheses_never_empty() {
        let evaluator = CausalityEvaluator::new(config(), ReferenceTable::empty());
        for profile in [
            DatasetProfile::Generic,
            DatasetProfile::Clinical,
            DatasetProfile::Administrative,
        ] {
            let hypotheses = evaluator.define_hypotheses(profile, &[]);
            assert!(!hypotheses.is_empty());
            assert!(hypotheses.iter().all(|h| !h.features.is_empty()));
        }
    }

    #[test]
    fn test_evaluation_set_rejects_misaligned_parts() {
        let a = TransformedSet::new(s(&["x"]), vec![vec![1.0]], s(&["a"]), s(&["c"]));
        let b = TransformedSet::new(s(&["y"]), vec![vec![1.0]], s(&["a"]), s(&["c"]));
        assert!(EvaluationSet::new(a, b).is_err());
    }
}
