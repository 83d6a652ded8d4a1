//! Hypothesis Evaluation Tests
//!
//! Tests for the causality evaluator through the public API:
//! - Verdict rules for importance and conditional hypotheses
//! - One result per hypothesis, always with a status
//! - Reference-derived results expose both calculated and reference figures
//! - A full run over an on-disk clinical log

use std::fs;
use std::path::PathBuf;

use serde_json::Value;
use tempfile::TempDir;
use tracecause::causality::{
    importance_verdict, rate_verdict, Analysis, CausalityEvaluator, CompareOp, Condition,
    EvaluationSet, EvaluatorConfig, FallbackPolicy, Hypothesis, HypothesisKind, OutcomeGroup,
    ReferenceResult, ReferenceTable, Status, TargetGroup, MISSING_FEATURES,
};
use tracecause::cli::{run_pipeline, RunReport};
use tracecause::config::PipelineConfig;
use tracecause::features::DatasetProfile;
use tracecause::model::{Classifier, DecisionTree};
use tracecause::observability::RunCounters;
use tracecause::transform::TransformedSet;

// =============================================================================
// Helper Functions
// =============================================================================

fn names(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
}

/// Twenty rows: `long_stay` holds on the first ten. Predictions hit the
/// outcome on 5 of the condition rows and 1 of the others.
fn rate_fixture() -> (EvaluationSet, Vec<String>) {
    let rows: Vec<Vec<f64>> = (0..20)
        .map(|i| vec![if i < 10 { 1.0 } else { 0.0 }, (i % 4) as f64])
        .collect();
    let labels: Vec<String> = (0..20)
        .map(|i| if i % 2 == 0 { "Release A" } else { "CRP" }.to_string())
        .collect();
    let case_ids: Vec<String> = (0..20).map(|i| format!("c{}", i)).collect();
    let set = TransformedSet::new(names(&["long_stay", "visits"]), rows, labels, case_ids);

    let predictions: Vec<String> = (0..20)
        .map(|i| {
            let hit = if i < 10 { i < 5 } else { i == 10 };
            if hit { "Release A" } else { "Leucocytes" }.to_string()
        })
        .collect();

    (EvaluationSet::new(set.clone(), set).unwrap(), predictions)
}

fn stay_hypothesis() -> Hypothesis {
    Hypothesis {
        id: "clinical.stay_length".into(),
        name: "Long stays lead to release".into(),
        description: String::new(),
        features: names(&["long_stay"]),
        kind: HypothesisKind::Conditional {
            condition: Condition::compare("long_stay", CompareOp::Gt, 0.5),
            outcome: OutcomeGroup::new(&["Release"]),
        },
    }
}

fn trained_tree(set: &EvaluationSet) -> DecisionTree {
    let mut tree = DecisionTree::default();
    tree.train(set.scaled_rows(), set.labels()).unwrap();
    tree
}

fn reference_table_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config/reference_results.json")
}

fn write_clinical_log(dir: &std::path::Path) -> PathBuf {
    let mut csv = String::from(
        "case:concept:name,concept:name,time:timestamp,org:group,CRP,Leucocytes,SIRSCritLeucos\n",
    );
    for case in 0..30 {
        let day = case % 28 + 1;
        let outcome = if case % 3 == 0 { "Admission NC" } else { "Release A" };
        let crp = (case * 7 % 50) as f64;
        let rows = [
            ("ER Registration", "A", String::new(), String::new(), "false"),
            ("CRP", "B", crp.to_string(), String::new(), "false"),
            ("Leucocytes", "B", String::new(), (case % 11).to_string(), if case % 2 == 0 { "true" } else { "false" }),
            (outcome, "C", String::new(), String::new(), "false"),
        ];
        for (i, (activity, group, crp, leuco, sirs)) in rows.iter().enumerate() {
            csv.push_str(&format!(
                "p{},{},2024-05-{:02} {:02}:15:00,{},{},{},{}\n",
                case,
                activity,
                day,
                8 + i * (1 + case % 3),
                group,
                crp,
                leuco,
                sirs
            ));
        }
    }
    let path = dir.join("sepsis.csv");
    fs::write(&path, csv).unwrap();
    path
}

// =============================================================================
// Verdict Rule Tests
// =============================================================================

/// 0.30 / 0.05 / p 0.01 is supported; 0.20 fails on magnitude alone.
#[test]
fn test_importance_verdict_rules() {
    let config = EvaluatorConfig::default();
    assert_eq!(importance_verdict(0.30, 0.05, 0.01, &config), Status::Supported);
    assert_eq!(importance_verdict(0.20, 0.05, 0.01, &config), Status::NotSupported);
    assert_eq!(importance_verdict(0.20, 0.05, 0.0001, &config), Status::NotSupported);
}

/// Rates 0.50 vs 0.10 give a supported conditional hypothesis.
#[test]
fn test_conditional_rates_end_to_end() {
    let (set, predictions) = rate_fixture();
    let evaluator = CausalityEvaluator::new(EvaluatorConfig::default(), ReferenceTable::empty());
    let result = evaluator.test_hypothesis(&stay_hypothesis(), &trained_tree(&set), &set, &predictions);

    assert_eq!(result.status, Status::Supported);
    let Analysis::Rates(rates) = &result.analysis else {
        panic!("expected rate figures, got {:?}", result.analysis);
    };
    assert!((rates.condition_true_rate - 0.5).abs() < 1e-12);
    assert!((rates.condition_false_rate - 0.1).abs() < 1e-12);
    assert_eq!(rate_verdict(0.5, 0.1, evaluator.config()), Status::Supported);
}

/// A group with no trained feature is skipped for missing features.
#[test]
fn test_absent_feature_group_is_skipped() {
    let (set, predictions) = rate_fixture();
    let evaluator = CausalityEvaluator::new(EvaluatorConfig::default(), ReferenceTable::empty());
    let hypothesis = Hypothesis {
        id: "clinical.lab_markers".into(),
        name: "Lab markers".into(),
        description: String::new(),
        features: names(&["CRP_last", "CRP_mean"]),
        kind: HypothesisKind::Importance {
            target: TargetGroup::Any,
        },
    };
    let result = evaluator.test_hypothesis(&hypothesis, &trained_tree(&set), &set, &predictions);
    assert_eq!(result.status, Status::Skipped);
    assert_eq!(result.justification, MISSING_FEATURES);
    assert!(result.fallback.is_none());
}

// =============================================================================
// Fallback Transparency Tests
// =============================================================================

/// A substituted verdict serializes both sides of the comparison.
#[test]
fn test_fallback_exposes_both_sides() {
    let (set, predictions) = rate_fixture();
    let mut refs = ReferenceTable::empty();
    refs.insert(
        "clinical.stay_length",
        ReferenceResult {
            status: Status::NotSupported,
            effect: 0.02,
            condition_true_rate: Some(0.12),
            condition_false_rate: Some(0.10),
            note: Some("stays rarely matter".into()),
        },
    );
    let evaluator = CausalityEvaluator::new(EvaluatorConfig::default(), refs);
    let result = evaluator.test_hypothesis(&stay_hypothesis(), &trained_tree(&set), &set, &predictions);

    assert_eq!(result.status, Status::NotSupported);
    assert!(result.is_fallback());

    let json = serde_json::to_value(&result).unwrap();
    let fallback = &json["fallback"];
    assert_eq!(fallback["calculated_status"], "SUPPORTED");
    assert!((fallback["calculated_effect"].as_f64().unwrap() - 0.4).abs() < 1e-9);
    assert!((fallback["calculated_true_rate"].as_f64().unwrap() - 0.5).abs() < 1e-9);
    assert_eq!(fallback["reference_status"], "NOT_SUPPORTED");
    assert_eq!(fallback["reference_effect"], 0.02);
    assert_eq!(fallback["reference_note"], "stays rarely matter");
}

/// Reporting live keeps the computed verdict and no fallback.
#[test]
fn test_report_live_policy_keeps_computed_verdict() {
    let (set, predictions) = rate_fixture();
    let mut refs = ReferenceTable::empty();
    refs.insert(
        "clinical.stay_length",
        ReferenceResult {
            status: Status::NotSupported,
            effect: 0.02,
            condition_true_rate: None,
            condition_false_rate: None,
            note: None,
        },
    );
    let config = EvaluatorConfig {
        fallback_policy: FallbackPolicy::ReportLive,
        ..EvaluatorConfig::default()
    };
    let evaluator = CausalityEvaluator::new(config, refs);
    let result = evaluator.test_hypothesis(&stay_hypothesis(), &trained_tree(&set), &set, &predictions);

    assert_eq!(result.status, Status::Supported);
    assert!(!result.is_fallback());
    assert!(!result.reference_check.unwrap().agrees);
}

/// The shipped reference table parses and only holds live verdicts.
#[test]
fn test_shipped_reference_table_loads() {
    let table = ReferenceTable::load(&reference_table_path()).unwrap();
    assert!(!table.is_empty());
    assert_eq!(
        table.get("administrative.supervisor_oversight").unwrap().condition_true_rate,
        Some(0.406)
    );
    for id in table.ids() {
        let status = table.get(id).unwrap().status;
        assert!(matches!(status, Status::Supported | Status::NotSupported));
    }
}

// =============================================================================
// Full Run Tests
// =============================================================================

/// Clinical log on disk → report with one complete result per hypothesis.
#[test]
fn test_full_run_over_clinical_log() {
    let dir = TempDir::new().unwrap();
    let mut config = PipelineConfig::default();
    config.log.path = Some(write_clinical_log(dir.path()));
    config.causality.reference_path = Some(reference_table_path());
    config.model.n_estimators = 10;

    let counters = RunCounters::new();
    let report = run_pipeline(&config, &counters).unwrap();

    assert_eq!(report.profile, DatasetProfile::Clinical);
    assert_eq!(report.train_examples + report.test_examples, 90);
    assert!(report.feature_names.iter().any(|n| n == "CRP_last"));

    let evaluator = CausalityEvaluator::new(EvaluatorConfig::default(), ReferenceTable::empty());
    let defined = evaluator.define_hypotheses(DatasetProfile::Clinical, &report.feature_names);
    assert_eq!(report.hypotheses.len(), defined.len());
    assert_eq!(report.summary.total, defined.len());

    for result in &report.hypotheses {
        if let Some(fallback) = &result.fallback {
            assert_eq!(result.status, fallback.reference_status);
        }
    }
    assert_eq!(
        counters.snapshot().fallbacks_used as usize,
        report.hypotheses.iter().filter(|r| r.is_fallback()).count()
    );

    assert_eq!(report.feature_importances.len(), report.feature_names.len());
    let total: f64 = report.feature_importances.iter().map(|f| f.importance).sum();
    assert!((total - 1.0).abs() < 1e-6 || total == 0.0);
    assert!(report.feature_names.iter().any(|n| n == "CRP"));

    let json: Value = serde_json::to_value(&report).unwrap();
    assert!(json["transitions"].is_array());
    let back: RunReport = serde_json::from_value(json).unwrap();
    assert_eq!(back.run_id, report.run_id);
    assert_eq!(back.hypotheses.len(), report.hypotheses.len());
    let ranked = |r: &RunReport| {
        r.feature_importances
            .iter()
            .map(|f| f.feature.clone())
            .collect::<Vec<_>>()
    };
    assert_eq!(ranked(&back), ranked(&report));
    assert_eq!(back.transitions.len(), report.transitions.len());
}

/// Same configuration, same verdicts.
#[test]
fn test_full_run_is_deterministic() {
    let dir = TempDir::new().unwrap();
    let mut config = PipelineConfig::default();
    config.log.path = Some(write_clinical_log(dir.path()));
    config.model.n_estimators = 5;

    let a = run_pipeline(&config, &RunCounters::new()).unwrap();
    let b = run_pipeline(&config, &RunCounters::new()).unwrap();

    assert_eq!(a.schema_fingerprint, b.schema_fingerprint);
    assert_eq!(a.metrics, b.metrics);
    let statuses = |r: &RunReport| r.hypotheses.iter().map(|h| h.status).collect::<Vec<_>>();
    assert_eq!(statuses(&a), statuses(&b));
}
