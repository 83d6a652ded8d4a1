//! Evaluation metrics

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::classifier::Classifier;
use super::errors::{ModelError, ModelResult};

/// Per-class precision, recall, F1 and support
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Accuracy and macro-averaged scores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    pub accuracy: f64,
    pub macro_precision: f64,
    pub macro_recall: f64,
    pub macro_f1: f64,
    pub samples: usize,
    pub per_class: BTreeMap<String, ClassMetrics>,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Scores predictions against true labels.
///
/// Macro averages run over every label seen in either list; undefined
/// ratios count as 0.
pub fn score(truth: &[String], predicted: &[String]) -> ModelResult<ModelMetrics> {
    if truth.len() != predicted.len() {
        return Err(ModelError::LengthMismatch {
            rows: predicted.len(),
            labels: truth.len(),
        });
    }

    let labels: BTreeSet<&str> = truth
        .iter()
        .chain(predicted)
        .map(|s| s.as_str())
        .collect();

    let mut per_class = BTreeMap::new();
    for label in &labels {
        let tp = truth
            .iter()
            .zip(predicted)
            .filter(|(t, p)| t.as_str() == *label && p.as_str() == *label)
            .count();
        let support = truth.iter().filter(|t| t.as_str() == *label).count();
        let predicted_count = predicted.iter().filter(|p| p.as_str() == *label).count();

        let precision = ratio(tp, predicted_count);
        let recall = ratio(tp, support);
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        per_class.insert(
            label.to_string(),
            ClassMetrics {
                precision,
                recall,
                f1,
                support,
            },
        );
    }

    let n_labels = per_class.len().max(1) as f64;
    let mean = |f: fn(&ClassMetrics) -> f64| per_class.values().map(f).sum::<f64>() / n_labels;
    let correct = truth.iter().zip(predicted).filter(|(t, p)| t == p).count();

    Ok(ModelMetrics {
        accuracy: ratio(correct, truth.len()),
        macro_precision: mean(|m| m.precision),
        macro_recall: mean(|m| m.recall),
        macro_f1: mean(|m| m.f1),
        samples: truth.len(),
        per_class,
    })
}

/// Predicts `rows` with `model` and scores the result
pub fn evaluate(
    model: &dyn Classifier,
    rows: &[Vec<f64>],
    labels: &[String],
) -> ModelResult<ModelMetrics> {
    let predicted = model.predict(rows)?;
    score(labels, &predicted)
}

/// Global importance of one trained feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// Pairs the trained feature names with the model's importances, most
/// important first; ties keep feature order
pub fn rank_importances(
    model: &dyn Classifier,
    feature_names: &[String],
) -> ModelResult<Vec<FeatureImportance>> {
    let importances = model.feature_importances()?;
    if importances.len() != feature_names.len() {
        return Err(ModelError::FeatureCount {
            row: 0,
            expected: feature_names.len(),
            actual: importances.len(),
        });
    }

    let mut ranked: Vec<FeatureImportance> = feature_names
        .iter()
        .zip(importances)
        .map(|(feature, importance)| FeatureImportance {
            feature: feature.clone(),
            importance,
        })
        .collect();
    ranked.sort_by(|a, b| b.importance.total_cmp(&a.importance));
    Ok(ranked)
}
