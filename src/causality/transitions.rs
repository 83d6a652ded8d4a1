//! Transition cause analysis
//!
//! Groups held-out rows by mispredicted `actual -> predicted` transition
//! and profiles the model's most important features on each group: mean
//! and spread of numeric features, most common value of categorical ones.
//! Features are read from the raw examples, before encoding and scaling.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::features::{ExampleDataset, FeatureValue};
use crate::model::FeatureImportance;
use crate::observability::{log_event_with_fields, Event};

use super::errors::{CausalityError, CausalityResult};
use super::stats::{mean, population_std};

/// Summary of one feature over the rows of a transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeaturePattern {
    Numeric {
        feature: String,
        mean: f64,
        std: f64,
    },
    Categorical {
        feature: String,
        most_common: String,
        /// Share of the transition's rows holding `most_common`
        frequency: f64,
    },
}

impl FeaturePattern {
    pub fn feature(&self) -> &str {
        match self {
            FeaturePattern::Numeric { feature, .. } | FeaturePattern::Categorical { feature, .. } => {
                feature
            }
        }
    }
}

/// One mispredicted transition and its feature patterns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionCause {
    pub actual: String,
    pub predicted: String,
    pub cases: usize,
    pub patterns: Vec<FeaturePattern>,
}

/// Profiles mispredicted transitions.
///
/// `predictions` must be row-aligned with `dataset`. Only the first
/// `top_features` entries of `ranked` that exist in the dataset schema
/// are profiled. Transitions with fewer than `min_cases` rows are
/// dropped. Results are ordered by case count, then by transition.
pub fn analyze_transitions(
    dataset: &ExampleDataset,
    predictions: &[String],
    ranked: &[FeatureImportance],
    top_features: usize,
    min_cases: usize,
) -> CausalityResult<Vec<TransitionCause>> {
    if predictions.len() != dataset.len() {
        return Err(CausalityError::Misaligned(format!(
            "{} predictions for {} examples",
            predictions.len(),
            dataset.len()
        )));
    }

    let features: Vec<(&str, usize)> = ranked
        .iter()
        .take(top_features)
        .filter_map(|f| {
            let index = dataset.schema().index_of(&f.feature)?;
            Some((f.feature.as_str(), index))
        })
        .collect();

    let mut groups: BTreeMap<(&str, &str), Vec<usize>> = BTreeMap::new();
    for (row, (example, predicted)) in dataset.examples().iter().zip(predictions).enumerate() {
        if example.target != *predicted {
            groups
                .entry((example.target.as_str(), predicted.as_str()))
                .or_default()
                .push(row);
        }
    }

    let mut causes: Vec<TransitionCause> = groups
        .into_iter()
        .filter(|(_, rows)| rows.len() >= min_cases.max(1))
        .map(|((actual, predicted), rows)| TransitionCause {
            actual: actual.to_string(),
            predicted: predicted.to_string(),
            cases: rows.len(),
            patterns: features
                .iter()
                .map(|&(name, index)| pattern(dataset, &rows, name, index))
                .collect(),
        })
        .collect();
    causes.sort_by(|a, b| b.cases.cmp(&a.cases));

    log_event_with_fields(
        Event::TransitionsAnalyzed,
        &[
            ("transitions", &causes.len().to_string()),
            ("features", &features.len().to_string()),
        ],
    );
    Ok(causes)
}

fn pattern(dataset: &ExampleDataset, rows: &[usize], name: &str, index: usize) -> FeaturePattern {
    let values: Vec<&FeatureValue> = rows
        .iter()
        .filter_map(|&r| dataset.examples()[r].values.get(index))
        .collect();

    let numbers: Option<Vec<f64>> = values
        .iter()
        .map(|v| match v {
            FeatureValue::Numeric(n) => Some(*n),
            FeatureValue::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            FeatureValue::Categorical(_) => None,
        })
        .collect();

    if let Some(numbers) = numbers {
        return FeaturePattern::Numeric {
            feature: name.to_string(),
            mean: mean(&numbers),
            std: population_std(&numbers),
        };
    }

    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for v in &values {
        *counts.entry(v.to_string()).or_default() += 1;
    }
    // Ties go to the smallest label
    let (most_common, count) = counts
        .into_iter()
        .fold((String::new(), 0), |best, (label, n)| if n > best.1 { (label, n) } else { best });

    FeaturePattern::Categorical {
        feature: name.to_string(),
        most_common,
        frequency: if values.is_empty() { 0.0 } else { count as f64 / values.len() as f64 },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{Example, FeatureDef, FeatureSchema};

    fn dataset() -> ExampleDataset {
        let schema = FeatureSchema::new(vec![
            FeatureDef::numeric("wait"),
            FeatureDef::categorical("department"),
            FeatureDef::boolean("urgent"),
        ])
        .unwrap();
        let examples = (0..8)
            .map(|i| Example {
                case_id: format!("c{}", i),
                values: vec![
                    FeatureValue::Numeric(i as f64),
                    FeatureValue::Categorical(if i < 5 { "ER" } else { "ICU" }.to_string()),
                    FeatureValue::Boolean(i % 2 == 0),
                ],
                target: if i < 6 { "Release A" } else { "Admission NC" }.to_string(),
            })
            .collect();
        ExampleDataset::new(schema, examples).unwrap()
    }

    fn ranked(names: &[&str]) -> Vec<FeatureImportance> {
        names
            .iter()
            .enumerate()
            .map(|(i, n)| FeatureImportance {
                feature: n.to_string(),
                importance: 1.0 / (i + 1) as f64,
            })
            .collect()
    }

    #[test]
    fn test_mispredicted_transition_patterns() {
        // Rows 0..6 are Release A but predicted CRP; rows 6, 7 are correct
        let predictions: Vec<String> = (0..8)
            .map(|i| if i < 6 { "CRP" } else { "Admission NC" }.to_string())
            .collect();
        let causes = analyze_transitions(
            &dataset(),
            &predictions,
            &ranked(&["wait", "department", "urgent"]),
            10,
            5,
        )
        .unwrap();

        assert_eq!(causes.len(), 1);
        let cause = &causes[0];
        assert_eq!(cause.actual, "Release A");
        assert_eq!(cause.predicted, "CRP");
        assert_eq!(cause.cases, 6);

        // wait over 0..6: mean 2.5, population std sqrt(35/12)
        match &cause.patterns[0] {
            FeaturePattern::Numeric { feature, mean, std } => {
                assert_eq!(feature, "wait");
                assert!((mean - 2.5).abs() < 1e-12);
                assert!((std - (35.0f64 / 12.0).sqrt()).abs() < 1e-12);
            }
            other => panic!("unexpected pattern {:?}", other),
        }
        match &cause.patterns[1] {
            FeaturePattern::Categorical {
                most_common,
                frequency,
                ..
            } => {
                assert_eq!(most_common, "ER");
                assert!((frequency - 5.0 / 6.0).abs() < 1e-12);
            }
            other => panic!("unexpected pattern {:?}", other),
        }
        assert!(matches!(&cause.patterns[2], FeaturePattern::Numeric { mean, .. } if (*mean - 0.5).abs() < 1e-12));
    }

    #[test]
    fn test_small_transitions_dropped() {
        let predictions: Vec<String> = (0..8)
            .map(|i| if i < 2 { "CRP" } else if i < 6 { "Release A" } else { "Admission NC" }.to_string())
            .collect();
        let causes =
            analyze_transitions(&dataset(), &predictions, &ranked(&["wait"]), 10, 5).unwrap();
        assert!(causes.is_empty());
    }

    #[test]
    fn test_top_features_limit_and_unknown_names() {
        let predictions = vec!["CRP".to_string(); 8];
        let causes = analyze_transitions(
            &dataset(),
            &predictions,
            &ranked(&["not_trained", "department", "wait"]),
            2,
            1,
        )
        .unwrap();

        assert_eq!(causes.len(), 2);
        assert_eq!(causes[0].actual, "Release A");
        assert_eq!(causes[1].actual, "Admission NC");
        for cause in &causes {
            let names: Vec<&str> = cause.patterns.iter().map(|p| p.feature()).collect();
            assert_eq!(names, vec!["department"]);
        }
    }

    #[test]
    fn test_misaligned_predictions() {
        assert!(analyze_transitions(&dataset(), &[], &ranked(&["wait"]), 10, 5).is_err());
    }
}
