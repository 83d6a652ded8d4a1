//! Classifier seam
//!
//! Extraction and hypothesis testing only see `dyn Classifier`. Rows are
//! encoded feature vectors in schema order; labels are activity names.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::errors::{ModelError, ModelResult};
use super::forest::{ForestParams, RandomForest};
use super::tree::{DecisionTree, TreeParams};

/// A trainable multi-class classifier
pub trait Classifier: fmt::Debug {
    /// Short model name for logs and reports
    fn name(&self) -> &str;

    /// Fits the model, replacing any previous fit
    fn train(&mut self, rows: &[Vec<f64>], labels: &[String]) -> ModelResult<()>;

    /// Class probabilities per row, columns ordered as `classes()`
    fn predict_proba(&self, rows: &[Vec<f64>]) -> ModelResult<Vec<Vec<f64>>>;

    /// Class labels seen during training, sorted
    fn classes(&self) -> &[String];

    /// Normalized importance per feature (sums to 1 unless all zero)
    fn feature_importances(&self) -> ModelResult<Vec<f64>>;

    /// Untrained copy with identical parameters
    fn fresh(&self) -> Box<dyn Classifier>;

    /// Most probable class per row; ties go to the first class
    fn predict(&self, rows: &[Vec<f64>]) -> ModelResult<Vec<String>> {
        let classes = self.classes();
        Ok(self
            .predict_proba(rows)?
            .iter()
            .map(|p| classes[argmax(p)].clone())
            .collect())
    }
}

/// Index of the largest value, first one on ties
pub fn argmax(values: &[f64]) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |(bi, bv), (i, &v)| {
            if v > bv {
                (i, v)
            } else {
                (bi, bv)
            }
        })
        .0
}

/// Validates a training set and returns its feature width
pub fn check_training(rows: &[Vec<f64>], labels: &[String]) -> ModelResult<usize> {
    if rows.is_empty() {
        return Err(ModelError::EmptyTrainingSet);
    }
    if rows.len() != labels.len() {
        return Err(ModelError::LengthMismatch {
            rows: rows.len(),
            labels: labels.len(),
        });
    }
    let width = rows[0].len();
    check_rows(rows, width)?;
    Ok(width)
}

/// Every row must have `width` features
pub fn check_rows(rows: &[Vec<f64>], width: usize) -> ModelResult<()> {
    match rows.iter().position(|r| r.len() != width) {
        Some(row) => Err(ModelError::FeatureCount {
            row,
            expected: width,
            actual: rows[row].len(),
        }),
        None => Ok(()),
    }
}

/// Sorted class list and the class index of every label
pub fn encode_labels(labels: &[String]) -> (Vec<String>, Vec<usize>) {
    let mut classes: Vec<String> = labels.to_vec();
    classes.sort();
    classes.dedup();
    let y = labels
        .iter()
        .map(|l| classes.binary_search(l).unwrap_or(0))
        .collect();
    (classes, y)
}

/// Which classifier a run trains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    DecisionTree,
    #[default]
    RandomForest,
}

/// Classifier settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default)]
    pub kind: ModelKind,

    #[serde(default)]
    pub max_depth: Option<usize>,

    #[serde(default = "default_min_samples_split")]
    pub min_samples_split: usize,

    #[serde(default = "default_min_samples_leaf")]
    pub min_samples_leaf: usize,

    /// Forest size (random forest only)
    #[serde(default = "default_n_estimators")]
    pub n_estimators: usize,

    #[serde(default = "default_random_state")]
    pub random_state: u64,
}

fn default_min_samples_split() -> usize {
    2
}

fn default_min_samples_leaf() -> usize {
    1
}

fn default_n_estimators() -> usize {
    100
}

fn default_random_state() -> u64 {
    42
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            kind: ModelKind::default(),
            max_depth: None,
            min_samples_split: default_min_samples_split(),
            min_samples_leaf: default_min_samples_leaf(),
            n_estimators: default_n_estimators(),
            random_state: default_random_state(),
        }
    }
}

impl ModelConfig {
    pub fn validate(&self) -> ModelResult<()> {
        if self.min_samples_split < 2 {
            return Err(ModelError::InvalidParameter(
                "min_samples_split must be at least 2".into(),
            ));
        }
        if self.min_samples_leaf < 1 {
            return Err(ModelError::InvalidParameter(
                "min_samples_leaf must be at least 1".into(),
            ));
        }
        if self.kind == ModelKind::RandomForest && self.n_estimators == 0 {
            return Err(ModelError::InvalidParameter(
                "n_estimators must be at least 1".into(),
            ));
        }
        if self.max_depth == Some(0) {
            return Err(ModelError::InvalidParameter("max_depth must be at least 1".into()));
        }
        Ok(())
    }

    fn tree_params(&self) -> TreeParams {
        TreeParams {
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            min_samples_leaf: self.min_samples_leaf,
            max_features: None,
            random_state: self.random_state,
        }
    }

    /// Builds an untrained classifier
    pub fn build(&self) -> ModelResult<Box<dyn Classifier>> {
        self.validate()?;
        Ok(match self.kind {
            ModelKind::DecisionTree => Box::new(DecisionTree::new(self.tree_params())),
            ModelKind::RandomForest => Box::new(RandomForest::new(ForestParams {
                n_estimators: self.n_estimators,
                tree: self.tree_params(),
            })),
        })
    }
}
