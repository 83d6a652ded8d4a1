//! Bagged random forest
//!
//! Each tree is grown on a bootstrap sample with √p features considered
//! per split. Probabilities and importances are averaged over trees.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::classifier::{check_rows, check_training, encode_labels, Classifier};
use super::errors::{ModelError, ModelResult};
use super::tree::{GrownTree, TreeParams};

/// Forest parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_estimators: usize,
    /// Per-tree parameters; `max_features: None` means √p
    pub tree: TreeParams,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            tree: TreeParams::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RandomForest {
    params: ForestParams,
    classes: Vec<String>,
    width: usize,
    trees: Vec<GrownTree>,
}

impl RandomForest {
    pub fn new(params: ForestParams) -> Self {
        Self {
            params,
            classes: Vec::new(),
            width: 0,
            trees: Vec::new(),
        }
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    fn ensure_trained(&self) -> ModelResult<()> {
        if self.trees.is_empty() {
            Err(ModelError::NotTrained)
        } else {
            Ok(())
        }
    }
}

impl Default for RandomForest {
    fn default() -> Self {
        Self::new(ForestParams::default())
    }
}

impl Classifier for RandomForest {
    fn name(&self) -> &str {
        "random_forest"
    }

    fn train(&mut self, rows: &[Vec<f64>], labels: &[String]) -> ModelResult<()> {
        if self.params.n_estimators == 0 {
            return Err(ModelError::InvalidParameter(
                "n_estimators must be at least 1".into(),
            ));
        }
        let width = check_training(rows, labels)?;
        let (classes, y) = encode_labels(labels);

        let mut tree_params = self.params.tree.clone();
        if tree_params.max_features.is_none() {
            tree_params.max_features = Some(((width as f64).sqrt() as usize).max(1));
        }

        let mut rng = StdRng::seed_from_u64(self.params.tree.random_state);
        let n = rows.len();
        let trees = (0..self.params.n_estimators)
            .map(|_| {
                let sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                let mut tree_rng = StdRng::seed_from_u64(rng.gen());
                GrownTree::grow(&tree_params, rows, &y, classes.len(), &sample, &mut tree_rng)
            })
            .collect();

        self.trees = trees;
        self.classes = classes;
        self.width = width;
        Ok(())
    }

    fn predict_proba(&self, rows: &[Vec<f64>]) -> ModelResult<Vec<Vec<f64>>> {
        self.ensure_trained()?;
        check_rows(rows, self.width)?;

        let n_trees = self.trees.len() as f64;
        Ok(rows
            .iter()
            .map(|row| {
                let mut acc = vec![0.0; self.classes.len()];
                for tree in &self.trees {
                    for (a, p) in acc.iter_mut().zip(tree.distribution(row)) {
                        *a += p;
                    }
                }
                acc.iter_mut().for_each(|a| *a /= n_trees);
                acc
            })
            .collect())
    }

    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn feature_importances(&self) -> ModelResult<Vec<f64>> {
        self.ensure_trained()?;
        let mut acc = vec![0.0; self.width];
        for tree in &self.trees {
            for (a, v) in acc.iter_mut().zip(tree.importances()) {
                *a += v;
            }
        }
        let total: f64 = acc.iter().sum();
        if total > 0.0 {
            acc.iter_mut().for_each(|a| *a /= total);
        }
        Ok(acc)
    }

    fn fresh(&self) -> Box<dyn Classifier> {
        Box::new(RandomForest::new(self.params.clone()))
    }
}
