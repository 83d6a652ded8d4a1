//! CART decision tree (Gini impurity)
//!
//! Nodes live in a flat arena; node 0 is the root. Feature importance is
//! the total weighted impurity decrease per feature, normalized to sum 1.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::classifier::{check_rows, check_training, encode_labels, Classifier};
use super::errors::{ModelError, ModelResult};

const MIN_DECREASE: f64 = 1e-12;

/// Tree growth parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features considered per split; all when `None`
    pub max_features: Option<usize>,
    pub random_state: u64,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            random_state: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Leaf {
        distribution: Vec<f64>,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// A grown tree over class indices
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GrownTree {
    nodes: Vec<Node>,
    importances: Vec<f64>,
}

impl GrownTree {
    /// Grows a tree on the rows at `sample` (indices may repeat)
    pub(crate) fn grow(
        params: &TreeParams,
        rows: &[Vec<f64>],
        y: &[usize],
        n_classes: usize,
        sample: &[usize],
        rng: &mut StdRng,
    ) -> Self {
        let width = rows.first().map_or(0, Vec::len);
        let mut builder = Builder {
            params,
            rows,
            y,
            n_classes,
            rng,
            nodes: Vec::new(),
            importances: vec![0.0; width],
        };
        builder.build(sample, 0);

        let total: f64 = builder.importances.iter().sum();
        let mut importances = builder.importances;
        if total > 0.0 {
            importances.iter_mut().for_each(|v| *v /= total);
        }

        Self {
            nodes: builder.nodes,
            importances,
        }
    }

    pub(crate) fn distribution(&self, row: &[f64]) -> &[f64] {
        let mut id = 0;
        loop {
            match &self.nodes[id] {
                Node::Leaf { distribution } => return distribution,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    id = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    pub(crate) fn importances(&self) -> &[f64] {
        &self.importances
    }

    pub(crate) fn depth(&self) -> usize {
        fn walk(nodes: &[Node], id: usize) -> usize {
            match &nodes[id] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        walk(&self.nodes, 0)
    }
}

struct SplitChoice {
    feature: usize,
    threshold: f64,
    decrease: f64,
}

struct Builder<'a> {
    params: &'a TreeParams,
    rows: &'a [Vec<f64>],
    y: &'a [usize],
    n_classes: usize,
    rng: &'a mut StdRng,
    nodes: Vec<Node>,
    importances: Vec<f64>,
}

fn gini(counts: &[f64], total: f64) -> f64 {
    if total <= 0.0 {
        return 0.0;
    }
    1.0 - counts.iter().map(|c| (c / total).powi(2)).sum::<f64>()
}

impl Builder<'_> {
    fn class_counts(&self, indices: &[usize]) -> Vec<f64> {
        let mut counts = vec![0.0; self.n_classes];
        for &i in indices {
            counts[self.y[i]] += 1.0;
        }
        counts
    }

    fn build(&mut self, indices: &[usize], depth: usize) -> usize {
        let counts = self.class_counts(indices);
        let n = indices.len();
        let node_gini = gini(&counts, n as f64);

        let splittable = n >= self.params.min_samples_split
            && n >= 2 * self.params.min_samples_leaf.max(1)
            && self.params.max_depth.map_or(true, |d| depth < d)
            && node_gini > 0.0;

        if splittable {
            if let Some(split) = self.best_split(indices, &counts, node_gini) {
                self.importances[split.feature] += split.decrease;

                let rows = self.rows;
                let (left, right): (Vec<usize>, Vec<usize>) = indices
                    .iter()
                    .partition(|&&i| rows[i][split.feature] <= split.threshold);

                let id = self.nodes.len();
                self.nodes.push(Node::Leaf {
                    distribution: Vec::new(),
                });
                let left = self.build(&left, depth + 1);
                let right = self.build(&right, depth + 1);
                self.nodes[id] = Node::Split {
                    feature: split.feature,
                    threshold: split.threshold,
                    left,
                    right,
                };
                return id;
            }
        }

        let total = n.max(1) as f64;
        let id = self.nodes.len();
        self.nodes.push(Node::Leaf {
            distribution: counts.iter().map(|c| c / total).collect(),
        });
        id
    }

    fn best_split(&mut self, indices: &[usize], counts: &[f64], node_gini: f64) -> Option<SplitChoice> {
        let rows = self.rows;
        let y = self.y;
        let width = self.importances.len();
        let n = indices.len() as f64;
        let min_leaf = self.params.min_samples_leaf.max(1);

        // With feature subsampling, features past the first `k` are only
        // visited while no valid split has been found
        let mut features: Vec<usize> = (0..width).collect();
        let mut budget = width;
        if let Some(k) = self.params.max_features {
            if k < width {
                features.shuffle(&mut *self.rng);
                budget = k.max(1);
            }
        }

        let mut best: Option<SplitChoice> = None;
        let mut sorted = indices.to_vec();

        for (visited, feature) in features.into_iter().enumerate() {
            if visited >= budget && best.is_some() {
                break;
            }
            sorted.sort_by(|&a, &b| rows[a][feature].total_cmp(&rows[b][feature]));

            let mut left = vec![0.0; self.n_classes];
            let mut right = counts.to_vec();

            for pos in 0..sorted.len().saturating_sub(1) {
                let class = y[sorted[pos]];
                left[class] += 1.0;
                right[class] -= 1.0;

                let value = rows[sorted[pos]][feature];
                let next = rows[sorted[pos + 1]][feature];
                if value == next {
                    continue;
                }

                let n_left = pos + 1;
                let n_right = sorted.len() - n_left;
                if n_left < min_leaf || n_right < min_leaf {
                    continue;
                }

                let weighted = (n_left as f64 * gini(&left, n_left as f64)
                    + n_right as f64 * gini(&right, n_right as f64))
                    / n;
                let decrease = n * (node_gini - weighted);

                if best.as_ref().map_or(true, |b| decrease > b.decrease + MIN_DECREASE) {
                    let mid = value + (next - value) / 2.0;
                    best = Some(SplitChoice {
                        feature,
                        threshold: if mid < next { mid } else { value },
                        decrease,
                    });
                }
            }
        }

        best.filter(|b| b.decrease > MIN_DECREASE)
    }
}

/// Single CART classifier
#[derive(Debug, Clone)]
pub struct DecisionTree {
    params: TreeParams,
    classes: Vec<String>,
    width: usize,
    tree: Option<GrownTree>,
}

impl DecisionTree {
    pub fn new(params: TreeParams) -> Self {
        Self {
            params,
            classes: Vec::new(),
            width: 0,
            tree: None,
        }
    }

    pub fn params(&self) -> &TreeParams {
        &self.params
    }

    /// Depth of the fitted tree
    pub fn depth(&self) -> Option<usize> {
        self.tree.as_ref().map(GrownTree::depth)
    }

    fn fitted(&self) -> ModelResult<&GrownTree> {
        self.tree.as_ref().ok_or(ModelError::NotTrained)
    }
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new(TreeParams::default())
    }
}

impl Classifier for DecisionTree {
    fn name(&self) -> &str {
        "decision_tree"
    }

    fn train(&mut self, rows: &[Vec<f64>], labels: &[String]) -> ModelResult<()> {
        let width = check_training(rows, labels)?;
        let (classes, y) = encode_labels(labels);
        let sample: Vec<usize> = (0..rows.len()).collect();
        let mut rng = StdRng::seed_from_u64(self.params.random_state);

        self.tree = Some(GrownTree::grow(
            &self.params,
            rows,
            &y,
            classes.len(),
            &sample,
            &mut rng,
        ));
        self.classes = classes;
        self.width = width;
        Ok(())
    }

    fn predict_proba(&self, rows: &[Vec<f64>]) -> ModelResult<Vec<Vec<f64>>> {
        let tree = self.fitted()?;
        check_rows(rows, self.width)?;
        Ok(rows.iter().map(|r| tree.distribution(r).to_vec()).collect())
    }

    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn feature_importances(&self) -> ModelResult<Vec<f64>> {
        Ok(self.fitted()?.importances().to_vec())
    }

    fn fresh(&self) -> Box<dyn Classifier> {
        Box::new(DecisionTree::new(self.params.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_learns_threshold_on_informative_feature() {
        // Feature 0 is noise, feature 1 separates the classes
        let rows = vec![
            vec![5.0, 1.0],
            vec![1.0, 2.0],
            vec![3.0, 3.0],
            vec![5.0, 10.0],
            vec![1.0, 11.0],
            vec![3.0, 12.0],
        ];
        let y = labels(&["a", "a", "a", "b", "b", "b"]);
        let mut tree = DecisionTree::default();
        tree.train(&rows, &y).unwrap();

        assert_eq!(tree.predict(&rows).unwrap(), y);
        assert_eq!(tree.predict(&[vec![0.0, 0.0], vec![0.0, 50.0]]).unwrap(), labels(&["a", "b"]));

        let imp = tree.feature_importances().unwrap();
        assert_eq!(imp, vec![0.0, 1.0]);
        assert_eq!(tree.depth(), Some(1));
    }

    #[test]
    fn test_max_depth_limits_growth() {
        let rows: Vec<Vec<f64>> = (0..8).map(|i| vec![i as f64]).collect();
        let y = labels(&["a", "b", "a", "b", "a", "b", "a", "b"]);
        let mut tree = DecisionTree::new(TreeParams {
            max_depth: Some(2),
            ..TreeParams::default()
        });
        tree.train(&rows, &y).unwrap();
        assert!(tree.depth().unwrap() <= 2);
    }

    #[test]
    fn test_pure_node_is_leaf() {
        let rows = vec![vec![1.0], vec![2.0]];
        let mut tree = DecisionTree::default();
        tree.train(&rows, &labels(&["a", "a"])).unwrap();
        assert_eq!(tree.depth(), Some(0));
        assert_eq!(tree.feature_importances().unwrap(), vec![0.0]);
        assert_eq!(tree.predict_proba(&[vec![9.0]]).unwrap(), vec![vec![1.0]]);
    }

    #[test]
    fn test_untrained_and_width_errors() {
        let tree = DecisionTree::default();
        assert_eq!(tree.predict(&[vec![1.0]]).unwrap_err(), ModelError::NotTrained);

        let mut tree = DecisionTree::default();
        tree.train(&[vec![1.0, 2.0]], &labels(&["a"])).unwrap();
        assert!(matches!(
            tree.predict(&[vec![1.0]]),
            Err(ModelError::FeatureCount { .. })
        ));
    }

    #[test]
    fn test_fresh_is_untrained() {
        let mut tree = DecisionTree::default();
        tree.train(&[vec![1.0]], &labels(&["a"])).unwrap();
        let fresh = tree.fresh();
        assert!(fresh.classes().is_empty());
        assert!(fresh.feature_importances().is_err());
    }
}
