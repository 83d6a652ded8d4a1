//! Model collaborator
//!
//! A small classifier seam plus two implementations: a CART decision tree
//! and a bagged random forest. Everything downstream works through
//! `dyn Classifier`.

mod classifier;
mod errors;
mod forest;
mod metrics;
mod tree;

pub use classifier::{
    argmax, check_rows, check_training, encode_labels, Classifier, ModelConfig, ModelKind,
};
pub use errors::{ModelError, ModelResult};
pub use forest::{ForestParams, RandomForest};
pub use metrics::{
    evaluate, rank_importances, score, ClassMetrics, FeatureImportance, ModelMetrics,
};
pub use tree::{DecisionTree, TreeParams};
