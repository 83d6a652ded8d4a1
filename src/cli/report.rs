//! Run report document

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::causality::{HypothesisResult, HypothesisSummary, TransitionCause};
use crate::features::DatasetProfile;
use crate::model::{FeatureImportance, ModelMetrics};
use crate::observability::CountersSnapshot;

/// Everything one `run` produced, written as `run-<run_id>.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub profile: DatasetProfile,
    pub schema_fingerprint: String,
    pub feature_names: Vec<String>,
    pub model: String,
    pub train_examples: usize,
    pub test_examples: usize,
    pub metrics: ModelMetrics,
    /// Trained model's importances, most important first
    #[serde(default)]
    pub feature_importances: Vec<FeatureImportance>,
    /// Mispredicted transitions on the test partition
    #[serde(default)]
    pub transitions: Vec<TransitionCause>,
    pub hypotheses: Vec<HypothesisResult>,
    pub summary: HypothesisSummary,
    #[serde(default)]
    pub counters: Option<CountersSnapshot>,
}

impl RunReport {
    pub fn file_name(&self) -> String {
        format!("run-{}.json", self.run_id)
    }
}
