//! Data transformer and fitted transform state
//!
//! `fit_transform` returns an immutable `FittedTransform`. Test data only
//! ever goes through that value, so encoders and scaler fitted on the
//! training partition are never refit.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::features::{ExampleDataset, FeatureKind, FeatureSchema, FeatureValue};
use crate::observability::{log_event_with_fields, Event};

use super::balance::balance_indices;
use super::encoder::{LabelEncoder, UNKNOWN_CODE};
use super::errors::{TransformError, TransformResult};
use super::scaler::StandardScaler;

/// Transformer settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformConfig {
    /// Upsample minority target classes before fitting
    #[serde(default = "default_balance_classes")]
    pub balance_classes: bool,

    #[serde(default = "default_random_state")]
    pub random_state: u64,
}

fn default_balance_classes() -> bool {
    true
}

fn default_random_state() -> u64 {
    42
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            balance_classes: default_balance_classes(),
            random_state: default_random_state(),
        }
    }
}

/// Numeric feature matrix with row-aligned labels
#[derive(Debug, Clone, PartialEq)]
pub struct TransformedSet {
    feature_names: Vec<String>,
    rows: Vec<Vec<f64>>,
    labels: Vec<String>,
    case_ids: Vec<String>,
}

impl TransformedSet {
    pub fn new(
        feature_names: Vec<String>,
        rows: Vec<Vec<f64>>,
        labels: Vec<String>,
        case_ids: Vec<String>,
    ) -> Self {
        Self {
            feature_names,
            rows,
            labels,
            case_ids,
        }
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn case_ids(&self) -> &[String] {
        &self.case_ids
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.feature_names.len()
    }

    /// Rows at `indices`, in that order
    pub fn select(&self, indices: &[usize]) -> Self {
        let pick = |v: &[String]| -> Vec<String> {
            indices.iter().filter_map(|&i| v.get(i).cloned()).collect()
        };
        Self {
            feature_names: self.feature_names.clone(),
            rows: indices
                .iter()
                .filter_map(|&i| self.rows.get(i).cloned())
                .collect(),
            labels: pick(&self.labels),
            case_ids: pick(&self.case_ids),
        }
    }
}

/// Encoders and scaler fitted on a training partition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedTransform {
    schema: FeatureSchema,
    encoders: BTreeMap<String, LabelEncoder>,
    scaler: StandardScaler,
}

impl FittedTransform {
    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn encoder(&self, feature: &str) -> Option<&LabelEncoder> {
        self.encoders.get(feature)
    }

    pub fn encoders(&self) -> &BTreeMap<String, LabelEncoder> {
        &self.encoders
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    /// Encoded, unscaled rows. Unseen categories become -1.
    pub fn encode(&self, dataset: &ExampleDataset) -> TransformResult<TransformedSet> {
        self.check_schema(dataset.schema())?;
        Ok(self.encode_unchecked(dataset))
    }

    /// Encoded and scaled rows
    pub fn transform(&self, dataset: &ExampleDataset) -> TransformResult<TransformedSet> {
        let encoded = self.encode(dataset)?;
        let rows = self.scaler.transform(encoded.rows())?;
        Ok(TransformedSet { rows, ..encoded })
    }

    /// Encodes one row of feature values
    pub fn encode_values(&self, values: &[FeatureValue]) -> Vec<f64> {
        self.schema
            .features()
            .iter()
            .zip(values)
            .map(|(def, value)| match (def.kind, value) {
                (FeatureKind::Categorical, FeatureValue::Categorical(label)) => self
                    .encoders
                    .get(&def.name)
                    .map_or(UNKNOWN_CODE, |e| e.encode(label)),
                (_, other) => other.as_f64().unwrap_or(0.0),
            })
            .collect()
    }

    fn encode_unchecked(&self, dataset: &ExampleDataset) -> TransformedSet {
        let examples = dataset.examples();
        TransformedSet {
            feature_names: self.schema.names().into_iter().map(str::to_string).collect(),
            rows: examples.iter().map(|e| self.encode_values(&e.values)).collect(),
            labels: examples.iter().map(|e| e.target.clone()).collect(),
            case_ids: examples.iter().map(|e| e.case_id.clone()).collect(),
        }
    }

    fn check_schema(&self, schema: &FeatureSchema) -> TransformResult<()> {
        if &self.schema == schema {
            Ok(())
        } else {
            Err(TransformError::SchemaMismatch {
                expected: self.schema.fingerprint(),
                found: schema.fingerprint(),
            })
        }
    }
}

/// Fits encoders and scaler on training data
#[derive(Debug, Clone, Default)]
pub struct DataTransformer {
    config: TransformConfig,
}

impl DataTransformer {
    pub fn new(config: TransformConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TransformConfig {
        &self.config
    }

    /// Balances (optionally), fits encoders and scaler, and transforms
    /// the training partition.
    pub fn fit_transform(
        &self,
        train: &ExampleDataset,
    ) -> TransformResult<(TransformedSet, FittedTransform)> {
        if train.is_empty() {
            return Err(TransformError::EmptyDataset);
        }

        let balanced = if self.config.balance_classes {
            balance_indices(&train.targets(), self.config.random_state).map(|idx| train.select(&idx))
        } else {
            None
        };
        let train = balanced.as_ref().unwrap_or(train);

        let schema = train.schema().clone();
        let mut encoders = BTreeMap::new();
        for (index, def) in schema.features().iter().enumerate() {
            if def.kind != FeatureKind::Categorical {
                continue;
            }
            let labels = train
                .examples()
                .iter()
                .filter_map(|e| e.values.get(index).and_then(FeatureValue::as_category));
            encoders.insert(def.name.clone(), LabelEncoder::fit(labels));
        }

        let mut fitted = FittedTransform {
            schema,
            encoders,
            scaler: StandardScaler::default(),
        };
        let encoded = fitted.encode_unchecked(train);
        fitted.scaler = StandardScaler::fit(encoded.rows(), encoded.width())?;
        let rows = fitted.scaler.transform(encoded.rows())?;

        log_event_with_fields(
            Event::TransformFitted,
            &[
                ("rows", &rows.len().to_string()),
                ("balanced", &balanced.is_some().to_string()),
                ("categorical_features", &fitted.encoders.len().to_string()),
            ],
        );

        Ok((TransformedSet { rows, ..encoded }, fitted))
    }
}
