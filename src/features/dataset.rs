//! Examples and the example dataset

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::errors::{FeatureError, FeatureResult};
use super::schema::{FeatureDef, FeatureSchema, FeatureValue};

/// One supervised row: features of a trace prefix and the next activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Example {
    /// Carried for traceability only, never a model input
    pub case_id: String,
    pub values: Vec<FeatureValue>,
    pub target: String,
}

impl Example {
    /// Checks length and kinds against a schema
    pub fn check(&self, schema: &FeatureSchema) -> FeatureResult<()> {
        if self.values.len() != schema.len() {
            return Err(FeatureError::LengthMismatch {
                case_id: self.case_id.clone(),
                expected: schema.len(),
                actual: self.values.len(),
            });
        }
        for (def, value) in schema.features().iter().zip(&self.values) {
            if def.kind != value.kind() {
                return Err(FeatureError::KindMismatch {
                    case_id: self.case_id.clone(),
                    feature: def.name.clone(),
                    expected: def.kind,
                    found: value.kind(),
                });
            }
        }
        Ok(())
    }
}

/// Feature table plus targets, aligned to one schema
#[derive(Debug, Clone, PartialEq)]
pub struct ExampleDataset {
    schema: FeatureSchema,
    examples: Vec<Example>,
}

impl ExampleDataset {
    /// Builds a dataset, validating every example against the schema
    pub fn new(schema: FeatureSchema, examples: Vec<Example>) -> FeatureResult<Self> {
        let dataset = Self { schema, examples };
        dataset.validate()?;
        Ok(dataset)
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn examples(&self) -> &[Example] {
        &self.examples
    }

    pub fn feature_names(&self) -> Vec<&str> {
        self.schema.names()
    }

    pub fn targets(&self) -> Vec<&str> {
        self.examples.iter().map(|e| e.target.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    /// Every example has exactly one value per schema column, of the declared kind
    pub fn validate(&self) -> FeatureResult<()> {
        self.examples.iter().try_for_each(|e| e.check(&self.schema))
    }

    /// Examples per target label
    pub fn class_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for example in &self.examples {
            *counts.entry(example.target.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// New dataset with the examples at `indices`, in that order
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            schema: self.schema.clone(),
            examples: indices
                .iter()
                .filter_map(|&i| self.examples.get(i).cloned())
                .collect(),
        }
    }

    /// Column values of one feature
    pub fn column(&self, name: &str) -> FeatureResult<Vec<&FeatureValue>> {
        let index = self
            .schema
            .index_of(name)
            .ok_or_else(|| FeatureError::UnknownFeature(name.to_string()))?;
        Ok(self.examples.iter().map(|e| &e.values[index]).collect())
    }

    /// Serializable table form
    pub fn to_document(&self) -> DatasetDocument {
        DatasetDocument {
            fingerprint: self.schema.fingerprint(),
            features: self.schema.features().to_vec(),
            case_ids: self.examples.iter().map(|e| e.case_id.clone()).collect(),
            rows: self.examples.iter().map(|e| e.values.clone()).collect(),
            targets: self.examples.iter().map(|e| e.target.clone()).collect(),
        }
    }
}

/// Row-aligned JSON form of a dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetDocument {
    pub fingerprint: String,
    pub features: Vec<FeatureDef>,
    pub case_ids: Vec<String>,
    pub rows: Vec<Vec<FeatureValue>>,
    pub targets: Vec<String>,
}
