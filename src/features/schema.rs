//! Feature schema
//!
//! The schema is the ordered list of (name, kind) pairs agreed between
//! training and evaluation. It is built once per (profile, log columns)
//! pair and shared read-only afterwards.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::errors::{FeatureError, FeatureResult};

/// Semantic type of a feature column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureKind {
    Numeric,
    Categorical,
    Boolean,
}

impl FeatureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureKind::Numeric => "numeric",
            FeatureKind::Categorical => "categorical",
            FeatureKind::Boolean => "boolean",
        }
    }
}

/// One feature value of an example
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Boolean(bool),
    Numeric(f64),
    Categorical(String),
}

impl FeatureValue {
    pub fn kind(&self) -> FeatureKind {
        match self {
            FeatureValue::Numeric(_) => FeatureKind::Numeric,
            FeatureValue::Categorical(_) => FeatureKind::Categorical,
            FeatureValue::Boolean(_) => FeatureKind::Boolean,
        }
    }

    /// Numeric reading; booleans read as 0/1, categories have none
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FeatureValue::Numeric(v) => Some(*v),
            FeatureValue::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            FeatureValue::Categorical(_) => None,
        }
    }

    pub fn as_category(&self) -> Option<&str> {
        match self {
            FeatureValue::Categorical(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Numeric(v) => write!(f, "{}", v),
            FeatureValue::Categorical(s) => write!(f, "{}", s),
            FeatureValue::Boolean(b) => write!(f, "{}", b),
        }
    }
}

/// A named, typed feature column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureDef {
    pub name: String,
    pub kind: FeatureKind,
}

impl FeatureDef {
    pub fn new(name: impl Into<String>, kind: FeatureKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn numeric(name: impl Into<String>) -> Self {
        Self::new(name, FeatureKind::Numeric)
    }

    pub fn categorical(name: impl Into<String>) -> Self {
        Self::new(name, FeatureKind::Categorical)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FeatureKind::Boolean)
    }
}

/// Ordered feature schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    features: Vec<FeatureDef>,
}

impl FeatureSchema {
    /// Builds a schema, rejecting duplicate names
    pub fn new(features: Vec<FeatureDef>) -> FeatureResult<Self> {
        let mut seen = HashSet::with_capacity(features.len());
        for def in &features {
            if !seen.insert(def.name.as_str()) {
                return Err(FeatureError::DuplicateFeature(def.name.clone()));
            }
        }
        Ok(Self { features })
    }

    pub fn features(&self) -> &[FeatureDef] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Feature names in column order
    pub fn names(&self) -> Vec<&str> {
        self.features.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.features.iter().position(|f| f.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    pub fn kind_of(&self, name: &str) -> Option<FeatureKind> {
        self.features.iter().find(|f| f.name == name).map(|f| f.kind)
    }

    /// SHA-256 over the ordered `name:kind` list.
    ///
    /// Two schemas have the same fingerprint iff they have the same
    /// names and kinds in the same order.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for def in &self.features {
            hasher.update(def.name.as_bytes());
            hasher.update(b":");
            hasher.update(def.kind.as_str().as_bytes());
            hasher.update(b"\n");
        }
        format!("{:x}", hasher.finalize())
    }

    /// Fails unless `other` is identical to this schema
    pub fn ensure_same(&self, other: &FeatureSchema) -> FeatureResult<()> {
        if self == other {
            Ok(())
        } else {
            Err(FeatureError::SchemaMismatch {
                expected: self.fingerprint(),
                found: other.fingerprint(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(defs: &[(&str, FeatureKind)]) -> FeatureSchema {
        FeatureSchema::new(defs.iter().map(|(n, k)| FeatureDef::new(*n, *k)).collect()).unwrap()
    }

    #[test]
    fn test_duplicate_rejected() {
        let err = FeatureSchema::new(vec![
            FeatureDef::numeric("a"),
            FeatureDef::categorical("a"),
        ])
        .unwrap_err();
        assert_eq!(err, FeatureError::DuplicateFeature("a".into()));
    }

    #[test]
    fn test_fingerprint_is_order_sensitive() {
        let a = schema(&[("x", FeatureKind::Numeric), ("y", FeatureKind::Boolean)]);
        let b = schema(&[("y", FeatureKind::Boolean), ("x", FeatureKind::Numeric)]);
        let c = schema(&[("x", FeatureKind::Numeric), ("y", FeatureKind::Boolean)]);
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint(), c.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
    }

    #[test]
    fn test_fingerprint_is_kind_sensitive() {
        let a = schema(&[("x", FeatureKind::Numeric)]);
        let b = schema(&[("x", FeatureKind::Categorical)]);
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert!(a.ensure_same(&b).is_err());
        assert!(a.ensure_same(&a.clone()).is_ok());
    }

    #[test]
    fn test_lookup() {
        let s = schema(&[("x", FeatureKind::Numeric), ("y", FeatureKind::Boolean)]);
        assert_eq!(s.index_of("y"), Some(1));
        assert_eq!(s.kind_of("x"), Some(FeatureKind::Numeric));
        assert!(!s.contains("z"));
        assert_eq!(s.names(), vec!["x", "y"]);
    }

    #[test]
    fn test_value_readings() {
        assert_eq!(FeatureValue::Boolean(true).as_f64(), Some(1.0));
        assert_eq!(FeatureValue::Categorical("A".into()).as_f64(), None);
        assert_eq!(FeatureValue::Numeric(2.5).kind(), FeatureKind::Numeric);
    }
}
