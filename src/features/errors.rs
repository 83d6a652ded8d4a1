//! # Feature Extraction Errors

use thiserror::Error;

use super::schema::FeatureKind;

/// Result type for feature extraction
pub type FeatureResult<T> = Result<T, FeatureError>;

/// Feature extraction errors
///
/// Every variant is fatal to the extraction run: no partial dataset is
/// ever returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeatureError {
    #[error("Duplicate feature name in schema: {0}")]
    DuplicateFeature(String),

    #[error("Example for case '{case_id}' has {actual} values, schema has {expected}")]
    LengthMismatch {
        case_id: String,
        expected: usize,
        actual: usize,
    },

    #[error("Feature '{feature}' for case '{case_id}' is {found:?}, schema declares {expected:?}")]
    KindMismatch {
        case_id: String,
        feature: String,
        expected: FeatureKind,
        found: FeatureKind,
    },

    #[error("Schema fingerprint mismatch: expected {expected}, found {found}")]
    SchemaMismatch { expected: String, found: String },

    #[error("Unknown dataset profile: {0}")]
    UnknownProfile(String),

    #[error("Unknown feature: {0}")]
    UnknownFeature(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = FeatureError::LengthMismatch {
            case_id: "c1".into(),
            expected: 7,
            actual: 6,
        };
        assert_eq!(
            err.to_string(),
            "Example for case 'c1' has 6 values, schema has 7"
        );
        assert!(FeatureError::UnknownProfile("medical".into())
            .to_string()
            .contains("medical"));
    }
}
