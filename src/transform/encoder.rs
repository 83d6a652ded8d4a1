//! Label encoding for categorical features

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Code assigned to categories not seen during fitting
pub const UNKNOWN_CODE: f64 = -1.0;

/// Maps category labels to dense integer codes in sorted label order
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    /// Fits on the distinct labels of `values`
    pub fn fit<'a>(values: impl IntoIterator<Item = &'a str>) -> Self {
        let classes: BTreeSet<&str> = values.into_iter().collect();
        Self {
            classes: classes.into_iter().map(str::to_string).collect(),
        }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Code of a label, `UNKNOWN_CODE` if unseen
    pub fn encode(&self, label: &str) -> f64 {
        self.classes
            .binary_search_by(|c| c.as_str().cmp(label))
            .map(|i| i as f64)
            .unwrap_or(UNKNOWN_CODE)
    }

    pub fn decode(&self, code: f64) -> Option<&str> {
        if code < 0.0 || code.fract() != 0.0 {
            return None;
        }
        self.classes.get(code as usize).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted_codes() {
        let enc = LabelEncoder::fit(["Release A", "CRP", "ER Triage", "CRP"]);
        assert_eq!(enc.classes(), &["CRP", "ER Triage", "Release A"]);
        assert_eq!(enc.encode("CRP"), 0.0);
        assert_eq!(enc.encode("Release A"), 2.0);
    }

    #[test]
    fn test_unknown_label() {
        let enc = LabelEncoder::fit(["a", "b"]);
        assert_eq!(enc.encode("z"), UNKNOWN_CODE);
        assert_eq!(enc.len(), 2);
    }

    #[test]
    fn test_decode() {
        let enc = LabelEncoder::fit(["a", "b"]);
        assert_eq!(enc.decode(1.0), Some("b"));
        assert_eq!(enc.decode(UNKNOWN_CODE), None);
        assert_eq!(enc.decode(7.0), None);
    }
}
