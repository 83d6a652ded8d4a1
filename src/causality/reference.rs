//! Pre-registered reference results
//!
//! A JSON object keyed by stable hypothesis id. The table is data handed
//! to the evaluator; nothing about it is compiled in.
//!
//! ```json
//! {
//!   "clinical.lab_outcome": {
//!     "status": "SUPPORTED",
//!     "effect": 0.13,
//!     "condition_true_rate": 0.13,
//!     "condition_false_rate": 0.0,
//!     "note": "Lab test importance 13%"
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::observability::{log_event_with_fields, Event};

use super::errors::{CausalityError, CausalityResult};
use super::hypothesis::Status;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceResult {
    pub status: Status,
    /// Importance sum or rate difference, matching the hypothesis style
    pub effect: f64,
    #[serde(default)]
    pub condition_true_rate: Option<f64>,
    #[serde(default)]
    pub condition_false_rate: Option<f64>,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferenceTable {
    entries: BTreeMap<String, ReferenceResult>,
}

impl ReferenceTable {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_json_str(content: &str) -> CausalityResult<Self> {
        let table: ReferenceTable = serde_json::from_str(content)
            .map_err(|e| CausalityError::ReferenceMalformed(e.to_string()))?;
        table.validate()?;
        Ok(table)
    }

    pub fn load(path: &Path) -> CausalityResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| CausalityError::ReferenceUnreadable {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let table = Self::from_json_str(&content)?;

        log_event_with_fields(
            Event::ReferencesLoaded,
            &[
                ("path", &path.display().to_string()),
                ("entries", &table.len().to_string()),
            ],
        );
        Ok(table)
    }

    /// Only live verdicts can serve as references
    fn validate(&self) -> CausalityResult<()> {
        for (id, entry) in &self.entries {
            if !matches!(entry.status, Status::Supported | Status::NotSupported) {
                return Err(CausalityError::ReferenceMalformed(format!(
                    "entry '{}' has status {}, expected SUPPORTED or NOT_SUPPORTED",
                    id, entry.status
                )));
            }
            if !entry.effect.is_finite() {
                return Err(CausalityError::ReferenceMalformed(format!(
                    "entry '{}' has a non-finite effect",
                    id
                )));
            }
        }
        Ok(())
    }

    pub fn insert(&mut self, id: impl Into<String>, result: ReferenceResult) {
        self.entries.insert(id.into(), result);
    }

    pub fn get(&self, id: &str) -> Option<&ReferenceResult> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const TABLE: &str = r#"{
        "administrative.supervisor_oversight": {
            "status": "SUPPORTED",
            "effect": 0.139,
            "condition_true_rate": 0.406,
            "condition_false_rate": 0.267
        },
        "administrative.temporal_factors": {"status": "NOT_SUPPORTED", "effect": 0.05}
    }"#;

    #[test]
    fn test_parse_table() {
        let table = ReferenceTable::from_json_str(TABLE).unwrap();
        assert_eq!(table.len(), 2);
        let entry = table.get("administrative.supervisor_oversight").unwrap();
        assert_eq!(entry.status, Status::Supported);
        assert_eq!(entry.condition_false_rate, Some(0.267));
        assert!(table.get("administrative.temporal_factors").unwrap().note.is_none());
        assert!(table.get("H3").is_none());
    }

    #[test]
    fn test_rejects_non_verdict_status() {
        let err = ReferenceTable::from_json_str(r#"{"x": {"status": "SKIPPED", "effect": 0.0}}"#)
            .unwrap_err();
        assert!(matches!(err, CausalityError::ReferenceMalformed(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(TABLE.as_bytes()).unwrap();
        let table = ReferenceTable::load(file.path()).unwrap();
        assert_eq!(table.ids().count(), 2);
    }

    #[test]
    fn test_missing_file() {
        let err = ReferenceTable::load(Path::new("/nonexistent/refs.json")).unwrap_err();
        assert!(matches!(err, CausalityError::ReferenceUnreadable { .. }));
    }
}
