//! Column mapping and observed log columns

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::event::{AttrValue, Event};

/// Names of the structural columns in the source table.
///
/// Defaults follow XES attribute naming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    #[serde(default = "default_case_id")]
    pub case_id: String,
    #[serde(default = "default_activity")]
    pub activity: String,
    #[serde(default = "default_timestamp")]
    pub timestamp: String,
    /// Department / organizational group column
    #[serde(default = "default_group")]
    pub group: String,
    /// Resource column
    #[serde(default = "default_resource")]
    pub resource: String,
}

fn default_case_id() -> String {
    "case:concept:name".to_string()
}
fn default_activity() -> String {
    "concept:name".to_string()
}
fn default_timestamp() -> String {
    "time:timestamp".to_string()
}
fn default_group() -> String {
    "org:group".to_string()
}
fn default_resource() -> String {
    "org:resource".to_string()
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            case_id: default_case_id(),
            activity: default_activity(),
            timestamp: default_timestamp(),
            group: default_group(),
            resource: default_resource(),
        }
    }
}

impl ColumnMapping {
    /// Whether a column is one of the three structural columns
    pub fn is_structural(&self, column: &str) -> bool {
        column == self.case_id || column == self.activity || column == self.timestamp
    }
}

/// Value kind inferred for an attribute column across the whole log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Numeric,
    Boolean,
    Categorical,
}

/// Attribute columns observed in a log (structural columns excluded),
/// in sorted order so schemas derived from them are deterministic
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogColumns {
    columns: BTreeMap<String, ColumnKind>,
}

impl LogColumns {
    /// Infers column kinds from every event's attributes.
    ///
    /// A column is numeric when every present value is a number, boolean
    /// when every present value is a boolean, categorical otherwise
    /// (including columns that are never present).
    pub fn from_events<'a>(events: impl IntoIterator<Item = &'a Event>) -> Self {
        #[derive(Default)]
        struct Seen {
            numbers: usize,
            bools: usize,
            other: usize,
        }

        let mut seen: BTreeMap<String, Seen> = BTreeMap::new();
        for event in events {
            for (name, value) in event.attributes() {
                let entry = seen.entry(name.clone()).or_default();
                match value {
                    AttrValue::Number(_) => entry.numbers += 1,
                    AttrValue::Bool(_) => entry.bools += 1,
                    AttrValue::Text(_) => entry.other += 1,
                    AttrValue::Missing => {}
                }
            }
        }

        let columns = seen
            .into_iter()
            .map(|(name, s)| {
                let kind = match (s.numbers, s.bools, s.other) {
                    (n, 0, 0) if n > 0 => ColumnKind::Numeric,
                    (0, b, 0) if b > 0 => ColumnKind::Boolean,
                    _ => ColumnKind::Categorical,
                };
                (name, kind)
            })
            .collect();

        Self { columns }
    }

    /// Builds a column set directly (for tests and programmatic logs)
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, ColumnKind)>,
        S: Into<String>,
    {
        Self {
            columns: pairs.into_iter().map(|(n, k)| (n.into(), k)).collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn kind(&self, name: &str) -> Option<ColumnKind> {
        self.columns.get(name).copied()
    }

    /// Column names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn event_with(attrs: &[(&str, AttrValue)]) -> Event {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        Event::new(
            "c",
            "A",
            ts,
            attrs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
            0,
        )
    }

    #[test]
    fn test_kind_inference() {
        let events = vec![
            event_with(&[
                ("CRP", AttrValue::Number(4.0)),
                ("SIRSCritFever", AttrValue::Bool(true)),
                ("org:group", AttrValue::Text("A".into())),
            ]),
            event_with(&[
                ("CRP", AttrValue::Missing),
                ("SIRSCritFever", AttrValue::Bool(false)),
                ("mixed", AttrValue::Number(1.0)),
            ]),
            event_with(&[("mixed", AttrValue::Text("x".into()))]),
        ];
        let cols = LogColumns::from_events(&events);
        assert_eq!(cols.kind("CRP"), Some(ColumnKind::Numeric));
        assert_eq!(cols.kind("SIRSCritFever"), Some(ColumnKind::Boolean));
        assert_eq!(cols.kind("org:group"), Some(ColumnKind::Categorical));
        assert_eq!(cols.kind("mixed"), Some(ColumnKind::Categorical));
    }

    #[test]
    fn test_names_sorted() {
        let cols = LogColumns::from_pairs([
            ("zeta", ColumnKind::Numeric),
            ("Amount", ColumnKind::Numeric),
            ("alpha", ColumnKind::Boolean),
        ]);
        let names: Vec<_> = cols.names().collect();
        assert_eq!(names, vec!["Amount", "alpha", "zeta"]);
    }

    #[test]
    fn test_structural_columns() {
        let mapping = ColumnMapping::default();
        assert!(mapping.is_structural("concept:name"));
        assert!(mapping.is_structural("time:timestamp"));
        assert!(!mapping.is_structural("org:group"));
    }
}
