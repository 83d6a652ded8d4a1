//! Events and traces
//!
//! Events are immutable once read. A trace owns the events of one case,
//! ordered by timestamp with ties broken by original log order.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::errors::{LogError, LogResult};

/// Heterogeneous attribute value carried by an event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Number(f64),
    Text(String),
    Missing,
}

static MISSING: AttrValue = AttrValue::Missing;

impl AttrValue {
    /// Converts a JSON value into an attribute value
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => AttrValue::Missing,
            serde_json::Value::Bool(b) => AttrValue::Bool(*b),
            serde_json::Value::Number(n) => n.as_f64().map_or(AttrValue::Missing, AttrValue::Number),
            serde_json::Value::String(s) if s.is_empty() => AttrValue::Missing,
            serde_json::Value::String(s) => AttrValue::Text(s.clone()),
            other => AttrValue::Text(other.to_string()),
        }
    }

    /// Interprets a raw flat-table cell: empty is missing, `true`/`false`
    /// are booleans, numeric text is a number
    pub fn from_cell(cell: &str) -> Self {
        let trimmed = cell.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") || trimmed.eq_ignore_ascii_case("null") {
            return AttrValue::Missing;
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "true" => return AttrValue::Bool(true),
            "false" => return AttrValue::Bool(false),
            _ => {}
        }
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => AttrValue::Number(n),
            _ => AttrValue::Text(trimmed.to_string()),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, AttrValue::Missing)
    }

    /// Numeric reading, if the value is (or parses as) a finite number
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Number(n) => Some(*n),
            AttrValue::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            AttrValue::Bool(_) | AttrValue::Missing => None,
        }
    }

    /// Boolean reading: booleans directly, numbers as non-zero
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(b) => Some(*b),
            AttrValue::Number(n) => Some(*n != 0.0),
            AttrValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Some(true),
                "false" | "0" => Some(false),
                _ => None,
            },
            AttrValue::Missing => None,
        }
    }

    /// Category label, if present
    pub fn as_category(&self) -> Option<String> {
        match self {
            AttrValue::Missing => None,
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Bool(b) => write!(f, "{}", b),
            AttrValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            AttrValue::Number(n) => write!(f, "{}", n),
            AttrValue::Text(s) => write!(f, "{}", s),
            AttrValue::Missing => write!(f, ""),
        }
    }
}

/// One immutable event of a case
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    case_id: String,
    activity: String,
    timestamp: NaiveDateTime,
    attributes: BTreeMap<String, AttrValue>,
    /// Original position in the log, used to break timestamp ties
    position: usize,
}

impl Event {
    pub fn new(
        case_id: impl Into<String>,
        activity: impl Into<String>,
        timestamp: NaiveDateTime,
        attributes: BTreeMap<String, AttrValue>,
        position: usize,
    ) -> Self {
        Self {
            case_id: case_id.into(),
            activity: activity.into(),
            timestamp,
            attributes,
            position,
        }
    }

    pub fn case_id(&self) -> &str {
        &self.case_id
    }

    pub fn activity(&self) -> &str {
        &self.activity
    }

    /// Timezone-naive timestamp (UTC-normalized when the source carried an offset)
    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Attribute value by column name; absent columns read as missing
    pub fn attribute(&self, name: &str) -> &AttrValue {
        self.attributes.get(name).unwrap_or(&MISSING)
    }

    pub fn attributes(&self) -> &BTreeMap<String, AttrValue> {
        &self.attributes
    }
}

/// The time-ordered events of one case
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    case_id: String,
    events: Vec<Event>,
}

impl Trace {
    /// Builds a trace, sorting events by timestamp then log position.
    ///
    /// Fails on an empty event list: a trace always has at least one event.
    pub fn new(case_id: impl Into<String>, mut events: Vec<Event>) -> LogResult<Self> {
        let case_id = case_id.into();
        if events.is_empty() {
            return Err(LogError::malformed(
                None,
                format!("Trace '{}' has no events", case_id),
            ));
        }
        events.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.position.cmp(&b.position))
        });
        Ok(Self { case_id, events })
    }

    pub fn case_id(&self) -> &str {
        &self.case_id
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Always false for a constructed trace
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Returns a copy truncated to the first `len` events (at least one)
    pub fn prefix(&self, len: usize) -> Trace {
        let keep = len.clamp(1, self.events.len());
        Trace {
            case_id: self.case_id.clone(),
            events: self.events[..keep].to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn event(activity: &str, ts: NaiveDateTime, position: usize) -> Event {
        Event::new("c1", activity, ts, BTreeMap::new(), position)
    }

    #[test]
    fn test_trace_sorts_by_timestamp() {
        let trace = Trace::new(
            "c1",
            vec![event("B", at(10, 0), 0), event("A", at(9, 0), 1)],
        )
        .unwrap();
        let activities: Vec<_> = trace.events().iter().map(|e| e.activity()).collect();
        assert_eq!(activities, vec!["A", "B"]);
    }

    #[test]
    fn test_trace_ties_keep_log_order() {
        let trace = Trace::new(
            "c1",
            vec![
                event("second", at(9, 0), 5),
                event("first", at(9, 0), 2),
                event("third", at(9, 0), 9),
            ],
        )
        .unwrap();
        let activities: Vec<_> = trace.events().iter().map(|e| e.activity()).collect();
        assert_eq!(activities, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_empty_trace_rejected() {
        assert!(Trace::new("c1", vec![]).is_err());
    }

    #[test]
    fn test_missing_attribute_reads_missing() {
        let e = event("A", at(9, 0), 0);
        assert!(e.attribute("CRP").is_missing());
    }

    #[test]
    fn test_cell_interpretation() {
        assert_eq!(AttrValue::from_cell(""), AttrValue::Missing);
        assert_eq!(AttrValue::from_cell("NaN"), AttrValue::Missing);
        assert_eq!(AttrValue::from_cell("TRUE"), AttrValue::Bool(true));
        assert_eq!(AttrValue::from_cell("12.5"), AttrValue::Number(12.5));
        assert_eq!(AttrValue::from_cell("ER Triage"), AttrValue::Text("ER Triage".into()));
    }

    #[test]
    fn test_value_readings() {
        assert_eq!(AttrValue::Number(3.0).as_bool(), Some(true));
        assert_eq!(AttrValue::Text("7".into()).as_f64(), Some(7.0));
        assert_eq!(AttrValue::Bool(true).as_f64(), None);
        assert_eq!(AttrValue::Number(2.0).as_category(), Some("2".into()));
        assert_eq!(AttrValue::Missing.as_category(), None);
    }
}
