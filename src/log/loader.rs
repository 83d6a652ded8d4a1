//! Event log loader
//!
//! Reads a flat event table and groups it into traces.
//!
//! Supported sources:
//! - JSON lines (`.jsonl`, `.ndjson`): one flat object per line
//! - JSON (`.json`): an array of flat objects (or JSON lines)
//! - CSV (`.csv`): header row naming the columns
//!
//! Loading is all-or-nothing. Any unreadable record, missing structural
//! column or unparseable timestamp fails the whole load.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use chrono::NaiveDateTime;
use serde_json::Value;

use crate::observability::{log_event_with_fields, Event as LogEvent};

use super::columns::{ColumnMapping, LogColumns};
use super::errors::{LogError, LogResult};
use super::event::{AttrValue, Event, Trace};
use super::timestamp::{from_unix_seconds, normalize_timestamp};

/// Source table format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    JsonLines,
    Json,
    Csv,
}

impl LogFormat {
    /// Infers the format from a file extension
    pub fn from_path(path: &Path) -> LogResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("jsonl") | Some("ndjson") => Ok(LogFormat::JsonLines),
            Some("json") => Ok(LogFormat::Json),
            Some("csv") => Ok(LogFormat::Csv),
            _ => Err(LogError::unsupported_format(path.display().to_string())),
        }
    }
}

/// A loaded event log: traces in order of each case's first appearance
#[derive(Debug, Clone)]
pub struct EventLog {
    traces: Vec<Trace>,
    columns: LogColumns,
    mapping: ColumnMapping,
}

impl EventLog {
    /// Groups events into traces. Fails on an empty event list.
    pub fn from_events(events: Vec<Event>, mapping: ColumnMapping) -> LogResult<Self> {
        if events.is_empty() {
            return Err(LogError::empty());
        }

        let columns = LogColumns::from_events(&events);

        let mut order: Vec<String> = Vec::new();
        let mut grouped: HashMap<String, Vec<Event>> = HashMap::new();
        for event in events {
            let case_id = event.case_id().to_string();
            if !grouped.contains_key(&case_id) {
                order.push(case_id.clone());
            }
            grouped.entry(case_id).or_default().push(event);
        }

        let mut traces = Vec::with_capacity(order.len());
        for case_id in order {
            let events = grouped.remove(&case_id).unwrap_or_default();
            traces.push(Trace::new(case_id, events)?);
        }

        Ok(Self {
            traces,
            columns,
            mapping,
        })
    }

    pub fn traces(&self) -> &[Trace] {
        &self.traces
    }

    /// Attribute columns (structural columns excluded)
    pub fn columns(&self) -> &LogColumns {
        &self.columns
    }

    pub fn mapping(&self) -> &ColumnMapping {
        &self.mapping
    }

    pub fn event_count(&self) -> usize {
        self.traces.iter().map(|t| t.len()).sum()
    }

    pub fn trace(&self, case_id: &str) -> Option<&Trace> {
        self.traces.iter().find(|t| t.case_id() == case_id)
    }
}

/// Loads event logs using a column mapping
#[derive(Debug, Clone, Default)]
pub struct LogLoader {
    mapping: ColumnMapping,
}

impl LogLoader {
    pub fn new(mapping: ColumnMapping) -> Self {
        Self { mapping }
    }

    pub fn mapping(&self) -> &ColumnMapping {
        &self.mapping
    }

    /// Loads a log file, choosing the parser from its extension
    pub fn load_path(&self, path: &Path) -> LogResult<EventLog> {
        let path_str = path.display().to_string();
        log_event_with_fields(LogEvent::LogLoadBegin, &[("path", &path_str)]);

        let result = LogFormat::from_path(path).and_then(|format| {
            let content = fs::read_to_string(path)
                .map_err(|e| LogError::unreadable(path_str.clone(), e))?;
            self.load_str(&content, format)
        });

        match &result {
            Ok(log) => log_event_with_fields(
                LogEvent::LogLoaded,
                &[
                    ("path", &path_str),
                    ("events", &log.event_count().to_string()),
                    ("traces", &log.traces().len().to_string()),
                    ("columns", &log.columns().len().to_string()),
                ],
            ),
            Err(e) => log_event_with_fields(
                LogEvent::LogUnreadable,
                &[("path", &path_str), ("error", &e.to_string())],
            ),
        }
        result
    }

    /// Loads a log from in-memory content
    pub fn load_str(&self, content: &str, format: LogFormat) -> LogResult<EventLog> {
        let events = match format {
            LogFormat::JsonLines => self.parse_json_lines(content)?,
            LogFormat::Json => {
                if content.trim_start().starts_with('[') {
                    self.parse_json_array(content)?
                } else {
                    self.parse_json_lines(content)?
                }
            }
            LogFormat::Csv => self.parse_csv(content)?,
        };
        EventLog::from_events(events, self.mapping.clone())
    }

    fn parse_json_lines(&self, content: &str) -> LogResult<Vec<Event>> {
        let mut events = Vec::new();
        for (index, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let record = index + 1;
            let value: Value = serde_json::from_str(line)
                .map_err(|e| LogError::malformed(Some(record), format!("Invalid JSON: {}", e)))?;
            events.push(self.event_from_json(&value, record, events.len())?);
        }
        Ok(events)
    }

    fn parse_json_array(&self, content: &str) -> LogResult<Vec<Event>> {
        let values: Vec<Value> = serde_json::from_str(content)
            .map_err(|e| LogError::malformed(None, format!("Invalid JSON array: {}", e)))?;
        values
            .iter()
            .enumerate()
            .map(|(index, value)| self.event_from_json(value, index + 1, index))
            .collect()
    }

    fn event_from_json(&self, value: &Value, record: usize, position: usize) -> LogResult<Event> {
        let object = value
            .as_object()
            .ok_or_else(|| LogError::malformed(Some(record), "Record is not a JSON object"))?;

        // Numeric timestamps are Unix seconds
        let timestamp = match object.get(&self.mapping.timestamp) {
            None | Some(Value::Null) => {
                return Err(LogError::missing_column(record, &self.mapping.timestamp))
            }
            Some(Value::Number(n)) => from_unix_seconds(n.as_f64().unwrap_or(f64::NAN))
                .ok_or_else(|| LogError::bad_timestamp(record, &n.to_string()))?,
            Some(Value::String(s)) => self.parse_timestamp(s, record)?,
            Some(other) => return Err(LogError::bad_timestamp(record, &other.to_string())),
        };

        let case_id = json_label(object.get(&self.mapping.case_id));
        let activity = json_label(object.get(&self.mapping.activity));

        let row: BTreeMap<String, AttrValue> = object
            .iter()
            .filter(|(k, _)| !self.mapping.is_structural(k))
            .map(|(k, v)| (k.clone(), AttrValue::from_json(v)))
            .collect();

        self.build_event(case_id, activity, timestamp, row, record, position)
    }

    fn parse_csv(&self, content: &str) -> LogResult<Vec<Event>> {
        let mut reader = csv::Reader::from_reader(content.as_bytes());
        let headers = reader
            .headers()
            .map_err(|e| LogError::malformed(Some(1), format!("Invalid CSV header: {}", e)))?
            .clone();

        let mut events = Vec::new();
        for (index, result) in reader.records().enumerate() {
            // Header is record 1
            let record_no = index + 2;
            let record = result
                .map_err(|e| LogError::malformed(Some(record_no), format!("Invalid CSV record: {}", e)))?;

            let cell = |name: &str| {
                headers
                    .iter()
                    .position(|h| h == name)
                    .and_then(|i| record.get(i))
                    .and_then(cell_label)
            };

            let raw_ts = cell(&self.mapping.timestamp)
                .ok_or_else(|| LogError::missing_column(record_no, &self.mapping.timestamp))?;
            let timestamp = self.parse_timestamp(&raw_ts, record_no)?;

            // Only attribute columns are typed; identifiers stay verbatim
            let row: BTreeMap<String, AttrValue> = headers
                .iter()
                .zip(record.iter())
                .filter(|(h, _)| !self.mapping.is_structural(h))
                .map(|(h, cell)| (h.to_string(), AttrValue::from_cell(cell)))
                .collect();

            let position = events.len();
            events.push(self.build_event(
                cell(&self.mapping.case_id),
                cell(&self.mapping.activity),
                timestamp,
                row,
                record_no,
                position,
            )?);
        }
        Ok(events)
    }

    fn parse_timestamp(&self, raw: &str, record: usize) -> LogResult<NaiveDateTime> {
        normalize_timestamp(raw).ok_or_else(|| LogError::bad_timestamp(record, raw))
    }

    fn build_event(
        &self,
        case_id: Option<String>,
        activity: Option<String>,
        timestamp: NaiveDateTime,
        row: BTreeMap<String, AttrValue>,
        record: usize,
        position: usize,
    ) -> LogResult<Event> {
        let case_id =
            case_id.ok_or_else(|| LogError::missing_column(record, &self.mapping.case_id))?;
        let activity =
            activity.ok_or_else(|| LogError::missing_column(record, &self.mapping.activity))?;
        Ok(Event::new(case_id, activity, timestamp, row, position))
    }
}

/// Identifier text of a JSON cell, exactly as written for strings
fn json_label(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Identifier text of a CSV cell; blank cells are missing
fn cell_label(cell: &str) -> Option<String> {
    let trimmed = cell.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
