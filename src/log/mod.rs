//! Event log subsystem
//!
//! Loads a flat table of events (case id, activity, timestamp and arbitrary
//! attributes) and groups it into per-case traces.
//!
//! # Guarantees
//!
//! - Traces hold at least one event, ordered by timestamp, ties in log order
//! - Timestamps are timezone-naive, UTC-normalized when an offset was given
//! - Any unreadable record aborts the whole load (FATAL)

mod columns;
mod errors;
mod event;
mod loader;
mod timestamp;

pub use columns::{ColumnKind, ColumnMapping, LogColumns};
pub use errors::{LogError, LogErrorCode, LogResult};
pub use event::{AttrValue, Event, Trace};
pub use loader::{EventLog, LogFormat, LogLoader};
pub use timestamp::{normalize_timestamp, seconds_between};
