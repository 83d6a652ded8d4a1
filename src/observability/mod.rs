//! Observability for tracecause runs
//!
//! - Structured logging (JSON lines on stderr)
//! - Typed lifecycle events
//! - Exact run counters
//!
//! # Principles
//!
//! 1. Observability is read-only: it never changes a verdict or a feature value
//! 2. No background threads
//! 3. Deterministic output for the same run
//!
//! # Usage
//!
//! ```ignore
//! use tracecause::observability::{log_event_with_fields, Event, ObservationScope};
//!
//! log_event_with_fields(Event::ProfileDetected, &[("profile", "clinical")]);
//!
//! let scope = ObservationScope::new("EXTRACTION");
//! // ... extract ...
//! scope.complete_with_fields(&[("examples", "1200")]);
//! ```

mod events;
mod logger;
mod metrics;
mod scope;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{CountersSnapshot, RunCounters};
pub use scope::ObservationScope;

/// Log a lifecycle event
pub fn log_event(event: Event) {
    log_event_with_fields(event, &[]);
}

/// Log a lifecycle event with fields
///
/// Severity follows the event: FATAL for fatal events, WARN for recoverable
/// anomalies, INFO otherwise.
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    let severity = if event.is_fatal() {
        Severity::Fatal
    } else if event.is_warning() {
        Severity::Warn
    } else {
        Severity::Info
    };
    Logger::log(severity, event.as_str(), fields);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_event() {
        log_event(Event::LogLoadBegin);
        log_event(Event::LogLoaded);
    }

    #[test]
    fn test_log_event_with_fields() {
        log_event_with_fields(Event::HypothesisSkipped, &[("id", "clinical.lab_markers")]);
    }
}
