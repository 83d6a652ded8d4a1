//! Run counters
//!
//! - Counters only, monotonic within one run
//! - Exact values, surfaced in the run report and the final log line

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Operational counters for one pipeline run
#[derive(Debug, Default)]
pub struct RunCounters {
    events_loaded: AtomicU64,
    traces_loaded: AtomicU64,
    short_traces: AtomicU64,
    examples_extracted: AtomicU64,
    hypotheses_tested: AtomicU64,
    hypotheses_supported: AtomicU64,
    hypotheses_skipped: AtomicU64,
    hypotheses_errored: AtomicU64,
    fallbacks_used: AtomicU64,
}

impl RunCounters {
    /// Create a registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a loaded log
    pub fn record_log(&self, events: u64, traces: u64) {
        self.events_loaded.fetch_add(events, Ordering::Relaxed);
        self.traces_loaded.fetch_add(traces, Ordering::Relaxed);
    }

    /// Record a trace with fewer than two events
    pub fn increment_short_traces(&self) {
        self.short_traces.fetch_add(1, Ordering::Relaxed);
    }

    /// Record extracted examples
    pub fn add_examples(&self, count: u64) {
        self.examples_extracted.fetch_add(count, Ordering::Relaxed);
    }

    /// Record one tested hypothesis
    pub fn record_hypothesis(&self, supported: bool, skipped: bool, errored: bool, fallback: bool) {
        self.hypotheses_tested.fetch_add(1, Ordering::Relaxed);
        if supported {
            self.hypotheses_supported.fetch_add(1, Ordering::Relaxed);
        }
        if skipped {
            self.hypotheses_skipped.fetch_add(1, Ordering::Relaxed);
        }
        if errored {
            self.hypotheses_errored.fetch_add(1, Ordering::Relaxed);
        }
        if fallback {
            self.fallbacks_used.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Take a point-in-time copy of all counters
    pub fn snapshot(&self) -> CountersSnapshot {
        CountersSnapshot {
            events_loaded: self.events_loaded.load(Ordering::Relaxed),
            traces_loaded: self.traces_loaded.load(Ordering::Relaxed),
            short_traces: self.short_traces.load(Ordering::Relaxed),
            examples_extracted: self.examples_extracted.load(Ordering::Relaxed),
            hypotheses_tested: self.hypotheses_tested.load(Ordering::Relaxed),
            hypotheses_supported: self.hypotheses_supported.load(Ordering::Relaxed),
            hypotheses_skipped: self.hypotheses_skipped.load(Ordering::Relaxed),
            hypotheses_errored: self.hypotheses_errored.load(Ordering::Relaxed),
            fallbacks_used: self.fallbacks_used.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`RunCounters`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CountersSnapshot {
    pub events_loaded: u64,
    pub traces_loaded: u64,
    pub short_traces: u64,
    pub examples_extracted: u64,
    pub hypotheses_tested: u64,
    pub hypotheses_supported: u64,
    pub hypotheses_skipped: u64,
    pub hypotheses_errored: u64,
    pub fallbacks_used: u64,
}

impl CountersSnapshot {
    /// Flattens the snapshot into log fields
    pub fn as_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("events_loaded", self.events_loaded.to_string()),
            ("traces_loaded", self.traces_loaded.to_string()),
            ("short_traces", self.short_traces.to_string()),
            ("examples_extracted", self.examples_extracted.to_string()),
            ("hypotheses_tested", self.hypotheses_tested.to_string()),
            ("hypotheses_supported", self.hypotheses_supported.to_string()),
            ("hypotheses_skipped", self.hypotheses_skipped.to_string()),
            ("hypotheses_errored", self.hypotheses_errored.to_string()),
            ("fallbacks_used", self.fallbacks_used.to_string()),
        ]
    }
}
