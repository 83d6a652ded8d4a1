//! Observable pipeline events
//!
//! Events are explicit and typed.

use std::fmt;

/// Observable events in a tracecause run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Configuration loaded and validated
    ConfigLoaded,
    /// Reference table loaded
    ReferencesLoaded,

    // Event log
    /// Log loading begins
    LogLoadBegin,
    /// Log loaded and grouped into traces
    LogLoaded,
    /// Log could not be read (FATAL)
    LogUnreadable,

    // Extraction
    /// Dataset profile chosen (explicitly or by detection)
    ProfileDetected,
    /// Extraction complete
    ExtractionComplete,
    /// Trace contributed no examples
    TraceTooShort,

    // Transformation and training
    /// Train/test split done
    SplitComplete,
    /// Encoders and scaler fitted on the training partition
    TransformFitted,
    /// Model trained
    ModelTrained,
    /// Model evaluated on the test partition
    ModelEvaluated,

    // Causality
    /// Hypotheses defined from the catalogue
    HypothesesDefined,
    /// Model refit on a hypothesis's target rows
    HypothesisRefit,
    /// Hypothesis tested with a live verdict
    HypothesisTested,
    /// Hypothesis skipped
    HypothesisSkipped,
    /// Hypothesis verdict taken from the reference table
    HypothesisFallback,
    /// Hypothesis errored
    HypothesisError,
    /// Live verdict disagrees with the reference but was kept
    ReferenceDisagreement,
    /// Mispredicted transitions profiled
    TransitionsAnalyzed,

    // Output
    /// Output document written
    OutputWritten,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::ReferencesLoaded => "REFERENCES_LOADED",

            Event::LogLoadBegin => "LOG_LOAD_BEGIN",
            Event::LogLoaded => "LOG_LOADED",
            Event::LogUnreadable => "LOG_UNREADABLE",

            Event::ProfileDetected => "PROFILE_DETECTED",
            Event::ExtractionComplete => "EXTRACTION_COMPLETE",
            Event::TraceTooShort => "TRACE_TOO_SHORT",

            Event::SplitComplete => "SPLIT_COMPLETE",
            Event::TransformFitted => "TRANSFORM_FITTED",
            Event::ModelTrained => "MODEL_TRAINED",
            Event::ModelEvaluated => "MODEL_EVALUATED",

            Event::HypothesesDefined => "HYPOTHESES_DEFINED",
            Event::HypothesisRefit => "HYPOTHESIS_REFIT",
            Event::HypothesisTested => "HYPOTHESIS_TESTED",
            Event::HypothesisSkipped => "HYPOTHESIS_SKIPPED",
            Event::HypothesisFallback => "HYPOTHESIS_FALLBACK",
            Event::HypothesisError => "HYPOTHESIS_ERROR",
            Event::ReferenceDisagreement => "REFERENCE_DISAGREEMENT",
            Event::TransitionsAnalyzed => "TRANSITIONS_ANALYZED",

            Event::OutputWritten => "OUTPUT_WRITTEN",
        }
    }

    /// Returns true if this event indicates a fatal condition
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::LogUnreadable)
    }

    /// Returns true if this event marks a recoverable anomaly
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            Event::HypothesisSkipped
                | Event::HypothesisFallback
                | Event::HypothesisError
                | Event::ReferenceDisagreement
        )
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
