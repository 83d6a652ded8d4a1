//! Feature extraction subsystem
//!
//! Turns traces into supervised next-activity examples.
//!
//! # Guarantees
//!
//! - A trace of N events yields exactly `max(0, N - 1)` examples
//! - Example i only reads `trace[0..=i]` (plus the trace length)
//! - Every example carries one value per schema column, of the declared kind
//! - Profile detection is a pure function of the log's columns

mod administrative;
mod base;
mod clinical;
mod dataset;
mod errors;
mod extractor;
mod profile;
mod schema;
mod window;

pub use clinical::LabStats;
pub use dataset::{DatasetDocument, Example, ExampleDataset};
pub use errors::{FeatureError, FeatureResult};
pub use extractor::{FeatureFamily, TraceFeatureExtractor};
pub use profile::{detect_profile, detect_profile_with, DatasetProfile, ExtractionConfig, ProfileChoice};
pub use schema::{FeatureDef, FeatureKind, FeatureSchema, FeatureValue};
pub use window::{Window, START, UNKNOWN};
