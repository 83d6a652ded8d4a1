//! Data transformation subsystem
//!
//! Label encoding, z-score scaling, seeded class balancing and a seeded
//! stratified split.
//!
//! # Invariants
//!
//! - Encoders and scaler are fitted on training data only
//! - A `FittedTransform` is never mutated after `fit_transform` returns
//! - Unseen categories encode to -1 instead of failing

mod balance;
mod encoder;
mod errors;
mod scaler;
mod split;
mod transformer;

pub use balance::{balance_indices, IMBALANCE_RATIO};
pub use encoder::{LabelEncoder, UNKNOWN_CODE};
pub use errors::{TransformError, TransformResult};
pub use scaler::StandardScaler;
pub use split::{stratified_indices, train_test_split, SplitDataset};
pub use transformer::{DataTransformer, FittedTransform, TransformConfig, TransformedSet};
