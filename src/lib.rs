//! tracecause - next-activity features and causal hypotheses for event logs
//!
//! Turns a process event log into leakage-free next-activity examples,
//! trains a classifier on them and tests domain hypotheses against the
//! trained model.

pub mod causality;
pub mod cli;
pub mod config;
pub mod features;
pub mod log;
pub mod model;
pub mod observability;
pub mod transform;
