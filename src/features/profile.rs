//! Dataset profiles and extraction settings
//!
//! A profile names the derived-feature family applied during extraction.
//! It is chosen once per run, either explicitly or by `detect_profile`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::log::LogColumns;

use super::errors::FeatureError;

/// Closed set of feature families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetProfile {
    Generic,
    Clinical,
    Administrative,
}

impl DatasetProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetProfile::Generic => "generic",
            DatasetProfile::Clinical => "clinical",
            DatasetProfile::Administrative => "administrative",
        }
    }
}

impl fmt::Display for DatasetProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Profile override: a fixed profile or auto-detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileChoice {
    #[default]
    Auto,
    Generic,
    Clinical,
    Administrative,
}

impl ProfileChoice {
    /// Resolves the choice against the columns of a log
    pub fn resolve(&self, columns: &LogColumns, config: &ExtractionConfig) -> DatasetProfile {
        match self {
            ProfileChoice::Auto => detect_profile_with(columns, config),
            ProfileChoice::Generic => DatasetProfile::Generic,
            ProfileChoice::Clinical => DatasetProfile::Clinical,
            ProfileChoice::Administrative => DatasetProfile::Administrative,
        }
    }
}

impl FromStr for ProfileChoice {
    type Err = FeatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(ProfileChoice::Auto),
            "generic" => Ok(ProfileChoice::Generic),
            "clinical" => Ok(ProfileChoice::Clinical),
            "administrative" => Ok(ProfileChoice::Administrative),
            other => Err(FeatureError::UnknownProfile(other.to_string())),
        }
    }
}

/// Extraction settings shared by every profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Tracked lab-test columns (clinical)
    #[serde(default = "default_lab_tests")]
    pub lab_tests: Vec<String>,

    /// Name prefix of binary clinical-criterion columns
    #[serde(default = "default_criterion_prefix")]
    pub criterion_prefix: String,

    /// Monetary amount column (administrative)
    #[serde(default = "default_amount_column")]
    pub amount_column: String,

    /// Number of preceding activities kept as `prev_event_*` (clinical)
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    /// Adds the causal feature family on top of the profile features
    #[serde(default = "default_causal_features")]
    pub causal_features: bool,
}

fn default_lab_tests() -> Vec<String> {
    vec!["CRP".into(), "Leucocytes".into(), "LacticAcid".into()]
}

fn default_criterion_prefix() -> String {
    "SIRS".to_string()
}

fn default_amount_column() -> String {
    "Amount".to_string()
}

fn default_history_window() -> usize {
    5
}

fn default_causal_features() -> bool {
    true
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            lab_tests: default_lab_tests(),
            criterion_prefix: default_criterion_prefix(),
            amount_column: default_amount_column(),
            history_window: default_history_window(),
            causal_features: default_causal_features(),
        }
    }
}

impl ExtractionConfig {
    /// Lab tests present in the log, in configured order
    pub fn present_lab_tests<'a>(&'a self, columns: &'a LogColumns) -> impl Iterator<Item = &'a str> {
        self.lab_tests
            .iter()
            .map(|t| t.as_str())
            .filter(move |t| columns.contains(t))
    }

    /// Criterion columns present in the log, sorted
    pub fn criterion_columns<'a>(&'a self, columns: &'a LogColumns) -> impl Iterator<Item = &'a str> {
        columns
            .names()
            .filter(move |c| !self.criterion_prefix.is_empty() && c.starts_with(&self.criterion_prefix))
    }
}

/// Detects the profile with default extraction settings
pub fn detect_profile(columns: &LogColumns) -> DatasetProfile {
    detect_profile_with(columns, &ExtractionConfig::default())
}

/// Detects the profile from the log's attribute columns.
///
/// Clinical signatures are checked first, then administrative ones.
pub fn detect_profile_with(columns: &LogColumns, config: &ExtractionConfig) -> DatasetProfile {
    let clinical = config.criterion_columns(columns).next().is_some()
        || config.present_lab_tests(columns).next().is_some();
    if clinical {
        return DatasetProfile::Clinical;
    }

    let administrative = columns.contains(&config.amount_column)
        || columns
            .names()
            .any(|c| c.to_ascii_lowercase().contains("declaration"));
    if administrative {
        return DatasetProfile::Administrative;
    }

    DatasetProfile::Generic
}
