//! Pipeline configuration
//!
//! One JSON file, every field defaulted. An empty object `{}` is a valid
//! configuration; the log path can then come from the command line.
//!
//! ```json
//! {
//!   "log": { "path": "sepsis.csv", "case_id": "case:concept:name" },
//!   "profile": "auto",
//!   "split": { "test_size": 0.2, "random_state": 42 },
//!   "model": { "kind": "random_forest", "n_estimators": 100 },
//!   "causality": { "fallback_policy": "substitute", "reference_path": "reference_results.json" },
//!   "output_dir": "./out",
//!   "log_level": "info"
//! }
//! ```

mod errors;

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::causality::EvaluatorConfig;
use crate::features::{ExtractionConfig, ProfileChoice};
use crate::log::ColumnMapping;
use crate::model::ModelConfig;
use crate::observability::{log_event_with_fields, Event, Severity};
use crate::transform::TransformConfig;

pub use errors::{ConfigError, ConfigResult};

/// Where the event log comes from and how its columns are named
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSource {
    #[serde(default)]
    pub path: Option<PathBuf>,

    #[serde(flatten)]
    pub columns: ColumnMapping,
}

/// Train/test split and training-set balancing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitConfig {
    #[serde(default = "default_test_size")]
    pub test_size: f64,

    #[serde(default = "default_random_state")]
    pub random_state: u64,

    #[serde(default = "default_balance_classes")]
    pub balance_classes: bool,
}

fn default_test_size() -> f64 {
    0.2
}

fn default_random_state() -> u64 {
    42
}

fn default_balance_classes() -> bool {
    true
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_size: default_test_size(),
            random_state: default_random_state(),
            balance_classes: default_balance_classes(),
        }
    }
}

impl SplitConfig {
    pub fn transform_config(&self) -> TransformConfig {
        TransformConfig {
            balance_classes: self.balance_classes,
            random_state: self.random_state,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub log: LogSource,

    #[serde(default)]
    pub profile: ProfileChoice,

    #[serde(default)]
    pub extraction: ExtractionConfig,

    #[serde(default)]
    pub split: SplitConfig,

    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub causality: EvaluatorConfig,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Minimum log severity: trace, info, warn, error or fatal
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./tracecause-out")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            log: LogSource::default(),
            profile: ProfileChoice::default(),
            extraction: ExtractionConfig::default(),
            split: SplitConfig::default(),
            model: ModelConfig::default(),
            causality: EvaluatorConfig::default(),
            output_dir: default_output_dir(),
            log_level: default_log_level(),
        }
    }
}

impl PipelineConfig {
    /// Reads and validates a configuration file.
    ///
    /// Relative paths inside the file are resolved against the file's
    /// directory.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Unreadable {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let mut config = Self::from_json_str(&content)?;

        if let Some(base) = path.parent() {
            config.resolve_relative(base);
        }

        log_event_with_fields(
            Event::ConfigLoaded,
            &[
                ("path", &path.display().to_string()),
                ("profile", &format!("{:?}", config.profile).to_lowercase()),
            ],
        );
        Ok(config)
    }

    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        let config: PipelineConfig =
            serde_json::from_str(content).map_err(|e| ConfigError::Malformed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn resolve_relative(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        if let Some(p) = self.log.path.as_mut() {
            resolve(p);
        }
        if let Some(p) = self.causality.reference_path.as_mut() {
            resolve(p);
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if !(self.split.test_size > 0.0 && self.split.test_size < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "split.test_size must be in (0, 1), got {}",
                self.split.test_size
            )));
        }
        if self.extraction.history_window == 0 {
            return Err(ConfigError::Invalid(
                "extraction.history_window must be at least 1".into(),
            ));
        }
        self.model
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("model: {}", e)))?;
        self.causality
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("causality: {}", e)))?;
        self.severity()?;
        Ok(())
    }

    pub fn severity(&self) -> ConfigResult<Severity> {
        Severity::parse(&self.log_level)
            .ok_or_else(|| ConfigError::Invalid(format!("unknown log_level '{}'", self.log_level)))
    }
}
