//! Trace-to-example extraction
//!
//! For a trace of N events the extractor emits N-1 examples. Example i
//! describes the prefix `trace[0..=i]` and targets `trace[i+1].activity`.
//!
//! The schema is fixed when the extractor is built. Each profile family
//! fills every one of its columns for every example, using neutral values
//! for absent attributes, so all rows align with the schema.

use std::fmt;

use crate::log::{ColumnMapping, EventLog, LogColumns, Trace};
use crate::observability::{log_event_with_fields, Event, Logger, Severity};

use super::administrative::AdministrativeFamily;
use super::base::{BaseFamily, GenericFamily};
use super::clinical::ClinicalFamily;
use super::dataset::{Example, ExampleDataset};
use super::errors::FeatureResult;
use super::profile::{DatasetProfile, ExtractionConfig};
use super::schema::{FeatureDef, FeatureSchema, FeatureValue};
use super::window::Window;

/// A group of features computed together over a trace prefix.
///
/// `compute` must push exactly one value per definition, in order.
pub trait FeatureFamily: fmt::Debug {
    fn definitions(&self) -> Vec<FeatureDef>;
    fn compute(&self, window: &Window<'_>, out: &mut Vec<FeatureValue>);
}

/// Per-profile feature extractor with a frozen schema
#[derive(Debug)]
pub struct TraceFeatureExtractor {
    profile: DatasetProfile,
    schema: FeatureSchema,
    families: Vec<Box<dyn FeatureFamily>>,
}

impl TraceFeatureExtractor {
    /// Builds the extractor with the default column mapping
    pub fn new(
        profile: DatasetProfile,
        columns: &LogColumns,
        config: &ExtractionConfig,
    ) -> FeatureResult<Self> {
        Self::with_mapping(profile, columns, &ColumnMapping::default(), config)
    }

    /// Builds the extractor and its schema
    pub fn with_mapping(
        profile: DatasetProfile,
        columns: &LogColumns,
        mapping: &ColumnMapping,
        config: &ExtractionConfig,
    ) -> FeatureResult<Self> {
        let mut families: Vec<Box<dyn FeatureFamily>> = vec![Box::new(BaseFamily)];

        match profile {
            DatasetProfile::Generic => {
                families.push(Box::new(GenericFamily::new(columns, mapping)));
            }
            DatasetProfile::Clinical => {
                families.push(Box::new(ClinicalFamily::new(columns, &mapping.group, config)));
            }
            DatasetProfile::Administrative => {
                families.push(Box::new(AdministrativeFamily::new(columns, mapping, config)));
            }
        }

        let schema = FeatureSchema::new(families.iter().flat_map(|f| f.definitions()).collect())?;

        Ok(Self {
            profile,
            schema,
            families,
        })
    }

    /// Builds an extractor for a loaded log
    pub fn for_log(
        profile: DatasetProfile,
        log: &EventLog,
        config: &ExtractionConfig,
    ) -> FeatureResult<Self> {
        Self::with_mapping(profile, log.columns(), log.mapping(), config)
    }

    pub fn profile(&self) -> DatasetProfile {
        self.profile
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Feature values for the prefix ending at `index`
    pub fn features_at(&self, trace: &Trace, index: usize) -> Option<Vec<FeatureValue>> {
        let window = Window::new(trace, index)?;
        let mut values = Vec::with_capacity(self.schema.len());
        for family in &self.families {
            family.compute(&window, &mut values);
        }
        Some(values)
    }

    /// One example per consecutive event pair
    pub fn extract(&self, trace: &Trace) -> Vec<Example> {
        let events = trace.events();
        (0..events.len().saturating_sub(1))
            .filter_map(|i| {
                let values = self.features_at(trace, i)?;
                Some(Example {
                    case_id: trace.case_id().to_string(),
                    values,
                    target: events[i + 1].activity().to_string(),
                })
            })
            .collect()
    }

    /// Extracts every trace in log order into one validated dataset
    pub fn extract_log(&self, log: &EventLog) -> FeatureResult<ExampleDataset> {
        let mut examples = Vec::new();
        let mut short_traces = 0usize;

        for trace in log.traces() {
            if trace.len() < 2 {
                short_traces += 1;
                Logger::log(
                    Severity::Trace,
                    Event::TraceTooShort.as_str(),
                    &[("case_id", trace.case_id())],
                );
                continue;
            }
            for example in self.extract(trace) {
                example.check(&self.schema)?;
                examples.push(example);
            }
        }

        let dataset = ExampleDataset::new(self.schema.clone(), examples)?;

        log_event_with_fields(
            Event::ExtractionComplete,
            &[
                ("profile", self.profile.as_str()),
                ("traces", &log.traces().len().to_string()),
                ("short_traces", &short_traces.to_string()),
                ("examples", &dataset.len().to_string()),
                ("features", &self.schema.len().to_string()),
                ("fingerprint", &self.schema.fingerprint()),
            ],
        );

        Ok(dataset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::{AttrValue, ColumnKind, Event as LogEvent};
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn trace(case_id: &str, activities: &[&str]) -> Trace {
        let base = NaiveDate::from_ymd_opt(2024, 2, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let events = activities
            .iter()
            .enumerate()
            .map(|(i, a)| {
                let mut attrs = BTreeMap::new();
                if i % 2 == 1 {
                    attrs.insert("CRP".to_string(), AttrValue::Number(i as f64));
                }
                LogEvent::new(case_id, *a, base + chrono::Duration::minutes(i as i64), attrs, i)
            })
            .collect();
        Trace::new(case_id, events).unwrap()
    }

    fn extractor(profile: DatasetProfile) -> TraceFeatureExtractor {
        let columns = LogColumns::from_pairs([("CRP", ColumnKind::Numeric)]);
        TraceFeatureExtractor::new(profile, &columns, &ExtractionConfig::default()).unwrap()
    }

    #[test]
    fn test_example_count() {
        let ex = extractor(DatasetProfile::Generic);
        assert_eq!(ex.extract(&trace("a", &["A"])).len(), 0);
        assert_eq!(ex.extract(&trace("a", &["A", "B"])).len(), 1);
        assert_eq!(ex.extract(&trace("a", &["A", "B", "C", "D", "E"])).len(), 4);
    }

    #[test]
    fn test_targets_are_next_activity() {
        let ex = extractor(DatasetProfile::Generic);
        let examples = ex.extract(&trace("a", &["A", "B", "C"]));
        let targets: Vec<_> = examples.iter().map(|e| e.target.as_str()).collect();
        assert_eq!(targets, vec!["B", "C"]);
    }

    #[test]
    fn test_rows_align_with_schema_in_every_profile() {
        for profile in [
            DatasetProfile::Generic,
            DatasetProfile::Clinical,
            DatasetProfile::Administrative,
        ] {
            let ex = extractor(profile);
            for example in ex.extract(&trace("a", &["A", "B", "A", "C"])) {
                example.check(ex.schema()).unwrap();
            }
        }
    }

    #[test]
    fn test_schema_stable_across_builds() {
        let a = extractor(DatasetProfile::Clinical);
        let b = extractor(DatasetProfile::Clinical);
        assert_eq!(a.schema().names(), b.schema().names());
        assert_eq!(a.schema().fingerprint(), b.schema().fingerprint());
    }

    #[test]
    fn test_later_events_do_not_change_earlier_features() {
        let ex = extractor(DatasetProfile::Clinical);
        let full = trace("a", &["A", "B", "C", "D"]);
        let altered = trace("a", &["A", "B", "X", "Y"]);
        assert_eq!(ex.features_at(&full, 1), ex.features_at(&altered, 1));
    }
}
