//! Universal base features and the generic profile

use crate::log::{seconds_between, ColumnMapping, LogColumns};

use super::administrative::Passthrough;
use super::extractor::FeatureFamily;
use super::schema::{FeatureDef, FeatureValue};
use super::window::{category, Window};

/// Features present in every profile
#[derive(Debug, Clone, Default)]
pub struct BaseFamily;

impl FeatureFamily for BaseFamily {
    fn definitions(&self) -> Vec<FeatureDef> {
        vec![
            FeatureDef::categorical("current_activity"),
            FeatureDef::numeric("event_position"),
            FeatureDef::numeric("trace_length"),
            FeatureDef::numeric("time_since_start"),
            FeatureDef::numeric("time_since_last_event"),
            FeatureDef::numeric("repeated_activities"),
            FeatureDef::numeric("unique_activities_so_far"),
        ]
    }

    fn compute(&self, window: &Window<'_>, out: &mut Vec<FeatureValue>) {
        let current = window.current();

        let since_last = window
            .previous()
            .map(|prev| seconds_between(prev.timestamp(), current.timestamp()))
            .unwrap_or(0.0);

        let repeated = window
            .events()
            .iter()
            .filter(|e| e.activity() == current.activity())
            .count();

        out.push(FeatureValue::Categorical(current.activity().to_string()));
        out.push(FeatureValue::Numeric((window.index() + 1) as f64));
        out.push(FeatureValue::Numeric(window.trace_len() as f64));
        out.push(FeatureValue::Numeric(seconds_between(
            window.first().timestamp(),
            current.timestamp(),
        )));
        out.push(FeatureValue::Numeric(since_last));
        out.push(FeatureValue::Numeric(repeated as f64));
        out.push(FeatureValue::Numeric(window.unique_activities() as f64));
    }
}

/// Generic profile: the current department when the log carries one,
/// plus a current-event copy of every other attribute column
#[derive(Debug, Clone)]
pub struct GenericFamily {
    group: Option<String>,
    current: Vec<Passthrough>,
}

impl GenericFamily {
    pub fn new(columns: &LogColumns, mapping: &ColumnMapping) -> Self {
        let group = columns
            .contains(&mapping.group)
            .then(|| mapping.group.clone());
        let current = Passthrough::columns(columns, mapping, |c| c == mapping.group);
        Self { group, current }
    }
}

impl FeatureFamily for GenericFamily {
    fn definitions(&self) -> Vec<FeatureDef> {
        let mut defs = Vec::new();
        if self.group.is_some() {
            defs.push(FeatureDef::categorical("department"));
        }
        defs.extend(self.current.iter().map(Passthrough::definition));
        defs
    }

    fn compute(&self, window: &Window<'_>, out: &mut Vec<FeatureValue>) {
        let current = window.current();
        if let Some(group) = &self.group {
            out.push(FeatureValue::Categorical(category(current, group)));
        }
        for p in &self.current {
            out.push(p.value(current));
        }
    }
}
