//! Clinical profile features
//!
//! Time context, recent activity history, department movement, running
//! lab-test statistics and binary criterion dynamics. Missing lab readings
//! are absent, not zero: statistics only cover observed values. The raw
//! reading of the current event is 0.0 when it has none.

use chrono::{Datelike, Timelike, Weekday};

use crate::log::{Event, LogColumns};

use super::extractor::FeatureFamily;
use super::profile::ExtractionConfig;
use super::schema::{FeatureDef, FeatureValue};
use super::window::{category, transitions, Window, START, UNKNOWN};

/// Criterion columns summed into `SIRS_combined`
const COMBINED_CRITERIA: [&str; 4] = [
    "SIRSCritTemperature",
    "SIRSCritHeartRate",
    "SIRSCritLeucos",
    "SIRSCritRespiratory",
];

/// Running statistics of one lab test over a window
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LabStats {
    pub last: f64,
    pub mean: f64,
    pub max: f64,
    pub count: usize,
}

impl LabStats {
    /// Statistics over observed numeric readings; all zero when none
    pub fn over(events: &[Event], column: &str) -> Self {
        let readings: Vec<f64> = events
            .iter()
            .filter_map(|e| e.attribute(column).as_f64())
            .collect();

        let Some(&last) = readings.last() else {
            return Self::default();
        };

        let count = readings.len();
        Self {
            last,
            mean: readings.iter().sum::<f64>() / count as f64,
            max: readings.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            count,
        }
    }
}

/// Clinical feature family
#[derive(Debug, Clone)]
pub struct ClinicalFamily {
    group: Option<String>,
    history: usize,
    lab_tests: Vec<String>,
    criteria: Vec<String>,
    causal: bool,
    combined_criteria: bool,
}

impl ClinicalFamily {
    pub fn new(columns: &LogColumns, group: &str, config: &ExtractionConfig) -> Self {
        let criteria: Vec<String> = config
            .criterion_columns(columns)
            .map(str::to_string)
            .collect();

        Self {
            group: columns.contains(group).then(|| group.to_string()),
            history: config.history_window,
            lab_tests: config.present_lab_tests(columns).map(str::to_string).collect(),
            combined_criteria: columns.contains(COMBINED_CRITERIA[0])
                && columns.contains(COMBINED_CRITERIA[1]),
            criteria,
            causal: config.causal_features,
        }
    }

    fn criterion_active(event: &Event, column: &str) -> bool {
        event.attribute(column).as_bool().unwrap_or(false)
    }

    fn department(&self, event: &Event) -> String {
        match &self.group {
            Some(group) => category(event, group),
            None => UNKNOWN.to_string(),
        }
    }

    /// Length of the run of identical departments ending at the current event
    fn department_streak(&self, window: &Window<'_>) -> usize {
        if self.group.is_none() {
            return 0;
        }
        let current = self.department(window.current());
        window
            .events()
            .iter()
            .rev()
            .take_while(|e| self.department(e) == current)
            .count()
    }
}

impl FeatureFamily for ClinicalFamily {
    fn definitions(&self) -> Vec<FeatureDef> {
        let mut defs = vec![FeatureDef::numeric("time_of_day"), FeatureDef::boolean("weekend")];

        for k in 1..=self.history {
            defs.push(FeatureDef::categorical(format!("prev_event_{}", k)));
        }

        defs.push(FeatureDef::categorical("department"));
        defs.push(FeatureDef::numeric("dept_changes"));
        defs.push(FeatureDef::numeric("current_dept_duration"));

        for test in &self.lab_tests {
            for stat in ["last", "mean", "max", "count"] {
                defs.push(FeatureDef::numeric(format!("{}_{}", test, stat)));
            }
        }
        // Reading on the current event itself
        for test in &self.lab_tests {
            defs.push(FeatureDef::numeric(test.clone()));
        }

        for criterion in &self.criteria {
            defs.push(FeatureDef::boolean(criterion.clone()));
            defs.push(FeatureDef::numeric(format!("{}_changes", criterion)));
            defs.push(FeatureDef::numeric(format!("{}_duration", criterion)));
        }

        if self.causal {
            defs.push(FeatureDef::boolean("dept_changed"));
            if self.combined_criteria {
                defs.push(FeatureDef::numeric("SIRS_combined"));
                defs.push(FeatureDef::numeric("SIRS_severity"));
            }
            for test in &self.lab_tests {
                defs.push(FeatureDef::numeric(format!("{}_change", test)));
                defs.push(FeatureDef::numeric(format!("{}_change_rate", test)));
            }
        }

        defs
    }

    fn compute(&self, window: &Window<'_>, out: &mut Vec<FeatureValue>) {
        let current = window.current();
        let events = window.events();
        let ts = current.timestamp();

        out.push(FeatureValue::Numeric(ts.hour() as f64));
        out.push(FeatureValue::Boolean(matches!(
            ts.weekday(),
            Weekday::Sat | Weekday::Sun
        )));

        // Preceding activities, oldest first, current excluded
        let before = &events[..window.index()];
        let recent = &before[before.len().saturating_sub(self.history)..];
        let padding = self.history - recent.len();
        for _ in 0..padding {
            out.push(FeatureValue::Categorical(START.to_string()));
        }
        for event in recent {
            out.push(FeatureValue::Categorical(event.activity().to_string()));
        }

        let dept_changes = match self.group {
            Some(_) => transitions(events, |e| self.department(e)),
            None => 0,
        };
        out.push(FeatureValue::Categorical(self.department(current)));
        out.push(FeatureValue::Numeric(dept_changes as f64));
        out.push(FeatureValue::Numeric(self.department_streak(window) as f64));

        let stats: Vec<LabStats> = self
            .lab_tests
            .iter()
            .map(|t| LabStats::over(events, t))
            .collect();
        for s in &stats {
            out.push(FeatureValue::Numeric(s.last));
            out.push(FeatureValue::Numeric(s.mean));
            out.push(FeatureValue::Numeric(s.max));
            out.push(FeatureValue::Numeric(s.count as f64));
        }
        for test in &self.lab_tests {
            out.push(FeatureValue::Numeric(
                current.attribute(test).as_f64().unwrap_or(0.0),
            ));
        }

        for criterion in &self.criteria {
            let changes = transitions(events, |e| Self::criterion_active(e, criterion));
            let active = events
                .iter()
                .filter(|e| Self::criterion_active(e, criterion))
                .count();
            out.push(FeatureValue::Boolean(Self::criterion_active(current, criterion)));
            out.push(FeatureValue::Numeric(changes as f64));
            out.push(FeatureValue::Numeric(active as f64));
        }

        if !self.causal {
            return;
        }

        let dept_changed = window
            .previous()
            .map(|prev| self.group.is_some() && self.department(prev) != self.department(current))
            .unwrap_or(false);
        out.push(FeatureValue::Boolean(dept_changed));

        if self.combined_criteria {
            let combined = COMBINED_CRITERIA
                .iter()
                .filter(|c| Self::criterion_active(current, c))
                .count() as f64;
            out.push(FeatureValue::Numeric(combined));
            out.push(FeatureValue::Numeric(combined / 4.0));
        }

        let earlier = window.shrink();
        for (test, s) in self.lab_tests.iter().zip(&stats) {
            let (change, rate) = match earlier {
                Some(prev_window) => {
                    let prev_last = LabStats::over(prev_window.events(), test).last;
                    let change = s.last - prev_last;
                    (change, change / (prev_last + 0.001))
                }
                None => (0.0, 0.0),
            };
            out.push(FeatureValue::Numeric(change));
            out.push(FeatureValue::Numeric(rate));
        }
    }
}
