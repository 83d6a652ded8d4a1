//! Administrative profile features

use crate::log::{ColumnKind, ColumnMapping, Event, LogColumns};

use super::extractor::FeatureFamily;
use super::profile::ExtractionConfig;
use super::schema::{FeatureDef, FeatureKind, FeatureValue};
use super::window::{category, transitions, Window};

/// Identifier columns are never copied as features
fn is_identifier(column: &str) -> bool {
    let lower = column.to_ascii_lowercase();
    lower == "id" || lower.ends_with(":id") || lower.ends_with("_id")
}

fn is_state_column(column: &str) -> bool {
    column.contains("APPROVED") || column.contains("REJECTED")
}

/// Current-event copy of one attribute column, neutral when absent
#[derive(Debug, Clone)]
pub(crate) struct Passthrough {
    column: String,
    kind: FeatureKind,
}

impl Passthrough {
    /// Every attribute column not structural, not an identifier and not
    /// rejected by `skip`, in column order
    pub(crate) fn columns(
        columns: &LogColumns,
        mapping: &ColumnMapping,
        skip: impl Fn(&str) -> bool,
    ) -> Vec<Passthrough> {
        columns
            .names()
            // `current_activity` is a base feature
            .filter(|c| *c != "activity")
            .filter(|c| !mapping.is_structural(c) && !is_identifier(c) && !skip(*c))
            .map(|c| Passthrough {
                column: c.to_string(),
                kind: match columns.kind(c) {
                    Some(ColumnKind::Numeric) => FeatureKind::Numeric,
                    Some(ColumnKind::Boolean) => FeatureKind::Boolean,
                    _ => FeatureKind::Categorical,
                },
            })
            .collect()
    }

    pub(crate) fn definition(&self) -> FeatureDef {
        FeatureDef::new(format!("current_{}", self.column), self.kind)
    }

    pub(crate) fn value(&self, event: &Event) -> FeatureValue {
        let attr = event.attribute(&self.column);
        match self.kind {
            FeatureKind::Numeric => FeatureValue::Numeric(attr.as_f64().unwrap_or(0.0)),
            FeatureKind::Boolean => FeatureValue::Boolean(attr.as_bool().unwrap_or(false)),
            FeatureKind::Categorical => FeatureValue::Categorical(category(event, &self.column)),
        }
    }
}

/// Administrative feature family
#[derive(Debug, Clone)]
pub struct AdministrativeFamily {
    amount: Option<String>,
    states: Vec<String>,
    current: Vec<Passthrough>,
    resource: Option<String>,
    causal: bool,
}

impl AdministrativeFamily {
    pub fn new(columns: &LogColumns, mapping: &ColumnMapping, config: &ExtractionConfig) -> Self {
        let amount = columns
            .contains(&config.amount_column)
            .then(|| config.amount_column.clone());

        let states: Vec<String> = columns
            .names()
            .filter(|c| is_state_column(c))
            .map(str::to_string)
            .collect();

        let current = Passthrough::columns(columns, mapping, |c| {
            Some(c) == amount.as_deref() || is_state_column(c)
        });

        Self {
            amount,
            states,
            current,
            resource: columns
                .contains(&mapping.resource)
                .then(|| mapping.resource.clone()),
            causal: config.causal_features,
        }
    }
}

impl FeatureFamily for AdministrativeFamily {
    fn definitions(&self) -> Vec<FeatureDef> {
        let mut defs = Vec::new();

        if self.amount.is_some() {
            defs.push(FeatureDef::numeric("amount"));
        }
        for state in &self.states {
            defs.push(FeatureDef::boolean(format!("state_{}", state)));
        }
        defs.extend(self.current.iter().map(Passthrough::definition));

        if self.causal {
            defs.push(FeatureDef::numeric("complexity_score"));
            defs.push(FeatureDef::numeric("approval_count"));
            defs.push(FeatureDef::numeric("rejection_count"));
            if self.resource.is_some() {
                defs.push(FeatureDef::numeric("resource_changes"));
            }
        }

        defs
    }

    fn compute(&self, window: &Window<'_>, out: &mut Vec<FeatureValue>) {
        let current = window.current();

        if let Some(amount) = &self.amount {
            out.push(FeatureValue::Numeric(
                current.attribute(amount).as_f64().unwrap_or(0.0),
            ));
        }
        for state in &self.states {
            out.push(FeatureValue::Boolean(
                current.attribute(state).as_bool().unwrap_or(false),
            ));
        }
        for p in &self.current {
            out.push(p.value(current));
        }

        if !self.causal {
            return;
        }

        let events = window.events();
        let complexity = window.trace_len() as f64 * window.unique_activities() as f64 / 100.0;
        let approvals = events
            .iter()
            .filter(|e| e.activity().contains("APPROVED") || e.activity().contains("COMPLETE"))
            .count();
        let rejections = events
            .iter()
            .filter(|e| e.activity().contains("REJECTED"))
            .count();

        out.push(FeatureValue::Numeric(complexity));
        out.push(FeatureValue::Numeric(approvals as f64));
        out.push(FeatureValue::Numeric(rejections as f64));
        if let Some(resource) = &self.resource {
            let changes = transitions(events, |e| category(e, resource));
            out.push(FeatureValue::Numeric(changes as f64));
        }
    }
}
