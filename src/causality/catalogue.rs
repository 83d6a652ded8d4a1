//! Hypothesis catalogue per dataset profile
//!
//! Each entry names substring patterns over feature names. A defined
//! hypothesis takes every trained feature matching a pattern, or the
//! entry's fallback list when nothing matches, so its feature group is
//! never empty.

use crate::features::DatasetProfile;

use super::condition::{CompareOp, Condition};
use super::hypothesis::{Hypothesis, HypothesisKind, OutcomeGroup, TargetGroup};

#[derive(Debug, Clone, Copy)]
pub(crate) enum EntryStyle {
    /// Empty target list means every row
    Importance { target: &'static [&'static str] },
    Conditional {
        feature: &'static str,
        op: CompareOp,
        value: f64,
        outcome: &'static [&'static str],
    },
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct CatalogueEntry {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub patterns: &'static [&'static str],
    pub fallback: &'static [&'static str],
    pub style: EntryStyle,
}

impl CatalogueEntry {
    /// Trained features matching a pattern, in trained order
    fn matching_features(&self, feature_names: &[String]) -> Vec<String> {
        feature_names
            .iter()
            .filter(|name| self.patterns.iter().any(|p| name.contains(p)))
            .cloned()
            .collect()
    }

    pub fn define(&self, feature_names: &[String]) -> Hypothesis {
        let mut features = self.matching_features(feature_names);
        if features.is_empty() {
            features = self.fallback.iter().map(|f| f.to_string()).collect();
        }

        let kind = match self.style {
            EntryStyle::Importance { target } => HypothesisKind::Importance {
                target: TargetGroup::activities(target),
            },
            EntryStyle::Conditional {
                feature,
                op,
                value,
                outcome,
            } => HypothesisKind::Conditional {
                condition: Condition::compare(feature, op, value),
                outcome: OutcomeGroup::new(outcome),
            },
        };

        Hypothesis {
            id: self.id.to_string(),
            name: self.name.to_string(),
            description: self.description.to_string(),
            features,
            kind,
        }
    }
}

const GENERIC: &[CatalogueEntry] = &[
    CatalogueEntry {
        id: "generic.temporal_factors",
        name: "Timing drives the next activity",
        description: "Elapsed time since case start and since the previous event",
        patterns: &["time_since"],
        fallback: &["time_since_start", "time_since_last_event"],
        style: EntryStyle::Importance { target: &[] },
    },
    CatalogueEntry {
        id: "generic.process_progress",
        name: "Case progress drives the next activity",
        description: "Position in the case, case length and activity variety so far",
        patterns: &["event_position", "trace_length", "unique_activities"],
        fallback: &["event_position", "trace_length"],
        style: EntryStyle::Importance { target: &[] },
    },
    CatalogueEntry {
        id: "generic.rework",
        name: "Rework drives the next activity",
        description: "Repetition of the current activity within the case",
        patterns: &["repeated_activities", "current_activity"],
        fallback: &["repeated_activities", "current_activity"],
        style: EntryStyle::Importance { target: &[] },
    },
];

const CLINICAL: &[CatalogueEntry] = &[
    CatalogueEntry {
        id: "clinical.lab_markers",
        name: "Diagnostic lab results drive subsequent events",
        description: "Importance of lab test readings for release and admission events",
        patterns: &["CRP_", "Leucocytes_", "LacticAcid_"],
        fallback: &["CRP_last", "Leucocytes_last"],
        style: EntryStyle::Importance {
            target: &["Release", "Admission"],
        },
    },
    CatalogueEntry {
        id: "clinical.sirs_criteria",
        name: "SIRS criteria drive diagnostic test requests",
        description: "Importance of SIRS criteria for lab test events",
        patterns: &["SIRS"],
        fallback: &["SIRSCritLeucos", "SIRSCritTemperature"],
        style: EntryStyle::Importance {
            target: &["CRP", "Leucocytes", "LacticAcid"],
        },
    },
    CatalogueEntry {
        id: "clinical.department_transfers",
        name: "Department transfers shape event sequences",
        description: "Importance of department changes and stay length for release and return events",
        patterns: &["dept_", "department"],
        fallback: &["dept_changes", "current_dept_duration"],
        style: EntryStyle::Importance {
            target: &["Release", "Return ER"],
        },
    },
    CatalogueEntry {
        id: "clinical.temporal_markers",
        name: "Timing and marker change rates drive subsequent events",
        description: "Importance of elapsed time and lab value changes",
        patterns: &["time_since", "_change", "time_of_day"],
        fallback: &["time_since_start", "CRP_change", "Leucocytes_change"],
        style: EntryStyle::Importance { target: &[] },
    },
    CatalogueEntry {
        id: "clinical.lab_outcome",
        name: "A CRP reading precedes release or admission",
        description: "Predicted release/admission rate with and without a CRP reading",
        patterns: &["CRP_last", "Leucocytes_last"],
        fallback: &["CRP_last", "Leucocytes_last"],
        style: EntryStyle::Conditional {
            feature: "CRP_last",
            op: CompareOp::Gt,
            value: 0.0,
            outcome: &["Release A", "Admission NC"],
        },
    },
    CatalogueEntry {
        id: "clinical.sirs_testing",
        name: "Changing SIRS leucocyte criterion leads to lab tests",
        description: "Predicted lab test rate when the leucocyte criterion has changed",
        patterns: &["SIRSCritLeucos", "SIRSCritTemperature"],
        fallback: &["SIRSCritLeucos", "SIRSCritTemperature"],
        style: EntryStyle::Conditional {
            feature: "SIRSCritLeucos_changes",
            op: CompareOp::Gt,
            value: 0.0,
            outcome: &["CRP", "Leucocytes"],
        },
    },
    CatalogueEntry {
        id: "clinical.transfer_outcome",
        name: "Repeated transfers lead to release or return",
        description: "Predicted release/return rate after more than one department change",
        patterns: &["dept_changes", "current_dept_duration"],
        fallback: &["dept_changes", "current_dept_duration"],
        style: EntryStyle::Conditional {
            feature: "dept_changes",
            op: CompareOp::Gt,
            value: 1.0,
            outcome: &["Release", "Return ER"],
        },
    },
    CatalogueEntry {
        id: "clinical.stay_length",
        name: "Long stays lead to admission or release",
        description: "Predicted admission/release rate after the first day",
        patterns: &["time_since_start"],
        fallback: &["time_since_start"],
        style: EntryStyle::Conditional {
            feature: "time_since_start",
            op: CompareOp::Gt,
            value: 86_400.0,
            outcome: &["Admission", "Release"],
        },
    },
];

const ADMINISTRATIVE: &[CatalogueEntry] = &[
    CatalogueEntry {
        id: "administrative.process_complexity",
        name: "Complex cases draw management oversight",
        description: "Importance of case length and activity variety for supervisor events",
        patterns: &["trace_length", "unique_activities", "complexity_score"],
        fallback: &["trace_length", "unique_activities_so_far"],
        style: EntryStyle::Importance {
            target: &["SUPERVISOR"],
        },
    },
    CatalogueEntry {
        id: "administrative.approval_history",
        name: "Earlier approvals and rejections drive later decisions",
        description: "Importance of prior approval and rejection counts for decision events",
        patterns: &["approval_count", "rejection_count", "state_"],
        fallback: &["time_since_last_event", "event_position"],
        style: EntryStyle::Importance {
            target: &["APPROVED", "REJECTED"],
        },
    },
    CatalogueEntry {
        id: "administrative.resources",
        name: "Resource changes drive control steps",
        description: "Importance of organisational role and resource features for final approval",
        patterns: &["org:role", "org:resource", "resource_changes"],
        fallback: &["current_org:role", "event_position"],
        style: EntryStyle::Importance {
            target: &["FINAL_APPROVED"],
        },
    },
    CatalogueEntry {
        id: "administrative.temporal_factors",
        name: "Timing drives the workflow",
        description: "Importance of elapsed time features",
        patterns: &["time_since"],
        fallback: &["time_since_start", "time_since_last_event"],
        style: EntryStyle::Importance { target: &[] },
    },
    CatalogueEntry {
        id: "administrative.long_trace_rejection",
        name: "Long cases lead to rejections",
        description: "Predicted rejection rate for cases longer than five events",
        patterns: &["trace_length", "time_since_start"],
        fallback: &["trace_length", "time_since_start"],
        style: EntryStyle::Conditional {
            feature: "trace_length",
            op: CompareOp::Gt,
            value: 5.0,
            outcome: &["REJECTED"],
        },
    },
    CatalogueEntry {
        id: "administrative.quick_approval",
        name: "Quick succession leads to approval",
        description: "Predicted approval rate within an hour of the previous event",
        patterns: &["time_since_last_event", "event_position"],
        fallback: &["time_since_last_event", "event_position"],
        style: EntryStyle::Conditional {
            feature: "time_since_last_event",
            op: CompareOp::Lt,
            value: 3_600.0,
            outcome: &["APPROVED"],
        },
    },
    CatalogueEntry {
        id: "administrative.supervisor_oversight",
        name: "Varied cases reach a supervisor",
        description: "Predicted supervisor rate after more than four distinct activities",
        patterns: &["trace_length", "unique_activities_so_far"],
        fallback: &["trace_length", "unique_activities_so_far"],
        style: EntryStyle::Conditional {
            feature: "unique_activities_so_far",
            op: CompareOp::Gt,
            value: 4.0,
            outcome: &["SUPERVISOR"],
        },
    },
    CatalogueEntry {
        id: "administrative.prior_rejection",
        name: "An earlier rejection leads to another",
        description: "Predicted rejection rate after at least one rejection",
        patterns: &["rejection_count", "current_activity"],
        fallback: &["rejection_count", "current_activity"],
        style: EntryStyle::Conditional {
            feature: "rejection_count",
            op: CompareOp::Gt,
            value: 0.0,
            outcome: &["REJECTED"],
        },
    },
    CatalogueEntry {
        id: "administrative.resource_control",
        name: "Resource handovers lead to final approval",
        description: "Predicted final approval rate after a resource change",
        patterns: &["resource_changes", "event_position"],
        fallback: &["resource_changes", "event_position"],
        style: EntryStyle::Conditional {
            feature: "resource_changes",
            op: CompareOp::Gt,
            value: 0.0,
            outcome: &["FINAL_APPROVED"],
        },
    },
    CatalogueEntry {
        id: "administrative.slow_case_approval",
        name: "Week-old cases still get approved",
        description: "Predicted approval rate for cases open longer than a week",
        patterns: &["time_since_start", "time_since_last_event"],
        fallback: &["time_since_start", "time_since_last_event"],
        style: EntryStyle::Conditional {
            feature: "time_since_start",
            op: CompareOp::Gt,
            value: 604_800.0,
            outcome: &["APPROVED"],
        },
    },
];

pub(crate) fn entries(profile: DatasetProfile) -> &'static [CatalogueEntry] {
    match profile {
        DatasetProfile::Generic => GENERIC,
        DatasetProfile::Clinical => CLINICAL,
        DatasetProfile::Administrative => ADMINISTRATIVE,
    }
}
