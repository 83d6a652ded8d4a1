//! Row predicates for condition/outcome hypotheses
//!
//! Conditions are evaluated on encoded, unscaled feature rows, so
//! thresholds read in the units the features were extracted in
//! (seconds, counts, lab values).

use std::fmt;

use serde::{Deserialize, Serialize};

use super::errors::{CausalityError, CausalityResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    Gt,
    Ge,
    Lt,
    Le,
    Eq,
    Ne,
}

impl CompareOp {
    pub fn apply(self, left: f64, right: f64) -> bool {
        match self {
            CompareOp::Gt => left > right,
            CompareOp::Ge => left >= right,
            CompareOp::Lt => left < right,
            CompareOp::Le => left <= right,
            CompareOp::Eq => left == right,
            CompareOp::Ne => left != right,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
        }
    }
}

/// Boolean predicate over one feature row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    Compare {
        feature: String,
        op: CompareOp,
        value: f64,
    },
    All {
        conditions: Vec<Condition>,
    },
    Any {
        conditions: Vec<Condition>,
    },
}

impl Condition {
    pub fn compare(feature: impl Into<String>, op: CompareOp, value: f64) -> Self {
        Condition::Compare {
            feature: feature.into(),
            op,
            value,
        }
    }

    /// Every feature the condition reads, in first-use order
    pub fn features(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_features(&mut out);
        out
    }

    fn collect_features<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Condition::Compare { feature, .. } => {
                if !out.contains(&feature.as_str()) {
                    out.push(feature.as_str());
                }
            }
            Condition::All { conditions } | Condition::Any { conditions } => {
                for c in conditions {
                    c.collect_features(out);
                }
            }
        }
    }

    /// Evaluates the condition on `row`, whose columns are named by `names`
    pub fn evaluate(&self, names: &[String], row: &[f64]) -> CausalityResult<bool> {
        match self {
            Condition::Compare { feature, op, value } => {
                let index = names
                    .iter()
                    .position(|n| n == feature)
                    .ok_or_else(|| CausalityError::UnknownFeature(feature.clone()))?;
                let cell = row.get(index).copied().ok_or_else(|| {
                    CausalityError::Misaligned(format!(
                        "row has {} values, feature '{}' is column {}",
                        row.len(),
                        feature,
                        index
                    ))
                })?;
                Ok(op.apply(cell, *value))
            }
            Condition::All { conditions } => {
                for c in conditions {
                    if !c.evaluate(names, row)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Condition::Any { conditions } => {
                for c in conditions {
                    if c.evaluate(names, row)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, parts: &[Condition], sep: &str) -> fmt::Result {
    write!(f, "(")?;
    for (i, c) in parts.iter().enumerate() {
        if i > 0 {
            write!(f, " {} ", sep)?;
        }
        write!(f, "{}", c)?;
    }
    write!(f, ")")
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Compare { feature, op, value } => {
                write!(f, "{} {} {}", feature, op.symbol(), value)
            }
            Condition::All { conditions } => write_joined(f, conditions, "and"),
            Condition::Any { conditions } => write_joined(f, conditions, "or"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> Vec<String> {
        vec!["CRP_last".into(), "dept_changes".into()]
    }

    #[test]
    fn test_compare() {
        let c = Condition::compare("CRP_last", CompareOp::Gt, 0.0);
        assert!(c.evaluate(&names(), &[12.0, 0.0]).unwrap());
        assert!(!c.evaluate(&names(), &[0.0, 0.0]).unwrap());
        assert_eq!(c.to_string(), "CRP_last > 0");
    }

    #[test]
    fn test_combinators() {
        let all = Condition::All {
            conditions: vec![
                Condition::compare("CRP_last", CompareOp::Gt, 0.0),
                Condition::compare("dept_changes", CompareOp::Ge, 2.0),
            ],
        };
        assert!(!all.evaluate(&names(), &[1.0, 1.0]).unwrap());
        assert!(all.evaluate(&names(), &[1.0, 2.0]).unwrap());

        let any = Condition::Any {
            conditions: all_parts(&all),
        };
        assert!(any.evaluate(&names(), &[1.0, 1.0]).unwrap());
        assert_eq!(any.to_string(), "(CRP_last > 0 or dept_changes >= 2)");
        assert_eq!(any.features(), vec!["CRP_last", "dept_changes"]);
    }

    fn all_parts(c: &Condition) -> Vec<Condition> {
        match c {
            Condition::All { conditions } => conditions.clone(),
            _ => vec![],
        }
    }

    #[test]
    fn test_unknown_feature_is_error() {
        let c = Condition::compare("Leucocytes_last", CompareOp::Lt, 3.0);
        assert_eq!(
            c.evaluate(&names(), &[1.0, 1.0]).unwrap_err(),
            CausalityError::UnknownFeature("Leucocytes_last".into())
        );
    }

    #[test]
    fn test_serde_shape() {
        let c: Condition = serde_json::from_str(
            r#"{"type": "compare", "feature": "trace_length", "op": "gt", "value": 5}"#,
        )
        .unwrap();
        assert_eq!(c, Condition::compare("trace_length", CompareOp::Gt, 5.0));
    }
}
