//! Significance statistics
//!
//! Two-sided one-sample Student t-test, with the t distribution tail
//! taken from `statrs`.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Outcome of a one-sample t-test
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TTest {
    pub t_statistic: f64,
    pub p_value: f64,
    pub degrees_of_freedom: usize,
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator)
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}

/// Population standard deviation (n denominator)
pub fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (ss / values.len() as f64).sqrt()
}

/// Tests whether `values` have mean `mu`.
///
/// Returns `None` for fewer than two values, or when the t distribution
/// cannot be built for the sample. With zero spread the
/// p-value is 1 when the sample mean equals `mu` and 0 otherwise.
pub fn one_sample_t_test(values: &[f64], mu: f64) -> Option<TTest> {
    if values.len() < 2 {
        return None;
    }
    let df = values.len() - 1;
    let m = mean(values);
    let sd = sample_std(values);

    if sd == 0.0 {
        let (t_statistic, p_value) = if m == mu {
            (0.0, 1.0)
        } else {
            ((m - mu).signum() * f64::INFINITY, 0.0)
        };
        return Some(TTest {
            t_statistic,
            p_value,
            degrees_of_freedom: df,
        });
    }

    let t = (m - mu) / (sd / (values.len() as f64).sqrt());
    Some(TTest {
        t_statistic: t,
        p_value: two_sided_t_p_value(t, df as f64)?,
        degrees_of_freedom: df,
    })
}

/// P(|T| ≥ |t|) for Student's t with `df` degrees of freedom
///
/// `None` when `df` is not a positive number.
pub fn two_sided_t_p_value(t: f64, df: f64) -> Option<f64> {
    if !t.is_finite() {
        return Some(0.0);
    }
    let dist = StudentsT::new(0.0, 1.0, df).ok()?;
    Some((2.0 * dist.sf(t.abs())).clamp(0.0, 1.0))
}
