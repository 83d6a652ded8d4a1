//! Z-score scaling

use serde::{Deserialize, Serialize};

use super::errors::{TransformError, TransformResult};

/// Per-column mean and scale fitted on training rows
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StandardScaler {
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl StandardScaler {
    /// Fits population mean and standard deviation per column.
    ///
    /// Columns with zero variance get scale 1.
    pub fn fit(rows: &[Vec<f64>], width: usize) -> TransformResult<Self> {
        if rows.is_empty() {
            return Err(TransformError::EmptyDataset);
        }
        check_width(rows, width)?;

        let n = rows.len() as f64;
        let mut means = vec![0.0; width];
        for row in rows {
            for (m, v) in means.iter_mut().zip(row) {
                *m += v;
            }
        }
        means.iter_mut().for_each(|m| *m /= n);

        let mut variances = vec![0.0; width];
        for row in rows {
            for ((var, v), m) in variances.iter_mut().zip(row).zip(&means) {
                *var += (v - m).powi(2);
            }
        }

        let scales = variances
            .into_iter()
            .map(|var| {
                let std = (var / n).sqrt();
                if std > f64::EPSILON {
                    std
                } else {
                    1.0
                }
            })
            .collect();

        Ok(Self { means, scales })
    }

    pub fn means(&self) -> &[f64] {
        &self.means
    }

    pub fn scales(&self) -> &[f64] {
        &self.scales
    }

    pub fn width(&self) -> usize {
        self.means.len()
    }

    /// Scales rows with the fitted statistics
    pub fn transform(&self, rows: &[Vec<f64>]) -> TransformResult<Vec<Vec<f64>>> {
        check_width(rows, self.width())?;
        Ok(rows
            .iter()
            .map(|row| {
                row.iter()
                    .zip(self.means.iter().zip(&self.scales))
                    .map(|(v, (m, s))| (v - m) / s)
                    .collect()
            })
            .collect())
    }
}

fn check_width(rows: &[Vec<f64>], width: usize) -> TransformResult<()> {
    match rows.iter().position(|r| r.len() != width) {
        Some(row) => Err(TransformError::RowWidth {
            row,
            expected: width,
            actual: rows[row].len(),
        }),
        None => Ok(()),
    }
}
