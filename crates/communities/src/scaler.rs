use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Per-column standardization to zero mean and unit population variance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub means: Vec<f64>,
    /// Population std per column, 1 for constant columns
    pub scales: Vec<f64>,
}

impl StandardScaler {
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self> {
        let Some(first) = rows.first() else {
            bail!("Cannot fit a scaler on an empty matrix");
        };
        let width = first.len();
        if rows.iter().any(|r| r.len() != width) {
            bail!("Feature rows have different lengths");
        }

        let mut means = Vec::with_capacity(width);
        let mut scales = Vec::with_capacity(width);

        for col in 0..width {
            let column: Vec<f64> = rows.iter().map(|r| r[col]).collect();
            let mean = statistical::mean(&column);
            let std = statistical::population_standard_deviation(&column, Some(mean));

            means.push(mean);
            scales.push(if std > 0.0 { std } else { 1.0 });
        }

        Ok(Self { means, scales })
    }

    pub fn transform(&self, rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
        rows.iter()
            .map(|row| {
                row.iter()
                    .zip(self.means.iter().zip(&self.scales))
                    .map(|(x, (mean, scale))| (x - mean) / scale)
                    .collect()
            })
            .collect()
    }

    pub fn fit_transform(rows: &[Vec<f64>]) -> Result<(Self, Vec<Vec<f64>>)> {
        let scaler = Self::fit(rows)?;
        let scaled = scaler.transform(rows);
        Ok((scaler, scaled))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standardizes_columns() {
        let rows = vec![vec![1.0, 5.0], vec![3.0, 5.0]];
        let (scaler, scaled) = StandardScaler::fit_transform(&rows).unwrap();

        assert_eq!(scaler.means, vec![2.0, 5.0]);
        // constant column keeps scale 1
        assert_eq!(scaler.scales, vec![1.0, 1.0]);
        assert_eq!(scaled, vec![vec![-1.0, 0.0], vec![1.0, 0.0]]);
    }

    #[test]
    fn test_rejects_empty_and_ragged_input() {
        assert!(StandardScaler::fit(&[]).is_err());
        assert!(StandardScaler::fit(&[vec![1.0], vec![1.0, 2.0]]).is_err());
    }
}
