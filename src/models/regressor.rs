//! Regressor capability and the linear model artifact

use crate::types::batch::FeatureBatch;
use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A fitted model that maps each row of a batch to a price.
///
/// Implementations are read-only during inference so one ensemble can serve
/// concurrent requests.
pub trait Regressor: Send + Sync {
    /// Predict one value per row of `batch`.
    fn predict(&self, batch: &FeatureBatch) -> Result<Vec<f64>>;
}

/// Ordinary least squares model persisted as JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LinearRegressor {
    /// Columns the coefficients were fitted against, in order
    pub feature_names: Vec<String>,
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl LinearRegressor {
    pub fn new(feature_names: Vec<String>, intercept: f64, coefficients: Vec<f64>) -> Result<Self> {
        ensure!(
            feature_names.len() == coefficients.len(),
            "linear model has {} feature names but {} coefficients",
            feature_names.len(),
            coefficients.len()
        );
        Ok(Self {
            feature_names,
            intercept,
            coefficients,
        })
    }

    /// Load a linear model artifact from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read linear model from {:?}", path))?;
        let model: LinearRegressor = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse linear model {:?}", path))?;
        Self::new(model.feature_names, model.intercept, model.coefficients)
    }
}

impl Regressor for LinearRegressor {
    fn predict(&self, batch: &FeatureBatch) -> Result<Vec<f64>> {
        ensure!(
            batch.columns() == self.feature_names.as_slice(),
            "batch columns {:?} do not match fitted columns {:?}",
            batch.columns(),
            self.feature_names
        );

        Ok(batch
            .rows()
            .iter()
            .map(|row| {
                self.intercept
                    + row
                        .iter()
                        .zip(&self.coefficients)
                        .map(|(x, w)| x * w)
                        .sum::<f64>()
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns() -> Vec<String> {
        vec!["living area".to_string(), "number of bedrooms".to_string()]
    }

    #[test]
    fn test_linear_prediction() {
        let model = LinearRegressor::new(columns(), 10_000.0, vec![200.0, 5_000.0]).unwrap();
        let batch =
            FeatureBatch::new(columns(), vec![vec![1500.0, 3.0], vec![2000.0, 4.0]]).unwrap();

        let predictions = model.predict(&batch).unwrap();

        assert_eq!(predictions, vec![325_000.0, 430_000.0]);
    }

    #[test]
    fn test_coefficient_count_mismatch() {
        assert!(LinearRegressor::new(columns(), 0.0, vec![1.0]).is_err());
    }

    #[test]
    fn test_column_mismatch_fails_prediction() {
        let model = LinearRegressor::new(columns(), 0.0, vec![1.0, 1.0]).unwrap();
        let batch = FeatureBatch::new(
            vec!["lot area".to_string(), "number of bedrooms".to_string()],
            vec![vec![4000.0, 3.0]],
        )
        .unwrap();

        assert!(model.predict(&batch).is_err());
    }
}
