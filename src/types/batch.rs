//! Feature batch passed to every regressor in the ensemble

use crate::error::FeatureError;

/// A matrix of feature rows sharing one ordered set of named columns.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureBatch {
    columns: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl FeatureBatch {
    /// Build a batch, rejecting rows whose width differs from the column list.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self, FeatureError> {
        for (row, values) in rows.iter().enumerate() {
            if values.len() != columns.len() {
                return Err(FeatureError::RaggedRow {
                    row,
                    expected: columns.len(),
                    actual: values.len(),
                });
            }
        }
        Ok(Self { columns, rows })
    }

    /// Column names in model order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Number of samples (rows)
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of feature columns
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Row-major values as `f32`, the layout ONNX tensors expect.
    pub fn to_f32_row_major(&self) -> Vec<f32> {
        self.rows
            .iter()
            .flat_map(|row| row.iter().map(|&v| v as f32))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns() -> Vec<String> {
        vec!["living area".to_string(), "lot area".to_string()]
    }

    #[test]
    fn test_batch_shape() {
        let batch =
            FeatureBatch::new(columns(), vec![vec![1500.0, 4000.0], vec![2000.0, 5000.0]]).unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.width(), 2);
        assert!(!batch.is_empty());
        assert_eq!(batch.to_f32_row_major(), vec![1500.0, 4000.0, 2000.0, 5000.0]);
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let err = FeatureBatch::new(columns(), vec![vec![1500.0, 4000.0], vec![2000.0]])
            .unwrap_err();

        assert_eq!(
            err,
            FeatureError::RaggedRow {
                row: 1,
                expected: 2,
                actual: 1
            }
        );
    }
}
