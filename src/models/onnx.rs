//! ONNX Runtime regressor for exported tree and boosting models

use crate::models::regressor::Regressor;
use crate::types::batch::FeatureBatch;
use anyhow::{anyhow, ensure, Context, Result};
use ort::session::{builder::GraphOptimizationLevel, Session, SessionOutputs};
use ort::value::Tensor;
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

/// Regressor backed by an ONNX Runtime session.
///
/// Running a session needs exclusive access, so the session sits behind a
/// mutex; concurrent predictions on the same member are serialized.
pub struct OnnxRegressor {
    name: String,
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
}

impl OnnxRegressor {
    /// Load an ONNX model from file
    pub fn from_file<P: AsRef<Path>>(path: P, name: &str, intra_threads: usize) -> Result<Self> {
        let path = path.as_ref();

        info!(model = %name, path = %path.display(), threads = intra_threads, "Loading ONNX model");

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(intra_threads)?
            .commit_from_file(path)
            .context(format!("Failed to load model from {:?}", path))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "float_input".to_string());

        // sklearn-onnx names the regression output "variable"; fall back to the first output
        let output_name = session
            .outputs
            .iter()
            .find(|o| o.name == "variable" || o.name.contains("predict"))
            .or_else(|| session.outputs.first())
            .map(|o| o.name.clone())
            .unwrap_or_else(|| "variable".to_string());

        info!(
            model = %name,
            input = %input_name,
            output = %output_name,
            "Model loaded successfully"
        );

        Ok(Self {
            name: name.to_string(),
            session: Mutex::new(session),
            input_name,
            output_name,
        })
    }

    fn extract_predictions(&self, outputs: &SessionOutputs, n_samples: usize) -> Result<Vec<f64>> {
        let output = outputs
            .get(self.output_name.as_str())
            .ok_or_else(|| anyhow!("output '{}' missing from model results", self.output_name))?;

        let (shape, data) = output
            .try_extract_tensor::<f32>()
            .context("regression output is not a float tensor")?;

        // Either [n] or [n, 1]
        let dims: Vec<i64> = shape.iter().copied().collect();
        ensure!(
            data.len() == n_samples,
            "output shape {:?} does not hold {} predictions",
            dims,
            n_samples
        );

        debug!(model = %self.name, shape = ?dims, "Extracted regression output");
        Ok(data.iter().map(|&v| v as f64).collect())
    }
}

impl Regressor for OnnxRegressor {
    fn predict(&self, batch: &FeatureBatch) -> Result<Vec<f64>> {
        let shape = vec![batch.len() as i64, batch.width() as i64];
        let input_tensor = Tensor::from_array((shape, batch.to_f32_row_major()))
            .context("Failed to create input tensor")?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| anyhow!("Lock error: {}", e))?;

        let outputs = session.run(ort::inputs![self.input_name.as_str() => input_tensor])?;
        self.extract_predictions(&outputs, batch.len())
    }
}
