//! Ensemble inference engine for house price prediction

use crate::config::AppConfig;
use crate::error::EnsembleError;
use crate::models::aggregator::{EnsembleMember, VotingEnsemble, VotingMethod, VotingReport};
use crate::models::loader::{LoadedModel, ModelLoader};
use crate::types::batch::FeatureBatch;
use crate::types::quote::PriceQuote;
use anyhow::{Context, Result};
use tracing::{debug, info, warn};

/// Result of ensemble inference for one batch
#[derive(Debug, Clone)]
pub struct PredictionResult {
    /// Final price per sample
    pub prices: Vec<f64>,
    /// Voting diagnostics
    pub report: VotingReport,
}

impl PredictionResult {
    /// Convert prediction result to a reply quote
    pub fn to_quote(&self, currency: &str) -> PriceQuote {
        PriceQuote::new(self.prices.clone(), currency, self.report.method.as_str())
            .with_diagnostics(
                self.report.model_predictions(),
                self.report.failed_models(),
                self.report.weight_map(),
            )
    }
}

/// Voting ensemble bound to the feature layout its members were trained on
pub struct InferenceEngine {
    ensemble: VotingEnsemble,
    /// Expected feature columns, in order
    feature_columns: Vec<String>,
}

impl InferenceEngine {
    /// Create a new inference engine from configuration
    pub fn new(config: &AppConfig, feature_columns: Vec<String>) -> Result<Self> {
        let method = config
            .models
            .voting_method()
            .context("Invalid voting method")?;

        let loader = ModelLoader::with_threads(config.models.onnx_threads);
        let models = loader.load_members(&config.models.models_dir, &config.models.members)?;

        let engine = Self::from_models(models, method, feature_columns)?;

        info!(
            method = %engine.method(),
            models = ?engine.model_names(),
            weights = ?engine.ensemble.weights(),
            "Inference engine initialized"
        );

        Ok(engine)
    }

    /// Build the ensemble from loaded members.
    ///
    /// Weights are used only when every member carries one; a partial set is
    /// ignored with a warning, which makes weighted voting fail construction.
    pub fn from_models(
        models: Vec<LoadedModel>,
        method: VotingMethod,
        feature_columns: Vec<String>,
    ) -> Result<Self> {
        let weights: Option<Vec<f64>> = models.iter().map(|m| m.weight).collect();
        if weights.is_none() && models.iter().any(|m| m.weight.is_some()) {
            warn!("Weights configured for only some models, ignoring all weights");
        }

        let members = models
            .into_iter()
            .map(|m| EnsembleMember::boxed(m.name, m.regressor))
            .collect();

        let ensemble =
            VotingEnsemble::new(members, weights, method).context("Invalid ensemble configuration")?;

        Ok(Self::from_ensemble(ensemble, feature_columns))
    }

    /// Wrap an already constructed ensemble
    pub fn from_ensemble(ensemble: VotingEnsemble, feature_columns: Vec<String>) -> Self {
        Self {
            ensemble,
            feature_columns,
        }
    }

    pub fn method(&self) -> VotingMethod {
        self.ensemble.method()
    }

    /// Get the number of loaded models
    pub fn model_count(&self) -> usize {
        self.ensemble.len()
    }

    /// Get loaded model names
    pub fn model_names(&self) -> Vec<String> {
        self.ensemble.model_names()
    }

    pub fn feature_columns(&self) -> &[String] {
        &self.feature_columns
    }

    /// Run ensemble inference on a batch laid out in the expected columns
    pub fn predict(&self, batch: &FeatureBatch) -> Result<PredictionResult, EnsembleError> {
        if batch.columns() != self.feature_columns.as_slice() {
            return Err(EnsembleError::ColumnMismatch {
                expected: self.feature_columns.clone(),
                actual: batch.columns().to_vec(),
            });
        }

        let prediction = self.ensemble.predict_detailed(batch)?;

        debug!(
            samples = batch.len(),
            method = %prediction.report.method,
            prices = ?prediction.values,
            "Ensemble inference complete"
        );

        Ok(PredictionResult {
            prices: prediction.values,
            report: prediction.report,
        })
    }
}
