//! Prediction service: request decoding, inference and reply building.
//!
//! Everything the transport loop needs is owned here and passed explicitly;
//! there is no process-wide model registry.

use crate::config::ServiceConfig;
use crate::error::ServiceError;
use crate::feature_extractor::FeatureExtractor;
use crate::metrics::ServiceMetrics;
use crate::models::inference::{InferenceEngine, PredictionResult};
use crate::types::listing::HouseListing;
use crate::types::quote::{ErrorReply, HealthStatus, PredictionReply};
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, warn};

/// Decoded prediction request.
///
/// Accepts a bare listing, a listing wrapped as `{"features": {...}}`, or a
/// batch as `{"listings": [...]}`.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRequest {
    pub listings: Vec<HouseListing>,
}

impl PredictionRequest {
    pub fn from_slice(payload: &[u8]) -> Result<Self, ServiceError> {
        let value: Value =
            serde_json::from_slice(payload).map_err(|e| ServiceError::Malformed(e.to_string()))?;

        let listings = match value {
            Value::Object(mut map) if map.contains_key("listings") => {
                serde_json::from_value(map.remove("listings").unwrap_or_default())
            }
            Value::Object(mut map) if map.contains_key("features") => {
                serde_json::from_value(map.remove("features").unwrap_or_default())
                    .map(|listing| vec![listing])
            }
            Value::Object(_) => serde_json::from_value(value).map(|listing| vec![listing]),
            _ => {
                return Err(ServiceError::Malformed(
                    "expected a JSON object".to_string(),
                ))
            }
        }
        .map_err(|e| ServiceError::Malformed(e.to_string()))?;

        Ok(Self { listings })
    }

    /// Client identifiers of the listings that carry one
    pub fn listing_ids(&self) -> Vec<&str> {
        self.listings
            .iter()
            .filter_map(|l| l.listing_id.as_deref())
            .collect()
    }
}

/// Shared request-handling context
pub struct PredictionService {
    engine: Option<Arc<InferenceEngine>>,
    extractor: FeatureExtractor,
    metrics: Arc<ServiceMetrics>,
    settings: ServiceConfig,
}

impl PredictionService {
    pub fn new(
        engine: Option<Arc<InferenceEngine>>,
        extractor: FeatureExtractor,
        metrics: Arc<ServiceMetrics>,
        settings: ServiceConfig,
    ) -> Self {
        Self {
            engine,
            extractor,
            metrics,
            settings,
        }
    }

    pub fn metrics(&self) -> &Arc<ServiceMetrics> {
        &self.metrics
    }

    /// Price the listings in `payload`; never fails, errors become error replies.
    pub fn handle_predict(&self, payload: &[u8]) -> PredictionReply {
        let start_time = Instant::now();

        match self.predict(payload) {
            Ok(result) => {
                let processing_time = start_time.elapsed();
                self.metrics
                    .record_request(processing_time, result.prices.len());
                self.metrics.record_voting(&result.report);

                debug!(
                    listings = result.prices.len(),
                    failed_models = ?result.report.failed_models(),
                    processing_time_us = processing_time.as_micros() as u64,
                    "Prediction request served"
                );

                PredictionReply::Success(result.to_quote(&self.settings.currency))
            }
            Err(e) => {
                let code = e.code();
                self.metrics.record_error(code);

                if code >= 500 {
                    error!(code, error = %e, "Prediction request failed");
                } else {
                    warn!(code, error = %e, "Prediction request rejected");
                }

                PredictionReply::Error(ErrorReply::new(code, e.label(), e.to_string()))
            }
        }
    }

    fn predict(&self, payload: &[u8]) -> Result<PredictionResult, ServiceError> {
        let engine = self.engine.as_ref().ok_or(ServiceError::ModelNotLoaded)?;
        let request = PredictionRequest::from_slice(payload)?;
        debug!(
            listings = request.listings.len(),
            listing_ids = ?request.listing_ids(),
            "Decoded prediction request"
        );
        let batch = self.extractor.extract_batch(&request.listings)?;
        Ok(engine.predict(&batch)?)
    }

    /// Liveness and model status
    pub fn health(&self) -> HealthStatus {
        HealthStatus {
            status: if self.engine.is_some() {
                "healthy".to_string()
            } else {
                "degraded".to_string()
            },
            model_loaded: self.engine.is_some(),
            models: self
                .engine
                .as_ref()
                .map(|e| e.model_names())
                .unwrap_or_default(),
            voting_method: self
                .engine
                .as_ref()
                .map(|e| e.method().to_string())
                .unwrap_or_default(),
            environment: self.settings.environment.clone(),
            timestamp: Utc::now(),
        }
    }
}
