//! Reply payloads for prediction and health requests

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Successful price prediction for one or more listings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceQuote {
    /// Unique reply identifier
    pub request_id: String,

    /// Always "success"
    pub status: String,

    /// Price of the first listing, rounded to cents
    pub prediction: f64,

    /// Prices of every listing in request order, rounded to cents
    pub predictions: Vec<f64>,

    pub currency: String,

    /// Voting method that combined the member predictions
    pub voting_method: String,

    /// Raw predictions of each member that succeeded
    pub model_predictions: HashMap<String, Vec<f64>>,

    /// Members excluded from this prediction
    pub failed_models: Vec<String>,

    /// Normalized weights applied to the surviving members
    pub weights: HashMap<String, f64>,

    pub timestamp: DateTime<Utc>,
}

impl PriceQuote {
    /// Create a quote from final per-listing prices
    pub fn new(predictions: Vec<f64>, currency: &str, voting_method: &str) -> Self {
        let predictions: Vec<f64> = predictions.into_iter().map(round_cents).collect();
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            status: "success".to_string(),
            prediction: predictions.first().copied().unwrap_or_default(),
            predictions,
            currency: currency.to_string(),
            voting_method: voting_method.to_string(),
            model_predictions: HashMap::new(),
            failed_models: Vec::new(),
            weights: HashMap::new(),
            timestamp: Utc::now(),
        }
    }

    /// Attach per-model diagnostics
    pub fn with_diagnostics(
        mut self,
        model_predictions: HashMap<String, Vec<f64>>,
        failed_models: Vec<String>,
        weights: HashMap<String, f64>,
    ) -> Self {
        self.model_predictions = model_predictions;
        self.failed_models = failed_models;
        self.weights = weights;
        self
    }
}

/// Error reply; `code` follows HTTP status semantics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorReply {
    pub request_id: String,
    pub status: String,
    pub code: u16,
    pub error: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl ErrorReply {
    pub fn new(code: u16, error: &str, message: String) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            status: "error".to_string(),
            code,
            error: error.to_string(),
            message,
            timestamp: Utc::now(),
        }
    }
}

/// Reply to a prediction request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PredictionReply {
    Success(PriceQuote),
    Error(ErrorReply),
}

impl PredictionReply {
    pub fn is_success(&self) -> bool {
        matches!(self, PredictionReply::Success(_))
    }
}

/// Reply to a health request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub model_loaded: bool,
    pub models: Vec<String>,
    pub voting_method: String,
    pub environment: String,
    pub timestamp: DateTime<Utc>,
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_rounds_to_cents() {
        let quote = PriceQuote::new(vec![512_345.678_9, 1_000.004], "USD", "weighted");

        assert_eq!(quote.prediction, 512_345.68);
        assert_eq!(quote.predictions, vec![512_345.68, 1_000.0]);
        assert_eq!(quote.status, "success");
    }

    #[test]
    fn test_reply_serialization() {
        let mut model_predictions = HashMap::new();
        model_predictions.insert("linear".to_string(), vec![500_000.0]);

        let reply = PredictionReply::Success(
            PriceQuote::new(vec![500_000.0], "USD", "median").with_diagnostics(
                model_predictions,
                vec!["xgboost".to_string()],
                HashMap::new(),
            ),
        );

        let json = serde_json::to_string(&reply).unwrap();
        let deserialized: PredictionReply = serde_json::from_str(&json).unwrap();

        match deserialized {
            PredictionReply::Success(quote) => {
                assert_eq!(quote.prediction, 500_000.0);
                assert_eq!(quote.failed_models, vec!["xgboost".to_string()]);
            }
            PredictionReply::Error(_) => panic!("expected a success reply"),
        }
    }

    #[test]
    fn test_error_reply_serialization() {
        let reply = PredictionReply::Error(ErrorReply::new(
            503,
            "No predictions available",
            "all 3 models failed".to_string(),
        ));

        let value = serde_json::to_value(&reply).unwrap();
        assert_eq!(value["status"], "error");
        assert_eq!(value["code"], 503);
        assert!(!reply.is_success());
    }
}
