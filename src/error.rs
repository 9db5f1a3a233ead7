//! Error types for the house price service

use thiserror::Error;

/// Errors raised by the voting ensemble and the inference engine around it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EnsembleError {
    /// A single member failed for one call. Recoverable: the member is
    /// excluded and the call continues with the others.
    #[error("model '{model}' failed to predict: {reason}")]
    ModelPredictionFailed { model: String, reason: String },

    /// Every member failed for this call.
    #[error("no predictions available: all {attempted} models failed")]
    NoPredictionsAvailable { attempted: usize },

    #[error("weighted voting requires weights but none were configured")]
    MissingWeights,

    #[error("invalid weights: {0}")]
    InvalidWeights(String),

    #[error("unrecognized voting method '{0}'")]
    UnrecognizedVotingMethod(String),

    #[error("ensemble has no members")]
    EmptyEnsemble,

    #[error("duplicate model name '{0}' in ensemble")]
    DuplicateModel(String),

    /// Weighted voting where every surviving member carries zero weight.
    #[error("surviving models {survivors:?} carry zero total weight")]
    ZeroSurvivingWeight { survivors: Vec<String> },

    /// The vote overflowed even though every member output was finite.
    #[error("{method} voting produced a non-finite result")]
    NonFiniteVote { method: String },

    #[error("feature columns do not match the model layout: expected {expected:?}, got {actual:?}")]
    ColumnMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },
}

/// Errors raised while turning listings into a feature batch.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeatureError {
    #[error("row {row} has {actual} values, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("invalid value for {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("request contains no listings")]
    NoListings,
}

/// Errors surfaced by the serving shell, each mapped to a response code.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("malformed request: {0}")]
    Malformed(String),

    #[error(transparent)]
    Validation(#[from] FeatureError),

    #[error("model not loaded")]
    ModelNotLoaded,

    #[error(transparent)]
    Ensemble(#[from] EnsembleError),
}

impl ServiceError {
    /// Response code in HTTP terms: client error, unavailable, or internal.
    pub fn code(&self) -> u16 {
        match self {
            ServiceError::Malformed(_) | ServiceError::Validation(_) => 400,
            ServiceError::ModelNotLoaded
            | ServiceError::Ensemble(EnsembleError::NoPredictionsAvailable { .. }) => 503,
            ServiceError::Ensemble(EnsembleError::ColumnMismatch { .. }) => 400,
            ServiceError::Ensemble(_) => 500,
        }
    }

    /// Short error label used in the response body.
    pub fn label(&self) -> &'static str {
        match self {
            ServiceError::Malformed(_) => "Malformed request",
            ServiceError::Validation(_)
            | ServiceError::Ensemble(EnsembleError::ColumnMismatch { .. }) => "Validation failed",
            ServiceError::ModelNotLoaded => "Model not loaded",
            ServiceError::Ensemble(EnsembleError::NoPredictionsAvailable { .. }) => {
                "No predictions available"
            }
            ServiceError::Ensemble(_) => "Prediction failed",
        }
    }
}
