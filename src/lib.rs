//! House Price Service Library
//!
//! Prices houses from tabular listing features by combining an ensemble of
//! fitted regressors under a selectable voting method, served over NATS.

pub mod config;
pub mod consumer;
pub mod error;
pub mod feature_extractor;
pub mod metrics;
pub mod models;
pub mod producer;
pub mod service;
pub mod types;

pub use config::AppConfig;
pub use consumer::RequestConsumer;
pub use error::{EnsembleError, FeatureError, ServiceError};
pub use feature_extractor::FeatureExtractor;
pub use models::aggregator::{EnsembleMember, VotingEnsemble, VotingMethod};
pub use models::inference::InferenceEngine;
pub use models::regressor::Regressor;
pub use producer::ReplyPublisher;
pub use service::PredictionService;
pub use types::{batch::FeatureBatch, listing::HouseListing, quote::PriceQuote};
