//! Configuration management for the house price service

use crate::error::EnsembleError;
use crate::models::aggregator::VotingMethod;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub nats: NatsConfig,
    pub models: ModelsConfig,
    #[serde(default)]
    pub service: ServiceConfig,
    pub pipeline: PipelineConfig,
    pub logging: LoggingConfig,
}

/// NATS connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NatsConfig {
    /// NATS server URL
    pub url: String,
    /// Request/reply subject for price predictions
    pub predict_subject: String,
    /// Request/reply subject for health checks
    pub health_subject: String,
    /// Queue group for load-balancing predictions across replicas
    #[serde(default)]
    pub queue_group: Option<String>,
}

/// One ensemble member artifact
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ModelMemberConfig {
    /// Member name, unique within the ensemble
    pub name: String,
    /// Artifact file relative to `models_dir` (`.onnx` or `.json`)
    pub file: String,
    /// Voting weight; required on every member for weighted voting
    #[serde(default)]
    pub weight: Option<f64>,
}

/// Ensemble configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ModelsConfig {
    /// Directory containing model artifacts
    pub models_dir: String,
    /// weighted, median, rank or simple-average
    #[serde(default = "default_voting_method")]
    pub voting_method: String,
    /// Reject unknown voting methods instead of falling back to simple-average
    #[serde(default = "default_strict_voting_method")]
    pub strict_voting_method: bool,
    /// Ensemble members in voting order
    pub members: Vec<ModelMemberConfig>,
    /// Number of threads for ONNX inference per model (default: 1)
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
}

fn default_voting_method() -> String {
    "weighted".to_string()
}

fn default_strict_voting_method() -> bool {
    true
}

fn default_onnx_threads() -> usize {
    1
}

impl ModelsConfig {
    /// Resolve the configured voting method, honoring `strict_voting_method`.
    pub fn voting_method(&self) -> Result<VotingMethod, EnsembleError> {
        if self.strict_voting_method {
            self.voting_method.parse()
        } else {
            Ok(VotingMethod::parse_lenient(&self.voting_method))
        }
    }
}

/// Reply settings
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Currency reported with every price
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Deployment environment reported by health checks
    #[serde(default = "default_environment")]
    pub environment: String,
    /// Keep serving (health degraded, predictions unavailable) when models fail to load
    #[serde(default)]
    pub allow_degraded_start: bool,
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_environment() -> String {
    "production".to_string()
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            environment: default_environment(),
            allow_degraded_start: false,
        }
    }
}

/// Request processing configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Maximum requests handled concurrently
    pub workers: usize,
    /// Seconds between metrics summaries
    #[serde(default = "default_metrics_interval")]
    pub metrics_interval_secs: u64,
}

fn default_metrics_interval() -> u64 {
    30
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl AppConfig {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/config.toml")
    }

    /// Load configuration from a specific path.
    ///
    /// Environment variables prefixed `HOUSE_PRICE__` override file values,
    /// e.g. `HOUSE_PRICE__NATS__URL`.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("HOUSE_PRICE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let members = [
            ("linear", "linear_regression.json", 0.2),
            ("random_forest", "random_forest.onnx", 0.35),
            ("xgboost", "xgboost.onnx", 0.45),
        ]
        .into_iter()
        .map(|(name, file, weight)| ModelMemberConfig {
            name: name.to_string(),
            file: file.to_string(),
            weight: Some(weight),
        })
        .collect();

        Self {
            nats: NatsConfig {
                url: "nats://localhost:4222".to_string(),
                predict_subject: "house.price.predict".to_string(),
                health_subject: "house.price.health".to_string(),
                queue_group: None,
            },
            models: ModelsConfig {
                models_dir: "models".to_string(),
                voting_method: default_voting_method(),
                strict_voting_method: true,
                members,
                onnx_threads: 1,
            },
            service: ServiceConfig::default(),
            pipeline: PipelineConfig {
                workers: 4,
                metrics_interval_secs: default_metrics_interval(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "json".to_string(),
            },
        }
    }
}
