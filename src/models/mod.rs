//! Regressors, the voting ensemble and model loading

pub mod aggregator;
pub mod inference;
pub mod loader;
pub mod onnx;
pub mod regressor;

pub use aggregator::{VotingEnsemble, VotingMethod};
pub use inference::InferenceEngine;
pub use loader::ModelLoader;
pub use regressor::{LinearRegressor, Regressor};
