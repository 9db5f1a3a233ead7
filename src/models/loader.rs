//! Model artifact loader

use crate::config::ModelMemberConfig;
use crate::models::onnx::OnnxRegressor;
use crate::models::regressor::{LinearRegressor, Regressor};
use anyhow::{bail, Result};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

/// Artifact format, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    /// `.onnx` exported tree or boosting model
    Onnx,
    /// `.json` linear model coefficients
    Linear,
}

impl ModelFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("onnx") => Some(ModelFormat::Onnx),
            Some("json") => Some(ModelFormat::Linear),
            _ => None,
        }
    }
}

/// A loaded ensemble member with its configured weight
pub struct LoadedModel {
    pub name: String,
    pub format: ModelFormat,
    pub regressor: Box<dyn Regressor>,
    pub weight: Option<f64>,
}

/// Loader for model artifacts
pub struct ModelLoader {
    /// Number of intra-op threads per ONNX session
    onnx_threads: usize,
    onnx_initialized: AtomicBool,
}

impl ModelLoader {
    /// Create a new model loader with default settings (1 thread)
    pub fn new() -> Self {
        Self::with_threads(1)
    }

    /// Create a new model loader with specified number of ONNX threads
    pub fn with_threads(onnx_threads: usize) -> Self {
        Self {
            onnx_threads,
            onnx_initialized: AtomicBool::new(false),
        }
    }

    fn ensure_onnx_runtime(&self) -> Result<()> {
        if !self.onnx_initialized.swap(true, Ordering::SeqCst) {
            ort::init().commit()?;
            info!(onnx_threads = self.onnx_threads, "ONNX Runtime initialized");
        }
        Ok(())
    }

    /// Load a single model artifact
    pub fn load_model<P: AsRef<Path>>(&self, path: P, name: &str) -> Result<LoadedModel> {
        let path = path.as_ref();

        let Some(format) = ModelFormat::from_path(path) else {
            bail!("Unsupported model format for {}", path.display());
        };

        let regressor: Box<dyn Regressor> = match format {
            ModelFormat::Onnx => {
                self.ensure_onnx_runtime()?;
                Box::new(OnnxRegressor::from_file(path, name, self.onnx_threads)?)
            }
            ModelFormat::Linear => {
                let model = LinearRegressor::from_file(path)?;
                info!(
                    model = %name,
                    path = %path.display(),
                    features = model.feature_names.len(),
                    "Linear model loaded successfully"
                );
                Box::new(model)
            }
        };

        Ok(LoadedModel {
            name: name.to_string(),
            format,
            regressor,
            weight: None,
        })
    }

    /// Load every configured member from a directory.
    ///
    /// Members that are missing or fail to load are skipped with a warning;
    /// loading nothing at all is an error.
    pub fn load_members<P: AsRef<Path>>(
        &self,
        models_dir: P,
        members: &[ModelMemberConfig],
    ) -> Result<Vec<LoadedModel>> {
        let models_dir = models_dir.as_ref();
        let mut models = Vec::new();

        for member in members {
            let path = models_dir.join(&member.file);
            if !path.exists() {
                warn!(model = %member.name, path = %path.display(), "Model file not found");
                continue;
            }

            match self.load_model(&path, &member.name) {
                Ok(mut model) => {
                    model.weight = member.weight;
                    models.push(model);
                }
                Err(e) => {
                    warn!(model = %member.name, error = %e, "Failed to load model, skipping");
                }
            }
        }

        if models.is_empty() {
            bail!("No models loaded from {}", models_dir.display());
        }

        info!(
            count = models.len(),
            "Loaded {} models from {}",
            models.len(),
            models_dir.display()
        );

        Ok(models)
    }
}

impl Default for ModelLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::path::PathBuf;

    /// Scratch directory removed on drop
    pub(crate) struct ScratchDir(pub PathBuf);

    impl ScratchDir {
        pub(crate) fn new() -> Self {
            let dir = std::env::temp_dir().join(format!("house-price-{}", uuid::Uuid::new_v4()));
            std::fs::create_dir_all(&dir).unwrap();
            Self(dir)
        }

        pub(crate) fn write_linear(&self, file: &str, model: &LinearRegressor) {
            let json = serde_json::to_string(model).unwrap();
            std::fs::write(self.0.join(file), json).unwrap();
        }
    }

    impl Drop for ScratchDir {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.0);
        }
    }

    fn member(name: &str, file: &str, weight: Option<f64>) -> ModelMemberConfig {
        ModelMemberConfig {
            name: name.to_string(),
            file: file.to_string(),
            weight,
        }
    }

    fn linear() -> LinearRegressor {
        LinearRegressor::new(vec!["living area".to_string()], 50_000.0, vec![150.0]).unwrap()
    }

    #[test]
    fn test_model_format_from_extension() {
        assert_eq!(
            ModelFormat::from_path(Path::new("models/xgboost.onnx")),
            Some(ModelFormat::Onnx)
        );
        assert_eq!(
            ModelFormat::from_path(Path::new("models/linear.json")),
            Some(ModelFormat::Linear)
        );
        assert_eq!(ModelFormat::from_path(Path::new("models/rf.joblib")), None);
    }

    #[test]
    fn test_load_members_skips_missing_and_broken() {
        let dir = ScratchDir::new();
        dir.write_linear("linear.json", &linear());
        std::fs::write(dir.0.join("broken.json"), "{ not json").unwrap();

        let loader = ModelLoader::new();
        let models = loader
            .load_members(
                &dir.0,
                &[
                    member("linear", "linear.json", Some(0.4)),
                    member("broken", "broken.json", Some(0.3)),
                    member("missing", "missing.json", Some(0.3)),
                ],
            )
            .unwrap();

        assert_eq!(models.len(), 1);
        assert_eq!(models[0].name, "linear");
        assert_eq!(models[0].format, ModelFormat::Linear);
        assert_eq!(models[0].weight, Some(0.4));
    }

    #[test]
    fn test_load_members_fails_when_nothing_loads() {
        let dir = ScratchDir::new();
        let loader = ModelLoader::new();

        let result = loader.load_members(&dir.0, &[member("missing", "missing.json", None)]);
        assert!(result.is_err());
    }

    #[test]
    fn test_unsupported_format() {
        let dir = ScratchDir::new();
        std::fs::write(dir.0.join("forest.joblib"), b"binary").unwrap();

        let loader = ModelLoader::new();
        assert!(loader.load_model(dir.0.join("forest.joblib"), "forest").is_err());
    }
}
