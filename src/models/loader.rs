//! Artifact loader for the fitted model, scaler and training columns

use crate::config::ArtifactsConfig;
use crate::feature_extractor::ColumnSchema;
use crate::models::cox::CoxModel;
use crate::models::scaler::StandardScaler;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;
use std::sync::{Arc, OnceLock};
use tracing::{info, warn};

/// Everything needed to score an applicant, loaded once and shared read-only
#[derive(Debug)]
pub struct ArtifactBundle {
    pub model: CoxModel,
    pub scaler: StandardScaler,
    pub columns: Arc<ColumnSchema>,
}

impl ArtifactBundle {
    /// Assemble a bundle after checking the three artifacts agree with each other
    pub fn new(model: CoxModel, scaler: StandardScaler, columns: ColumnSchema) -> Result<Self> {
        scaler.validate().context("Invalid scaler")?;
        model.validate(&columns).context("Invalid Cox model")?;

        Ok(Self {
            model,
            scaler,
            columns: Arc::new(columns),
        })
    }
}

/// Loader for the serialized artifacts.
///
/// The first call to [`ArtifactLoader::load`] reads the files; every later
/// call returns the cached outcome, including a missing-artifacts outcome.
pub struct ArtifactLoader {
    config: ArtifactsConfig,
    cache: OnceLock<Option<Arc<ArtifactBundle>>>,
}

impl ArtifactLoader {
    /// Create a loader for the configured artifact locations
    pub fn new(config: ArtifactsConfig) -> Self {
        Self {
            config,
            cache: OnceLock::new(),
        }
    }

    /// Create a loader for the default file names in `dir`
    pub fn from_dir(dir: impl Into<String>) -> Self {
        Self::new(ArtifactsConfig::default().with_dir(dir))
    }

    /// Load the bundle, or `None` if any artifact file is missing.
    ///
    /// Present but malformed artifacts are an error. Errors are not cached,
    /// so a later call retries the read.
    pub fn load(&self) -> Result<Option<Arc<ArtifactBundle>>> {
        if let Some(cached) = self.cache.get() {
            return Ok(cached.clone());
        }

        let loaded = self.read_bundle()?.map(Arc::new);
        Ok(self.cache.get_or_init(|| loaded).clone())
    }

    /// Message shown to the user when the artifacts are missing
    pub fn missing_message(&self) -> String {
        format!(
            "Model or necessary files not found. Please ensure `{}`, `{}`, and `{}` are in `{}`.",
            self.config.model_file, self.config.scaler_file, self.config.columns_file, self.config.dir
        )
    }

    fn read_bundle(&self) -> Result<Option<ArtifactBundle>> {
        let paths = [
            self.config.model_path(),
            self.config.scaler_path(),
            self.config.columns_path(),
        ];

        let mut missing = false;
        for path in &paths {
            if !path.is_file() {
                warn!(path = %path.display(), "Artifact file not found");
                missing = true;
            }
        }
        if missing {
            return Ok(None);
        }

        let [model_path, scaler_path, columns_path] = &paths;
        let model: CoxModel = Self::read_json(model_path, "Cox model")?;
        let scaler: StandardScaler = Self::read_json(scaler_path, "scaler")?;
        let columns: ColumnSchema = Self::read_json(columns_path, "training columns")?;

        let bundle = ArtifactBundle::new(model, scaler, columns)
            .with_context(|| format!("Inconsistent artifacts in {}", self.config.dir))?;

        info!(
            dir = %self.config.dir,
            columns = bundle.columns.len(),
            covariates = bundle.model.covariates.len(),
            timeline_points = bundle.model.baseline_cumulative_hazard.len(),
            "Artifacts loaded successfully"
        );

        Ok(Some(bundle))
    }

    fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
        info!(artifact = %what, path = %path.display(), "Loading artifact");

        let bytes = fs::read(path).with_context(|| format!("Failed to read {} from {:?}", what, path))?;
        serde_json::from_slice(&bytes).with_context(|| format!("Failed to parse {} from {:?}", what, path))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::feature_extractor::tests::demo_schema;
    use crate::models::cox::tests::demo_model;
    use crate::models::scaler::tests::demo_scaler;
    use tempfile::TempDir;

    pub(crate) fn demo_bundle(months: u32) -> Arc<ArtifactBundle> {
        let schema = (*demo_schema()).clone();
        Arc::new(ArtifactBundle::new(demo_model(months), demo_scaler(), schema).unwrap())
    }

    fn write_artifacts(dir: &Path) {
        fs::write(
            dir.join("cox_model.json"),
            serde_json::to_vec(&demo_model(48)).unwrap(),
        )
        .unwrap();
        fs::write(dir.join("scaler.json"), serde_json::to_vec(&demo_scaler()).unwrap()).unwrap();
        fs::write(
            dir.join("training_columns.json"),
            serde_json::to_vec(&*demo_schema()).unwrap(),
        )
        .unwrap();
    }

    #[test]
    fn test_load_complete_bundle() {
        let dir = TempDir::new().unwrap();
        write_artifacts(dir.path());

        let loader = ArtifactLoader::from_dir(dir.path().to_string_lossy());
        let bundle = loader.load().unwrap().expect("bundle present");

        assert_eq!(bundle.columns.len(), demo_schema().len());
        assert_eq!(bundle.model.baseline_cumulative_hazard.len(), 48);
    }

    #[test]
    fn test_missing_file_is_absent() {
        let dir = TempDir::new().unwrap();
        write_artifacts(dir.path());
        fs::remove_file(dir.path().join("scaler.json")).unwrap();

        let loader = ArtifactLoader::from_dir(dir.path().to_string_lossy());
        assert!(loader.load().unwrap().is_none());
        assert!(loader.missing_message().contains("scaler.json"));
    }

    #[test]
    fn test_bundle_cached_after_first_load() {
        let dir = TempDir::new().unwrap();
        write_artifacts(dir.path());

        let loader = ArtifactLoader::from_dir(dir.path().to_string_lossy());
        let first = loader.load().unwrap().unwrap();

        fs::remove_file(dir.path().join("cox_model.json")).unwrap();
        let second = loader.load().unwrap().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_absent_outcome_cached() {
        let dir = TempDir::new().unwrap();
        let loader = ArtifactLoader::from_dir(dir.path().to_string_lossy());
        assert!(loader.load().unwrap().is_none());

        write_artifacts(dir.path());
        assert!(loader.load().unwrap().is_none());
    }

    #[test]
    fn test_malformed_artifact_is_error() {
        let dir = TempDir::new().unwrap();
        write_artifacts(dir.path());
        fs::write(dir.path().join("scaler.json"), b"{not json").unwrap();

        let loader = ArtifactLoader::from_dir(dir.path().to_string_lossy());
        assert!(loader.load().is_err());
    }

    #[test]
    fn test_inconsistent_artifacts_rejected() {
        let dir = TempDir::new().unwrap();
        write_artifacts(dir.path());
        fs::write(
            dir.path().join("training_columns.json"),
            br#"["loan_amnt","int_rate","annual_inc","dti"]"#,
        )
        .unwrap();

        let loader = ArtifactLoader::from_dir(dir.path().to_string_lossy());
        assert!(loader.load().is_err());
    }
}
