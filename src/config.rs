//! Configuration management for the credit survival service

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub nats: NatsConfig,
    pub artifacts: ArtifactsConfig,
    #[serde(default)]
    pub prediction: PredictionConfig,
    pub pipeline: PipelineConfig,
    pub logging: LoggingConfig,
}

/// NATS connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NatsConfig {
    /// NATS server URL
    pub url: String,
    /// Subject for incoming prediction requests
    pub request_subject: String,
    /// Subject for responses to requests that carry no reply subject
    pub response_subject: String,
}

/// Locations of the fitted model artifacts
#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactsConfig {
    /// Directory containing the artifact files
    pub dir: String,
    /// Fitted Cox model
    #[serde(default = "default_model_file")]
    pub model_file: String,
    /// Fitted standard scaler
    #[serde(default = "default_scaler_file")]
    pub scaler_file: String,
    /// Ordered training columns
    #[serde(default = "default_columns_file")]
    pub columns_file: String,
}

fn default_model_file() -> String {
    "cox_model.json".to_string()
}

fn default_scaler_file() -> String {
    "scaler.json".to_string()
}

fn default_columns_file() -> String {
    "training_columns.json".to_string()
}

impl ArtifactsConfig {
    pub fn model_path(&self) -> PathBuf {
        Path::new(&self.dir).join(&self.model_file)
    }

    pub fn scaler_path(&self) -> PathBuf {
        Path::new(&self.dir).join(&self.scaler_file)
    }

    pub fn columns_path(&self) -> PathBuf {
        Path::new(&self.dir).join(&self.columns_file)
    }

    /// Same file names under another directory
    pub fn with_dir(&self, dir: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            ..self.clone()
        }
    }
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            dir: "artifacts".to_string(),
            model_file: default_model_file(),
            scaler_file: default_scaler_file(),
            columns_file: default_columns_file(),
        }
    }
}

/// Prediction behaviour
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PredictionConfig {
    /// Reject grades/purposes outside the form's options instead of
    /// aligning them to all-zero indicators
    #[serde(default)]
    pub strict_categories: bool,
}

/// Pipeline configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Maximum requests processed concurrently
    pub workers: usize,
    /// Seconds between metrics summaries
    #[serde(default = "default_report_interval")]
    pub report_interval_secs: u64,
}

fn default_report_interval() -> u64 {
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

    /// Load configuration from a specific path, with `CREDIT_SURVIVAL__*` environment overrides
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("CREDIT_SURVIVAL")
                    .prefix_separator("__")
                    .separator("__"),
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
        Self {
            nats: NatsConfig {
                url: "nats://localhost:4222".to_string(),
                request_subject: "credit.survival.predict".to_string(),
                response_subject: "credit.survival.results".to_string(),
            },
            artifacts: ArtifactsConfig::default(),
            prediction: PredictionConfig::default(),
            pipeline: PipelineConfig {
                workers: 4,
                report_interval_secs: default_report_interval(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }
}
