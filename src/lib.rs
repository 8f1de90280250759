//! Credit Survival Service Library
//!
//! Loan survival prediction backed by a fitted Cox proportional hazards
//! model: applicant records are one-hot encoded, aligned to the training
//! columns, standardized, and turned into a survival curve with a
//! 36-month point estimate.

pub mod config;
pub mod consumer;
pub mod feature_extractor;
pub mod handler;
pub mod metrics;
pub mod models;
pub mod producer;
pub mod report;
pub mod types;

pub use config::AppConfig;
pub use consumer::RequestConsumer;
pub use feature_extractor::{AlignedFeatures, ColumnSchema, FeatureExtractor};
pub use handler::RequestHandler;
pub use models::inference::{InferenceEngine, Prediction};
pub use models::loader::{ArtifactBundle, ArtifactLoader};
pub use producer::ResponsePublisher;
pub use types::{
    applicant::ApplicantRecord,
    prediction::{PointEstimate, PredictionRequest, PredictionResponse, SurvivalCurve},
};
