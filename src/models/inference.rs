//! Survival inference engine: alignment, scaling, Cox prediction, horizon lookup

use crate::config::PredictionConfig;
use crate::feature_extractor::{AlignedFeatures, FeatureExtractor};
use crate::models::loader::ArtifactBundle;
use crate::report;
use crate::types::applicant::ApplicantRecord;
use crate::types::prediction::{
    PointEstimate, PredictionResponse, SurvivalCurve, SURVIVAL_HORIZON_MONTHS,
};
use anyhow::{bail, Context, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of running one applicant through the pipeline
#[derive(Debug, Clone)]
pub struct Prediction {
    /// Model input after alignment and scaling
    pub features: AlignedFeatures,
    /// Relative risk against the training means
    pub partial_hazard: f64,
    /// Survival probability on the model's time grid
    pub curve: SurvivalCurve,
    /// Survival probability at the fixed horizon
    pub point_estimate: PointEstimate,
}

impl Prediction {
    /// Convert the prediction into a response for `request_id`
    pub fn to_response(&self, request_id: String) -> PredictionResponse {
        PredictionResponse::ok(
            request_id,
            self.curve.clone(),
            self.point_estimate,
            report::summary_message(&self.point_estimate),
        )
    }
}

/// Inference engine over a loaded artifact bundle
pub struct InferenceEngine {
    bundle: Arc<ArtifactBundle>,
    extractor: FeatureExtractor,
    strict_categories: bool,
}

impl InferenceEngine {
    /// Create a new inference engine from a loaded bundle
    pub fn new(bundle: Arc<ArtifactBundle>, config: &PredictionConfig) -> Self {
        let extractor = FeatureExtractor::new(Arc::clone(&bundle.columns));

        info!(
            features = extractor.feature_count(),
            covariates = bundle.model.covariates.len(),
            strict_categories = config.strict_categories,
            "Inference engine initialized"
        );

        Self {
            bundle,
            extractor,
            strict_categories: config.strict_categories,
        }
    }

    pub fn bundle(&self) -> &ArtifactBundle {
        &self.bundle
    }

    pub fn feature_count(&self) -> usize {
        self.extractor.feature_count()
    }

    /// Expand, align and scale a record into the model's input row
    pub fn prepare(&self, record: &ApplicantRecord) -> Result<AlignedFeatures> {
        if self.strict_categories {
            let unknown = record.unknown_categories();
            if !unknown.is_empty() {
                let listed: Vec<String> = unknown
                    .iter()
                    .map(|(field, value)| format!("{}={}", field, value))
                    .collect();
                bail!("Unknown categories: {}", listed.join(", "));
            }
        }

        let expanded = self.extractor.expand(record);
        let unmatched = self.extractor.unmatched_columns(&expanded);
        if !unmatched.is_empty() {
            warn!(
                columns = ?unmatched,
                "Category has no training column; its indicators are all zero"
            );
        }

        let mut features = self.extractor.align(&expanded);
        self.bundle
            .scaler
            .transform(&mut features)
            .context("Failed to scale numeric features")?;

        Ok(features)
    }

    /// Run the full pipeline for one applicant
    pub fn predict(&self, record: &ApplicantRecord) -> Result<Prediction> {
        let features = self.prepare(record)?;

        let partial_hazard = self.bundle.model.partial_hazard(&features)?;
        let curve = self.bundle.model.predict_survival_function(&features)?;
        let point_estimate = curve.point_estimate(SURVIVAL_HORIZON_MONTHS);

        match point_estimate {
            PointEstimate::Defined { probability, .. } => debug!(
                partial_hazard = partial_hazard,
                survival_36m = probability,
                timeline_points = curve.len(),
                "Survival prediction complete"
            ),
            PointEstimate::HorizonExceedsTimeline { max_time, .. } => warn!(
                max_time = ?max_time,
                horizon = SURVIVAL_HORIZON_MONTHS,
                "Prediction timeline does not contain the horizon"
            ),
        }

        Ok(Prediction {
            features,
            partial_hazard,
            curve,
            point_estimate,
        })
    }
}
