//! Per-request handling: decode, validate, predict, respond

use crate::models::inference::{InferenceEngine, Prediction};
use crate::types::prediction::{PredictionRequest, PredictionResponse};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, warn};

/// Answers prediction requests.
///
/// Built once at startup and shared by every request task. Without an
/// engine (artifacts missing) every request receives the configuration
/// missing message and no prediction work is done.
pub struct RequestHandler {
    engine: Option<Arc<InferenceEngine>>,
    missing_message: String,
}

impl RequestHandler {
    pub fn new(engine: Arc<InferenceEngine>) -> Self {
        Self {
            engine: Some(engine),
            missing_message: String::new(),
        }
    }

    /// Handler for a process whose artifacts could not be found
    pub fn configuration_missing(message: impl Into<String>) -> Self {
        Self {
            engine: None,
            missing_message: message.into(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.engine.is_some()
    }

    /// Handle a raw request payload
    pub fn handle(&self, payload: &[u8]) -> PredictionResponse {
        match serde_json::from_slice::<PredictionRequest>(payload) {
            Ok(request) => self.handle_request(&request),
            Err(e) => {
                warn!(error = %e, "Failed to deserialize prediction request");
                PredictionResponse::rejected(String::new(), format!("Invalid request: {}", e))
            }
        }
    }

    /// Handle a decoded request
    pub fn handle_request(&self, request: &PredictionRequest) -> PredictionResponse {
        let Some(engine) = &self.engine else {
            return PredictionResponse::configuration_missing(
                request.request_id.clone(),
                self.missing_message.clone(),
            );
        };

        match Self::run(engine, request) {
            Ok(prediction) => {
                debug!(
                    request_id = %request.request_id,
                    point_estimate = ?prediction.point_estimate,
                    "Request processed"
                );
                prediction.to_response(request.request_id.clone())
            }
            Err(e) => {
                warn!(request_id = %request.request_id, error = %e, "Request rejected");
                PredictionResponse::rejected(request.request_id.clone(), format!("{:#}", e))
            }
        }
    }

    fn run(engine: &InferenceEngine, request: &PredictionRequest) -> Result<Prediction> {
        request.applicant.validate()?;
        engine.predict(&request.applicant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PredictionConfig;
    use crate::models::loader::tests::demo_bundle;
    use crate::types::applicant::ApplicantRecord;
    use crate::types::prediction::ResponseStatus;

    fn handler(strict: bool) -> RequestHandler {
        let engine = InferenceEngine::new(
            demo_bundle(48),
            &PredictionConfig {
                strict_categories: strict,
            },
        );
        RequestHandler::new(Arc::new(engine))
    }

    fn payload(applicant: ApplicantRecord) -> Vec<u8> {
        let request = PredictionRequest {
            request_id: "req_42".to_string(),
            applicant,
        };
        serde_json::to_vec(&request).unwrap()
    }

    #[test]
    fn test_ok_response() {
        let response = handler(false).handle(&payload(ApplicantRecord::default()));

        assert_eq!(response.status, ResponseStatus::Ok);
        assert_eq!(response.request_id, "req_42");
        assert!(response.curve.is_some());
        assert!(response
            .message
            .starts_with("The predicted probability of survival at 36 months is:"));
    }

    #[test]
    fn test_configuration_missing() {
        let handler = RequestHandler::configuration_missing("Model or necessary files not found.");
        assert!(!handler.is_enabled());

        let response = handler.handle(&payload(ApplicantRecord::default()));
        assert_eq!(response.status, ResponseStatus::ConfigurationMissing);
        assert_eq!(response.message, "Model or necessary files not found.");
        assert!(response.curve.is_none());
        assert!(response.point_estimate.is_none());
    }

    #[test]
    fn test_out_of_range_rejected() {
        let mut applicant = ApplicantRecord::default();
        applicant.int_rate = 50.0;

        let response = handler(false).handle(&payload(applicant));
        assert_eq!(response.status, ResponseStatus::Rejected);
        assert!(response.message.contains("int_rate"));
    }

    #[test]
    fn test_malformed_payload_rejected() {
        let response = handler(false).handle(b"{\"applicant\": 3}");
        assert_eq!(response.status, ResponseStatus::Rejected);
        assert!(response.request_id.is_empty());
    }

    #[test]
    fn test_strict_categories() {
        let mut applicant = ApplicantRecord::default();
        applicant.purpose = "yacht".to_string();

        let lenient = handler(false).handle(&payload(applicant.clone()));
        assert_eq!(lenient.status, ResponseStatus::Ok);

        let strict = handler(true).handle(&payload(applicant));
        assert_eq!(strict.status, ResponseStatus::Rejected);
        assert!(strict.message.contains("purpose=yacht"));
    }
}
