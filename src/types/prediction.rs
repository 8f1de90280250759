//! Prediction request/response data structures

use crate::types::applicant::ApplicantRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Horizon (in months) of the reported point estimate
pub const SURVIVAL_HORIZON_MONTHS: f64 = 36.0;

/// One sample of a survival curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    /// Elapsed time in months
    pub time: f64,
    /// Probability that the loan has not defaulted by `time`
    pub survival: f64,
}

/// Survival probability sampled on the model's time grid
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SurvivalCurve {
    pub points: Vec<CurvePoint>,
}

impl SurvivalCurve {
    pub fn new(points: Vec<CurvePoint>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Last time on the grid
    pub fn max_time(&self) -> Option<f64> {
        self.points.last().map(|p| p.time)
    }

    /// Value at exactly `time`; no interpolation
    pub fn value_at(&self, time: f64) -> Option<f64> {
        self.points
            .iter()
            .find(|p| p.time == time)
            .map(|p| p.survival)
    }

    /// Whether survival never increases along the grid
    pub fn is_non_increasing(&self) -> bool {
        self.points
            .windows(2)
            .all(|w| w[0].survival >= w[1].survival)
    }

    /// Point estimate at `horizon`
    pub fn point_estimate(&self, horizon: f64) -> PointEstimate {
        match self.value_at(horizon) {
            Some(probability) => PointEstimate::Defined {
                horizon,
                probability,
            },
            None => PointEstimate::HorizonExceedsTimeline {
                horizon,
                max_time: self.max_time(),
            },
        }
    }
}

/// Survival probability at the fixed horizon
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PointEstimate {
    Defined { horizon: f64, probability: f64 },
    /// The curve has no sample at exactly `horizon`
    HorizonExceedsTimeline {
        horizon: f64,
        max_time: Option<f64>,
    },
}

impl PointEstimate {
    pub fn probability(&self) -> Option<f64> {
        match self {
            PointEstimate::Defined { probability, .. } => Some(*probability),
            PointEstimate::HorizonExceedsTimeline { .. } => None,
        }
    }
}

/// A form submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionRequest {
    /// Caller-chosen identifier echoed in the response
    #[serde(default = "new_request_id")]
    pub request_id: String,

    pub applicant: ApplicantRecord,
}

fn new_request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl PredictionRequest {
    pub fn new(applicant: ApplicantRecord) -> Self {
        Self {
            request_id: new_request_id(),
            applicant,
        }
    }
}

/// Outcome classification of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Ok,
    /// Artifacts were not found at startup; prediction is disabled
    ConfigurationMissing,
    /// The request could not be decoded or failed validation
    Rejected,
}

impl ResponseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseStatus::Ok => "ok",
            ResponseStatus::ConfigurationMissing => "configuration_missing",
            ResponseStatus::Rejected => "rejected",
        }
    }
}

/// Reply sent for every request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResponse {
    /// Unique response identifier
    pub response_id: String,

    /// Request this response answers (empty if the request was undecodable)
    pub request_id: String,

    pub status: ResponseStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub curve: Option<SurvivalCurve>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point_estimate: Option<PointEstimate>,

    /// Human-readable summary, warning or error
    pub message: String,

    pub timestamp: DateTime<Utc>,
}

impl PredictionResponse {
    fn with_status(request_id: String, status: ResponseStatus, message: String) -> Self {
        Self {
            response_id: uuid::Uuid::new_v4().to_string(),
            request_id,
            status,
            curve: None,
            point_estimate: None,
            message,
            timestamp: Utc::now(),
        }
    }

    pub fn ok(
        request_id: String,
        curve: SurvivalCurve,
        point_estimate: PointEstimate,
        message: String,
    ) -> Self {
        let mut response = Self::with_status(request_id, ResponseStatus::Ok, message);
        response.curve = Some(curve);
        response.point_estimate = Some(point_estimate);
        response
    }

    pub fn configuration_missing(request_id: String, message: String) -> Self {
        Self::with_status(request_id, ResponseStatus::ConfigurationMissing, message)
    }

    pub fn rejected(request_id: String, message: String) -> Self {
        Self::with_status(request_id, ResponseStatus::Rejected, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn curve(points: &[(f64, f64)]) -> SurvivalCurve {
        SurvivalCurve::new(
            points
                .iter()
                .map(|&(time, survival)| CurvePoint { time, survival })
                .collect(),
        )
    }

    #[test]
    fn test_point_estimate_at_horizon() {
        let c = curve(&[(12.0, 0.97), (24.0, 0.93), (36.0, 0.88), (48.0, 0.84)]);
        assert_eq!(
            c.point_estimate(SURVIVAL_HORIZON_MONTHS),
            PointEstimate::Defined {
                horizon: 36.0,
                probability: 0.88
            }
        );
    }

    #[test]
    fn test_point_estimate_short_timeline() {
        let c = curve(&[(12.0, 0.97), (24.0, 0.93), (30.0, 0.91)]);
        let estimate = c.point_estimate(SURVIVAL_HORIZON_MONTHS);
        assert_eq!(estimate.probability(), None);
        assert_eq!(
            estimate,
            PointEstimate::HorizonExceedsTimeline {
                horizon: 36.0,
                max_time: Some(30.0)
            }
        );
    }

    #[test]
    fn test_point_estimate_no_interpolation() {
        let c = curve(&[(35.0, 0.9), (37.0, 0.89)]);
        assert!(c.point_estimate(36.0).probability().is_none());
    }

    #[test]
    fn test_non_increasing() {
        assert!(curve(&[(1.0, 0.9), (2.0, 0.9), (3.0, 0.8)]).is_non_increasing());
        assert!(!curve(&[(1.0, 0.8), (2.0, 0.9)]).is_non_increasing());
    }

    #[test]
    fn test_response_serialization() {
        let c = curve(&[(36.0, 0.88)]);
        let response = PredictionResponse::ok(
            "req_1".to_string(),
            c.clone(),
            c.point_estimate(36.0),
            "ok".to_string(),
        );

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"status\":\"ok\""));
        assert!(json.contains("\"kind\":\"defined\""));

        let deserialized: PredictionResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.request_id, "req_1");
        assert_eq!(deserialized.curve, Some(c));
    }

    #[test]
    fn test_request_id_defaults() {
        let request: PredictionRequest = serde_json::from_str(
            r#"{"applicant":{"loan_amnt":15000,"int_rate":12.5,"annual_inc":75000,"dti":20,"grade":"B","purpose":"credit_card"}}"#,
        )
        .unwrap();
        assert!(!request.request_id.is_empty());
        assert_eq!(request.applicant.grade, "B");
    }
}
