//! Type definitions for the credit survival service

pub mod applicant;
pub mod prediction;

pub use applicant::ApplicantRecord;
pub use prediction::{PointEstimate, PredictionRequest, PredictionResponse, SurvivalCurve};
