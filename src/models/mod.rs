//! Fitted model artifacts and inference

pub mod cox;
pub mod inference;
pub mod loader;
pub mod scaler;

pub use cox::CoxModel;
pub use inference::InferenceEngine;
pub use loader::{ArtifactBundle, ArtifactLoader};
pub use scaler::StandardScaler;
