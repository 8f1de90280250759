//! NATS publisher for prediction responses

use crate::types::prediction::PredictionResponse;
use anyhow::Result;
use async_nats::{Client, Subject};
use tracing::debug;

/// Publishes responses to the request's reply subject, or to a fallback subject
#[derive(Clone)]
pub struct ResponsePublisher {
    client: Client,
    fallback_subject: String,
}

impl ResponsePublisher {
    /// Create a new response publisher
    pub fn new(client: Client, fallback_subject: &str) -> Self {
        Self {
            client,
            fallback_subject: fallback_subject.to_string(),
        }
    }

    /// Publish a response
    pub async fn publish(&self, reply: Option<Subject>, response: &PredictionResponse) -> Result<()> {
        let payload = serde_json::to_vec(response)?;
        let subject = reply.unwrap_or_else(|| Subject::from(self.fallback_subject.as_str()));

        debug!(
            subject = %subject,
            request_id = %response.request_id,
            status = response.status.as_str(),
            "Publishing prediction response"
        );

        self.client.publish(subject, payload.into()).await?;
        Ok(())
    }

    /// Get the fallback subject name
    pub fn fallback_subject(&self) -> &str {
        &self.fallback_subject
    }
}
