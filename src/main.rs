//! Credit Survival Service - Main Entry Point
//!
//! Loads the fitted survival artifacts once, then answers prediction
//! requests received over NATS with a survival curve and 36-month estimate.

use anyhow::Result;
use credit_survival::{
    config::{AppConfig, LoggingConfig},
    consumer::RequestConsumer,
    handler::RequestHandler,
    metrics::{MetricsReporter, ServiceMetrics},
    models::{inference::InferenceEngine, loader::ArtifactLoader},
    producer::ResponsePublisher,
    types::prediction::ResponseStatus,
};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, error, info};

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().or_else(|_| {
        tracing_subscriber::EnvFilter::try_new(format!("credit_survival={}", logging.level))
    })?;

    if logging.format == "json" {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::load()?;
    init_logging(&config.logging)?;

    info!("Starting Credit Survival Service");
    info!(
        artifacts_dir = %config.artifacts.dir,
        strict_categories = config.prediction.strict_categories,
        "Configuration loaded successfully"
    );

    // Load artifacts once; the bundle is shared read-only by every request
    let loader = ArtifactLoader::new(config.artifacts.clone());
    let handler = match loader.load()? {
        Some(bundle) => {
            let engine = InferenceEngine::new(bundle, &config.prediction);
            info!(features = engine.feature_count(), "Prediction enabled");
            RequestHandler::new(Arc::new(engine))
        }
        None => {
            error!("{}", loader.missing_message());
            RequestHandler::configuration_missing(loader.missing_message())
        }
    };
    let handler = Arc::new(handler);

    let metrics = Arc::new(ServiceMetrics::new());

    // Connect to NATS
    let client = async_nats::connect(&config.nats.url).await?;
    info!("Connected to NATS at {}", config.nats.url);

    let consumer = RequestConsumer::new(client.clone(), &config.nats.request_subject);
    let publisher = Arc::new(ResponsePublisher::new(client.clone(), &config.nats.response_subject));

    let num_workers = config.pipeline.workers.max(1);
    info!(
        workers = num_workers,
        subject = %consumer.subject(),
        fallback_subject = %publisher.fallback_subject(),
        "Starting request loop"
    );

    let semaphore = Arc::new(Semaphore::new(num_workers));

    // Start metrics reporter
    let reporter = MetricsReporter::new(metrics.clone(), config.pipeline.report_interval_secs);
    tokio::spawn(reporter.start());

    let mut subscription = consumer.subscribe().await?;

    while let Some(message) = subscription.next().await {
        // Acquire permit (limits concurrent tasks)
        let permit = semaphore.clone().acquire_owned().await?;

        let handler = handler.clone();
        let publisher = publisher.clone();
        let metrics = metrics.clone();

        tokio::spawn(async move {
            let start_time = Instant::now();

            // Each request owns its record and derived features
            let response = handler.handle(&message.payload);
            let processing_time = start_time.elapsed();
            metrics.record_response(&response, processing_time);

            match response.status {
                ResponseStatus::Ok => debug!(
                    request_id = %response.request_id,
                    processing_time_us = processing_time.as_micros(),
                    "{}",
                    response.message
                ),
                status => info!(
                    request_id = %response.request_id,
                    status = status.as_str(),
                    "{}",
                    response.message
                ),
            }

            if let Err(e) = publisher.publish(message.reply.clone(), &response).await {
                error!(
                    request_id = %response.request_id,
                    error = %e,
                    "Failed to publish prediction response"
                );
            }

            drop(permit);
        });
    }

    info!("Service shutting down...");
    metrics.print_summary();

    Ok(())
}
