//! Survival Form
//!
//! Command-line stand-in for the applicant form: builds applicant records
//! within the input ranges, submits them to the service over NATS, and
//! writes each reply's survival chart as SVG and prints the 36-month estimate.

use credit_survival::config::ArtifactsConfig;
use credit_survival::report::{self, ChartOptions};
use credit_survival::types::applicant::{
    sorted_purposes, ApplicantRecord, FieldRange, ANNUAL_INCOME, DEBT_TO_INCOME, GRADES,
    INTEREST_RATE, LOAN_AMOUNT,
};
use credit_survival::types::prediction::{PredictionRequest, PredictionResponse, ResponseStatus};
use credit_survival::{ArtifactLoader, InferenceEngine, RequestHandler};
use anyhow::Context;
use rand::Rng;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// How applicants are filled in
#[derive(Debug, Clone, Copy, PartialEq)]
enum FormMode {
    /// The form's initial state
    Default,
    /// Random slider positions and dropdown choices
    Random,
}

impl FormMode {
    fn parse(s: &str) -> Self {
        match s {
            "random" => FormMode::Random,
            _ => FormMode::Default,
        }
    }
}

/// Applicant generator for form submissions
struct ApplicantGenerator {
    rng: rand::rngs::ThreadRng,
    mode: FormMode,
    purposes: Vec<&'static str>,
}

impl ApplicantGenerator {
    fn new(mode: FormMode) -> Self {
        Self {
            rng: rand::thread_rng(),
            mode,
            purposes: sorted_purposes(),
        }
    }

    fn next_applicant(&mut self) -> ApplicantRecord {
        match self.mode {
            FormMode::Default => ApplicantRecord::default(),
            FormMode::Random => ApplicantRecord::new(
                self.slider(&LOAN_AMOUNT),
                self.slider(&INTEREST_RATE),
                self.slider(&ANNUAL_INCOME),
                self.slider(&DEBT_TO_INCOME),
                GRADES[self.rng.gen_range(0..GRADES.len())],
                self.purposes[self.rng.gen_range(0..self.purposes.len())],
            ),
        }
    }

    /// Value on the slider's step grid
    fn slider(&mut self, range: &FieldRange) -> f64 {
        range.value_at(self.rng.gen_range(0..=range.steps()))
    }
}

fn describe(applicant: &ApplicantRecord) -> String {
    format!(
        "{} {:.0} | {} {:.1} | {} {:.0} | {} {:.1} | grade {} | purpose {}",
        LOAN_AMOUNT.label,
        applicant.loan_amnt,
        INTEREST_RATE.label,
        applicant.int_rate,
        ANNUAL_INCOME.label,
        applicant.annual_inc,
        DEBT_TO_INCOME.label,
        applicant.dti,
        applicant.grade,
        applicant.purpose
    )
}

fn write_chart(chart_dir: &Path, request_id: &str, svg: &str) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(chart_dir)
        .with_context(|| format!("Failed to create chart directory {:?}", chart_dir))?;
    let path = chart_dir.join(format!("survival_{}.svg", request_id));
    fs::write(&path, svg).with_context(|| format!("Failed to write chart to {:?}", path))?;
    Ok(path)
}

fn print_response(
    applicant: &ApplicantRecord,
    response: &PredictionResponse,
    chart_dir: &Path,
) -> anyhow::Result<()> {
    println!("Applicant Information: {}", describe(applicant));
    match (&response.status, &response.curve) {
        (ResponseStatus::Ok, Some(curve)) => {
            let svg = report::render_chart(curve, ChartOptions::default())?;
            let path = write_chart(chart_dir, &response.request_id, &svg)?;
            println!("Prediction Results");
            println!(
                "Predicted probability that the loan will not have defaulted over time: {}",
                path.display()
            );
            println!("{}", response.message);
        }
        (status, _) => println!("[{}] {}", status.as_str(), response.message),
    }
    println!();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("survival_form=info".parse()?),
        )
        .init();

    info!("Starting Survival Form");

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let nats_url = args.get(1).map(|s| s.as_str()).unwrap_or("nats://localhost:4222");
    let subject = args.get(2).map(|s| s.as_str()).unwrap_or("credit.survival.predict");
    let count: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(1);
    let delay_ms: u64 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(500);
    let mode = FormMode::parse(args.get(5).map(|s| s.as_str()).unwrap_or("default"));
    let chart_dir = PathBuf::from(args.get(6).map(|s| s.as_str()).unwrap_or("charts"));

    info!(
        nats_url = %nats_url,
        subject = %subject,
        count = count,
        delay_ms = delay_ms,
        mode = ?mode,
        chart_dir = %chart_dir.display(),
        "Configuration loaded"
    );

    // Connect to NATS
    let client = match async_nats::connect(nats_url).await {
        Ok(c) => {
            info!("Connected to NATS");
            c
        }
        Err(e) => {
            warn!(error = %e, "Failed to connect to NATS. Predicting locally.");
            return run_local_mode(count, delay_ms, mode, &chart_dir).await;
        }
    };

    let mut generator = ApplicantGenerator::new(mode);

    for _ in 0..count {
        let request = PredictionRequest::new(generator.next_applicant());
        let payload = serde_json::to_vec(&request)?;

        let reply = client.request(subject.to_string(), payload.into()).await?;
        let response: PredictionResponse = serde_json::from_slice(&reply.payload)?;
        print_response(&request.applicant, &response, &chart_dir)?;

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    info!("Completed! Submitted {} applicants", count);

    Ok(())
}

async fn run_local_mode(
    count: u64,
    delay_ms: u64,
    mode: FormMode,
    chart_dir: &Path,
) -> anyhow::Result<()> {
    info!("Running in local mode (no NATS connection)");

    let loader = ArtifactLoader::new(ArtifactsConfig::default());
    let handler = match loader.load()? {
        Some(bundle) => RequestHandler::new(Arc::new(InferenceEngine::new(
            bundle,
            &Default::default(),
        ))),
        None => RequestHandler::configuration_missing(loader.missing_message()),
    };

    let mut generator = ApplicantGenerator::new(mode);

    for _ in 0..count {
        let request = PredictionRequest::new(generator.next_applicant());
        let response = handler.handle_request(&request);
        print_response(&request.applicant, &response, chart_dir)?;

        if !handler.is_enabled() {
            break;
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    Ok(())
}
