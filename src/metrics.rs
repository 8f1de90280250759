//! Request statistics for the survival service.

use crate::types::prediction::{PredictionResponse, ResponseStatus};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::info;

const MAX_SAMPLES: usize = 10_000;

/// Metrics collector for request handling
pub struct ServiceMetrics {
    /// Total requests answered
    pub requests_handled: AtomicU64,
    /// Ok responses without a value at the horizon
    pub horizon_undefined: AtomicU64,
    by_status: RwLock<HashMap<ResponseStatus, u64>>,
    /// Handling times (in microseconds)
    processing_times: RwLock<Vec<u64>>,
    /// Histogram of the survival probability at the horizon, 10 buckets over [0, 1]
    survival_buckets: RwLock<[u64; 10]>,
    start_time: Instant,
}

impl ServiceMetrics {
    pub fn new() -> Self {
        Self {
            requests_handled: AtomicU64::new(0),
            horizon_undefined: AtomicU64::new(0),
            by_status: RwLock::new(HashMap::new()),
            processing_times: RwLock::new(Vec::with_capacity(1000)),
            survival_buckets: RwLock::new([0; 10]),
            start_time: Instant::now(),
        }
    }

    /// Record one answered request
    pub fn record_response(&self, response: &PredictionResponse, processing_time: Duration) {
        self.requests_handled.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut by_status) = self.by_status.write() {
            *by_status.entry(response.status).or_insert(0) += 1;
        }

        if let Ok(mut times) = self.processing_times.write() {
            times.push(processing_time.as_micros() as u64);
            if times.len() > MAX_SAMPLES {
                times.drain(0..MAX_SAMPLES / 2);
            }
        }

        if let Some(estimate) = &response.point_estimate {
            match estimate.probability() {
                Some(p) => {
                    let bucket = (p.clamp(0.0, 1.0) * 10.0).min(9.0) as usize;
                    if let Ok(mut buckets) = self.survival_buckets.write() {
                        buckets[bucket] += 1;
                    }
                }
                None => {
                    self.horizon_undefined.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
    }

    pub fn status_count(&self, status: ResponseStatus) -> u64 {
        self.by_status
            .read()
            .map(|m| m.get(&status).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Handling time statistics
    pub fn get_processing_stats(&self) -> ProcessingStats {
        let mut sorted = match self.processing_times.read() {
            Ok(times) if !times.is_empty() => times.clone(),
            _ => return ProcessingStats::default(),
        };
        sorted.sort_unstable();

        let count = sorted.len();
        let sum: u64 = sorted.iter().sum();
        let percentile = |q: f64| sorted[((count as f64 * q) as usize).min(count - 1)];

        ProcessingStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: percentile(0.5),
            p95_us: percentile(0.95),
            p99_us: percentile(0.99),
            max_us: sorted[count - 1],
        }
    }

    /// Requests per second since startup
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.requests_handled.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn get_survival_distribution(&self) -> [u64; 10] {
        self.survival_buckets.read().map(|b| *b).unwrap_or([0; 10])
    }

    /// Print summary statistics
    pub fn print_summary(&self) {
        let handled = self.requests_handled.load(Ordering::Relaxed);
        let undefined = self.horizon_undefined.load(Ordering::Relaxed);
        let processing = self.get_processing_stats();
        let throughput = self.get_throughput();
        let distribution = self.get_survival_distribution();

        info!("╔══════════════════════════════════════════════════════════════╗");
        info!("║            CREDIT SURVIVAL SERVICE - METRICS SUMMARY         ║");
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Requests Handled: {:>8}  │  Throughput: {:>8.1} req/s     ║",
            handled, throughput
        );
        info!(
            "║ ok={:>6}  rejected={:>6}  config_missing={:>6}  no_36m={:>6} ║",
            self.status_count(ResponseStatus::Ok),
            self.status_count(ResponseStatus::Rejected),
            self.status_count(ResponseStatus::ConfigurationMissing),
            undefined
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Handling Time (μs): mean={:>5} p50={:>5} p95={:>5} p99={:>5}  ║",
            processing.mean_us, processing.p50_us, processing.p95_us, processing.p99_us
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ 36-Month Survival Distribution:                              ║");
        let total: u64 = distribution.iter().sum();
        for (i, &count) in distribution.iter().enumerate() {
            let pct = if total > 0 {
                (count as f64 / total as f64) * 100.0
            } else {
                0.0
            };
            let bar = "█".repeat(((pct / 2.0) as usize).min(20));
            info!(
                "║   {:.1}-{:.1}: {:>6} ({:>5.1}%) {}",
                i as f64 / 10.0,
                (i + 1) as f64 / 10.0,
                count,
                pct,
                bar
            );
        }
        info!("╚══════════════════════════════════════════════════════════════╝");
    }
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Handling time statistics
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Periodic metrics summary printer
pub struct MetricsReporter {
    metrics: Arc<ServiceMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<ServiceMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Start the periodic reporting task
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs.max(1)));
        // the first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::prediction::{CurvePoint, PointEstimate, SurvivalCurve};

    fn ok_response(estimate: PointEstimate) -> PredictionResponse {
        PredictionResponse::ok(
            "r".to_string(),
            SurvivalCurve::new(vec![CurvePoint {
                time: 36.0,
                survival: 0.8,
            }]),
            estimate,
            String::new(),
        )
    }

    #[test]
    fn test_metrics_recording() {
        let metrics = ServiceMetrics::new();

        metrics.record_response(
            &ok_response(PointEstimate::Defined {
                horizon: 36.0,
                probability: 0.85,
            }),
            Duration::from_micros(100),
        );
        metrics.record_response(
            &ok_response(PointEstimate::HorizonExceedsTimeline {
                horizon: 36.0,
                max_time: Some(24.0),
            }),
            Duration::from_micros(300),
        );
        metrics.record_response(
            &PredictionResponse::rejected("r".to_string(), "bad".to_string()),
            Duration::from_micros(200),
        );

        assert_eq!(metrics.requests_handled.load(Ordering::Relaxed), 3);
        assert_eq!(metrics.horizon_undefined.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.status_count(ResponseStatus::Ok), 2);
        assert_eq!(metrics.status_count(ResponseStatus::Rejected), 1);
        assert_eq!(metrics.get_survival_distribution()[8], 1);

        let stats = metrics.get_processing_stats();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.mean_us, 200);
        assert_eq!(stats.max_us, 300);
    }

    #[test]
    fn test_empty_stats() {
        let metrics = ServiceMetrics::new();
        assert_eq!(metrics.get_processing_stats().count, 0);
        assert_eq!(metrics.get_survival_distribution(), [0; 10]);
    }
}
