//! Performance metrics and statistics tracking for the prediction service.

use crate::models::aggregator::VotingReport;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::info;

/// Metrics collector for service performance
pub struct ServiceMetrics {
    /// Prediction requests answered successfully
    pub requests_processed: AtomicU64,
    /// Listings priced across all successful requests
    pub samples_predicted: AtomicU64,
    /// Failed requests by response code
    errors_by_code: RwLock<HashMap<u16, u64>>,
    /// Processing times (in microseconds)
    processing_times: RwLock<Vec<u64>>,
    /// Model inference times (in microseconds)
    model_times: RwLock<HashMap<String, Vec<u64>>>,
    /// Calls in which each model was excluded from the vote
    model_failures: RwLock<HashMap<String, u64>>,
    /// Start time for rate calculation
    start_time: Instant,
    /// Model agreement tracking (how closely member prices agree)
    model_agreements: RwLock<Vec<f64>>,
}

impl ServiceMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            requests_processed: AtomicU64::new(0),
            samples_predicted: AtomicU64::new(0),
            errors_by_code: RwLock::new(HashMap::new()),
            processing_times: RwLock::new(Vec::with_capacity(1000)),
            model_times: RwLock::new(HashMap::new()),
            model_failures: RwLock::new(HashMap::new()),
            start_time: Instant::now(),
            model_agreements: RwLock::new(Vec::with_capacity(1000)),
        }
    }

    /// Record a successful prediction request
    pub fn record_request(&self, processing_time: Duration, samples: usize) {
        self.requests_processed.fetch_add(1, Ordering::Relaxed);
        self.samples_predicted
            .fetch_add(samples as u64, Ordering::Relaxed);

        if let Ok(mut times) = self.processing_times.write() {
            times.push(processing_time.as_micros() as u64);
            // Keep only last 10000 for memory efficiency
            if times.len() > 10000 {
                times.drain(0..5000);
            }
        }
    }

    /// Record a failed request
    pub fn record_error(&self, code: u16) {
        if let Ok(mut by_code) = self.errors_by_code.write() {
            *by_code.entry(code).or_insert(0) += 1;
        }
    }

    /// Record model inference time
    pub fn record_model_time(&self, model_name: &str, duration: Duration) {
        if let Ok(mut times) = self.model_times.write() {
            let model_times = times.entry(model_name.to_string()).or_insert_with(Vec::new);
            model_times.push(duration.as_micros() as u64);
            // Keep only last 1000 per model
            if model_times.len() > 1000 {
                model_times.drain(0..500);
            }
        }
    }

    /// Record per-model outcomes of one ensemble call
    pub fn record_voting(&self, report: &VotingReport) {
        for member in &report.succeeded {
            self.record_model_time(&member.name, member.elapsed);
        }

        if !report.failed.is_empty() {
            if let Ok(mut failures) = self.model_failures.write() {
                for failure in &report.failed {
                    *failures.entry(failure.name.clone()).or_insert(0) += 1;
                }
            }
        }

        let n_samples = report
            .succeeded
            .first()
            .map(|m| m.values.len())
            .unwrap_or(0);
        for sample in 0..n_samples {
            let prices: Vec<f64> = report.succeeded.iter().map(|m| m.values[sample]).collect();
            self.record_model_agreement(&prices);
        }
    }

    /// Record model agreement for one sample (1 - coefficient of variation)
    pub fn record_model_agreement(&self, prices: &[f64]) {
        if prices.len() < 2 {
            return;
        }

        let mean = prices.iter().sum::<f64>() / prices.len() as f64;
        if mean.abs() < f64::EPSILON {
            return;
        }
        let variance =
            prices.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / prices.len() as f64;
        let cv = variance.sqrt() / mean.abs();

        let agreement = 1.0 - cv.min(1.0);

        if let Ok(mut agreements) = self.model_agreements.write() {
            agreements.push(agreement);
            if agreements.len() > 1000 {
                agreements.drain(0..500);
            }
        }
    }

    /// Get processing time statistics
    pub fn get_processing_stats(&self) -> ProcessingStats {
        self.processing_times
            .read()
            .map(|times| ProcessingStats::from_micros(&times))
            .unwrap_or_default()
    }

    /// Get per-model timings and failure counts.
    ///
    /// Timings cover only calls whose output entered the vote; a model that
    /// never succeeded still appears with its failures.
    pub fn get_model_stats(&self) -> HashMap<String, ModelStats> {
        let mut stats: HashMap<String, ModelStats> = self
            .model_times
            .read()
            .map(|times| {
                times
                    .iter()
                    .map(|(model, micros)| {
                        let latency = ProcessingStats::from_micros(micros);
                        (
                            model.clone(),
                            ModelStats {
                                calls: latency.count,
                                failures: 0,
                                mean_us: latency.mean_us,
                                p50_us: latency.p50_us,
                                p99_us: latency.p99_us,
                            },
                        )
                    })
                    .collect()
            })
            .unwrap_or_default();

        for (model, failures) in self.get_model_failures() {
            stats.entry(model).or_default().failures = failures;
        }

        stats
    }

    /// Get failure counts per model
    pub fn get_model_failures(&self) -> HashMap<String, u64> {
        self.model_failures
            .read()
            .map(|f| f.clone())
            .unwrap_or_default()
    }

    /// Get average model agreement
    pub fn get_avg_agreement(&self) -> f64 {
        let Ok(agreements) = self.model_agreements.read() else {
            return 0.0;
        };
        if agreements.is_empty() {
            return 0.0;
        }
        agreements.iter().sum::<f64>() / agreements.len() as f64
    }

    /// Get current throughput (requests per second)
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.requests_processed.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Get failed requests by response code
    pub fn get_errors_by_code(&self) -> HashMap<u16, u64> {
        self.errors_by_code
            .read()
            .map(|e| e.clone())
            .unwrap_or_default()
    }

    /// Print summary statistics
    pub fn print_summary(&self) {
        let requests = self.requests_processed.load(Ordering::Relaxed);
        let samples = self.samples_predicted.load(Ordering::Relaxed);
        let errors_by_code = self.get_errors_by_code();
        let error_count: u64 = errors_by_code.values().sum();

        let processing = self.get_processing_stats();
        let throughput = self.get_throughput();
        let agreement = self.get_avg_agreement();

        info!("╔══════════════════════════════════════════════════════════════╗");
        info!("║         HOUSE PRICE SERVICE - METRICS SUMMARY                ║");
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Requests Served:  {:>8}  │  Throughput: {:>6.1} req/s      ║",
            requests, throughput
        );
        info!(
            "║ Listings Priced:  {:>8}  │  Failed Requests: {:>8}     ║",
            samples, error_count
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Processing Time (μs): mean={:>5} p50={:>5} p95={:>5} p99={:>5} ║",
            processing.mean_us, processing.p50_us, processing.p95_us, processing.p99_us
        );
        info!(
            "║ Model Agreement: {:>5.1}% (higher = models agree more)        ║",
            agreement * 100.0
        );
        if !errors_by_code.is_empty() {
            info!("╠══════════════════════════════════════════════════════════════╣");
            info!("║ Failed Requests by Code:                                     ║");
            for (code, count) in &errors_by_code {
                info!("║   {:>3}: {:>6}                                              ║", code, count);
            }
        }
        info!("╚══════════════════════════════════════════════════════════════╝");

        let model_stats = self.get_model_stats();
        if !model_stats.is_empty() {
            info!("Model Inference Times (μs):");
            for (model, stats) in &model_stats {
                info!(
                    "  {}: mean={} p50={} p99={} (calls={}, failures={})",
                    model, stats.mean_us, stats.p50_us, stats.p99_us, stats.calls, stats.failures
                );
            }
        }
    }
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Processing time statistics
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

impl ProcessingStats {
    fn from_micros(times: &[u64]) -> Self {
        if times.is_empty() {
            return Self::default();
        }

        let mut sorted = times.to_vec();
        sorted.sort_unstable();
        let count = sorted.len();
        let at = |q: f64| sorted[((count as f64 * q) as usize).min(count - 1)];

        Self {
            count: count as u64,
            mean_us: sorted.iter().sum::<u64>() / count as u64,
            p50_us: at(0.5),
            p95_us: at(0.95),
            p99_us: at(0.99),
            max_us: sorted[count - 1],
        }
    }
}

/// Model-specific statistics
#[derive(Debug, Default)]
pub struct ModelStats {
    /// Successful calls
    pub calls: u64,
    pub failures: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p99_us: u64,
}

/// Real-time metrics reporter that prints periodic summaries
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
        // The first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}
