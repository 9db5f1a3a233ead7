//! House Price Service - Main Entry Point
//!
//! Loads the model ensemble, then answers price prediction and health
//! requests over NATS request/reply. Prediction requests are handled in
//! parallel, bounded by the configured worker count.

use anyhow::Result;
use futures::StreamExt;
use house_price_service::{
    config::{AppConfig, LoggingConfig},
    consumer::RequestConsumer,
    feature_extractor::FeatureExtractor,
    metrics::{MetricsReporter, ServiceMetrics},
    models::inference::InferenceEngine,
    producer::ReplyPublisher,
    service::PredictionService,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| {
        EnvFilter::try_new(format!("house_price_service={}", logging.level))
    })?;

    if logging.format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
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

    info!("Starting House Price Service");
    info!(
        voting_method = %config.models.voting_method,
        members = config.models.members.len(),
        models_dir = %config.models.models_dir,
        "Configuration loaded successfully"
    );

    // Initialize metrics
    let metrics = Arc::new(ServiceMetrics::new());

    // Initialize components
    let feature_extractor = FeatureExtractor::new();
    info!(
        "Feature extractor initialized ({} features)",
        feature_extractor.feature_count()
    );

    let inference_engine = match InferenceEngine::new(&config, feature_extractor.feature_names())
    {
        Ok(engine) => {
            info!(
                "Inference engine initialized with {} models: {:?}",
                engine.model_count(),
                engine.model_names()
            );
            Some(Arc::new(engine))
        }
        Err(e) if config.service.allow_degraded_start => {
            error!(error = ?e, "Could not load models, serving in degraded mode");
            None
        }
        Err(e) => return Err(e),
    };

    let service = Arc::new(PredictionService::new(
        inference_engine,
        feature_extractor,
        metrics.clone(),
        config.service.clone(),
    ));

    // Connect to NATS
    let client = async_nats::connect(&config.nats.url).await?;
    info!("Connected to NATS at {}", config.nats.url);

    let publisher = ReplyPublisher::new(client.clone());
    let predict_consumer = RequestConsumer::new(client.clone(), &config.nats.predict_subject)
        .with_queue_group(config.nats.queue_group.clone());
    let health_consumer = RequestConsumer::new(client.clone(), &config.nats.health_subject);

    // Health checks are cheap; answer them inline on their own task
    let mut health_requests = health_consumer.subscribe().await?;
    let health_service = service.clone();
    let health_publisher = publisher.clone();
    tokio::spawn(async move {
        while let Some(message) = health_requests.next().await {
            let status = health_service.health();
            if let Err(e) = health_publisher
                .reply(message.reply.as_ref(), &status)
                .await
            {
                error!(error = %e, "Failed to publish health reply");
            }
        }
    });

    // Start metrics reporter
    let metrics_clone = metrics.clone();
    let interval_secs = config.pipeline.metrics_interval_secs;
    tokio::spawn(async move {
        let reporter = MetricsReporter::new(metrics_clone, interval_secs);
        reporter.start().await;
    });

    // Parallel processing configuration
    let num_workers = config.pipeline.workers.max(1);
    info!(
        "Starting request processing loop with {} parallel workers",
        num_workers
    );
    info!("Listening on subject: {}", predict_consumer.subject());
    info!("Health checks on: {}", health_consumer.subject());

    // Semaphore to limit concurrent processing
    let semaphore = Arc::new(Semaphore::new(num_workers));
    let processed_count = Arc::new(AtomicU64::new(0));

    let mut subscription = predict_consumer.subscribe().await?;

    loop {
        let message = tokio::select! {
            message = subscription.next() => match message {
                Some(message) => message,
                None => {
                    warn!("Prediction subscription closed");
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        };

        // Acquire permit (limits concurrent tasks)
        let permit = semaphore.clone().acquire_owned().await?;

        let service = service.clone();
        let publisher = publisher.clone();
        let processed_count = processed_count.clone();

        tokio::spawn(async move {
            // Inference is CPU-bound; keep it off the async workers
            let payload = message.payload.clone();
            let worker_service = service.clone();
            let reply =
                tokio::task::spawn_blocking(move || worker_service.handle_predict(&payload)).await;

            match reply {
                Ok(reply) => {
                    if let Err(e) = publisher.reply(message.reply.as_ref(), &reply).await {
                        error!(error = %e, "Failed to publish prediction reply");
                    }
                }
                Err(e) => {
                    error!(error = %e, "Prediction task panicked");
                }
            }

            let count = processed_count.fetch_add(1, Ordering::Relaxed) + 1;

            // Log progress every 100 requests
            if count % 100 == 0 {
                let metrics = service.metrics();
                let processing_stats = metrics.get_processing_stats();
                info!(
                    processed = count,
                    throughput = format!("{:.1} req/s", metrics.get_throughput()),
                    avg_latency_us = processing_stats.mean_us,
                    "Processing milestone"
                );
            }

            // Release permit when done
            drop(permit);
        });
    }

    // Print final summary
    info!("Service shutting down...");
    metrics.print_summary();

    Ok(())
}
