//! Test Client
//!
//! Generates random listings and sends them to the prediction service over
//! NATS request/reply, then queries the health subject.

use house_price_service::types::{HouseListing, PredictionReply};
use rand::Rng;
use serde_json::json;
use std::time::Duration;
use tracing::{info, warn};

/// Listing generator for testing
struct ListingGenerator {
    rng: rand::rngs::ThreadRng,
    listing_counter: u64,
}

impl ListingGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
            listing_counter: 0,
        }
    }

    /// Generate a plausible single-family listing
    fn generate(&mut self) -> HouseListing {
        self.listing_counter += 1;

        let sqft_living = self.rng.gen_range(600.0..5000.0_f64).round();
        let sqft_basement = if self.rng.gen_bool(0.4) {
            (sqft_living * self.rng.gen_range(0.1..0.4)).round()
        } else {
            0.0
        };
        let yr_built = self.rng.gen_range(1900..2020);

        let mut listing = HouseListing::new(
            f64::from(self.rng.gen_range(1..7)),
            f64::from(self.rng.gen_range(2..9)) / 2.0,
            sqft_living,
            self.rng.gen_range(1500.0..20000.0_f64).round(),
            yr_built,
            self.rng.gen_range(122001..122020),
        );
        listing.listing_id = Some(format!("listing_{:06}", self.listing_counter));
        listing.floors = f64::from(self.rng.gen_range(2..7)) / 2.0;
        listing.waterfront = if self.rng.gen_bool(0.05) { 1.0 } else { 0.0 };
        listing.view = f64::from(self.rng.gen_range(0..5));
        listing.condition = self.rng.gen_range(1..6);
        listing.grade = self.rng.gen_range(4..13);
        listing.sqft_basement = sqft_basement;
        if self.rng.gen_bool(0.2) {
            listing.yr_renovated = self.rng.gen_range(yr_built..=2024);
        }
        listing.schools_nearby = f64::from(self.rng.gen_range(1..4));
        listing.airport_distance = self.rng.gen_range(50.0..80.0_f64).round();

        listing
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("test_client=info".parse()?),
        )
        .init();

    info!("Starting Test Client");

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let nats_url = args.get(1).map(|s| s.as_str()).unwrap_or("nats://localhost:4222");
    let subject = args.get(2).map(|s| s.as_str()).unwrap_or("house.price.predict");
    let health_subject = args.get(3).map(|s| s.as_str()).unwrap_or("house.price.health");
    let count: u64 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(20);
    let batch_size: usize = args.get(5).and_then(|s| s.parse().ok()).unwrap_or(1);
    let delay_ms: u64 = args.get(6).and_then(|s| s.parse().ok()).unwrap_or(100);

    info!(
        nats_url = %nats_url,
        subject = %subject,
        count = count,
        batch_size = batch_size,
        delay_ms = delay_ms,
        "Configuration loaded"
    );

    let mut generator = ListingGenerator::new();

    // Connect to NATS
    let client = match async_nats::connect(nats_url).await {
        Ok(c) => {
            info!("Connected to NATS");
            c
        }
        Err(e) => {
            warn!(error = %e, "Failed to connect to NATS. Printing sample requests only.");
            for i in 0..count.min(3) {
                let listing = generator.generate();
                info!("Sample request {}:\n{}", i + 1, serde_json::to_string_pretty(&listing)?);
            }
            return Ok(());
        }
    };

    let health = client.request(health_subject.to_string(), "".into()).await?;
    info!("Health: {}", String::from_utf8_lossy(&health.payload));

    let mut succeeded = 0;
    let mut failed = 0;

    for i in 0..count {
        let listings: Vec<HouseListing> = (0..batch_size.max(1)).map(|_| generator.generate()).collect();
        let payload = if listings.len() == 1 {
            serde_json::to_vec(&listings[0])?
        } else {
            serde_json::to_vec(&json!({ "listings": listings }))?
        };

        let response = client.request(subject.to_string(), payload.into()).await?;

        match serde_json::from_slice::<PredictionReply>(&response.payload) {
            Ok(PredictionReply::Success(quote)) => {
                succeeded += 1;
                info!(
                    request = i + 1,
                    prediction = quote.prediction,
                    voting_method = %quote.voting_method,
                    failed_models = ?quote.failed_models,
                    "Received quote"
                );
            }
            Ok(PredictionReply::Error(reply)) => {
                failed += 1;
                warn!(request = i + 1, code = reply.code, message = %reply.message, "Received error reply");
            }
            Err(e) => {
                failed += 1;
                warn!(request = i + 1, error = %e, "Could not decode reply");
            }
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    info!("Completed! {} requests ({} succeeded, {} failed)", count, succeeded, failed);

    Ok(())
}
