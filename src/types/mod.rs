//! Type definitions for the house price service

pub mod batch;
pub mod listing;
pub mod quote;

pub use batch::FeatureBatch;
pub use listing::HouseListing;
pub use quote::{ErrorReply, HealthStatus, PredictionReply, PriceQuote};
