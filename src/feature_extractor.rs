//! Feature alignment for house price model inference.
//!
//! Maps client listings onto the column layout the models were trained on,
//! filling optional fields with their defaults and rejecting listings that
//! fall outside the ranges the models were trained on.

use crate::error::FeatureError;
use crate::types::batch::FeatureBatch;
use crate::types::listing::HouseListing;
use chrono::{Datelike, Utc};

/// Model column names in training order.
pub const MODEL_COLUMNS: [&str; 18] = [
    "number of bedrooms",
    "number of bathrooms",
    "living area",
    "lot area",
    "number of floors",
    "waterfront present",
    "number of views",
    "condition of the house",
    "grade of the house",
    "Area of the house(excluding basement)",
    "Area of the basement",
    "Built Year",
    "Renovation Year",
    "Postal Code",
    "living_area_renov",
    "lot_area_renov",
    "Number of schools nearby",
    "Distance from the airport",
];

const EARLIEST_BUILT_YEAR: i32 = 1800;

/// Feature extractor that turns listings into model input rows.
pub struct FeatureExtractor {
    /// Latest accepted construction year
    latest_year: i32,
}

impl FeatureExtractor {
    /// Create a new feature extractor accepting construction years up to the current year.
    pub fn new() -> Self {
        Self::with_latest_year(Utc::now().year())
    }

    pub fn with_latest_year(latest_year: i32) -> Self {
        Self { latest_year }
    }

    /// Extract one row of features from a listing.
    pub fn extract(&self, listing: &HouseListing) -> Result<Vec<f64>, FeatureError> {
        self.validate(listing)?;

        let sqft_above = listing
            .sqft_above
            .unwrap_or(listing.sqft_living - listing.sqft_basement);

        Ok(vec![
            listing.bedrooms,
            listing.bathrooms,
            listing.sqft_living,
            listing.sqft_lot,
            listing.floors,
            listing.waterfront,
            listing.view,
            listing.condition as f64,
            listing.grade as f64,
            sqft_above,
            listing.sqft_basement,
            listing.yr_built as f64,
            listing.yr_renovated as f64,
            listing.zipcode as f64,
            listing.sqft_living15.unwrap_or(listing.sqft_living),
            listing.sqft_lot15.unwrap_or(listing.sqft_lot),
            listing.schools_nearby,
            listing.airport_distance,
        ])
    }

    /// Extract a batch; any invalid listing rejects the whole batch.
    pub fn extract_batch(&self, listings: &[HouseListing]) -> Result<FeatureBatch, FeatureError> {
        if listings.is_empty() {
            return Err(FeatureError::NoListings);
        }

        let rows = listings
            .iter()
            .map(|listing| self.extract(listing))
            .collect::<Result<Vec<_>, _>>()?;

        FeatureBatch::new(self.feature_names(), rows)
    }

    fn validate(&self, listing: &HouseListing) -> Result<(), FeatureError> {
        positive("sqft_living", listing.sqft_living)?;
        positive("sqft_lot", listing.sqft_lot)?;
        positive("bedrooms", listing.bedrooms)?;
        positive("bathrooms", listing.bathrooms)?;
        positive("floors", listing.floors)?;
        whole_or_half("bedrooms", listing.bedrooms)?;
        whole_or_half("bathrooms", listing.bathrooms)?;
        whole_or_half("floors", listing.floors)?;

        non_negative("sqft_basement", listing.sqft_basement)?;
        non_negative("view", listing.view)?;
        non_negative("schools_nearby", listing.schools_nearby)?;
        non_negative("airport_distance", listing.airport_distance)?;
        if let Some(above) = listing.sqft_above {
            non_negative("sqft_above", above)?;
        }
        if listing.sqft_basement > listing.sqft_living {
            return Err(invalid("sqft_basement", "must not exceed the living area"));
        }

        if listing.waterfront != 0.0 && listing.waterfront != 1.0 {
            return Err(invalid("waterfront", "must be 0 or 1"));
        }

        if !(1..=10).contains(&listing.condition) {
            return Err(invalid("condition", "must be between 1 and 10"));
        }

        if !(EARLIEST_BUILT_YEAR..=self.latest_year).contains(&listing.yr_built) {
            return Err(invalid(
                "yr_built",
                &format!(
                    "must be between {} and {}",
                    EARLIEST_BUILT_YEAR, self.latest_year
                ),
            ));
        }

        if listing.yr_renovated != 0
            && !(listing.yr_built..=self.latest_year).contains(&listing.yr_renovated)
        {
            return Err(invalid(
                "yr_renovated",
                "must be 0 or between the built year and the current year",
            ));
        }

        Ok(())
    }

    /// Get the number of features produced.
    pub fn feature_count(&self) -> usize {
        MODEL_COLUMNS.len()
    }

    /// Get feature names in model order.
    pub fn feature_names(&self) -> Vec<String> {
        MODEL_COLUMNS.iter().map(|c| c.to_string()).collect()
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn invalid(field: &'static str, reason: &str) -> FeatureError {
    FeatureError::InvalidField {
        field,
        reason: reason.to_string(),
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), FeatureError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, "must be a positive number"))
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), FeatureError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, "must not be negative"))
    }
}

fn whole_or_half(field: &'static str, value: f64) -> Result<(), FeatureError> {
    let fraction = value.fract();
    if fraction == 0.0 || fraction == 0.5 {
        Ok(())
    } else {
        Err(invalid(field, "must be a whole number or end in .5"))
    }
}
