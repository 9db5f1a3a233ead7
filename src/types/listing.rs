//! House listing payload as sent by clients

use serde::{Deserialize, Deserializer, Serialize};

fn default_grade() -> i32 {
    7
}

fn default_schools_nearby() -> f64 {
    5.0
}

fn default_airport_distance() -> f64 {
    10.5
}

/// A house to be priced.
///
/// Accepts both client naming conventions: the snake_case listing names
/// (`sqft_living`, `yr_built`, `zipcode`) and the camelCase form names
/// (`livingArea`, `builtYear`, `pincode`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HouseListing {
    /// Optional client-side identifier, included in request logs
    #[serde(default, alias = "id")]
    pub listing_id: Option<String>,

    /// Number of bedrooms (whole or half)
    pub bedrooms: f64,

    /// Number of bathrooms (whole or half)
    pub bathrooms: f64,

    /// Living area in square feet
    #[serde(alias = "livingArea", alias = "living_area")]
    pub sqft_living: f64,

    /// Lot area in square feet
    #[serde(alias = "lotArea", alias = "lot_area")]
    pub sqft_lot: f64,

    /// Number of floors (whole or half)
    pub floors: f64,

    /// 1 if the house has a waterfront, 0 otherwise
    #[serde(default)]
    pub waterfront: f64,

    /// Number of views
    #[serde(default)]
    pub view: f64,

    /// Condition rating (1-10)
    pub condition: i32,

    /// Construction grade
    #[serde(default = "default_grade")]
    pub grade: i32,

    /// Area excluding the basement; derived from living and basement area when absent
    #[serde(default)]
    pub sqft_above: Option<f64>,

    /// Basement area
    #[serde(default)]
    pub sqft_basement: f64,

    /// Year the house was built
    #[serde(alias = "builtYear", alias = "built_year")]
    pub yr_built: i32,

    /// Year of the last renovation, 0 if never renovated
    #[serde(default, alias = "renovationYear")]
    pub yr_renovated: i32,

    /// Postal code, given either as a number or a digit string
    #[serde(alias = "pincode", deserialize_with = "deserialize_postal_code")]
    pub zipcode: u32,

    /// Living area after renovation; defaults to the living area
    #[serde(default)]
    pub sqft_living15: Option<f64>,

    /// Lot area after renovation; defaults to the lot area
    #[serde(default)]
    pub sqft_lot15: Option<f64>,

    /// Schools nearby
    #[serde(default = "default_schools_nearby", alias = "schoolsNearby")]
    pub schools_nearby: f64,

    /// Distance from the airport
    #[serde(default = "default_airport_distance", alias = "airportDistance")]
    pub airport_distance: f64,
}

impl HouseListing {
    /// Create a listing with required fields, every optional field at its default
    pub fn new(
        bedrooms: f64,
        bathrooms: f64,
        sqft_living: f64,
        sqft_lot: f64,
        yr_built: i32,
        zipcode: u32,
    ) -> Self {
        Self {
            listing_id: None,
            bedrooms,
            bathrooms,
            sqft_living,
            sqft_lot,
            floors: 1.0,
            waterfront: 0.0,
            view: 0.0,
            condition: 3,
            grade: default_grade(),
            sqft_above: None,
            sqft_basement: 0.0,
            yr_built,
            yr_renovated: 0,
            zipcode,
            sqft_living15: None,
            sqft_lot15: None,
            schools_nearby: default_schools_nearby(),
            airport_distance: default_airport_distance(),
        }
    }
}

/// Length of a postal code sent as text (the form-style `pincode`)
const PINCODE_DIGITS: usize = 6;

/// Numeric zip codes are taken as-is; text codes must be exactly six digits.
#[derive(Deserialize)]
#[serde(untagged)]
enum PostalCodeRepr {
    Number(u32),
    Text(String),
}

fn deserialize_postal_code<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    match PostalCodeRepr::deserialize(deserializer)? {
        PostalCodeRepr::Number(code) => Ok(code),
        PostalCodeRepr::Text(text) => {
            let text = text.trim();
            if !text.chars().all(|c| c.is_ascii_digit()) {
                return Err(serde::de::Error::custom(
                    "postal code must contain only digits",
                ));
            }
            if text.len() != PINCODE_DIGITS {
                return Err(serde::de::Error::custom(format!(
                    "postal code must be a {}-digit number",
                    PINCODE_DIGITS
                )));
            }
            text.parse().map_err(serde::de::Error::custom)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snake_case_listing() {
        let json = r#"{
            "bedrooms": 3, "bathrooms": 2, "sqft_living": 1500, "sqft_lot": 4000,
            "floors": 1, "condition": 3, "grade": 7, "yr_built": 1955, "zipcode": 98178
        }"#;

        let listing: HouseListing = serde_json::from_str(json).unwrap();

        assert_eq!(listing.sqft_living, 1500.0);
        assert_eq!(listing.zipcode, 98178);
        assert_eq!(listing.schools_nearby, 5.0);
        assert_eq!(listing.airport_distance, 10.5);
        assert_eq!(listing.sqft_above, None);
    }

    #[test]
    fn test_camel_case_listing() {
        let json = r#"{
            "pincode": "400001", "lotArea": 5000, "livingArea": 2000, "builtYear": 2000,
            "floors": 2, "bedrooms": 3, "bathrooms": 2.5, "condition": 8
        }"#;

        let listing: HouseListing = serde_json::from_str(json).unwrap();

        assert_eq!(listing.zipcode, 400001);
        assert_eq!(listing.sqft_lot, 5000.0);
        assert_eq!(listing.yr_built, 2000);
        assert_eq!(listing.bathrooms, 2.5);
        assert_eq!(listing.grade, 7);
    }

    #[test]
    fn test_non_numeric_postal_code_rejected() {
        let json = r#"{
            "pincode": "40A001", "lotArea": 5000, "livingArea": 2000, "builtYear": 2000,
            "floors": 2, "bedrooms": 3, "bathrooms": 2, "condition": 8
        }"#;

        assert!(serde_json::from_str::<HouseListing>(json).is_err());
    }

    #[test]
    fn test_text_postal_code_length() {
        let with_pincode = |pincode: &str| {
            format!(
                r#"{{
                    "pincode": "{}", "lotArea": 5000, "livingArea": 2000, "builtYear": 2000,
                    "floors": 2, "bedrooms": 3, "bathrooms": 2, "condition": 8
                }}"#,
                pincode
            )
        };

        assert!(serde_json::from_str::<HouseListing>(&with_pincode("40001")).is_err());
        assert!(serde_json::from_str::<HouseListing>(&with_pincode("4000011")).is_err());
        assert!(serde_json::from_str::<HouseListing>(&with_pincode("")).is_err());

        let listing: HouseListing = serde_json::from_str(&with_pincode("012345")).unwrap();
        assert_eq!(listing.zipcode, 12345);
    }
}
