use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::QueryError;

/// Longest mortgage term accepted, in years
pub const MAX_MORTGAGE_YEARS: i64 = 100;

/// Inclusive bounds; `min` may equal `max`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Bounds<T> {
    pub min: T,
    pub max: T,
}

impl<T: PartialOrd + Copy> Bounds<T> {
    pub fn new(min: T, max: T) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: T) -> bool {
        self.min <= value && value <= self.max
    }
}

/// Geographical position of a listing
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoLocation {
    pub latitude: f64,
    pub longitude: f64,
}

/// A search area suggested by the provider's type-ahead
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub display_name: String,
    pub identifier: String,
    pub normalised_name: String,
}

/// Raw listing as delivered by a listing source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawListing {
    pub id: String,
    pub address: String,
    pub price: i64,
    pub bedrooms: u32,
    pub location: GeoLocation,
    pub image_url: String,
    pub url: String,
    /// Monthly rent the listing is expected to fetch before adjustments
    pub base_rent: f64,
    #[serde(default = "Utc::now")]
    pub fetched_at: DateTime<Utc>,
}

/// A listing valued against a query. Immutable once ranked.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredProperty {
    pub listing: RawListing,
    pub estimated_rent: f64,
    /// Deposit boundary the ROI was evaluated at
    pub deposit: i64,
    pub mortgage_monthly_payment: f64,
    pub roi: f64,
    /// 1-based, dense
    pub rank: usize,
}

/// Financial assumptions and search bounds for one ranking request.
///
/// `display_name` is a label only and never influences results or the cache key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Query {
    pub location_identifier: String,
    pub display_name: String,
    pub price_range: Bounds<i64>,
    pub bedroom_range: Bounds<i64>,
    pub deposit_range: Bounds<i64>,
    /// Years
    pub mortgage_length: i64,
    /// Annual percentage, e.g. `5.5`
    pub mortgage_interest_rate: f64,
    pub investment_increase: i64,
    pub investment_deduction: i64,
    pub rent_increase: i64,
    pub rent_deduction: i64,
}

impl Query {
    /// Check bounds ordering and numeric domains, reporting the first offending field.
    pub fn validate(&self) -> Result<(), QueryError> {
        if self.location_identifier.trim().is_empty() {
            return Err(QueryError::invalid("identifier", "must not be empty"));
        }

        check_bounds("price", &self.price_range)?;
        check_bounds("bedrooms", &self.bedroom_range)?;
        check_bounds("deposit", &self.deposit_range)?;

        if self.mortgage_length <= 0 || self.mortgage_length > MAX_MORTGAGE_YEARS {
            return Err(QueryError::invalid(
                "mortgage_length",
                format!(
                    "must be between 1 and {MAX_MORTGAGE_YEARS} years, got {}",
                    self.mortgage_length
                ),
            ));
        }

        let rate = self.mortgage_interest_rate;
        if !rate.is_finite() || rate < 0.0 {
            return Err(QueryError::invalid(
                "mortgage_interest_rate",
                format!("must be a non-negative number, got {rate}"),
            ));
        }

        for (field, value) in [
            ("investment_increase", self.investment_increase),
            ("investment_deduction", self.investment_deduction),
            ("rent_increase", self.rent_increase),
            ("rent_deduction", self.rent_deduction),
        ] {
            if value < 0 {
                return Err(QueryError::invalid(
                    field,
                    format!("must be non-negative, got {value}"),
                ));
            }
        }

        Ok(())
    }

    /// Deterministic signature of every field that affects filtering or scoring.
    ///
    /// Expects a validated query, so bounds are already in min/max order.
    pub fn cache_key(&self) -> String {
        // -0.0 and 0.0 must collide
        let rate = if self.mortgage_interest_rate == 0.0 {
            0.0
        } else {
            self.mortgage_interest_rate
        };

        format!(
            "valuation:{}:price={}-{}:bedrooms={}-{}:deposit={}-{}:term={}:rate={}:investment=+{}-{}:rent=+{}-{}",
            self.location_identifier.trim(),
            self.price_range.min,
            self.price_range.max,
            self.bedroom_range.min,
            self.bedroom_range.max,
            self.deposit_range.min,
            self.deposit_range.max,
            self.mortgage_length,
            rate,
            self.investment_increase,
            self.investment_deduction,
            self.rent_increase,
            self.rent_deduction,
        )
    }
}

fn check_bounds(name: &'static str, bounds: &Bounds<i64>) -> Result<(), QueryError> {
    if bounds.min < 0 {
        return Err(QueryError::invalid(
            name,
            format!("minimum must be non-negative, got {}", bounds.min),
        ));
    }
    if bounds.min > bounds.max {
        return Err(QueryError::invalid(
            name,
            format!(
                "minimum {} is greater than maximum {}",
                bounds.min, bounds.max
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_query() -> Query {
        Query {
            location_identifier: "REGION^87490".to_string(),
            display_name: "London".to_string(),
            price_range: Bounds::new(100_000, 300_000),
            bedroom_range: Bounds::new(1, 3),
            deposit_range: Bounds::new(10_000, 30_000),
            mortgage_length: 10,
            mortgage_interest_rate: 5.5,
            investment_increase: 0,
            investment_deduction: 0,
            rent_increase: 0,
            rent_deduction: 0,
        }
    }

    pub(crate) fn listing(id: &str, price: i64, bedrooms: u32, base_rent: f64) -> RawListing {
        RawListing {
            id: id.to_string(),
            address: format!("{id} High Street"),
            price,
            bedrooms,
            location: GeoLocation {
                latitude: 51.5,
                longitude: -0.12,
            },
            image_url: format!("https://img.example/{id}.jpg"),
            url: format!("https://listings.example/properties/{id}"),
            base_rent,
            fetched_at: Utc::now(),
        }
    }

    #[test]
    fn test_valid_query_passes() {
        assert!(sample_query().validate().is_ok());
    }

    #[test]
    fn test_inverted_price_bounds_rejected() {
        let mut query = sample_query();
        query.price_range = Bounds::new(300_000, 100_000);

        match query.validate() {
            Err(QueryError::InvalidQuery { field, .. }) => assert_eq!(field, "price"),
            other => panic!("expected invalid price bounds, got {other:?}"),
        }
    }

    #[test]
    fn test_equal_bounds_allowed() {
        let mut query = sample_query();
        query.deposit_range = Bounds::new(0, 0);
        query.bedroom_range = Bounds::new(2, 2);
        assert!(query.validate().is_ok());
    }

    #[test]
    fn test_non_positive_mortgage_length_rejected() {
        let mut query = sample_query();
        query.mortgage_length = 0;

        match query.validate() {
            Err(QueryError::InvalidQuery { field, .. }) => assert_eq!(field, "mortgage_length"),
            other => panic!("expected invalid mortgage length, got {other:?}"),
        }
    }

    #[test]
    fn test_excessive_mortgage_length_rejected() {
        let mut query = sample_query();
        query.mortgage_length = MAX_MORTGAGE_YEARS;
        assert!(query.validate().is_ok());

        query.mortgage_length = 1_000_000_000_000_000_000;
        match query.validate() {
            Err(QueryError::InvalidQuery { field, .. }) => assert_eq!(field, "mortgage_length"),
            other => panic!("expected invalid mortgage length, got {other:?}"),
        }
    }

    #[test]
    fn test_negative_rate_and_adjustments_rejected() {
        let mut query = sample_query();
        query.mortgage_interest_rate = -0.1;
        assert!(query.validate().is_err());

        let mut query = sample_query();
        query.mortgage_interest_rate = f64::NAN;
        assert!(query.validate().is_err());

        let mut query = sample_query();
        query.rent_deduction = -5;
        match query.validate() {
            Err(QueryError::InvalidQuery { field, .. }) => assert_eq!(field, "rent_deduction"),
            other => panic!("expected invalid rent deduction, got {other:?}"),
        }
    }

    #[test]
    fn test_cache_key_ignores_display_name() {
        let a = sample_query();
        let mut b = sample_query();
        b.display_name = "Greater London".to_string();
        assert_eq!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn test_cache_key_tracks_scoring_fields() {
        let a = sample_query();
        let mut b = sample_query();
        b.rent_increase = 50;
        assert_ne!(a.cache_key(), b.cache_key());

        let mut c = sample_query();
        c.mortgage_interest_rate = 5.25;
        assert_ne!(a.cache_key(), c.cache_key());
    }

    #[test]
    fn test_cache_key_collapses_negative_zero_rate() {
        let mut a = sample_query();
        a.mortgage_interest_rate = 0.0;
        let mut b = sample_query();
        b.mortgage_interest_rate = -0.0;
        assert_eq!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn test_bounds_contains_is_inclusive() {
        let bounds = Bounds::new(2, 4);
        assert!(bounds.contains(2));
        assert!(bounds.contains(4));
        assert!(!bounds.contains(5));
    }
}
