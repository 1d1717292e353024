use serde::{Deserialize, Serialize};

use crate::error::QueryError;
use crate::models::{Bounds, Location, Query, ScoredProperty};

/// A numeric form field. Browsers post these as strings, API clients as numbers.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Numeric {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Numeric {
    fn as_f64(&self, field: &'static str) -> Result<f64, QueryError> {
        let value = match self {
            Numeric::Int(v) => *v as f64,
            Numeric::Float(v) => *v,
            Numeric::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| QueryError::invalid(field, format!("not a number: {s:?}")))?,
        };
        if !value.is_finite() {
            return Err(QueryError::invalid(field, "must be a finite number"));
        }
        Ok(value)
    }

    fn as_i64(&self, field: &'static str) -> Result<i64, QueryError> {
        if let Numeric::Int(v) = self {
            return Ok(*v);
        }
        if let Numeric::Text(s) = self {
            if let Ok(v) = s.trim().parse::<i64>() {
                return Ok(v);
            }
        }
        let value = self.as_f64(field)?;
        if value.fract() != 0.0 || value.abs() > i64::MAX as f64 {
            return Err(QueryError::invalid(
                field,
                format!("must be a whole number, got {value}"),
            ));
        }
        Ok(value as i64)
    }
}

/// POST /properties_data request
#[derive(Debug, Clone, Deserialize)]
pub struct PropertiesRequest {
    pub identifier: String,
    #[serde(default)]
    pub display_name: String,
    pub min_price: Numeric,
    pub max_price: Numeric,
    pub min_bedrooms: Numeric,
    pub max_bedrooms: Numeric,
    pub min_deposit: Numeric,
    pub max_deposit: Numeric,
    pub mortgage_length: Numeric,
    pub mortgage_interest_rate: Numeric,
    pub investment_increase: Numeric,
    pub investment_deduction: Numeric,
    pub rent_increase: Numeric,
    pub rent_deduction: Numeric,
}

impl PropertiesRequest {
    /// Coerce every field into a [`Query`]. Range checks happen in [`Query::validate`].
    pub fn into_query(self) -> Result<Query, QueryError> {
        Ok(Query {
            price_range: Bounds::new(
                self.min_price.as_i64("min_price")?,
                self.max_price.as_i64("max_price")?,
            ),
            bedroom_range: Bounds::new(
                self.min_bedrooms.as_i64("min_bedrooms")?,
                self.max_bedrooms.as_i64("max_bedrooms")?,
            ),
            deposit_range: Bounds::new(
                self.min_deposit.as_i64("min_deposit")?,
                self.max_deposit.as_i64("max_deposit")?,
            ),
            mortgage_length: self.mortgage_length.as_i64("mortgage_length")?,
            mortgage_interest_rate: self
                .mortgage_interest_rate
                .as_f64("mortgage_interest_rate")?,
            investment_increase: self.investment_increase.as_i64("investment_increase")?,
            investment_deduction: self.investment_deduction.as_i64("investment_deduction")?,
            rent_increase: self.rent_increase.as_i64("rent_increase")?,
            rent_deduction: self.rent_deduction.as_i64("rent_deduction")?,
            location_identifier: self.identifier,
            display_name: self.display_name,
        })
    }
}

/// One row of the POST /properties_data response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PropertyRow {
    pub rank: usize,
    pub address: String,
    pub price: i64,
    /// Monthly, 2 dp
    pub estimated_rent: f64,
    /// Annual net cashflow over deposit, 4 dp
    pub roi: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub image: String,
    pub href: String,
}

impl From<&ScoredProperty> for PropertyRow {
    fn from(p: &ScoredProperty) -> Self {
        Self {
            rank: p.rank,
            address: p.listing.address.clone(),
            price: p.listing.price,
            estimated_rent: round_to(p.estimated_rent, 2),
            roi: round_to(p.roi, 4),
            latitude: p.listing.location.latitude,
            longitude: p.listing.location.longitude,
            image: p.listing.image_url.clone(),
            href: p.listing.url.clone(),
        }
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// GET /locations query string
#[derive(Debug, Deserialize)]
pub struct LocationsParams {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocationSuggestion {
    pub display_name: String,
    pub identifier: String,
}

impl From<&Location> for LocationSuggestion {
    fn from(l: &Location) -> Self {
        Self {
            display_name: l.display_name.clone(),
            identifier: l.identifier.clone(),
        }
    }
}

/// GET /health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}
