use crate::models::{Bounds, Query};

/// Search parameters passed to a listing source
#[derive(Debug, Clone, PartialEq)]
pub struct ListingSearch {
    /// Provider identifier of the search area
    pub location_identifier: String,
    /// Inclusive price bounds
    pub price: Bounds<i64>,
    /// Inclusive bedroom bounds
    pub bedrooms: Bounds<i64>,
}

impl ListingSearch {
    pub fn from_query(query: &Query) -> Self {
        Self {
            location_identifier: query.location_identifier.trim().to_string(),
            price: query.price_range,
            bedrooms: query.bedroom_range,
        }
    }

    /// Key for the raw listings this search fetches.
    ///
    /// Covers only what the provider sees, so queries differing in financial
    /// assumptions share one fetch.
    pub fn cache_key(&self) -> String {
        format!(
            "listings:{}:price={}-{}:bedrooms={}-{}",
            self.location_identifier,
            self.price.min,
            self.price.max,
            self.bedrooms.min,
            self.bedrooms.max,
        )
    }
}

/// Which side of the market a provider page lists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Buy,
    Rent,
}
