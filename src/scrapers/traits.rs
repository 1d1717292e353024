use crate::models::{Location, RawListing};
use crate::scrapers::types::ListingSearch;
use anyhow::Result;
use async_trait::async_trait;

/// Common trait for all listing providers
/// New providers plug in here without touching the ranking pipeline
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Fetch every for-sale listing matching the location and basic filters
    async fn fetch(&self, search: &ListingSearch) -> Result<Vec<RawListing>>;

    /// Get the name of the listing source
    fn source_name(&self) -> &'static str;
}

/// Type-ahead lookup of search areas
#[async_trait]
pub trait LocationSource: Send + Sync {
    async fn find_locations(&self, input: &str) -> Result<Vec<Location>>;
}
