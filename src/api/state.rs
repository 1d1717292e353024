use std::sync::Arc;

use crate::cache::{CacheBackend, CacheStore};
use crate::config::Config;
use crate::locations::LocationService;
use crate::models::Location;
use crate::orchestrator::{FetchedListings, QueryOrchestrator, RankedProperties};
use crate::scrapers::{ListingSource, LocationSource};

/// Shared state for all handlers
pub struct AppState {
    pub orchestrator: QueryOrchestrator,
    pub locations: LocationService,
    /// Rows returned per ranking response
    pub max_results: usize,
}

impl AppState {
    /// Wire the orchestrator and location lookup over the given sources and cache backends.
    pub fn new(
        config: &Config,
        listings: Arc<dyn ListingSource>,
        locations: Arc<dyn LocationSource>,
        ranking_backend: Arc<dyn CacheBackend<RankedProperties>>,
        listing_backend: Arc<dyn CacheBackend<FetchedListings>>,
        location_backend: Arc<dyn CacheBackend<Arc<Vec<Location>>>>,
    ) -> Arc<Self> {
        let ttl = config.cache.ttl();
        let timeout = config.listing_source.timeout();

        Arc::new(Self {
            orchestrator: QueryOrchestrator::new(
                listings,
                Arc::new(CacheStore::new(ranking_backend)),
                ttl,
                timeout,
            )
            .with_listing_cache(Arc::new(CacheStore::new(listing_backend))),
            locations: LocationService::new(
                locations,
                Arc::new(CacheStore::new(location_backend)),
                ttl,
                timeout,
            ),
            max_results: config.response.max_results,
        })
    }
}
