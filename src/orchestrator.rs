//! Entry point for ranking requests.
//!
//! ```text
//! Query ─ validate ─ cache key ─┬─ hit ───────────────────────────────┐
//!                               └─ miss ─ fetch ─ rank ─ store ───────┴─> ranked properties
//! ```
//!
//! Concurrent identical queries share one fetch through
//! [`CacheStore::get_or_compute`].

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::cache::CacheStore;
use crate::error::QueryError;
use crate::models::{Query, RawListing, ScoredProperty};
use crate::scrapers::{ListingSearch, ListingSource};
use crate::valuation;

/// Ranked result set shared between the cache and every caller.
pub type RankedProperties = Arc<Vec<ScoredProperty>>;

pub type RankingCache = CacheStore<RankedProperties, QueryError>;

/// Raw listings for one [`ListingSearch`].
pub type FetchedListings = Arc<Vec<RawListing>>;

pub type ListingCache = CacheStore<FetchedListings, QueryError>;

pub struct QueryOrchestrator {
    source: Arc<dyn ListingSource>,
    cache: Arc<RankingCache>,
    listing_cache: Option<Arc<ListingCache>>,
    ttl: Duration,
    fetch_timeout: Duration,
}

impl QueryOrchestrator {
    pub fn new(
        source: Arc<dyn ListingSource>,
        cache: Arc<RankingCache>,
        ttl: Duration,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            source,
            cache,
            listing_cache: None,
            ttl,
            fetch_timeout,
        }
    }

    /// Also cache raw listings per search, so queries that differ only in
    /// financial assumptions reuse one provider fetch.
    pub fn with_listing_cache(mut self, listing_cache: Arc<ListingCache>) -> Self {
        self.listing_cache = Some(listing_cache);
        self
    }

    /// Rank every listing matching `query`, best ROI first.
    ///
    /// An empty result is a success. Failures are never cached.
    pub async fn handle(&self, query: &Query) -> Result<RankedProperties, QueryError> {
        if let Err(e) = query.validate() {
            debug!(error = %e, "rejected query");
            return Err(e);
        }

        let key = query.cache_key();
        let search = ListingSearch::from_query(query);

        self.cache
            .get_or_compute(&key, self.ttl, move || async move {
                let listings = self.listings_for(&search).await?;
                let ranking = valuation::rank(query, &listings);

                info!(
                    location = %query.location_identifier,
                    display_name = %query.display_name,
                    fetched = listings.len(),
                    ranked = ranking.properties.len(),
                    "ranked properties"
                );
                Ok(Arc::new(ranking.properties))
            })
            .await
    }

    async fn listings_for(&self, search: &ListingSearch) -> Result<FetchedListings, QueryError> {
        let Some(listing_cache) = &self.listing_cache else {
            return self.fetch_listings(search).await.map(Arc::new);
        };

        listing_cache
            .get_or_compute(&search.cache_key(), self.ttl, move || async move {
                self.fetch_listings(search).await.map(Arc::new)
            })
            .await
    }

    async fn fetch_listings(&self, search: &ListingSearch) -> Result<Vec<RawListing>, QueryError> {
        let name = self.source.source_name();

        match tokio::time::timeout(self.fetch_timeout, self.source.fetch(search)).await {
            Ok(Ok(listings)) => {
                debug!(source = name, count = listings.len(), "fetched listings");
                Ok(listings)
            }
            Ok(Err(e)) => {
                warn!(source = name, error = %format!("{e:#}"), "listing fetch failed");
                Err(QueryError::ListingSourceUnavailable(format!("{name}: {e:#}")))
            }
            Err(_) => {
                warn!(source = name, timeout = ?self.fetch_timeout, "listing fetch timed out");
                Err(QueryError::ListingSourceUnavailable(format!(
                    "{name} did not respond within {}s",
                    self.fetch_timeout.as_secs()
                )))
            }
        }
    }
}
