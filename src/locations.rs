//! Cached search-area suggestions.

use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::cache::CacheStore;
use crate::models::Location;
use crate::scrapers::LocationSource;

pub type LocationCache = CacheStore<Arc<Vec<Location>>, String>;

pub struct LocationService {
    source: Arc<dyn LocationSource>,
    cache: Arc<LocationCache>,
    ttl: Duration,
    timeout: Duration,
}

impl LocationService {
    pub fn new(
        source: Arc<dyn LocationSource>,
        cache: Arc<LocationCache>,
        ttl: Duration,
        timeout: Duration,
    ) -> Self {
        Self {
            source,
            cache,
            ttl,
            timeout,
        }
    }

    /// Suggestions for `input`. Empty input or a provider failure yields no suggestions.
    pub async fn suggest(&self, input: &str) -> Arc<Vec<Location>> {
        let input = input.trim();
        if input.is_empty() {
            return Arc::new(Vec::new());
        }

        let key = format!("location:{}", input.to_lowercase());
        let result = self
            .cache
            .get_or_compute(&key, self.ttl, move || async move {
                match tokio::time::timeout(self.timeout, self.source.find_locations(input)).await {
                    Ok(Ok(locations)) => Ok(Arc::new(locations)),
                    Ok(Err(e)) => Err(format!("{e:#}")),
                    Err(_) => Err(format!("no response within {}s", self.timeout.as_secs())),
                }
            })
            .await;

        match result {
            Ok(locations) => {
                info!(input, count = locations.len(), "location suggestions");
                locations
            }
            Err(e) => {
                warn!(input, error = %e, "failed to get location suggestions");
                Arc::new(Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryBackend;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubLocations {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl LocationSource for StubLocations {
        async fn find_locations(&self, input: &str) -> Result<Vec<Location>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("type-ahead unavailable");
            }
            Ok(vec![Location {
                display_name: input.to_string(),
                identifier: "REGION^1".to_string(),
                normalised_name: input.to_uppercase(),
            }])
        }
    }

    fn service(fail: bool) -> (LocationService, Arc<StubLocations>) {
        let source = Arc::new(StubLocations {
            calls: AtomicUsize::new(0),
            fail,
        });
        let cache: Arc<LocationCache> =
            Arc::new(CacheStore::new(Arc::new(MemoryBackend::<Arc<Vec<Location>>>::new())));
        let service = LocationService::new(
            source.clone(),
            cache,
            Duration::from_secs(60),
            Duration::from_secs(5),
        );
        (service, source)
    }

    #[tokio::test]
    async fn test_empty_input_skips_provider() {
        let (service, source) = service(false);
        assert!(service.suggest("   ").await.is_empty());
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_suggestions_cached_case_insensitively() {
        let (service, source) = service(false);
        assert_eq!(service.suggest("London").await.len(), 1);
        assert_eq!(service.suggest("london").await.len(), 1);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_yields_empty_and_retries() {
        let (service, source) = service(true);
        assert!(service.suggest("Leeds").await.is_empty());
        assert!(service.suggest("Leeds").await.is_empty());
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }
}
