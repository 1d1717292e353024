use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use super::backend::CacheBackend;

type Flight<V, E> = Arc<OnceCell<Result<V, E>>>;

/// Unregisters a flight when its initialiser finishes or is dropped.
struct FlightRelease<'a, V, E> {
    in_flight: &'a Mutex<HashMap<String, Flight<V, E>>>,
    key: &'a str,
    flight: &'a Flight<V, E>,
}

impl<V, E> Drop for FlightRelease<'_, V, E> {
    fn drop(&mut self) {
        let mut in_flight = self.in_flight.lock();
        if in_flight
            .get(self.key)
            .is_some_and(|current| Arc::ptr_eq(current, self.flight))
        {
            in_flight.remove(self.key);
        }
    }
}

/// Cache front-end shared by every request.
///
/// Backend failures degrade to misses. [`get_or_compute`](Self::get_or_compute)
/// runs at most one computation per key at a time; every concurrent caller for
/// that key receives the outcome of that single run.
pub struct CacheStore<V, E> {
    backend: Arc<dyn CacheBackend<V>>,
    in_flight: Mutex<HashMap<String, Flight<V, E>>>,
}

impl<V, E> CacheStore<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    pub fn new(backend: Arc<dyn CacheBackend<V>>) -> Self {
        Self {
            backend,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Cached value for `key`. A backend error is logged and reported as a miss.
    pub async fn get(&self, key: &str) -> Option<V> {
        match self.backend.get(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!(key, backend = self.backend.backend_name(), error = %e, "cache read failed, treating as miss");
                None
            }
        }
    }

    /// Store `value`. A backend error is logged and swallowed.
    pub async fn set(&self, key: &str, value: V, ttl: Duration) {
        if let Err(e) = self.backend.set(key, value, ttl).await {
            warn!(key, backend = self.backend.backend_name(), error = %e, "cache write failed");
        }
    }

    /// Return the cached value or run `compute` to produce it.
    ///
    /// Successful results are stored with `ttl`. Errors are handed to the
    /// callers waiting at that moment and never stored, so the next call
    /// computes again.
    pub async fn get_or_compute<F, Fut>(&self, key: &str, ttl: Duration, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(key).await {
            debug!(key, "cache hit");
            return Ok(value);
        }

        let flight = {
            let mut in_flight = self.in_flight.lock();
            in_flight
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        let mut ran = false;
        let ran_here = &mut ran;
        let registered = &flight;
        let result = flight
            .get_or_init(|| async move {
                *ran_here = true;
                // Released on completion and on cancellation alike.
                let _release = FlightRelease {
                    in_flight: &self.in_flight,
                    key,
                    flight: registered,
                };
                // A previous flight may have stored the value after our first read.
                if let Some(value) = self.get(key).await {
                    return Ok(value);
                }
                debug!(key, "cache miss, computing");
                let result = compute().await;
                // Stored before the flight is released so late callers hit the backend.
                if let Ok(value) = &result {
                    self.set(key, value.clone(), ttl).await;
                }
                result
            })
            .await
            .clone();

        if !ran {
            debug!(key, "joined in-flight computation");
        }

        result
    }

    /// Number of keys with a computation currently running.
    pub fn in_flight(&self) -> usize {
        self.in_flight.lock().len()
    }
}
