//! Result caching with TTL expiry and single-flight computation.

pub mod backend;
pub mod store;

pub use backend::{CacheBackend, CacheEntry, MemoryBackend};
pub use store::CacheStore;
