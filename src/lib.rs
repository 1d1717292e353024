//! Rank for-sale property listings by the return a buy-to-let investor would earn.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod locations;
pub mod models;
pub mod orchestrator;
pub mod scrapers;
pub mod valuation;

pub use error::{CacheError, ConfigError, QueryError, RoiError};
pub use models::{Bounds, Query, RawListing, ScoredProperty};
pub use orchestrator::QueryOrchestrator;
