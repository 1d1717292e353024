use thiserror::Error;

/// Errors surfaced to callers of the query orchestrator.
///
/// `Clone` because a single in-flight computation hands the same outcome to
/// every waiter on its key.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    #[error("invalid query: {field}: {reason}")]
    InvalidQuery { field: &'static str, reason: String },

    #[error("listing source unavailable: {0}")]
    ListingSourceUnavailable(String),
}

impl QueryError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidQuery {
            field,
            reason: reason.into(),
        }
    }

    /// Stable name used in error responses.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidQuery { .. } => "InvalidQuery",
            Self::ListingSourceUnavailable(_) => "ListingSourceUnavailable",
        }
    }
}

/// Per-listing valuation failure. Recovered by excluding the listing.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum RoiError {
    #[error("ROI is undefined for a zero deposit")]
    UndefinedRoi,
}

/// Failure inside a cache backend. Never reaches a caller.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
}

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}
