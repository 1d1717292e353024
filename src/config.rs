//! Service configuration.
//!
//! Loaded from a TOML file; every section and field is optional and falls back
//! to the defaults below. `ROI_SCOUT_HOST` and `ROI_SCOUT_PORT` override the
//! listen address.

use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::ConfigError;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub cache: CacheConfig,
    pub listing_source: ListingSourceConfig,
    pub response: ResponseConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 5000,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Lifetime of a ranked result set
    pub ttl_secs: u64,
    /// Enables least-recently-used eviction when set
    pub max_entries: Option<usize>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 30 * 60,
            max_entries: None,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Rightmove,
    Fixture,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ListingSourceConfig {
    pub kind: SourceKind,
    pub base_url: String,
    /// Upper bound on one whole fetch, and on each HTTP request
    pub timeout_secs: u64,
    pub fixture_path: Option<PathBuf>,
    pub max_listings: usize,
    pub page_size: usize,
    /// Miles around the location
    pub search_radius: f64,
}

impl Default for ListingSourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::Rightmove,
            base_url: "https://www.rightmove.co.uk".into(),
            timeout_secs: 30,
            fixture_path: None,
            max_listings: 1000,
            page_size: 499,
            search_radius: 0.25,
        }
    }
}

impl ListingSourceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResponseConfig {
    pub max_results: usize,
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self { max_results: 100 }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "pretty".into(),
        }
    }
}

impl LoggingConfig {
    /// Initialize the tracing subscriber. `RUST_LOG` wins over `level`.
    pub fn init(&self) {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));

        match self.format.as_str() {
            "json" => fmt().json().with_env_filter(filter).init(),
            _ => fmt().with_env_filter(filter).init(),
        }
    }
}

impl Config {
    /// Load from `path`, falling back to defaults when the file does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let mut config = match fs::read_to_string(path.as_ref()) {
            Ok(raw) => toml::from_str(&raw).map_err(ConfigError::Parse)?,
            Err(e) if e.kind() == ErrorKind::NotFound => Self::default(),
            Err(e) => return Err(ConfigError::ReadFile(e)),
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    pub fn parse_toml(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(host) = std::env::var("ROI_SCOUT_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("ROI_SCOUT_PORT") {
            self.server.port = port.parse().map_err(|_| ConfigError::InvalidValue {
                field: "ROI_SCOUT_PORT",
                reason: format!("not a port number: {port}"),
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field, reason: &str| {
            Err(ConfigError::InvalidValue {
                field,
                reason: reason.to_string(),
            })
        };

        if self.server.port == 0 {
            return invalid("server.port", "must be non-zero");
        }
        if self.cache.ttl_secs == 0 {
            return invalid("cache.ttl_secs", "must be positive");
        }
        if self.cache.max_entries == Some(0) {
            return invalid("cache.max_entries", "must be positive when set");
        }
        if self.listing_source.timeout_secs == 0 {
            return invalid("listing_source.timeout_secs", "must be positive");
        }
        if self.listing_source.page_size == 0 {
            return invalid("listing_source.page_size", "must be positive");
        }
        if self.listing_source.kind == SourceKind::Fixture
            && self.listing_source.fixture_path.is_none()
        {
            return invalid(
                "listing_source.fixture_path",
                "required when kind = \"fixture\"",
            );
        }
        if self.response.max_results == 0 {
            return invalid("response.max_results", "must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = Config::parse_toml("").unwrap();
        assert_eq!(config.server.bind_addr(), "0.0.0.0:5000");
        assert_eq!(config.cache.ttl(), Duration::from_secs(1800));
        assert_eq!(config.cache.max_entries, None);
        assert_eq!(config.listing_source.kind, SourceKind::Rightmove);
        assert_eq!(config.response.max_results, 100);
    }

    #[test]
    fn test_sections_override_defaults() {
        let config = Config::parse_toml(
            r#"
[server]
port = 8080

[cache]
ttl_secs = 60
max_entries = 500

[listing_source]
kind = "fixture"
fixture_path = "data/listings.json"
timeout_secs = 5
"#,
        )
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.cache.max_entries, Some(500));
        assert_eq!(config.listing_source.kind, SourceKind::Fixture);
        assert_eq!(config.listing_source.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_fixture_kind_requires_path() {
        let result = Config::parse_toml("[listing_source]\nkind = \"fixture\"\n");
        match result {
            Err(ConfigError::InvalidValue { field, .. }) => {
                assert_eq!(field, "listing_source.fixture_path")
            }
            other => panic!("expected missing fixture path, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_ttl_rejected() {
        assert!(matches!(
            Config::parse_toml("[cache]\nttl_secs = 0\n"),
            Err(ConfigError::InvalidValue {
                field: "cache.ttl_secs",
                ..
            })
        ));
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        assert!(matches!(
            Config::parse_toml("[server\nport = 1"),
            Err(ConfigError::Parse(_))
        ));
    }
}
