use crate::models::{Location, RawListing};
use crate::scrapers::traits::{ListingSource, LocationSource};
use crate::scrapers::types::ListingSearch;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// Listings loaded from a JSON file, for offline runs and demos
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixtureSource {
    #[serde(default)]
    pub locations: Vec<Location>,
    /// Listings keyed by location identifier
    #[serde(default)]
    pub listings: HashMap<String, Vec<RawListing>>,
}

impl FixtureSource {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fixture {}", path.display()))?;
        let source: Self = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse fixture {}", path.display()))?;

        info!(
            "Loaded {} listings across {} locations from {}",
            source.listings.values().map(Vec::len).sum::<usize>(),
            source.listings.len(),
            path.display()
        );
        Ok(source)
    }
}

#[async_trait]
impl ListingSource for FixtureSource {
    async fn fetch(&self, search: &ListingSearch) -> Result<Vec<RawListing>> {
        Ok(self
            .listings
            .get(&search.location_identifier)
            .map(|listings| {
                listings
                    .iter()
                    .filter(|l| search.price.contains(l.price))
                    .filter(|l| search.bedrooms.contains(i64::from(l.bedrooms)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn source_name(&self) -> &'static str {
        "fixture"
    }
}

#[async_trait]
impl LocationSource for FixtureSource {
    async fn find_locations(&self, input: &str) -> Result<Vec<Location>> {
        let needle = input.trim().to_lowercase();
        Ok(self
            .locations
            .iter()
            .filter(|l| l.display_name.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }
}
