use crate::config::ListingSourceConfig;
use crate::models::{GeoLocation, Location, RawListing};
use crate::scrapers::rent::{RentComparable, RentEstimator};
use crate::scrapers::traits::{ListingSource, LocationSource};
use crate::scrapers::types::{Channel, ListingSearch};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Url};
use scraper::{Html, Selector};
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, warn};

const JSON_MODEL_MARKER: &str = "window.jsonModel = ";

/// Rightmove listing source: sale listings valued against nearby rentals
pub struct RightmoveSource {
    client: Client,
    base_url: String,
    radius: f64,
    page_size: usize,
    max_listings: usize,
}

/// One property card from a search results page
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderListing {
    pub id: String,
    pub address: String,
    /// Sale price, or monthly rent on the rent channel
    pub price: f64,
    pub bedrooms: u32,
    pub location: GeoLocation,
    pub image_url: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct JsonModel {
    #[serde(default)]
    properties: Vec<JsonProperty>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonProperty {
    id: serde_json::Value,
    #[serde(default)]
    bedrooms: Option<u32>,
    #[serde(default)]
    display_address: String,
    #[serde(default)]
    location: Option<JsonLocation>,
    #[serde(default)]
    price: Option<JsonPrice>,
    #[serde(default)]
    property_images: Option<JsonImages>,
}

#[derive(Debug, Deserialize)]
struct JsonLocation {
    latitude: Option<f64>,
    longitude: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct JsonPrice {
    amount: Option<f64>,
    #[serde(default)]
    frequency: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonImages {
    main_image_src: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TypeAheadResponse {
    #[serde(default)]
    type_ahead_locations: Vec<TypeAheadLocation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TypeAheadLocation {
    display_name: String,
    location_identifier: String,
    #[serde(default)]
    normalised_search_term: String,
}

impl RightmoveSource {
    /// Create a new Rightmove source from listing source settings
    pub fn new(config: &ListingSourceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36")
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            radius: config.search_radius,
            page_size: config.page_size.max(1),
            max_listings: config.max_listings,
        })
    }

    /// Search results URL for one page of a channel
    pub fn search_url(&self, search: &ListingSearch, channel: Channel, index: usize) -> Result<Url> {
        let path = match channel {
            Channel::Buy => "property-for-sale/find.html",
            Channel::Rent => "property-to-rent/find.html",
        };
        let mut url = Url::parse(&format!("{}/{}", self.base_url, path))
            .with_context(|| format!("Invalid base URL: {}", self.base_url))?;

        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("locationIdentifier", &search.location_identifier)
                .append_pair("radius", &self.radius.to_string())
                .append_pair("minBedrooms", &search.bedrooms.min.to_string())
                .append_pair("maxBedrooms", &search.bedrooms.max.to_string());

            match channel {
                Channel::Buy => {
                    query
                        .append_pair("minPrice", &search.price.min.to_string())
                        .append_pair("maxPrice", &search.price.max.to_string())
                        .append_pair("dontShow", "sharedOwnership")
                        .append_pair("includeSSTC", "false");
                }
                Channel::Rent => {
                    query.append_pair("includeLetAgreed", "true");
                }
            }

            if index > 0 {
                query.append_pair("index", &index.to_string());
            }
            query.append_pair("numberOfPropertiesPerPage", &self.page_size.to_string());
        }

        Ok(url)
    }

    /// Type-ahead URL: the upper-cased input split into two-character path segments
    pub fn typeahead_url(&self, input: &str) -> Result<Url> {
        let upper: Vec<char> = input.trim().to_uppercase().chars().collect();
        let pairs: Vec<String> = upper.chunks(2).map(|pair| pair.iter().collect()).collect();

        let mut url = Url::parse(&format!("{}/typeAhead/uknostreet", self.base_url))
            .with_context(|| format!("Invalid base URL: {}", self.base_url))?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("Base URL cannot carry a path: {}", self.base_url))?
            .extend(&pairs);

        Ok(url)
    }

    async fn fetch_text(&self, url: Url) -> Result<String> {
        debug!("Fetching URL: {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}", url))?;

        if !response.status().is_success() {
            warn!("Rightmove returned status: {}", response.status());
            anyhow::bail!("Failed to fetch {}: {}", url, response.status());
        }

        let body = response.text().await.context("Failed to read response body")?;
        debug!("Downloaded {} bytes", body.len());
        Ok(body)
    }

    /// Page through one channel until a short page or the listing cap
    async fn fetch_channel(&self, search: &ListingSearch, channel: Channel) -> Result<Vec<ProviderListing>> {
        let mut seen = HashSet::new();
        let mut listings = Vec::new();
        let mut index = 0;

        while index < self.max_listings {
            let url = self.search_url(search, channel, index)?;
            let html = self.fetch_text(url).await?;
            let page = parse_listings(&html, channel, &self.base_url)?;
            let page_len = page.len();

            for listing in page {
                if seen.insert(listing.id.clone()) {
                    listings.push(listing);
                }
            }

            if page_len < self.page_size {
                break;
            }
            index += self.page_size;
        }

        listings.truncate(self.max_listings);
        info!(
            channel = ?channel,
            location = %search.location_identifier,
            count = listings.len(),
            "Fetched Rightmove listings"
        );
        Ok(listings)
    }
}

#[async_trait]
impl ListingSource for RightmoveSource {
    async fn fetch(&self, search: &ListingSearch) -> Result<Vec<RawListing>> {
        info!("Starting Rightmove fetch for {}", search.location_identifier);

        let (rentals, sales) = tokio::try_join!(
            self.fetch_channel(search, Channel::Rent),
            self.fetch_channel(search, Channel::Buy),
        )?;

        let comparables = rentals
            .iter()
            .map(|rental| RentComparable {
                location: rental.location,
                monthly_rent: rental.price,
            })
            .collect();

        let Some(estimator) = RentEstimator::new(comparables) else {
            warn!(
                "No rental comparables for {}, {} sale listings cannot be valued",
                search.location_identifier,
                sales.len()
            );
            return Ok(Vec::new());
        };

        debug!(
            comparables = estimator.len(),
            mean_rent = estimator.mean_rent(),
            "Built rent estimator"
        );

        let fetched_at = Utc::now();
        let listings: Vec<RawListing> = sales
            .into_iter()
            .map(|sale| RawListing {
                base_rent: estimator.estimate(sale.location),
                id: sale.id,
                address: sale.address,
                price: sale.price.round() as i64,
                bedrooms: sale.bedrooms,
                location: sale.location,
                image_url: sale.image_url,
                url: sale.url,
                fetched_at,
            })
            .collect();

        info!("Successfully fetched {} listings from Rightmove", listings.len());
        Ok(listings)
    }

    fn source_name(&self) -> &'static str {
        "Rightmove"
    }
}

#[async_trait]
impl LocationSource for RightmoveSource {
    async fn find_locations(&self, input: &str) -> Result<Vec<Location>> {
        let url = self.typeahead_url(input)?;
        debug!("Fetching locations from {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}", url))?
            .error_for_status()
            .context("Type-ahead request rejected")?;

        let body: TypeAheadResponse = response
            .json()
            .await
            .context("Failed to decode type-ahead response")?;

        Ok(body
            .type_ahead_locations
            .into_iter()
            .map(|item| Location {
                display_name: item.display_name,
                identifier: item.location_identifier,
                normalised_name: item.normalised_search_term,
            })
            .collect())
    }
}

/// Extract property cards from the `window.jsonModel` script of a results page
pub fn parse_listings(html: &str, channel: Channel, base_url: &str) -> Result<Vec<ProviderListing>> {
    let document = Html::parse_document(html);
    let script_selector =
        Selector::parse("script").map_err(|e| anyhow!("Invalid script selector: {e:?}"))?;

    let raw = document
        .select(&script_selector)
        .map(|script| script.text().collect::<String>())
        .find_map(|text| {
            text.find(JSON_MODEL_MARKER).map(|pos| {
                text[pos + JSON_MODEL_MARKER.len()..]
                    .lines()
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .trim_end_matches(';')
                    .to_string()
            })
        })
        .context("Unable to find property metadata on page")?;

    let model: JsonModel = serde_json::from_str(&raw).context("Failed to parse property metadata")?;

    let channel_tag = match channel {
        Channel::Buy => "RES_BUY",
        Channel::Rent => "RES_LET",
    };

    let mut listings = Vec::with_capacity(model.properties.len());
    for property in model.properties {
        let id = match &property.id {
            serde_json::Value::Number(n) => n.to_string(),
            serde_json::Value::String(s) => s.clone(),
            _ => continue,
        };

        // Ignore cards with missing data
        let (Some(latitude), Some(longitude)) = (
            property.location.as_ref().and_then(|l| l.latitude),
            property.location.as_ref().and_then(|l| l.longitude),
        ) else {
            debug!("Skipped property {}: no location", id);
            continue;
        };
        let Some(price) = property.price.as_ref().and_then(|p| p.amount) else {
            debug!("Skipped property {}: no price", id);
            continue;
        };

        let price = match channel {
            Channel::Buy => price,
            Channel::Rent => monthly_rent(
                price,
                property.price.as_ref().and_then(|p| p.frequency.as_deref()),
            ),
        };

        listings.push(ProviderListing {
            url: format!("{}/properties/{}#/?channel={}", base_url.trim_end_matches('/'), id, channel_tag),
            id,
            address: property.display_address,
            price,
            bedrooms: property.bedrooms.unwrap_or(0),
            location: GeoLocation {
                latitude,
                longitude,
            },
            image_url: property
                .property_images
                .and_then(|images| images.main_image_src)
                .unwrap_or_default(),
        });
    }

    Ok(listings)
}

/// Normalise a quoted rent to a monthly figure
fn monthly_rent(amount: f64, frequency: Option<&str>) -> f64 {
    match frequency {
        Some("weekly") => amount * 52.0 / 12.0,
        Some("daily") => amount * 365.0 / 12.0,
        Some("quarterly") => amount / 3.0,
        Some("yearly") => amount / 12.0,
        _ => amount,
    }
}
