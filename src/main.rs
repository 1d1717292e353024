use anyhow::Context;
use clap::Parser;
use roi_scout::api::{self, AppState};
use roi_scout::cache::MemoryBackend;
use roi_scout::config::{Config, SourceKind};
use roi_scout::models::Location;
use roi_scout::orchestrator::{FetchedListings, RankedProperties};
use roi_scout::scrapers::{FixtureSource, ListingSource, LocationSource, RightmoveSource};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Rank for-sale listings by rental return on investment
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Path to the TOML config file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Listen host, overrides [server] host
    #[arg(long)]
    host: Option<String>,

    /// Listen port, overrides [server] port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let mut config = Config::load(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    config.logging.init();
    info!("🏠 ROI Scout v{}", env!("CARGO_PKG_VERSION"));

    let (listings, locations): (Arc<dyn ListingSource>, Arc<dyn LocationSource>) =
        match config.listing_source.kind {
            SourceKind::Rightmove => {
                let source = Arc::new(RightmoveSource::new(&config.listing_source)?);
                (source.clone() as Arc<dyn ListingSource>, source as Arc<dyn LocationSource>)
            }
            SourceKind::Fixture => {
                let path = config
                    .listing_source
                    .fixture_path
                    .as_ref()
                    .context("listing_source.fixture_path is not set")?;
                let source = Arc::new(FixtureSource::from_path(path)?);
                (source.clone() as Arc<dyn ListingSource>, source as Arc<dyn LocationSource>)
            }
        };
    info!(source = listings.source_name(), "Listing source ready");

    let max_entries = config.cache.max_entries;
    let state = AppState::new(
        &config,
        listings,
        locations,
        Arc::new(MemoryBackend::<RankedProperties>::with_capacity(max_entries)),
        Arc::new(MemoryBackend::<FetchedListings>::with_capacity(max_entries)),
        Arc::new(MemoryBackend::<Arc<Vec<Location>>>::with_capacity(max_entries)),
    );
    let app = api::router(state);

    let addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await
        .context("Server error")?;

    info!("ROI Scout stopped");
    Ok(())
}
