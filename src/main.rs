use anyhow::{Context, Result};
use real_estate_analytics::analytics::clean::clean_listings_with_report;
use real_estate_analytics::analytics::load::load_listings_with_report;
use real_estate_analytics::api::{router, AppState};
use real_estate_analytics::config::AppConfig;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    println!("🏠 Starting listing analytics server...");

    // Load environment variables
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    if config.sources.is_empty() {
        warn!("LISTING_SOURCES is empty, serving an empty table");
    }

    // Loading uses blocking HTTP, keep it off the runtime threads
    println!("📦 Loading listings from {} source(s)...", config.sources.len());
    let sources = config.sources.clone();
    let (listings, clean_report) = tokio::task::spawn_blocking(move || {
        let (raw, load_report) = load_listings_with_report(&sources);
        info!("{}", load_report);
        clean_listings_with_report(&raw)
    })
    .await
    .context("Listing loader panicked")?;

    println!("✅ {} listings ready ({})", listings.len(), clean_report);

    let state = AppState {
        listings: Arc::new(listings),
        max_localities: config.max_localities,
        min_samples: config.min_samples,
    };

    let app = router(state);

    println!("🚀 Server running on http://{}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
