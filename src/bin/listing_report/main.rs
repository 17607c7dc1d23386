//! Report pipeline - runs load, clean, aggregate, write over listing sources

use anyhow::{bail, Context, Result};
use real_estate_analytics::analytics::{aggregate, clean, load, write};
use real_estate_analytics::config::AppConfig;
use std::env;
use std::fs;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true)
        .init();

    info!("Starting listing report pipeline");

    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    // Sources from command line args, falling back to LISTING_SOURCES
    let args: Vec<String> = env::args().skip(1).collect();
    let sources = if args.is_empty() { config.sources.clone() } else { args };
    if sources.is_empty() {
        bail!("No listing sources given (pass paths/URLs or set LISTING_SOURCES)");
    }

    // Step 1: Load raw rows
    info!("Step 1/4: Loading {} source(s)...", sources.len());
    let (raw, load_report) = load::load_listings_with_report(&sources);
    info!("✓ {}", load_report);

    // Step 2: Clean
    info!("Step 2/4: Cleaning...");
    let (listings, clean_report) = clean::clean_listings_with_report(&raw);
    info!("✓ {}", clean_report);

    // Step 3: Aggregate
    info!("Step 3/4: Aggregating...");
    let localities = aggregate::retain_min_samples(aggregate::aggregate_by_locality(&listings), config.min_samples);
    let trend = aggregate::monthly_trend(&listings);
    if let Some(summary) = aggregate::summarize(&localities) {
        info!(
            "✓ {} localities, median of medians {:.0}/sqft",
            summary.locality_count, summary.median_of_medians
        );
    } else {
        info!("✓ No localities to aggregate");
    }

    // Step 4: Write tables
    info!("Step 4/4: Writing to {:?}...", config.output_dir);
    fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("Failed to create {:?}", config.output_dir))?;
    write::write_listings_csv(&config.output_dir.join("cleaned.csv"), &listings)?;
    write::write_locality_csv(&config.output_dir.join("localities.csv"), &localities)?;
    write::write_trend_csv(&config.output_dir.join("trend.csv"), &trend)?;
    info!("✓ Write complete");

    info!("Listing report pipeline complete");

    Ok(())
}
