//! Configuration loaded from environment variables

use anyhow::{Context, Result};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::analytics::utils::split_list;

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Listing sources (paths or URLs), in load order
    pub sources: Vec<String>,
    pub bind_addr: SocketAddr,
    pub output_dir: PathBuf,
    /// Most localities a single request may select
    pub max_localities: usize,
    /// Default minimum listings per locality aggregate
    pub min_samples: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup, so tests don't touch the process environment
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(AppConfig {
            sources: split_list(lookup("LISTING_SOURCES").as_deref()),

            bind_addr: lookup("BIND_ADDR")
                .unwrap_or_else(|| "127.0.0.1:3001".to_string())
                .parse()
                .context("BIND_ADDR must be a valid socket address")?,

            output_dir: lookup("OUTPUT_DIR")
                .unwrap_or_else(|| "./report".to_string())
                .into(),

            max_localities: lookup("MAX_LOCALITIES")
                .unwrap_or_else(|| "3".to_string())
                .parse()
                .context("MAX_LOCALITIES must be a valid number")?,

            min_samples: lookup("MIN_SAMPLES")
                .unwrap_or_else(|| "1".to_string())
                .parse()
                .context("MIN_SAMPLES must be a valid number")?,
        })
    }
}
