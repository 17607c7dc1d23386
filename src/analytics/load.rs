//! Record loader - concatenate every readable source into one raw table

use crate::analytics::fetch::fetch_source;
use crate::analytics::parse::parse_listings;
use crate::analytics::types::{LoadReport, RawListing, SourceId};
use tracing::{info, warn};

/// Load listings from all sources, in the order given.
///
/// A source that cannot be fetched or parsed is logged and skipped. When no
/// source parses the result is simply an empty table.
pub fn load_listings<S: AsRef<str>>(sources: &[S]) -> Vec<RawListing> {
    load_listings_with_report(sources).0
}

/// Same as [`load_listings`], also reporting how many sources were used
pub fn load_listings_with_report<S: AsRef<str>>(sources: &[S]) -> (Vec<RawListing>, LoadReport) {
    let mut rows = Vec::new();
    let mut report = LoadReport::default();

    for identifier in sources {
        let source = SourceId::parse(identifier.as_ref());

        let parsed = fetch_source(&source).and_then(|raw| parse_listings(&raw));
        match parsed {
            Ok(source_rows) => {
                report.sources_read += 1;
                rows.extend(source_rows);
            }
            Err(e) => {
                warn!("Skipping source {}: {}", source, e);
                report.sources_skipped += 1;
            }
        }
    }

    report.rows = rows.len();
    info!("Load complete: {}", report);

    (rows, report)
}
