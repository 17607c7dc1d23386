//! Fetch functions - retrieve raw listing payloads from files or URLs

use crate::analytics::error::SourceError;
use crate::analytics::types::{RawData, SourceFormat, SourceId, SourceLocation};
use crate::analytics::utils::{extract_csv_from_zip, http_get};
use bytes::Bytes;
use std::fs;
use tracing::info;

/// Fetch one source and decode it into a raw payload
pub fn fetch_source(source: &SourceId) -> Result<RawData, SourceError> {
    info!("Fetching listings from {}", source);

    let bytes = match &source.location {
        SourceLocation::Url(url) => http_get(url)?,
        SourceLocation::Path(path) => fs::read(path)
            .map(Bytes::from)
            .map_err(|e| SourceError::Io {
                path: path.clone(),
                source: e,
            })?,
    };

    match source.format {
        SourceFormat::Csv => Ok(RawData::Csv(String::from_utf8(bytes.to_vec())?)),
        SourceFormat::Zip => Ok(RawData::Csv(extract_csv_from_zip(&bytes)?)),
        SourceFormat::Workbook => Ok(RawData::Workbook(bytes)),
    }
}
