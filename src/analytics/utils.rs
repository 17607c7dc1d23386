//! Utility functions for common operations

use crate::analytics::error::SourceError;
use bytes::Bytes;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::io::{Cursor, Read};
use tracing::info;

/// Download a source via HTTP
pub fn http_get(url: &str) -> Result<Bytes, SourceError> {
    info!("Downloading from {}", url);
    let http_error = |source| SourceError::Http {
        url: url.to_string(),
        source,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(300)) // 5 min timeout
        .build()
        .map_err(http_error)?;

    let response = client.get(url).send().map_err(http_error)?;
    let status = response.status();

    if !status.is_success() {
        return Err(SourceError::Status {
            url: url.to_string(),
            status,
        });
    }

    let bytes = response.bytes().map_err(http_error)?;
    info!("Downloaded {} bytes", bytes.len());
    Ok(bytes)
}

/// Read the first CSV file out of an in-memory ZIP archive
pub fn extract_csv_from_zip(bytes: &[u8]) -> Result<String, SourceError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        let filename = file.name().to_string();

        if filename.to_ascii_lowercase().ends_with(".csv") {
            info!("Found CSV file: {}", filename);

            let mut contents = Vec::new();
            file.read_to_end(&mut contents)
                .map_err(|e| SourceError::Zip(e.into()))?;
            return Ok(String::from_utf8(contents)?);
        }
    }

    Err(SourceError::NoCsvInArchive)
}

/// Normalize a header cell: trim, drop a UTF-8 BOM, lower-case
pub fn normalize_header_name(name: &str) -> String {
    name.trim()
        .trim_start_matches('\u{feff}')
        .trim()
        .to_ascii_lowercase()
}

/// Treat blank cells as missing. Other text is kept exactly as found.
pub fn non_empty(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Parse a finite float; anything else is missing
pub fn parse_number(value: Option<&str>) -> Option<f64> {
    let v = value?.trim().parse::<f64>().ok()?;
    if v.is_finite() {
        Some(v)
    } else {
        None
    }
}

/// Parse a bedroom count. Accepts `"2"` and `"2.0"`; negatives and
/// fractional values are missing.
pub fn parse_bhk(value: Option<&str>) -> Option<u32> {
    let text = value?.trim();
    if let Ok(v) = text.parse::<u32>() {
        return Some(v);
    }

    let v = text.parse::<f64>().ok()?;
    if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v <= u32::MAX as f64 {
        Some(v as u32)
    } else {
        None
    }
}

/// Parse a calendar date from the formats listing exports commonly use.
/// Month-first wins over day-first when both would be valid.
pub fn parse_date(value: Option<&str>) -> Option<NaiveDate> {
    const DATE_FMTS: [&str; 5] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d/%m/%Y", "%d-%m-%Y"];
    const DATETIME_FMTS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
    ];

    let text = value?.trim();
    if text.is_empty() {
        return None;
    }

    for fmt in DATE_FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(text, fmt) {
            return Some(d);
        }
    }
    for fmt in DATETIME_FMTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(dt.date());
        }
    }
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| dt.naive_local().date())
}

/// Round half to even at `10^-decimals`, so negative `decimals` round to tens,
/// hundreds, ... This is the rounding rule of the conventional data-frame
/// `round`.
pub fn round_half_even(value: f64, decimals: i32) -> f64 {
    if decimals >= 0 {
        let scale = 10f64.powi(decimals);
        (value * scale).round_ties_even() / scale
    } else {
        let scale = 10f64.powi(-decimals);
        (value / scale).round_ties_even() * scale
    }
}

/// Case- and whitespace-insensitive form of a text key component
pub fn normalize_key_part(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Split a comma-separated list, dropping blanks
pub fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
