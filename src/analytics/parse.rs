//! Parse functions - transform raw source payloads into RawListing rows

use crate::analytics::error::SourceError;
use crate::analytics::types::{RawData, RawListing};
use crate::analytics::utils::{non_empty, normalize_header_name};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use chrono::{Duration, NaiveDate};
use std::io::Cursor;
use tracing::{debug, info};

/// Parse a raw payload into listing rows.
/// Columns are matched by normalized header name; unknown columns are ignored
/// and absent ones stay missing.
pub fn parse_listings(raw: &RawData) -> Result<Vec<RawListing>, SourceError> {
    match raw {
        RawData::Csv(text) => parse_csv(text),
        RawData::Workbook(bytes) => parse_workbook(bytes),
    }
}

fn parse_csv(text: &str) -> Result<Vec<RawListing>, SourceError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(normalize_header_name)
        .collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(SourceError::MissingHeader);
    }

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let record = result?;
        if record.len() > headers.len() {
            // +2: header line plus 1-based numbering
            return Err(SourceError::RaggedRow {
                line: idx + 2,
                expected: headers.len(),
                found: record.len(),
            });
        }
        rows.push(build_row(&headers, record.iter()));
    }

    info!("Parsed {} rows from CSV ({} columns)", rows.len(), headers.len());
    Ok(rows)
}

fn parse_workbook(bytes: &[u8]) -> Result<Vec<RawListing>, SourceError> {
    info!("Parsing workbook ({} bytes)", bytes.len());

    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    let sheet_names = workbook.sheet_names();
    let sheet_name = sheet_names.first().ok_or(SourceError::EmptyWorkbook)?;
    debug!("Reading sheet: {}", sheet_name);

    let range = workbook.worksheet_range(sheet_name)?;
    let mut cells = range.rows();

    let headers: Vec<String> = cells
        .next()
        .ok_or(SourceError::MissingHeader)?
        .iter()
        .map(|cell| cell_text(cell).map(|h| normalize_header_name(&h)).unwrap_or_default())
        .collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(SourceError::MissingHeader);
    }

    let rows: Vec<RawListing> = cells
        .filter(|row| row.iter().any(|cell| !matches!(cell, Data::Empty)))
        .map(|row| {
            let values: Vec<String> = row
                .iter()
                .map(|cell| cell_text(cell).unwrap_or_default())
                .collect();
            build_row(&headers, values.iter().map(String::as_str))
        })
        .collect();

    info!("Parsed {} rows from sheet {}", rows.len(), sheet_name);
    Ok(rows)
}

fn build_row<'a>(headers: &[String], values: impl Iterator<Item = &'a str>) -> RawListing {
    let mut row = RawListing::default();
    for (header, value) in headers.iter().zip(values) {
        row.set(header, non_empty(value));
    }
    row
}

/// Render a spreadsheet cell the way it would appear in a CSV export
fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Some(s.clone()),
        Data::Int(i) => Some(i.to_string()),
        Data::Float(f) => Some(f.to_string()),
        Data::Bool(b) => Some(b.to_string()),
        Data::DateTime(dt) => excel_serial_to_date(dt.as_f64()).map(|d| d.format("%Y-%m-%d").to_string()),
        Data::Error(_) | Data::Empty => None,
    }
}

/// Excel stores dates as days since 1899-12-30
fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    // Beyond year 9999 is not a date a listing can carry
    if !serial.is_finite() || !(0.0..=2_958_465.0).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.floor() as i64))
}
