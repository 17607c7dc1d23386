//! Write functions - export result tables as CSV
//!
//! Every table starts with its header row, also when it has no data rows,
//! so consumers can always rely on the column set.

use crate::analytics::error::ExportError;
use crate::analytics::types::{Listing, LocalityAggregate, TrendTable};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Write cleaned or filtered listings
pub fn write_listings<W: Write>(out: W, listings: &[Listing]) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(Listing::COLUMNS)?;

    for l in listings {
        writer.write_record([
            l.city.clone(),
            l.locality.clone(),
            l.property_type.clone(),
            l.bhk.map(|b| b.to_string()).unwrap_or_default(),
            l.area_sqft.to_string(),
            l.total_price.to_string(),
            l.listed_date.format("%Y-%m-%d").to_string(),
            l.source.clone().unwrap_or_default(),
            l.ppsf.to_string(),
            l.listed_month.clone(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Write per-locality aggregates
pub fn write_locality_aggregates<W: Write>(out: W, aggregates: &[LocalityAggregate]) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(LocalityAggregate::COLUMNS)?;

    for a in aggregates {
        writer.write_record([
            a.city.clone(),
            a.locality.clone(),
            a.median_ppsf.to_string(),
            a.p25_ppsf.to_string(),
            a.p75_ppsf.to_string(),
            a.listing_count.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Write a trend table; dimension columns come first
pub fn write_trend<W: Write>(out: W, trend: &TrendTable) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(trend.columns())?;

    for row in &trend.rows {
        let mut record: Vec<String> = row.key.iter().map(|v| v.to_string()).collect();
        record.push(row.bucket.clone());
        record.push(row.median_ppsf.to_string());
        record.push(row.p25_ppsf.to_string());
        record.push(row.p75_ppsf.to_string());
        record.push(row.listing_count.to_string());
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

/// Write listings to a CSV file
pub fn write_listings_csv(path: &Path, listings: &[Listing]) -> Result<(), ExportError> {
    write_listings(create(path)?, listings)?;
    info!("Wrote {} listings to {:?}", listings.len(), path);
    Ok(())
}

/// Write locality aggregates to a CSV file
pub fn write_locality_csv(path: &Path, aggregates: &[LocalityAggregate]) -> Result<(), ExportError> {
    write_locality_aggregates(create(path)?, aggregates)?;
    info!("Wrote {} locality rows to {:?}", aggregates.len(), path);
    Ok(())
}

/// Write a trend table to a CSV file
pub fn write_trend_csv(path: &Path, trend: &TrendTable) -> Result<(), ExportError> {
    write_trend(create(path)?, trend)?;
    info!("Wrote {} trend rows to {:?}", trend.rows.len(), path);
    Ok(())
}

fn create(path: &Path) -> Result<File, ExportError> {
    File::create(path).map_err(|e| ExportError::Create {
        path: path.to_path_buf(),
        source: e,
    })
}
