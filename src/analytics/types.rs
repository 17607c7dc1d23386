//! Core data types for the analytics pipeline
//! Pure data structures with no behavior beyond conversions

use bytes::Bytes;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw payload of a listing source - tagged union over the supported formats
#[derive(Debug)]
pub enum RawData {
    Csv(String),
    Workbook(Bytes),
}

/// Where a source lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    Path(PathBuf),
    Url(String),
}

/// On-the-wire format of a source, chosen by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Zip,
    Workbook,
}

/// A parsed source identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceId {
    pub location: SourceLocation,
    pub format: SourceFormat,
}

impl SourceId {
    pub fn parse(identifier: &str) -> Self {
        let identifier = identifier.trim();
        let lower = identifier.to_ascii_lowercase();

        let location = if lower.starts_with("http://") || lower.starts_with("https://") {
            SourceLocation::Url(identifier.to_string())
        } else {
            SourceLocation::Path(PathBuf::from(identifier))
        };

        // Ignore query strings and fragments when sniffing the extension
        let path_part = lower.split(['?', '#']).next().unwrap_or_default();
        let format = if path_part.ends_with(".zip") {
            SourceFormat::Zip
        } else if [".xlsx", ".xls", ".xlsm", ".ods"]
            .iter()
            .any(|ext| path_part.ends_with(ext))
        {
            SourceFormat::Workbook
        } else {
            SourceFormat::Csv
        };

        SourceId { location, format }
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.location {
            SourceLocation::Path(path) => write!(f, "{}", path.display()),
            SourceLocation::Url(url) => write!(f, "{}", url),
        }
    }
}

/// One row of a raw listing table. Every expected column is present;
/// values are the untyped text found in the source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawListing {
    pub city: Option<String>,
    pub locality: Option<String>,
    pub property_type: Option<String>,
    pub bhk: Option<String>,
    pub area_sqft: Option<String>,
    pub total_price: Option<String>,
    pub listed_date: Option<String>,
    pub source: Option<String>,
}

impl RawListing {
    pub const COLUMNS: [&'static str; 8] = [
        "city",
        "locality",
        "property_type",
        "bhk",
        "area_sqft",
        "total_price",
        "listed_date",
        "source",
    ];

    /// Set a column by its normalized name. Unknown columns are ignored.
    pub fn set(&mut self, column: &str, value: Option<String>) {
        let slot = match column {
            "city" => &mut self.city,
            "locality" => &mut self.locality,
            "property_type" => &mut self.property_type,
            "bhk" => &mut self.bhk,
            "area_sqft" => &mut self.area_sqft,
            "total_price" => &mut self.total_price,
            "listed_date" => &mut self.listed_date,
            "source" => &mut self.source,
            _ => return,
        };
        *slot = value;
    }
}

impl From<&Listing> for RawListing {
    fn from(listing: &Listing) -> Self {
        RawListing {
            city: Some(listing.city.clone()),
            locality: Some(listing.locality.clone()),
            property_type: Some(listing.property_type.clone()),
            bhk: listing.bhk.map(|b| b.to_string()),
            // f64 Display is shortest round-trip, so re-parsing is exact
            area_sqft: Some(listing.area_sqft.to_string()),
            total_price: Some(listing.total_price.to_string()),
            listed_date: Some(listing.listed_date.format("%Y-%m-%d").to_string()),
            source: listing.source.clone(),
        }
    }
}

/// A cleaned listing with derived fields populated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub city: String,
    pub locality: String,
    pub property_type: String,
    pub bhk: Option<u32>,
    pub area_sqft: f64,
    pub total_price: f64,
    pub listed_date: NaiveDate,
    pub source: Option<String>,
    pub ppsf: f64,
    pub listed_month: String,
}

impl Listing {
    pub const COLUMNS: [&'static str; 10] = [
        "city",
        "locality",
        "property_type",
        "bhk",
        "area_sqft",
        "total_price",
        "listed_date",
        "source",
        "ppsf",
        "listed_month",
    ];
}

/// Per-locality price-per-sqft statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalityAggregate {
    pub city: String,
    pub locality: String,
    pub median_ppsf: f64,
    pub p25_ppsf: f64,
    pub p75_ppsf: f64,
    pub listing_count: usize,
}

impl LocalityAggregate {
    pub const COLUMNS: [&'static str; 6] = [
        "city",
        "locality",
        "median_ppsf",
        "p25_ppsf",
        "p75_ppsf",
        "listing_count",
    ];
}

/// Median and quartiles of a sample, plus its size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PpsfSummary {
    pub median_ppsf: f64,
    pub p25_ppsf: f64,
    pub p75_ppsf: f64,
    pub listing_count: usize,
}

/// Columns a trend can be grouped by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    City,
    Locality,
    PropertyType,
    Bhk,
    Source,
}

impl Dimension {
    pub const DEFAULT: [Dimension; 2] = [Dimension::City, Dimension::Locality];

    pub fn column(&self) -> &'static str {
        match self {
            Dimension::City => "city",
            Dimension::Locality => "locality",
            Dimension::PropertyType => "property_type",
            Dimension::Bhk => "bhk",
            Dimension::Source => "source",
        }
    }

    pub fn from_column(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "city" => Some(Dimension::City),
            "locality" => Some(Dimension::Locality),
            "property_type" | "type" => Some(Dimension::PropertyType),
            "bhk" => Some(Dimension::Bhk),
            "source" => Some(Dimension::Source),
            _ => None,
        }
    }

    /// Value of this dimension for a listing, `None` when missing
    pub fn value(&self, listing: &Listing) -> Option<DimensionValue> {
        match self {
            Dimension::City => Some(DimensionValue::Text(listing.city.clone())),
            Dimension::Locality => Some(DimensionValue::Text(listing.locality.clone())),
            Dimension::PropertyType => Some(DimensionValue::Text(listing.property_type.clone())),
            Dimension::Bhk => listing.bhk.map(DimensionValue::Int),
            Dimension::Source => listing.source.clone().map(DimensionValue::Text),
        }
    }
}

/// One component of a trend group key. Integers sort numerically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DimensionValue {
    Int(u32),
    Text(String),
}

impl std::fmt::Display for DimensionValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DimensionValue::Int(v) => write!(f, "{}", v),
            DimensionValue::Text(v) => write!(f, "{}", v),
        }
    }
}

/// Time-bucketing resolution for trends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Monthly,
    Daily,
}

impl Granularity {
    pub fn bucket_column(&self) -> &'static str {
        match self {
            Granularity::Monthly => "listed_month",
            Granularity::Daily => "listed_date",
        }
    }

    pub fn bucket(&self, listing: &Listing) -> String {
        match self {
            Granularity::Monthly => listing.listed_month.clone(),
            Granularity::Daily => listing.listed_date.format("%Y-%m-%d").to_string(),
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "monthly" | "month" => Some(Granularity::Monthly),
            "daily" | "day" => Some(Granularity::Daily),
            _ => None,
        }
    }
}

/// One row of a time-bucketed trend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendAggregate {
    pub key: Vec<DimensionValue>,
    pub bucket: String,
    pub median_ppsf: f64,
    pub p25_ppsf: f64,
    pub p75_ppsf: f64,
    pub listing_count: usize,
}

/// Trend rows together with the grouping that produced them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendTable {
    pub dimensions: Vec<Dimension>,
    pub granularity: Granularity,
    pub rows: Vec<TrendAggregate>,
}

impl TrendTable {
    pub fn columns(&self) -> Vec<&'static str> {
        let mut columns: Vec<&'static str> = self.dimensions.iter().map(|d| d.column()).collect();
        columns.push(self.granularity.bucket_column());
        columns.extend(["median_ppsf", "p25_ppsf", "p75_ppsf", "listing_count"]);
        columns
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Headline numbers for the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub median_of_medians: f64,
    pub locality_count: usize,
    pub listing_count: usize,
}

/// One equal-width bucket of a histogram
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Box-plot input for one property type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyTypeSpread {
    pub property_type: String,
    #[serde(flatten)]
    pub summary: PpsfSummary,
}

/// Loader statistics
#[derive(Debug, Default, Clone)]
pub struct LoadReport {
    pub sources_read: usize,
    pub sources_skipped: usize,
    pub rows: usize,
}

impl std::fmt::Display for LoadReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "sources read: {}, skipped: {}, rows: {}",
            self.sources_read, self.sources_skipped, self.rows
        )
    }
}

/// Cleaning statistics, one counter per dropping step
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CleanReport {
    pub rows_in: usize,
    pub invalid: usize,
    pub bad_date: usize,
    pub duplicates: usize,
    pub ungrouped: usize,
    pub outliers: usize,
    pub rows_out: usize,
}

impl std::fmt::Display for CleanReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "in: {}, invalid: {}, bad date: {}, duplicates: {}, ungrouped: {}, outliers: {}, out: {}",
            self.rows_in,
            self.invalid,
            self.bad_date,
            self.duplicates,
            self.ungrouped,
            self.outliers,
            self.rows_out
        )
    }
}
