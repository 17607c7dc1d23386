//! Cleaning functions - turn a raw listing table into an analysis-ready one
//!
//! Every step works on the whole table and produces a new one; the input is
//! never modified. Bad values never raise: the row is dropped and counted.

use crate::analytics::stats::{iqr_bounds, sorted};
use crate::analytics::types::{CleanReport, Listing, RawListing};
use crate::analytics::utils::{
    normalize_key_part, parse_bhk, parse_date, parse_number, round_half_even,
};
use crate::calculate_ppsf;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info};

/// Groups smaller than this keep all their rows
pub const MIN_OUTLIER_GROUP: usize = 10;

/// Tuple identifying near-identical listings
type DedupKey = (String, String, String, Option<u32>, i64, i64);

/// A row that passed type coercion and validity checks
#[derive(Debug, Clone)]
struct TypedRow {
    city: Option<String>,
    locality: Option<String>,
    property_type: Option<String>,
    bhk: Option<u32>,
    area_sqft: f64,
    total_price: f64,
    ppsf: f64,
    listed_date: NaiveDate,
    source: Option<String>,
}

impl TypedRow {
    fn dedup_key(&self) -> DedupKey {
        let text = |v: &Option<String>| v.as_deref().map(normalize_key_part).unwrap_or_default();
        (
            text(&self.city),
            text(&self.locality),
            text(&self.property_type),
            self.bhk,
            round_half_even(self.area_sqft, 0) as i64,
            round_half_even(self.total_price, -4) as i64,
        )
    }
}

/// Clean a raw listing table
pub fn clean_listings(raw: &[RawListing]) -> Vec<Listing> {
    clean_listings_with_report(raw).0
}

/// Clean a raw listing table, also reporting how many rows each step dropped
pub fn clean_listings_with_report(raw: &[RawListing]) -> (Vec<Listing>, CleanReport) {
    let mut report = CleanReport {
        rows_in: raw.len(),
        ..Default::default()
    };

    // Steps 1-5: coerce types, drop invalid rows, derive ppsf, parse dates
    let mut typed = Vec::with_capacity(raw.len());
    for row in raw {
        match coerce_row(row) {
            Ok(t) => typed.push(t),
            Err(RowRejection::Invalid) => report.invalid += 1,
            Err(RowRejection::BadDate) => report.bad_date += 1,
        }
    }

    // Step 6: first occurrence of each dedup key wins
    let before = typed.len();
    let typed = deduplicate(typed);
    report.duplicates = before - typed.len();

    // Step 7: per-(city, locality) IQR filter
    let (listings, ungrouped, outliers) = remove_outliers(typed);
    report.ungrouped = ungrouped;
    report.outliers = outliers;
    report.rows_out = listings.len();

    info!("Clean complete: {}", report);

    (listings, report)
}

enum RowRejection {
    Invalid,
    BadDate,
}

fn coerce_row(row: &RawListing) -> Result<TypedRow, RowRejection> {
    let area_sqft = parse_number(row.area_sqft.as_deref()).ok_or(RowRejection::Invalid)?;
    let total_price = parse_number(row.total_price.as_deref()).ok_or(RowRejection::Invalid)?;
    let ppsf = calculate_ppsf(total_price, area_sqft).ok_or(RowRejection::Invalid)?;
    let listed_date = parse_date(row.listed_date.as_deref()).ok_or(RowRejection::BadDate)?;

    Ok(TypedRow {
        city: row.city.clone(),
        locality: row.locality.clone(),
        property_type: row.property_type.clone(),
        bhk: parse_bhk(row.bhk.as_deref()),
        area_sqft,
        total_price,
        ppsf,
        listed_date,
        source: row.source.clone(),
    })
}

fn deduplicate(rows: Vec<TypedRow>) -> Vec<TypedRow> {
    let mut seen = HashSet::with_capacity(rows.len());
    rows.into_iter()
        .filter(|row| seen.insert(row.dedup_key()))
        .collect()
}

/// Returns the surviving listings in input order, plus the number of rows
/// without a group and the number of outliers dropped.
fn remove_outliers(rows: Vec<TypedRow>) -> (Vec<Listing>, usize, usize) {
    let mut groups: BTreeMap<(&str, &str), Vec<usize>> = BTreeMap::new();
    let mut ungrouped = 0;
    for (idx, row) in rows.iter().enumerate() {
        match (row.city.as_deref(), row.locality.as_deref()) {
            (Some(city), Some(locality)) => groups.entry((city, locality)).or_default().push(idx),
            _ => ungrouped += 1,
        }
    }

    let mut keep = vec![false; rows.len()];
    let mut outliers = 0;
    for ((city, locality), indices) in &groups {
        let survivors = filter_group(&rows, indices.clone());
        let dropped = indices.len() - survivors.len();
        if dropped > 0 {
            debug!("Dropped {} outliers in {} / {}", dropped, city, locality);
        }
        outliers += dropped;
        for idx in survivors {
            keep[idx] = true;
        }
    }

    let listings = rows
        .into_iter()
        .zip(keep)
        .filter_map(|(row, kept)| kept.then(|| into_listing(row)))
        .collect();

    (listings, ungrouped, outliers)
}

/// Drop rows outside the IQR fences of the whole group. Groups below
/// `MIN_OUTLIER_GROUP` keep every row.
fn filter_group(rows: &[TypedRow], mut indices: Vec<usize>) -> Vec<usize> {
    if indices.len() < MIN_OUTLIER_GROUP {
        return indices;
    }

    let values = sorted(indices.iter().map(|&i| rows[i].ppsf));
    if let Some((lower, upper)) = iqr_bounds(&values) {
        indices.retain(|&i| rows[i].ppsf >= lower && rows[i].ppsf <= upper);
    }
    indices
}

fn into_listing(row: TypedRow) -> Listing {
    Listing {
        // Grouped rows always carry city and locality
        city: row.city.unwrap_or_default(),
        locality: row.locality.unwrap_or_default(),
        property_type: row.property_type.unwrap_or_default(),
        bhk: row.bhk,
        area_sqft: row.area_sqft,
        total_price: row.total_price,
        listed_month: row.listed_date.format("%Y-%m").to_string(),
        listed_date: row.listed_date,
        source: row.source,
        ppsf: row.ppsf,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(locality: &str, bhk: &str, area: &str, price: &str, date: &str) -> RawListing {
        RawListing {
            city: Some("Mumbai".to_string()),
            locality: Some(locality.to_string()),
            property_type: Some("Apartment".to_string()),
            bhk: Some(bhk.to_string()),
            area_sqft: Some(area.to_string()),
            total_price: Some(price.to_string()),
            listed_date: Some(date.to_string()),
            source: None,
        }
    }

    /// One Central group with the given ppsf values. Areas differ so no two
    /// rows share a dedup key.
    fn central_group(ppsfs: impl IntoIterator<Item = u64>) -> Vec<RawListing> {
        ppsfs
            .into_iter()
            .enumerate()
            .map(|(i, ppsf)| {
                let area = 1000 + i as u64;
                raw("Central", "2", &area.to_string(), &(ppsf * area).to_string(), "2023-01-01")
            })
            .collect()
    }

    /// 12 rows with ppsf 100..=110 plus one 10000
    fn outlier_group() -> Vec<RawListing> {
        central_group((100..=110).chain(std::iter::once(10_000)))
    }

    #[test]
    fn test_exact_duplicates_collapse() {
        let rows = vec![
            raw("Central", "2", "1000", "10000000", "2023-01-01"),
            raw("Central", "2", "1000", "10000000", "2023-01-01"),
        ];

        let cleaned = clean_listings(&rows);

        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned[0].ppsf, 10_000.0);
        assert_eq!(cleaned[0].listed_month, "2023-01");
    }

    #[test]
    fn test_near_duplicates_collapse_first_wins() {
        let mut first = raw("Central", "2", "1000.2", "10001000", "2023-01-01");
        first.source = Some("first".to_string());
        let mut second = raw(" central ", "2.0", "999.8", "9998000", "2023-02-01");
        second.city = Some("MUMBAI".to_string());
        second.source = Some("second".to_string());

        let (cleaned, report) = clean_listings_with_report(&[first, second]);

        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned[0].source.as_deref(), Some("first"));
        assert_eq!(report.duplicates, 1);
    }

    #[test]
    fn test_different_bhk_is_not_a_duplicate() {
        let rows = vec![
            raw("Central", "2", "1000", "10000000", "2023-01-01"),
            raw("Central", "3", "1000", "10000000", "2023-01-01"),
            raw("Central", "", "1000", "10000000", "2023-01-01"),
        ];

        assert_eq!(clean_listings(&rows).len(), 3);
    }

    #[test]
    fn test_invalid_rows_dropped() {
        let rows = vec![
            raw("Central", "2", "0", "10000000", "2023-01-01"),
            raw("Central", "2", "-50", "10000000", "2023-01-01"),
            raw("Central", "2", "1000", "abc", "2023-01-01"),
            raw("Central", "2", "", "10000000", "2023-01-01"),
            raw("Central", "2", "1000", "10000000", "not a date"),
            raw("Central", "2", "900", "9000000", "2023-03-15"),
        ];

        let (cleaned, report) = clean_listings_with_report(&rows);

        assert_eq!(cleaned.len(), 1);
        assert_eq!(report.invalid, 4);
        assert_eq!(report.bad_date, 1);
        assert_eq!(report.rows_in, 6);
        assert_eq!(report.rows_out, 1);
        assert!(cleaned
            .iter()
            .all(|l| l.area_sqft > 0.0 && l.total_price > 0.0));
    }

    #[test]
    fn test_unparsable_bhk_kept_as_missing() {
        let rows = vec![raw("Central", "studio", "500", "5000000", "2023-01-01")];

        let cleaned = clean_listings(&rows);

        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned[0].bhk, None);
    }

    #[test]
    fn test_missing_columns_never_raise() {
        let rows = vec![RawListing::default(), RawListing::default()];

        let (cleaned, report) = clean_listings_with_report(&rows);

        assert!(cleaned.is_empty());
        assert_eq!(report.invalid, 2);
    }

    #[test]
    fn test_rows_without_locality_are_dropped() {
        let mut row = raw("Central", "2", "1000", "10000000", "2023-01-01");
        row.locality = None;

        let (cleaned, report) = clean_listings_with_report(&[row]);

        assert!(cleaned.is_empty());
        assert_eq!(report.ungrouped, 1);
    }

    #[test]
    fn test_outlier_removed_from_large_group() {
        let (cleaned, report) = clean_listings_with_report(&outlier_group());

        assert_eq!(cleaned.len(), 11);
        assert_eq!(report.outliers, 1);
        assert!(cleaned.iter().all(|l| l.ppsf <= 110.0));
    }

    #[test]
    fn test_small_groups_exempt_from_outlier_filter() {
        let mut rows: Vec<RawListing> = outlier_group().into_iter().skip(3).collect();
        assert_eq!(rows.len(), 9);
        // A separate locality must not push this one over the threshold
        rows.push(raw("Suburb", "2", "1000", "100000", "2023-01-01"));

        let cleaned = clean_listings(&rows);

        assert_eq!(cleaned.len(), 10);
        assert!(cleaned.iter().any(|l| l.ppsf == 10_000.0));
    }

    #[test]
    fn test_surviving_rows_respect_group_fences() {
        let mut rows = outlier_group();
        rows.push(raw("Central", "2", "1000", "50000", "2023-01-01"));

        // ppsf of every row in the group before filtering
        let group = sorted((100..=110).map(f64::from).chain([10_000.0, 50.0]));
        let (lower, upper) = iqr_bounds(&group).unwrap();

        let cleaned = clean_listings(&rows);

        assert!(cleaned.iter().all(|l| l.ppsf >= lower && l.ppsf <= upper));
        assert!(cleaned.iter().all(|l| l.ppsf != 50.0 && l.ppsf != 10_000.0));
    }

    #[test]
    fn test_outlier_fences_use_the_whole_group() {
        // Fences over all 13 rows are (4, 28): only 10000 falls outside.
        // 27 would fall outside fences recomputed on the survivors.
        let rows = central_group((10..=20).chain([27, 10_000]));

        let (cleaned, report) = clean_listings_with_report(&rows);

        assert_eq!(cleaned.len(), 12);
        assert_eq!(report.outliers, 1);
        assert!(cleaned.iter().any(|l| l.ppsf == 27.0));
        assert!(cleaned.iter().all(|l| l.ppsf != 10_000.0));
    }

    #[test]
    fn test_padded_names_form_their_own_group() {
        // 9 rows; merging the padded row would make 10 and drop the 10000
        let mut rows = central_group((100..=107).chain([10_000]));
        let mut padded = raw("Central", "2", "2000", "200000", "2023-01-01");
        padded.city = Some(" Mumbai ".to_string());
        rows.push(padded);

        let cleaned = clean_listings(&rows);

        assert_eq!(cleaned.len(), 10);
        assert!(cleaned.iter().any(|l| l.city == " Mumbai "));
        assert!(cleaned.iter().any(|l| l.ppsf == 10_000.0));
    }

    #[test]
    fn test_input_order_preserved() {
        let rows = vec![
            raw("Zeta", "2", "1000", "10000000", "2023-01-01"),
            raw("Alpha", "2", "1000", "10000000", "2023-01-01"),
            raw("Zeta", "3", "1000", "10000000", "2023-01-01"),
        ];

        let cleaned = clean_listings(&rows);
        let order: Vec<_> = cleaned
            .iter()
            .map(|l| (l.locality.as_str(), l.bhk))
            .collect();

        assert_eq!(order, vec![("Zeta", Some(2)), ("Alpha", Some(2)), ("Zeta", Some(3))]);
    }

    #[test]
    fn test_clean_is_idempotent() {
        let mut rows = outlier_group();
        rows.push(raw("Central", "2", "1000", "10000000", "2023-01-01"));
        rows.push(raw("West", "1", "450.5", "3999999", "15/08/2022"));
        rows.push(raw("West", "1", "bad", "3999999", "2022-08-15"));

        let once = clean_listings(&rows);
        let again_raw: Vec<RawListing> = once.iter().map(RawListing::from).collect();
        let twice = clean_listings(&again_raw);

        assert_eq!(once, twice);
    }

    #[test]
    fn test_no_dedup_key_repeats() {
        let mut rows = outlier_group();
        rows.extend(outlier_group());

        let cleaned = clean_listings(&rows);
        let keys: HashSet<(String, Option<u32>, i64, i64)> = cleaned
            .iter()
            .map(|l| {
                (
                    l.locality.to_lowercase(),
                    l.bhk,
                    round_half_even(l.area_sqft, 0) as i64,
                    round_half_even(l.total_price, -4) as i64,
                )
            })
            .collect();

        assert_eq!(keys.len(), cleaned.len());
    }
}
