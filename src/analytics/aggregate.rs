//! Aggregation functions - descriptive price-per-sqft statistics per group
//!
//! All functions are pure: they read a cleaned table and return a new one.
//! Groups come out in ascending key order.

use crate::analytics::stats::{median_sorted, sorted, summarize_ppsf};
use crate::analytics::types::{
    DashboardSummary, Dimension, DimensionValue, Granularity, HistogramBin, Listing,
    LocalityAggregate, PpsfSummary, PropertyTypeSpread, TrendAggregate, TrendTable,
};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Default bucket count for the price histogram
pub const DEFAULT_HISTOGRAM_BINS: usize = 40;

/// Median, p25, p75 and count of ppsf for every (city, locality)
pub fn aggregate_by_locality(listings: &[Listing]) -> Vec<LocalityAggregate> {
    let mut groups: BTreeMap<(&str, &str), Vec<f64>> = BTreeMap::new();
    for listing in listings {
        groups
            .entry((listing.city.as_str(), listing.locality.as_str()))
            .or_default()
            .push(listing.ppsf);
    }

    let aggregates: Vec<LocalityAggregate> = groups
        .into_iter()
        .filter_map(|((city, locality), values)| {
            let summary = summarize_ppsf(values)?;
            Some(LocalityAggregate {
                city: city.to_string(),
                locality: locality.to_string(),
                median_ppsf: summary.median_ppsf,
                p25_ppsf: summary.p25_ppsf,
                p75_ppsf: summary.p75_ppsf,
                listing_count: summary.listing_count,
            })
        })
        .collect();

    debug!("Aggregated {} listings into {} localities", listings.len(), aggregates.len());
    aggregates
}

/// Trend statistics grouped by `dimensions` plus a time bucket.
///
/// Rows missing a value for one of the dimensions (for example no bhk) are
/// left out, since they have no group to belong to.
pub fn time_trend(listings: &[Listing], dimensions: &[Dimension], granularity: Granularity) -> TrendTable {
    let mut groups: BTreeMap<(Vec<DimensionValue>, String), Vec<f64>> = BTreeMap::new();
    for listing in listings {
        let key: Option<Vec<DimensionValue>> = dimensions.iter().map(|d| d.value(listing)).collect();
        if let Some(key) = key {
            groups
                .entry((key, granularity.bucket(listing)))
                .or_default()
                .push(listing.ppsf);
        }
    }

    let rows = groups
        .into_iter()
        .filter_map(|((key, bucket), values)| {
            let summary = summarize_ppsf(values)?;
            Some(TrendAggregate {
                key,
                bucket,
                median_ppsf: summary.median_ppsf,
                p25_ppsf: summary.p25_ppsf,
                p75_ppsf: summary.p75_ppsf,
                listing_count: summary.listing_count,
            })
        })
        .collect();

    TrendTable {
        dimensions: dimensions.to_vec(),
        granularity,
        rows,
    }
}

/// Monthly trend over the default (city, locality) grouping
pub fn monthly_trend(listings: &[Listing]) -> TrendTable {
    time_trend(listings, &Dimension::DEFAULT, Granularity::Monthly)
}

/// Keep aggregates backed by at least `min_samples` listings
pub fn retain_min_samples(aggregates: Vec<LocalityAggregate>, min_samples: usize) -> Vec<LocalityAggregate> {
    aggregates
        .into_iter()
        .filter(|a| a.listing_count >= min_samples)
        .collect()
}

/// Headline numbers across localities; `None` when there is nothing to show
pub fn summarize(aggregates: &[LocalityAggregate]) -> Option<DashboardSummary> {
    let medians = sorted(aggregates.iter().map(|a| a.median_ppsf));
    let median_of_medians = median_sorted(&medians)?;

    let localities: BTreeSet<&str> = aggregates.iter().map(|a| a.locality.as_str()).collect();

    Some(DashboardSummary {
        median_of_medians,
        locality_count: localities.len(),
        listing_count: aggregates.iter().map(|a| a.listing_count).sum(),
    })
}

/// The `n` localities with the highest median ppsf
pub fn top_localities(aggregates: &[LocalityAggregate], n: usize) -> Vec<LocalityAggregate> {
    let mut ranked = aggregates.to_vec();
    ranked.sort_by(|a, b| b.median_ppsf.total_cmp(&a.median_ppsf));
    ranked.truncate(n);
    ranked
}

/// Equal-width histogram of total price. Bins are closed on the right for
/// the last bucket so the maximum is counted.
pub fn price_histogram(listings: &[Listing], bins: usize) -> Vec<HistogramBin> {
    if listings.is_empty() || bins == 0 {
        return Vec::new();
    }

    let min = listings.iter().map(|l| l.total_price).fold(f64::INFINITY, f64::min);
    let max = listings.iter().map(|l| l.total_price).fold(f64::NEG_INFINITY, f64::max);

    if max <= min {
        return vec![HistogramBin {
            lower: min,
            upper: max,
            count: listings.len(),
        }];
    }

    let width = (max - min) / bins as f64;
    let mut counts = vec![0usize; bins];
    for listing in listings {
        let idx = ((listing.total_price - min) / width) as usize;
        counts[idx.min(bins - 1)] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            lower: min + width * i as f64,
            upper: if i + 1 == bins { max } else { min + width * (i + 1) as f64 },
            count,
        })
        .collect()
}

/// ppsf spread per property type, for box plots
pub fn ppsf_by_property_type(listings: &[Listing]) -> Vec<PropertyTypeSpread> {
    let mut groups: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for listing in listings {
        groups
            .entry(listing.property_type.as_str())
            .or_default()
            .push(listing.ppsf);
    }

    groups
        .into_iter()
        .filter_map(|(property_type, values)| {
            let summary: PpsfSummary = summarize_ppsf(values)?;
            Some(PropertyTypeSpread {
                property_type: property_type.to_string(),
                summary,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn listing(locality: &str, property_type: &str, bhk: Option<u32>, ppsf: f64, date: (i32, u32, u32)) -> Listing {
        let listed_date = NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap();
        Listing {
            city: "Mumbai".to_string(),
            locality: locality.to_string(),
            property_type: property_type.to_string(),
            bhk,
            area_sqft: 1000.0,
            total_price: ppsf * 1000.0,
            listed_date,
            source: None,
            ppsf,
            listed_month: listed_date.format("%Y-%m").to_string(),
        }
    }

    fn sample() -> Vec<Listing> {
        vec![
            listing("Powai", "Apartment", Some(2), 200.0, (2023, 1, 5)),
            listing("Andheri", "Apartment", Some(2), 100.0, (2023, 1, 5)),
            listing("Andheri", "Villa", Some(3), 300.0, (2023, 1, 20)),
            listing("Andheri", "Apartment", None, 200.0, (2023, 2, 1)),
            listing("Andheri", "Apartment", Some(2), 400.0, (2023, 2, 1)),
        ]
    }

    #[test]
    fn test_aggregate_by_locality() {
        let aggregates = aggregate_by_locality(&sample());

        assert_eq!(aggregates.len(), 2);

        let andheri = &aggregates[0];
        assert_eq!(andheri.locality, "Andheri");
        assert_eq!(andheri.listing_count, 4);
        // sorted 100, 200, 300, 400
        assert_eq!(andheri.median_ppsf, 250.0);
        assert_eq!(andheri.p25_ppsf, 175.0);
        assert_eq!(andheri.p75_ppsf, 325.0);

        let powai = &aggregates[1];
        assert_eq!(powai.locality, "Powai");
        assert_eq!(powai.listing_count, 1);
        assert_eq!(powai.median_ppsf, 200.0);
        assert_eq!(powai.p25_ppsf, 200.0);
    }

    #[test]
    fn test_aggregate_empty_input() {
        assert!(aggregate_by_locality(&[]).is_empty());

        let trend = monthly_trend(&[]);
        assert!(trend.is_empty());
        assert_eq!(
            trend.columns(),
            vec!["city", "locality", "listed_month", "median_ppsf", "p25_ppsf", "p75_ppsf", "listing_count"]
        );
    }

    #[test]
    fn test_listing_counts_match_group_sizes() {
        let listings = sample();
        let aggregates = aggregate_by_locality(&listings);

        for aggregate in &aggregates {
            let expected = listings
                .iter()
                .filter(|l| l.city == aggregate.city && l.locality == aggregate.locality)
                .count();
            assert_eq!(aggregate.listing_count, expected);
        }
    }

    #[test]
    fn test_monthly_trend() {
        let trend = monthly_trend(&sample());

        let rows: Vec<_> = trend
            .rows
            .iter()
            .map(|r| (r.key[1].to_string(), r.bucket.as_str(), r.listing_count, r.median_ppsf))
            .collect();

        assert_eq!(
            rows,
            vec![
                ("Andheri".to_string(), "2023-01", 2, 200.0),
                ("Andheri".to_string(), "2023-02", 2, 300.0),
                ("Powai".to_string(), "2023-01", 1, 200.0),
            ]
        );
    }

    #[test]
    fn test_daily_trend_by_bhk_skips_missing() {
        let trend = time_trend(&sample(), &[Dimension::Bhk], Granularity::Daily);

        assert_eq!(trend.columns()[..2], ["bhk", "listed_date"]);
        let keys: Vec<_> = trend
            .rows
            .iter()
            .map(|r| (r.key.clone(), r.bucket.clone(), r.listing_count))
            .collect();

        assert_eq!(
            keys,
            vec![
                (vec![DimensionValue::Int(2)], "2023-01-05".to_string(), 2),
                (vec![DimensionValue::Int(2)], "2023-02-01".to_string(), 1),
                (vec![DimensionValue::Int(3)], "2023-01-20".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_retain_min_samples() {
        let aggregates = retain_min_samples(aggregate_by_locality(&sample()), 2);

        assert_eq!(aggregates.len(), 1);
        assert_eq!(aggregates[0].locality, "Andheri");
    }

    #[test]
    fn test_summarize() {
        let summary = summarize(&aggregate_by_locality(&sample())).unwrap();

        // medians 250 (Andheri) and 200 (Powai)
        assert_eq!(summary.median_of_medians, 225.0);
        assert_eq!(summary.locality_count, 2);
        assert_eq!(summary.listing_count, 5);

        assert!(summarize(&[]).is_none());
    }

    #[test]
    fn test_top_localities() {
        let top = top_localities(&aggregate_by_locality(&sample()), 1);

        assert_eq!(top.len(), 1);
        assert_eq!(top[0].locality, "Andheri");
    }

    #[test]
    fn test_price_histogram() {
        let bins = price_histogram(&sample(), 3);

        assert_eq!(bins.len(), 3);
        assert_eq!(bins[0].lower, 100_000.0);
        assert_eq!(bins[2].upper, 400_000.0);
        // 100k | 200k 200k | 300k 400k
        let counts: Vec<usize> = bins.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![1, 2, 2]);
        assert_eq!(counts.iter().sum::<usize>(), 5);

        assert!(price_histogram(&[], DEFAULT_HISTOGRAM_BINS).is_empty());
    }

    #[test]
    fn test_price_histogram_single_value() {
        let listings = vec![listing("Powai", "Apartment", Some(2), 200.0, (2023, 1, 5)); 3];

        let bins = price_histogram(&listings, DEFAULT_HISTOGRAM_BINS);

        assert_eq!(bins.len(), 1);
        assert_eq!(bins[0].count, 3);
    }

    #[test]
    fn test_ppsf_by_property_type() {
        let spreads = ppsf_by_property_type(&sample());

        assert_eq!(spreads.len(), 2);
        assert_eq!(spreads[0].property_type, "Apartment");
        assert_eq!(spreads[0].summary.listing_count, 4);
        assert_eq!(spreads[1].property_type, "Villa");
        assert_eq!(spreads[1].summary.median_ppsf, 300.0);
    }
}
