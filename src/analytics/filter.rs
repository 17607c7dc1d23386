//! Filter engine for cleaned listings.
//! All active predicates are AND-combined; an inactive predicate matches
//! everything. Pure logic, no I/O.

use crate::analytics::types::Listing;
use crate::analytics::utils::{parse_date, parse_number, split_list};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// Parsed filter predicates
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    /// Exact city name. None = all cities.
    pub city: Option<String>,

    /// Localities to include (empty = all). Callers cap this list; the
    /// engine accepts any length.
    pub localities: HashSet<String>,

    /// Property types to include (empty = all).
    pub property_types: HashSet<String>,

    /// Bedroom counts to include (empty = all). Listings without a count
    /// never match a non-empty set.
    pub bhk: HashSet<u32>,

    /// Inclusive total price bounds
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,

    /// Inclusive area bounds
    pub min_area: Option<f64>,
    pub max_area: Option<f64>,

    /// Inclusive listing date bounds
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

impl FilterCriteria {
    /// Returns true if no predicate is active.
    pub fn is_empty(&self) -> bool {
        self.city.is_none()
            && self.localities.is_empty()
            && self.property_types.is_empty()
            && self.bhk.is_empty()
            && self.min_price.is_none()
            && self.max_price.is_none()
            && self.min_area.is_none()
            && self.max_area.is_none()
            && self.date_from.is_none()
            && self.date_to.is_none()
    }

    /// Check if a single listing satisfies every active predicate.
    pub fn matches(&self, listing: &Listing) -> bool {
        if let Some(city) = &self.city {
            if listing.city != *city {
                return false;
            }
        }

        if !self.localities.is_empty() && !self.localities.contains(&listing.locality) {
            return false;
        }

        if !self.property_types.is_empty() && !self.property_types.contains(&listing.property_type) {
            return false;
        }

        if !self.bhk.is_empty() {
            match listing.bhk {
                Some(bhk) if self.bhk.contains(&bhk) => {}
                _ => return false,
            }
        }

        within(listing.total_price, self.min_price, self.max_price)
            && within(listing.area_sqft, self.min_area, self.max_area)
            && within(listing.listed_date, self.date_from, self.date_to)
    }
}

fn within<T: PartialOrd>(value: T, min: Option<T>, max: Option<T>) -> bool {
    min.map_or(true, |min| value >= min) && max.map_or(true, |max| value <= max)
}

/// Filter input as typed by a user: every field is free text.
///
/// Lists are comma-separated. Conversion is lenient: a bound that does not
/// parse constrains nothing, and unparsable bhk entries are skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFilter {
    pub city: Option<String>,
    pub localities: Option<String>,
    pub property_types: Option<String>,
    pub bhk: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub min_area: Option<String>,
    pub max_area: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}

impl From<&RawFilter> for FilterCriteria {
    fn from(raw: &RawFilter) -> Self {
        FilterCriteria {
            city: raw
                .city
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
            localities: split_list(raw.localities.as_deref()).into_iter().collect(),
            property_types: split_list(raw.property_types.as_deref()).into_iter().collect(),
            bhk: split_list(raw.bhk.as_deref())
                .iter()
                .filter_map(|b| b.parse::<u32>().ok())
                .collect(),
            min_price: parse_number(raw.min_price.as_deref()),
            max_price: parse_number(raw.max_price.as_deref()),
            min_area: parse_number(raw.min_area.as_deref()),
            max_area: parse_number(raw.max_area.as_deref()),
            date_from: parse_date(raw.date_from.as_deref()),
            date_to: parse_date(raw.date_to.as_deref()),
        }
    }
}

/// Return the listings that satisfy every active predicate, in input order.
/// No match yields an empty table, never an error.
pub fn apply_filters(listings: &[Listing], criteria: &FilterCriteria) -> Vec<Listing> {
    if criteria.is_empty() {
        return listings.to_vec();
    }

    listings
        .iter()
        .filter(|listing| criteria.matches(listing))
        .cloned()
        .collect()
}

/// Values available for each filter widget
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterOptions {
    pub cities: Vec<String>,
    pub localities: Vec<String>,
    pub property_types: Vec<String>,
    pub bhk: Vec<u32>,
    pub date_min: Option<NaiveDate>,
    pub date_max: Option<NaiveDate>,
}

impl FilterOptions {
    /// Distinct sorted values present in the data. When `city` is given,
    /// every list except `cities` is narrowed to that city.
    pub fn from_listings(listings: &[Listing], city: Option<&str>) -> Self {
        let cities: BTreeSet<&str> = listings.iter().map(|l| l.city.as_str()).collect();

        let scoped: Vec<&Listing> = listings
            .iter()
            .filter(|l| city.map_or(true, |c| l.city == c))
            .collect();

        let localities: BTreeSet<&str> = scoped.iter().map(|l| l.locality.as_str()).collect();
        let property_types: BTreeSet<&str> = scoped
            .iter()
            .map(|l| l.property_type.as_str())
            .filter(|t| !t.is_empty())
            .collect();
        let bhk: BTreeSet<u32> = scoped.iter().filter_map(|l| l.bhk).collect();

        FilterOptions {
            cities: cities.into_iter().map(str::to_string).collect(),
            localities: localities.into_iter().map(str::to_string).collect(),
            property_types: property_types.into_iter().map(str::to_string).collect(),
            bhk: bhk.into_iter().collect(),
            date_min: scoped.iter().map(|l| l.listed_date).min(),
            date_max: scoped.iter().map(|l| l.listed_date).max(),
        }
    }
}
