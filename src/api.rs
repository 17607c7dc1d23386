//! Read-only HTTP surface over a cleaned listing table
//!
//! The table is cleaned once and shared; handlers only filter and aggregate
//! per request.

use crate::analytics::aggregate::{
    aggregate_by_locality, ppsf_by_property_type, price_histogram, retain_min_samples, summarize,
    time_trend, top_localities, DEFAULT_HISTOGRAM_BINS,
};
use crate::analytics::filter::{apply_filters, FilterCriteria, FilterOptions, RawFilter};
use crate::analytics::utils::split_list;
use crate::analytics::{
    DashboardSummary, Dimension, Granularity, HistogramBin, Listing, LocalityAggregate,
    PropertyTypeSpread, TrendTable,
};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{debug, warn};

/// Localities shown in the comparison chart
const TOP_LOCALITIES: usize = 15;

#[derive(Clone)]
pub struct AppState {
    pub listings: Arc<Vec<Listing>>,
    pub max_localities: usize,
    pub min_samples: usize,
}

impl AppState {
    /// Lenient criteria from the query, with the locality cap applied
    fn criteria(&self, query: &AnalyticsQuery) -> FilterCriteria {
        let mut criteria = FilterCriteria::from(&query.filter);

        // Distinct localities, first mention wins
        let mut seen = HashSet::new();
        let requested: Vec<String> = split_list(query.filter.localities.as_deref())
            .into_iter()
            .filter(|l| seen.insert(l.clone()))
            .collect();
        if requested.len() > self.max_localities {
            debug!(
                "Capping {} requested localities to {}",
                requested.len(),
                self.max_localities
            );
            criteria.localities = requested.into_iter().take(self.max_localities).collect();
        }
        criteria
    }

    fn filtered(&self, query: &AnalyticsQuery) -> Vec<Listing> {
        apply_filters(&self.listings, &self.criteria(query))
    }
}

/// Query parameters shared by every analytics endpoint. All free text.
#[derive(Debug, Default, Deserialize)]
pub struct AnalyticsQuery {
    #[serde(flatten)]
    pub filter: RawFilter,
    pub min_samples: Option<String>,
    pub granularity: Option<String>,
    pub dims: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct ApiResponse {
    pub message: String,
    pub status: String,
}

#[derive(Serialize)]
pub struct ListingsResponse {
    pub count: usize,
    pub listings: Vec<Listing>,
}

#[derive(Serialize)]
pub struct SummaryResponse {
    pub rows: usize,
    pub summary: Option<DashboardSummary>,
    pub top_localities: Vec<LocalityAggregate>,
    pub price_histogram: Vec<HistogramBin>,
    pub ppsf_by_property_type: Vec<PropertyTypeSpread>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health_check))
        .route("/api/health", get(health_check))
        .route("/api/listings", get(get_listings))
        .route("/api/localities", get(get_localities))
        .route("/api/trend", get(get_trend))
        .route("/api/summary", get(get_summary))
        .route("/api/options", get(get_options))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check() -> Json<ApiResponse> {
    Json(ApiResponse {
        message: "Listing analytics API is running!".to_string(),
        status: "ok".to_string(),
    })
}

async fn get_listings(State(state): State<AppState>, Query(query): Query<AnalyticsQuery>) -> Json<ListingsResponse> {
    let listings = state.filtered(&query);
    Json(ListingsResponse {
        count: listings.len(),
        listings,
    })
}

async fn get_localities(
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> Json<Vec<LocalityAggregate>> {
    let aggregates = aggregate_by_locality(&state.filtered(&query));
    Json(retain_min_samples(aggregates, min_samples(&state, &query)))
}

async fn get_trend(
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<TrendTable>, StatusCode> {
    let granularity = match query.granularity.as_deref() {
        None => Granularity::default(),
        Some(text) => Granularity::parse(text).ok_or_else(|| {
            warn!("Unknown granularity: {}", text);
            StatusCode::BAD_REQUEST
        })?,
    };

    let requested = split_list(query.dims.as_deref());
    let dimensions = if requested.is_empty() {
        Dimension::DEFAULT.to_vec()
    } else {
        requested
            .iter()
            .map(|name| {
                Dimension::from_column(name).ok_or_else(|| {
                    warn!("Unknown trend dimension: {}", name);
                    StatusCode::BAD_REQUEST
                })
            })
            .collect::<Result<Vec<_>, _>>()?
    };

    let listings = state.filtered(&query);
    Ok(Json(time_trend(&listings, &dimensions, granularity)))
}

async fn get_summary(State(state): State<AppState>, Query(query): Query<AnalyticsQuery>) -> Json<SummaryResponse> {
    let listings = state.filtered(&query);
    let aggregates = retain_min_samples(aggregate_by_locality(&listings), min_samples(&state, &query));

    Json(SummaryResponse {
        rows: listings.len(),
        summary: summarize(&aggregates),
        top_localities: top_localities(&aggregates, TOP_LOCALITIES),
        price_histogram: price_histogram(&listings, DEFAULT_HISTOGRAM_BINS),
        ppsf_by_property_type: ppsf_by_property_type(&listings),
    })
}

async fn get_options(State(state): State<AppState>, Query(query): Query<AnalyticsQuery>) -> Json<FilterOptions> {
    let city = query.filter.city.as_deref().map(str::trim).filter(|c| !c.is_empty());
    Json(FilterOptions::from_listings(&state.listings, city))
}

/// Unparsable thresholds fall back to the configured default
fn min_samples(state: &AppState, query: &AnalyticsQuery) -> usize {
    query
        .min_samples
        .as_deref()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(state.min_samples)
}
