use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tembea_catalog::{AvailabilityCalendar, Gallery, Listing, ListingFilter};
use tembea_sync::listings::{ListingQuery, ListingsQuery};
use tembea_sync::view::ResourceQuery;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/listings", get(list_listings))
        .route("/v1/listings/{id}", get(get_listing))
}

#[derive(Debug, Deserialize)]
struct ListingsParams {
    category: Option<String>,
    search: Option<String>,
    /// Secondary tag, refined locally after the fetch.
    subtype: Option<String>,
}

#[derive(Debug, Serialize)]
struct ListingDetail {
    #[serde(flatten)]
    listing: Listing,
    gallery: Gallery,
    /// Dates the availability calendar renders as disabled.
    disabled_dates: Vec<NaiveDate>,
}

pub(crate) fn parse_filter(
    category: Option<&str>,
    search: Option<&str>,
) -> Result<ListingFilter, ApiError> {
    let mut filter = match category {
        Some(raw) => ListingFilter::category(
            raw.parse()
                .map_err(|e: tembea_catalog::listing::ListingError| {
                    ApiError::ValidationError(e.to_string())
                })?,
        ),
        None => ListingFilter::all(),
    };
    if let Some(term) = search {
        filter = filter.with_search(term);
    }
    Ok(filter)
}

async fn list_listings(
    State(state): State<AppState>,
    Query(params): Query<ListingsParams>,
) -> Result<Json<Vec<Listing>>, ApiError> {
    let filter = parse_filter(params.category.as_deref(), params.search.as_deref())?;

    let listings = ListingsQuery { filter }
        .load(state.client.as_ref())
        .await?;

    let listings = match params.subtype.as_deref() {
        Some(tag) => ListingFilter::refine_by_subtype(&listings, tag),
        None => listings,
    };

    Ok(Json(listings))
}

async fn get_listing(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ListingDetail>, ApiError> {
    let listing = ListingQuery { id }
        .load(state.client.as_ref())
        .await?
        .ok_or_else(|| ApiError::NotFoundError("Listing not found".to_string()))?;

    let gallery = Gallery::for_listing(state.client.as_ref(), &listing);
    let disabled_dates = AvailabilityCalendar::new(&listing.availability)
        .disabled_dates()
        .collect();
    Ok(Json(ListingDetail {
        listing,
        gallery,
        disabled_dates,
    }))
}
