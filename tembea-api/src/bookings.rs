use axum::{
    extract::{Extension, Path, State},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tembea_booking::quote::BookingQuote;
use tembea_booking::workflow::BookingRequest;
use tembea_booking::{Booking, PaymentPlan, PaymentStatus};
use tembea_core::checkout::CheckoutSession;
use tembea_sync::bookings::BookingsQuery;
use tembea_sync::listings::ListingQuery;
use tembea_sync::view::ResourceQuery;
use tracing::info;
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::auth::CurrentUser;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/bookings", get(list_bookings).post(create_booking))
        .route("/v1/bookings/{id}/payment", post(confirm_payment))
}

#[derive(Debug, Deserialize)]
struct CreateBookingRequest {
    listing_id: Uuid,
    travelers: u32,
    check_in: NaiveDate,
    check_out: Option<NaiveDate>,
    plan: PaymentPlan,
}

#[derive(Debug, Serialize)]
struct BookingResponse {
    booking: Booking,
    quote: BookingQuote,
    checkout: CheckoutSession,
}

#[derive(Debug, Deserialize)]
struct ConfirmPaymentRequest {
    reference: String,
}

#[derive(Debug, Serialize)]
struct ConfirmPaymentResponse {
    payment_status: PaymentStatus,
}

async fn list_bookings(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<Booking>>, ApiError> {
    let identity = user.require()?.clone();
    let bookings = BookingsQuery {
        identity: Some(identity),
    }
    .load(state.client.as_ref())
    .await?;
    Ok(Json(bookings))
}

async fn create_booking(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<Json<BookingResponse>, ApiError> {
    // The listing is loaded through the same published-only singleton path
    // the detail page uses; an unpublished or unknown id reads as missing.
    let listing = ListingQuery { id: req.listing_id }
        .load(state.client.as_ref())
        .await
        .map_err(|_| ApiError::NotFoundError("Listing not found".to_string()))?
        .ok_or_else(|| ApiError::NotFoundError("Listing not found".to_string()))?;

    let pending = state
        .workflow
        .submit(
            user.0.as_ref(),
            BookingRequest {
                listing,
                travelers: req.travelers,
                check_in: req.check_in,
                check_out: req.check_out,
                plan: req.plan,
            },
        )
        .await?;

    info!(booking_id = %pending.booking.id, "booking confirmed, checkout initialized");
    Ok(Json(BookingResponse {
        booking: pending.booking,
        quote: pending.quote,
        checkout: pending.session,
    }))
}

/// Success-callback reconciliation: the front end reports the checkout
/// reference back and the provider is re-verified before any state change.
async fn confirm_payment(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<ConfirmPaymentRequest>,
) -> Result<Json<ConfirmPaymentResponse>, ApiError> {
    user.require()?;
    let payment_status = state.workflow.confirm_payment(id, &req.reference).await?;
    Ok(Json(ConfirmPaymentResponse { payment_status }))
}
