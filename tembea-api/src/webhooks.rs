use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Router,
};
use serde::Deserialize;
use tembea_booking::paystack::verify_webhook_signature;
use uuid::Uuid;

use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/webhooks/checkout", post(handle_checkout_webhook))
}

#[derive(Debug, Deserialize)]
struct CheckoutWebhook {
    event: String,
    data: CheckoutWebhookData,
}

#[derive(Debug, Deserialize)]
struct CheckoutWebhookData {
    reference: String,
}

/// POST /v1/webhooks/checkout
/// Receive payment outcomes from the checkout provider. The signature is an
/// HMAC over the raw body; nothing is processed without it checking out.
async fn handle_checkout_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, StatusCode> {
    let signature = headers
        .get("x-paystack-signature")
        .and_then(|h| h.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    if !verify_webhook_signature(&state.checkout_secret, &body, signature) {
        tracing::warn!("rejected checkout webhook with bad signature");
        return Err(StatusCode::UNAUTHORIZED);
    }

    let payload: CheckoutWebhook =
        serde_json::from_slice(&body).map_err(|_| StatusCode::BAD_REQUEST)?;

    tracing::info!(
        "Received webhook: {} for reference {}",
        payload.event,
        payload.data.reference
    );

    if payload.event == "charge.success" {
        // The reference is the booking id the checkout was initialized with.
        let booking_id = Uuid::parse_str(&payload.data.reference)
            .map_err(|_| StatusCode::BAD_REQUEST)?;

        state
            .workflow
            .confirm_payment(booking_id, &payload.data.reference)
            .await
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    }

    Ok(StatusCode::OK)
}
