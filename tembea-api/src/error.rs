use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tembea_booking::intake::IntakeError;
use tembea_booking::workflow::BookingError;
use tembea_core::client::ClientError;

#[derive(Debug)]
pub enum ApiError {
    AuthenticationError(String),
    SignInRequired { return_to: String },
    ValidationError(String),
    NotFoundError(String),
    /// Store/provider failures; the message is surfaced verbatim.
    StoreError(String),
    Anyhow(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::AuthenticationError(msg) => {
                (StatusCode::UNAUTHORIZED, Json(json!({ "error": msg }))).into_response()
            }
            ApiError::SignInRequired { return_to } => (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": "Please sign in to continue booking.",
                    "redirect": format!("/signin?redirect={}", return_to),
                })),
            )
                .into_response(),
            ApiError::ValidationError(msg) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
            }
            ApiError::NotFoundError(msg) => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": msg }))).into_response()
            }
            ApiError::StoreError(msg) => {
                tracing::error!("Store error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": msg })),
                )
                    .into_response()
            }
            ApiError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal Server Error" })),
                )
                    .into_response()
            }
        }
    }
}

impl From<ClientError> for ApiError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::RowNotFound(_) | ClientError::MultipleRows(_, _) => {
                ApiError::NotFoundError(err.to_string())
            }
            other => ApiError::StoreError(other.to_string()),
        }
    }
}

impl From<BookingError> for ApiError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::SignInRequired { return_to } => ApiError::SignInRequired { return_to },
            BookingError::InvalidTravelers { .. } | BookingError::MissingCheckOut => {
                ApiError::ValidationError(err.to_string())
            }
            BookingError::NotFound(id) => ApiError::NotFoundError(format!("Booking not found: {id}")),
            BookingError::Store(msg) | BookingError::Checkout(msg) => ApiError::StoreError(msg),
        }
    }
}

impl From<IntakeError> for ApiError {
    fn from(err: IntakeError) -> Self {
        match err {
            IntakeError::SignInRequired => {
                ApiError::AuthenticationError("Sign in to continue".to_string())
            }
            IntakeError::MissingField(_) => ApiError::ValidationError(err.to_string()),
            IntakeError::Store(msg) => ApiError::StoreError(msg),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Anyhow(err)
    }
}
