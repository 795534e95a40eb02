use axum::{
    extract::{Extension, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tembea_booking::intake::{CustomTripDraft, VolunteerSignup};
use tembea_booking::{CustomRequest, VolunteerApplication};
use tembea_shared::Masked;
use tembea_sync::requests::CustomRequestsQuery;
use tembea_sync::view::ResourceQuery;
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::auth::CurrentUser;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/v1/custom-requests",
            get(list_custom_requests).post(create_custom_request),
        )
        .route("/v1/volunteer-applications", post(create_volunteer_application))
}

#[derive(Debug, Deserialize)]
struct CustomRequestBody {
    trip_details: String,
    budget_cents: Option<i64>,
    full_name: String,
    email: String,
    phone: String,
    whatsapp_number: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VolunteerApplicationBody {
    opportunity_id: Uuid,
    name: String,
    email: String,
    skills: String,
    motivation: String,
    availability: String,
}

async fn list_custom_requests(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<CustomRequest>>, ApiError> {
    let identity = user.require()?.clone();
    let requests = CustomRequestsQuery {
        identity: Some(identity),
    }
    .load(state.client.as_ref())
    .await?;
    Ok(Json(requests))
}

async fn create_custom_request(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<CustomRequestBody>,
) -> Result<Json<CustomRequest>, ApiError> {
    let request = state
        .intake
        .submit_custom_request(
            user.0.as_ref(),
            CustomTripDraft {
                trip_details: body.trip_details,
                budget_cents: body.budget_cents,
                full_name: body.full_name,
                email: Masked(body.email),
                phone: Masked(body.phone),
                whatsapp_number: body.whatsapp_number.map(Masked),
            },
        )
        .await?;
    Ok(Json(request))
}

async fn create_volunteer_application(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<VolunteerApplicationBody>,
) -> Result<Json<VolunteerApplication>, ApiError> {
    let application = state
        .intake
        .submit_volunteer_application(
            user.0.as_ref(),
            VolunteerSignup {
                opportunity_id: body.opportunity_id,
                name: body.name,
                email: Masked(body.email),
                skills: body.skills,
                motivation: body.motivation,
                availability: body.availability,
            },
        )
        .await?;
    Ok(Json(application))
}
