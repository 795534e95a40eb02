use crate::models::{CustomRequest, VolunteerApplication};
use serde_json::json;
use std::sync::Arc;
use tembea_core::client::RemoteClient;
use tembea_core::identity::Identity;
use tembea_shared::{Masked, Table};
use tracing::info;
use uuid::Uuid;

/// A volunteer application as entered in the form.
#[derive(Debug, Clone)]
pub struct VolunteerSignup {
    pub opportunity_id: Uuid,
    pub name: String,
    pub email: Masked<String>,
    pub skills: String,
    pub motivation: String,
    pub availability: String,
}

/// A bespoke trip request as entered in the form (later variant, with the
/// requester's contact details).
#[derive(Debug, Clone)]
pub struct CustomTripDraft {
    pub trip_details: String,
    pub budget_cents: Option<i64>,
    pub full_name: String,
    pub email: Masked<String>,
    pub phone: Masked<String>,
    pub whatsapp_number: Option<Masked<String>>,
}

#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("Sign in to continue")]
    SignInRequired,

    #[error("{0} is required")]
    MissingField(&'static str),

    /// The store's message, verbatim.
    #[error("{0}")]
    Store(String),
}

/// Insert-only submission flows: volunteer applications, custom trip
/// requests, and the profile rename. Each submit creates or patches exactly
/// one row and relies on the caller's refetch (or the change feed) to make
/// the result visible.
pub struct IntakeService {
    client: Arc<dyn RemoteClient>,
}

impl IntakeService {
    pub fn new(client: Arc<dyn RemoteClient>) -> Self {
        Self { client }
    }

    pub async fn submit_volunteer_application(
        &self,
        identity: Option<&Identity>,
        signup: VolunteerSignup,
    ) -> Result<VolunteerApplication, IntakeError> {
        let identity = identity.ok_or(IntakeError::SignInRequired)?;

        for (value, field) in [
            (&signup.name, "name"),
            (&signup.email.0, "email"),
            (&signup.skills, "skills"),
            (&signup.motivation, "motivation"),
            (&signup.availability, "availability"),
        ] {
            if value.trim().is_empty() {
                return Err(IntakeError::MissingField(field));
            }
        }

        let row = self
            .client
            .insert(
                Table::VolunteerApplications,
                json!({
                    "opportunity_id": signup.opportunity_id,
                    "user_id": identity.id,
                    "name": signup.name,
                    "email": signup.email,
                    "skills": signup.skills,
                    "motivation": signup.motivation,
                    "availability": signup.availability,
                }),
            )
            .await
            .map_err(|e| IntakeError::Store(e.to_string()))?;

        let application = VolunteerApplication::from_row(row)
            .map_err(|e| IntakeError::Store(e.to_string()))?;
        info!(
            application_id = %application.id,
            opportunity_id = %application.opportunity_id,
            "volunteer application received"
        );
        Ok(application)
    }

    pub async fn submit_custom_request(
        &self,
        identity: Option<&Identity>,
        draft: CustomTripDraft,
    ) -> Result<CustomRequest, IntakeError> {
        let identity = identity.ok_or(IntakeError::SignInRequired)?;

        if draft.trip_details.trim().is_empty() {
            return Err(IntakeError::MissingField("trip_details"));
        }
        if draft.full_name.trim().is_empty() {
            return Err(IntakeError::MissingField("full_name"));
        }
        if draft.phone.0.trim().is_empty() {
            return Err(IntakeError::MissingField("phone"));
        }

        let row = self
            .client
            .insert(
                Table::CustomRequests,
                json!({
                    "user_id": identity.id,
                    "trip_details": draft.trip_details,
                    "budget_cents": draft.budget_cents,
                    "status": "pending",
                    "full_name": draft.full_name,
                    "email": draft.email,
                    "phone": draft.phone,
                    "whatsapp_number": draft.whatsapp_number,
                }),
            )
            .await
            .map_err(|e| IntakeError::Store(e.to_string()))?;

        let request =
            CustomRequest::from_row(row).map_err(|e| IntakeError::Store(e.to_string()))?;
        info!(request_id = %request.id, "custom trip request received");
        Ok(request)
    }

    /// The profile edit form mutates `full_name` only.
    pub async fn update_profile_name(
        &self,
        identity: Option<&Identity>,
        full_name: &str,
    ) -> Result<(), IntakeError> {
        let identity = identity.ok_or(IntakeError::SignInRequired)?;
        if full_name.trim().is_empty() {
            return Err(IntakeError::MissingField("full_name"));
        }

        self.client
            .update(
                Table::Profiles,
                json!({ "full_name": full_name.trim() }),
                vec![tembea_core::client::Filter::eq(
                    "id",
                    identity.id.to_string(),
                )],
            )
            .await
            .map_err(|e| IntakeError::Store(e.to_string()))?;

        info!(user_id = %identity.id, "profile name updated");
        Ok(())
    }
}
