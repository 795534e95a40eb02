use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tembea_shared::Masked;
use uuid::Uuid;

/// Payment state of a booking. Only a successful external checkout moves a
/// booking out of `pending`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Partial,
}

/// Settlement method chosen at submit time. Wire values are the store's
/// enumerated strings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaymentPlan {
    /// Pay the complete amount now.
    #[serde(rename = "full")]
    Full,
    /// Pay a percentage now, the rest on arrival.
    #[serde(rename = "deposit")]
    Deposit,
    /// Pay in equal installments, the first one now.
    #[serde(rename = "lipa_mdogo_mdogo")]
    Installment,
}

impl PaymentPlan {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentPlan::Full => "full",
            PaymentPlan::Deposit => "deposit",
            PaymentPlan::Installment => "lipa_mdogo_mdogo",
        }
    }

    /// The settled status a successful checkout produces for this plan.
    pub fn settled_status(&self) -> PaymentStatus {
        match self {
            PaymentPlan::Full => PaymentStatus::Paid,
            PaymentPlan::Deposit | PaymentPlan::Installment => PaymentStatus::Partial,
        }
    }
}

impl std::fmt::Display for PaymentPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user's reservation against a listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub listing_id: Uuid,
    pub user_id: Uuid,
    pub total_amount_cents: i64,
    pub guests: u32,
    pub check_in_date: NaiveDate,
    pub check_out_date: Option<NaiveDate>,
    pub payment_status: PaymentStatus,
    pub payment_plan: PaymentPlan,
    /// Transaction reference from the external checkout, once one succeeded.
    pub checkout_ref: Option<String>,
}

impl Booking {
    pub fn from_row(row: serde_json::Value) -> Result<Self, RecordError> {
        serde_json::from_value(row).map_err(|e| RecordError::Malformed(e.to_string()))
    }
}

/// One volunteer application per submit; no update or delete path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolunteerApplication {
    pub id: Uuid,
    pub opportunity_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub email: Masked<String>,
    pub skills: String,
    pub motivation: String,
    pub availability: String,
    pub created_at: DateTime<Utc>,
}

impl VolunteerApplication {
    pub fn from_row(row: serde_json::Value) -> Result<Self, RecordError> {
        serde_json::from_value(row).map_err(|e| RecordError::Malformed(e.to_string()))
    }
}

/// Status of a custom trip request. Mutated only by an admin on the store
/// side; read-only to the requesting user.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    InReview,
    Quoted,
    Closed,
}

impl Default for RequestStatus {
    fn default() -> Self {
        RequestStatus::Pending
    }
}

/// A bespoke trip request with the requester's contact details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub trip_details: String,
    pub budget_cents: Option<i64>,
    #[serde(default)]
    pub status: RequestStatus,
    pub full_name: Option<String>,
    pub email: Option<Masked<String>>,
    pub phone: Option<Masked<String>>,
    pub whatsapp_number: Option<Masked<String>>,
    pub created_at: DateTime<Utc>,
}

impl CustomRequest {
    pub fn from_row(row: serde_json::Value) -> Result<Self, RecordError> {
        serde_json::from_value(row).map_err(|e| RecordError::Malformed(e.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("Malformed row: {0}")]
    Malformed(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payment_plan_round_trips_store_values() {
        for (plan, wire) in [
            (PaymentPlan::Full, "\"full\""),
            (PaymentPlan::Deposit, "\"deposit\""),
            (PaymentPlan::Installment, "\"lipa_mdogo_mdogo\""),
        ] {
            assert_eq!(serde_json::to_string(&plan).unwrap(), wire);
            assert_eq!(serde_json::from_str::<PaymentPlan>(wire).unwrap(), plan);
        }
    }

    #[test]
    fn settled_status_depends_on_plan() {
        assert_eq!(PaymentPlan::Full.settled_status(), PaymentStatus::Paid);
        assert_eq!(PaymentPlan::Deposit.settled_status(), PaymentStatus::Partial);
        assert_eq!(PaymentPlan::Installment.settled_status(), PaymentStatus::Partial);
    }

    #[test]
    fn booking_decodes_from_store_row() {
        let row = json!({
            "id": "7f3cde2e-7b0a-4c5f-9a52-0cc43f2d2a4e",
            "created_at": "2026-07-01T10:00:00Z",
            "listing_id": "3fa85f64-5717-4562-b3fc-2c963f66afa6",
            "user_id": "4d1f2c3b-9f2a-4f6a-8a3e-2b1c0d9e8f7a",
            "total_amount_cents": 30_000,
            "guests": 3,
            "check_in_date": "2026-09-10",
            "check_out_date": null,
            "payment_status": "pending",
            "payment_plan": "lipa_mdogo_mdogo",
            "checkout_ref": null
        });

        let booking = Booking::from_row(row).unwrap();
        assert_eq!(booking.payment_status, PaymentStatus::Pending);
        assert_eq!(booking.payment_plan, PaymentPlan::Installment);
        assert!(booking.check_out_date.is_none());
    }

    #[test]
    fn contact_fields_are_masked_in_debug() {
        let request = CustomRequest {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            trip_details: "Two weeks, gorillas then beach".to_string(),
            budget_cents: Some(400_000),
            status: RequestStatus::Pending,
            full_name: Some("Asha N.".to_string()),
            email: Some(Masked("asha@example.com".to_string())),
            phone: Some(Masked("+254700000001".to_string())),
            whatsapp_number: None,
            created_at: Utc::now(),
        };

        let debug = format!("{:?}", request);
        assert!(!debug.contains("asha@example.com"));
        assert!(!debug.contains("+254700000001"));
    }
}
