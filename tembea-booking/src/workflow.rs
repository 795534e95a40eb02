use crate::models::{Booking, PaymentPlan, PaymentStatus};
use crate::quote::BookingQuote;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tembea_catalog::{Listing, ListingCategory};
use tembea_core::checkout::{CheckoutAdapter, CheckoutSession, CheckoutStatus};
use tembea_core::client::{Filter, RemoteClient};
use tembea_core::identity::Identity;
use tembea_store::app_config::BusinessRules;
use tembea_shared::Table;
use tracing::info;
use uuid::Uuid;

/// Trip parameters collected by the booking form. The listing must already
/// be loaded (and therefore published); check-out only applies to stays.
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub listing: Listing,
    pub travelers: u32,
    pub check_in: NaiveDate,
    pub check_out: Option<NaiveDate>,
    pub plan: PaymentPlan,
}

/// A booking persisted as `pending`, with the checkout the user still has to
/// complete. Cancelling the checkout leaves the row pending; the form stays
/// resubmittable and repeated submits create new rows.
#[derive(Debug, Clone)]
pub struct PendingBooking {
    pub booking: Booking,
    pub quote: BookingQuote,
    pub session: CheckoutSession,
}

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Sign in to continue booking")]
    SignInRequired { return_to: String },

    #[error("Traveler count must be between 1 and {max}")]
    InvalidTravelers { max: u32 },

    #[error("Check-out date is required for stays")]
    MissingCheckOut,

    /// The store's message, verbatim, for the user to see.
    #[error("{0}")]
    Store(String),

    #[error("Checkout initialization failed: {0}")]
    Checkout(String),

    #[error("Booking not found: {0}")]
    NotFound(Uuid),
}

/// Turns user-entered trip parameters into a persisted booking and
/// reconciles its payment status after the external checkout reports back.
pub struct BookingWorkflow {
    client: Arc<dyn RemoteClient>,
    checkout: Arc<dyn CheckoutAdapter>,
    rules: BusinessRules,
}

impl BookingWorkflow {
    pub fn new(
        client: Arc<dyn RemoteClient>,
        checkout: Arc<dyn CheckoutAdapter>,
        rules: BusinessRules,
    ) -> Self {
        Self {
            client,
            checkout,
            rules,
        }
    }

    pub fn quote(&self, listing: &Listing, travelers: u32, plan: PaymentPlan) -> BookingQuote {
        BookingQuote::compute(listing, travelers, plan, &self.rules)
    }

    /// Submit protocol: validate, insert one `pending` row, initialize the
    /// external checkout sized to the amount due now. Exactly one row per
    /// call; nothing here deduplicates repeated submits.
    pub async fn submit(
        &self,
        identity: Option<&Identity>,
        request: BookingRequest,
    ) -> Result<PendingBooking, BookingError> {
        let identity = identity.ok_or_else(|| BookingError::SignInRequired {
            return_to: format!(
                "/book/{}/{}",
                request.listing.category, request.listing.id
            ),
        })?;

        if request.travelers < 1 || request.travelers > self.rules.max_guests {
            return Err(BookingError::InvalidTravelers {
                max: self.rules.max_guests,
            });
        }
        if request.listing.category == ListingCategory::Stay && request.check_out.is_none() {
            return Err(BookingError::MissingCheckOut);
        }

        let quote = self.quote(&request.listing, request.travelers, request.plan);

        let row = self
            .client
            .insert(
                Table::Bookings,
                json!({
                    "listing_id": request.listing.id,
                    "user_id": identity.id,
                    "total_amount_cents": quote.total_cents,
                    "guests": request.travelers,
                    "check_in_date": request.check_in,
                    "check_out_date": request.check_out,
                    "payment_status": PaymentStatus::Pending,
                    "payment_plan": request.plan,
                }),
            )
            .await
            .map_err(|e| BookingError::Store(e.to_string()))?;

        let booking = Booking::from_row(row).map_err(|e| BookingError::Store(e.to_string()))?;
        info!(booking_id = %booking.id, plan = %request.plan, "booking created as pending");

        let session = self
            .checkout
            .initialize(booking.id, &identity.email, quote.due_now_cents)
            .await
            .map_err(|e| BookingError::Checkout(e.to_string()))?;

        Ok(PendingBooking {
            booking,
            quote,
            session,
        })
    }

    /// Reconcile a booking after the checkout's success callback or webhook.
    /// The provider is re-asked for the transaction's outcome; only a
    /// confirmed success moves the booking out of `pending`.
    pub async fn confirm_payment(
        &self,
        booking_id: Uuid,
        reference: &str,
    ) -> Result<PaymentStatus, BookingError> {
        let row = self
            .client
            .select_one(
                tembea_core::client::Query::table(Table::Bookings)
                    .filter(Filter::eq("id", booking_id.to_string())),
            )
            .await
            .map_err(|_| BookingError::NotFound(booking_id))?;
        let booking = Booking::from_row(row).map_err(|e| BookingError::Store(e.to_string()))?;

        let status = self
            .checkout
            .verify(reference)
            .await
            .map_err(|e| BookingError::Checkout(e.to_string()))?;

        if status != CheckoutStatus::Success {
            info!(booking_id = %booking_id, ?status, "checkout not completed, booking stays pending");
            return Ok(PaymentStatus::Pending);
        }

        let settled = booking.payment_plan.settled_status();
        self.client
            .update(
                Table::Bookings,
                json!({
                    "payment_status": settled,
                    "checkout_ref": reference,
                }),
                vec![Filter::eq("id", booking_id.to_string())],
            )
            .await
            .map_err(|e| BookingError::Store(e.to_string()))?;

        info!(booking_id = %booking_id, ?settled, "payment reconciled");
        Ok(settled)
    }
}

/// Checkout adapter for tests: every initialize succeeds, and verification
/// outcomes can be scripted per reference (default: success).
pub struct MockCheckout {
    outcomes: Mutex<HashMap<String, CheckoutStatus>>,
    fail_initialize: Mutex<bool>,
}

impl MockCheckout {
    pub fn new() -> Self {
        Self {
            outcomes: Mutex::new(HashMap::new()),
            fail_initialize: Mutex::new(false),
        }
    }

    pub fn script_outcome(&self, reference: &str, status: CheckoutStatus) {
        self.outcomes
            .lock()
            .expect("mock checkout lock poisoned")
            .insert(reference.to_string(), status);
    }

    pub fn fail_initialize(&self) {
        *self
            .fail_initialize
            .lock()
            .expect("mock checkout lock poisoned") = true;
    }
}

impl Default for MockCheckout {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CheckoutAdapter for MockCheckout {
    async fn initialize(
        &self,
        reference: Uuid,
        _email: &str,
        _amount_cents: i64,
    ) -> Result<CheckoutSession, Box<dyn std::error::Error + Send + Sync>> {
        if *self
            .fail_initialize
            .lock()
            .expect("mock checkout lock poisoned")
        {
            return Err("Simulated checkout gateway failure".into());
        }
        Ok(CheckoutSession {
            reference: reference.to_string(),
            authorization_url: Some(format!("https://checkout.test/{}", reference.simple())),
            access_code: Some("mock_access_code".to_string()),
        })
    }

    async fn verify(
        &self,
        reference: &str,
    ) -> Result<CheckoutStatus, Box<dyn std::error::Error + Send + Sync>> {
        let outcome = self
            .outcomes
            .lock()
            .expect("mock checkout lock poisoned")
            .get(reference)
            .copied()
            .unwrap_or(CheckoutStatus::Success);
        Ok(outcome)
    }
}
