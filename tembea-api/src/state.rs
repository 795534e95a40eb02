use std::sync::Arc;
use tembea_booking::{BookingWorkflow, IntakeService};
use tembea_core::checkout::CheckoutAdapter;
use tembea_core::client::RemoteClient;
use tembea_store::app_config::BusinessRules;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
}

#[derive(Clone)]
pub struct AppState {
    pub client: Arc<dyn RemoteClient>,
    pub checkout: Arc<dyn CheckoutAdapter>,
    pub workflow: Arc<BookingWorkflow>,
    pub intake: Arc<IntakeService>,
    pub auth: AuthConfig,
    pub business_rules: BusinessRules,
    /// Secret shared with the checkout provider; webhook signatures are
    /// HMACs over the raw body keyed by it.
    pub checkout_secret: String,
}
