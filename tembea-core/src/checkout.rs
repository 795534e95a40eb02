use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where an external checkout attempt stands, as reported by the provider.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutStatus {
    Pending,
    Success,
    Abandoned,
    Failed,
}

/// A checkout initialized with the provider. The authorization URL is what
/// the front end opens; the reference ties the provider's records back to
/// our booking row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub reference: String,
    pub authorization_url: Option<String>,
    pub access_code: Option<String>,
}

/// The third-party checkout widget boundary. One adapter per provider; the
/// booking workflow never talks to a provider directly.
#[async_trait]
pub trait CheckoutAdapter: Send + Sync {
    /// Start a checkout sized to the amount due now, keyed by the booking id.
    async fn initialize(
        &self,
        reference: Uuid,
        email: &str,
        amount_cents: i64,
    ) -> Result<CheckoutSession, Box<dyn std::error::Error + Send + Sync>>;

    /// Ask the provider what became of a checkout (success callback and
    /// webhook handling both re-verify instead of trusting the caller).
    async fn verify(
        &self,
        reference: &str,
    ) -> Result<CheckoutStatus, Box<dyn std::error::Error + Send + Sync>>;
}
