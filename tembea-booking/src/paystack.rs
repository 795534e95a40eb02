use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha512;
use tembea_core::checkout::{CheckoutAdapter, CheckoutSession, CheckoutStatus};
use uuid::Uuid;

type HmacSha512 = Hmac<Sha512>;

/// Paystack-backed checkout. Amounts are already in the currency's minor
/// unit, which is what the provider expects.
pub struct PaystackCheckout {
    http: reqwest::Client,
    secret_key: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct InitializeResponse {
    status: bool,
    message: Option<String>,
    data: Option<InitializeData>,
}

#[derive(Debug, Deserialize)]
struct InitializeData {
    authorization_url: String,
    access_code: String,
    reference: String,
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    status: bool,
    message: Option<String>,
    data: Option<VerifyData>,
}

#[derive(Debug, Deserialize)]
struct VerifyData {
    status: String,
}

impl PaystackCheckout {
    pub fn new(secret_key: &str, base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            secret_key: secret_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl CheckoutAdapter for PaystackCheckout {
    async fn initialize(
        &self,
        reference: Uuid,
        email: &str,
        amount_cents: i64,
    ) -> Result<CheckoutSession, Box<dyn std::error::Error + Send + Sync>> {
        let response: InitializeResponse = self
            .http
            .post(format!("{}/transaction/initialize", self.base_url))
            .bearer_auth(&self.secret_key)
            .json(&serde_json::json!({
                "email": email,
                "amount": amount_cents,
                "reference": reference.to_string(),
            }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if !response.status {
            return Err(response
                .message
                .unwrap_or_else(|| "checkout initialization rejected".to_string())
                .into());
        }
        let data = response
            .data
            .ok_or("checkout initialization response missing data")?;

        Ok(CheckoutSession {
            reference: data.reference,
            authorization_url: Some(data.authorization_url),
            access_code: Some(data.access_code),
        })
    }

    async fn verify(
        &self,
        reference: &str,
    ) -> Result<CheckoutStatus, Box<dyn std::error::Error + Send + Sync>> {
        let response: VerifyResponse = self
            .http
            .get(format!("{}/transaction/verify/{}", self.base_url, reference))
            .bearer_auth(&self.secret_key)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if !response.status {
            return Err(response
                .message
                .unwrap_or_else(|| "checkout verification rejected".to_string())
                .into());
        }

        let status = match response.data.map(|d| d.status) {
            Some(s) if s == "success" => CheckoutStatus::Success,
            Some(s) if s == "abandoned" => CheckoutStatus::Abandoned,
            Some(s) if s == "failed" => CheckoutStatus::Failed,
            _ => CheckoutStatus::Pending,
        };
        Ok(status)
    }
}

/// Signature the provider sends with a webhook: HMAC-SHA512 of the raw
/// body, hex-encoded.
pub fn webhook_signature(secret_key: &str, body: &[u8]) -> String {
    let mut mac = HmacSha512::new_from_slice(secret_key.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(body);
    mac.finalize()
        .into_bytes()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Validate a webhook body against the provider's signature header. Nothing
/// is processed from a webhook whose signature does not check out.
pub fn verify_webhook_signature(secret_key: &str, body: &[u8], signature: &str) -> bool {
    webhook_signature(secret_key, body).eq_ignore_ascii_case(signature)
}
