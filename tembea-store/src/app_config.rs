use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    pub checkout: CheckoutConfig,
    pub business_rules: BusinessRules,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

/// Secret shared with the hosted auth service; this application only
/// validates the tokens that service issues.
#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Base URL of the hosted object store, e.g. https://xyz.supabase.co.
    /// Absent means storage-relative image paths cannot be resolved.
    pub public_base: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CheckoutConfig {
    pub secret_key: String,
    #[serde(default = "default_checkout_base")]
    pub base_url: String,
}

fn default_checkout_base() -> String {
    "https://api.paystack.co".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    /// Share of the total collected up front on the deposit plan.
    #[serde(default = "default_deposit_percent")]
    pub deposit_percent: f64,
    /// Number of equal installments on the installment plan.
    #[serde(default = "default_installment_parts")]
    pub installment_parts: u32,
    /// Upper display bound on travelers per booking.
    #[serde(default = "default_max_guests")]
    pub max_guests: u32,
}

fn default_deposit_percent() -> f64 {
    0.15
}

fn default_installment_parts() -> u32 {
    4
}

fn default_max_guests() -> u32 {
    8
}

impl Default for BusinessRules {
    fn default() -> Self {
        Self {
            deposit_percent: default_deposit_percent(),
            installment_parts: default_installment_parts(),
            max_guests: default_max_guests(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Environment-specific file, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Eg. `TEMBEA__SERVER__PORT=8080`
            .add_source(config::Environment::with_prefix("TEMBEA").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
