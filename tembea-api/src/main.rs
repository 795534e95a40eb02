use std::net::SocketAddr;
use std::sync::Arc;
use tembea_api::{app, state::{AppState, AuthConfig}};
use tembea_booking::{BookingWorkflow, IntakeService, PaystackCheckout};
use tembea_core::checkout::CheckoutAdapter;
use tembea_core::client::RemoteClient;
use tembea_store::{ChangeFeed, DbClient, PgRemoteClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tembea_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = tembea_store::app_config::Config::load().expect("Failed to load config");
    tracing::info!("Starting Tembea API on port {}", config.server.port);

    // Store connection + migrations
    let db = DbClient::new(&config.database.url)
        .await
        .expect("Failed to connect to the store");
    db.migrate().await.expect("Failed to run migrations");

    // Realtime change feed over LISTEN/NOTIFY
    let feed = Arc::new(ChangeFeed::new());

    let mut remote = PgRemoteClient::new(db.pool.clone(), feed.clone());
    if let Some(base) = &config.storage.public_base {
        remote = remote.with_storage_base(base);
    }
    remote.start_listener();
    let client: Arc<dyn RemoteClient> = Arc::new(remote);

    // External checkout provider
    let checkout: Arc<dyn CheckoutAdapter> = Arc::new(PaystackCheckout::new(
        &config.checkout.secret_key,
        &config.checkout.base_url,
    ));

    let workflow = Arc::new(BookingWorkflow::new(
        client.clone(),
        checkout.clone(),
        config.business_rules.clone(),
    ));
    let intake = Arc::new(IntakeService::new(client.clone()));

    let app_state = AppState {
        client,
        checkout,
        workflow,
        intake,
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
        },
        business_rules: config.business_rules.clone(),
        checkout_secret: config.checkout.secret_key.clone(),
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
