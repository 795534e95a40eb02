use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use std::sync::Arc;
use tembea_api::middleware::auth::Claims;
use tembea_api::state::{AppState, AuthConfig};
use tembea_booking::paystack::webhook_signature;
use tembea_booking::{BookingWorkflow, IntakeService, MockCheckout};
use tembea_core::client::RemoteClient;
use tembea_shared::Table;
use tembea_store::app_config::BusinessRules;
use tembea_store::MemoryRemoteClient;
use tower::ServiceExt;
use uuid::Uuid;

const JWT_SECRET: &str = "test-secret";
const CHECKOUT_SECRET: &str = "sk_test_secret";

struct Harness {
    app: Router,
    client: Arc<MemoryRemoteClient>,
}

fn harness() -> Harness {
    let client = Arc::new(MemoryRemoteClient::new().with_storage_base("https://cdn.test"));
    let checkout = Arc::new(MockCheckout::new());
    let workflow = Arc::new(BookingWorkflow::new(
        client.clone(),
        checkout.clone(),
        BusinessRules::default(),
    ));
    let intake = Arc::new(IntakeService::new(client.clone()));

    let state = AppState {
        client: client.clone(),
        checkout,
        workflow,
        intake,
        auth: AuthConfig {
            secret: JWT_SECRET.to_string(),
        },
        business_rules: BusinessRules::default(),
        checkout_secret: CHECKOUT_SECRET.to_string(),
    };

    Harness {
        app: tembea_api::app(state),
        client,
    }
}

fn token_for(user_id: Uuid) -> String {
    let claims = Claims {
        sub: user_id.to_string(),
        email: Some("asha@example.com".to_string()),
        exp: (Utc::now().timestamp() + 3600) as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

fn seed_listing(client: &MemoryRemoteClient, id: Uuid, status: &str) {
    client.seed(
        Table::Listings,
        vec![json!({
            "id": id,
            "title": "Serengeti Classic Safari",
            "description": "Five days across the plains",
            "category": "tour",
            "price_cents": 100,
            "type": "Safari",
            "images": ["covers/serengeti.jpg"],
            "status": status,
            "created_at": "2026-06-01T08:00:00Z",
        })],
    );
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(path: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(path);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

fn post_json(path: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn listings_endpoint_serves_published_rows_only() {
    let h = harness();
    seed_listing(&h.client, Uuid::new_v4(), "published");
    seed_listing(&h.client, Uuid::new_v4(), "draft");

    let response = h.app.clone().oneshot(get("/v1/listings", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["status"], "published");
}

#[tokio::test]
async fn subtype_parameter_refines_after_the_remote_filter() {
    let h = harness();
    seed_listing(&h.client, Uuid::new_v4(), "published");
    h.client.seed(
        Table::Listings,
        vec![json!({
            "title": "Maasai Village Visit",
            "category": "tour",
            "type": "Cultural",
            "status": "published",
            "created_at": "2026-06-02T08:00:00Z",
        })],
    );

    let response = h
        .app
        .clone()
        .oneshot(get("/v1/listings?category=tour&subtype=cultural", None))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["title"], "Maasai Village Visit");
}

#[tokio::test]
async fn listing_detail_resolves_gallery_urls() {
    let h = harness();
    let id = Uuid::new_v4();
    seed_listing(&h.client, id, "published");

    let response = h
        .app
        .clone()
        .oneshot(get(&format!("/v1/listings/{id}"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(
        body["gallery"]["primary"],
        "https://cdn.test/storage/v1/object/public/listings_images/covers/serengeti.jpg"
    );
}

#[tokio::test]
async fn draft_listing_detail_is_not_found() {
    let h = harness();
    let id = Uuid::new_v4();
    seed_listing(&h.client, id, "draft");

    let response = h
        .app
        .clone()
        .oneshot(get(&format!("/v1/listings/{id}"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unauthenticated_booking_is_rejected_with_return_path() {
    let h = harness();
    let listing_id = Uuid::new_v4();
    seed_listing(&h.client, listing_id, "published");

    let response = h
        .app
        .clone()
        .oneshot(post_json(
            "/v1/bookings",
            None,
            json!({
                "listing_id": listing_id,
                "travelers": 2,
                "check_in": "2026-09-10",
                "plan": "full",
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(
        body["redirect"],
        format!("/signin?redirect=/book/tour/{listing_id}")
    );

    // No row was inserted.
    let rows = h
        .client
        .select(tembea_core::client::Query::table(Table::Bookings))
        .await
        .unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn booking_submit_creates_pending_row_with_quoted_total() {
    let h = harness();
    let listing_id = Uuid::new_v4();
    seed_listing(&h.client, listing_id, "published");
    let user_id = Uuid::new_v4();
    let token = token_for(user_id);

    let response = h
        .app
        .clone()
        .oneshot(post_json(
            "/v1/bookings",
            Some(&token),
            json!({
                "listing_id": listing_id,
                "travelers": 3,
                "check_in": "2026-09-10",
                "plan": "full",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["booking"]["total_amount_cents"], 300);
    assert_eq!(body["booking"]["payment_status"], "pending");
    assert_eq!(body["quote"]["due_now_cents"], 300);
    assert!(body["checkout"]["authorization_url"]
        .as_str()
        .unwrap()
        .starts_with("https://checkout.test/"));
}

#[tokio::test]
async fn payment_callback_settles_the_booking() {
    let h = harness();
    let listing_id = Uuid::new_v4();
    seed_listing(&h.client, listing_id, "published");
    let token = token_for(Uuid::new_v4());

    let created = body_json(
        h.app
            .clone()
            .oneshot(post_json(
                "/v1/bookings",
                Some(&token),
                json!({
                    "listing_id": listing_id,
                    "travelers": 1,
                    "check_in": "2026-09-10",
                    "plan": "deposit",
                }),
            ))
            .await
            .unwrap(),
    )
    .await;
    let booking_id = created["booking"]["id"].as_str().unwrap().to_string();
    let reference = created["checkout"]["reference"].as_str().unwrap().to_string();

    let response = h
        .app
        .clone()
        .oneshot(post_json(
            &format!("/v1/bookings/{booking_id}/payment"),
            Some(&token),
            json!({ "reference": reference }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["payment_status"], "partial");
}

#[tokio::test]
async fn webhook_requires_a_valid_signature() {
    let h = harness();
    let listing_id = Uuid::new_v4();
    seed_listing(&h.client, listing_id, "published");
    let token = token_for(Uuid::new_v4());

    let created = body_json(
        h.app
            .clone()
            .oneshot(post_json(
                "/v1/bookings",
                Some(&token),
                json!({
                    "listing_id": listing_id,
                    "travelers": 1,
                    "check_in": "2026-09-10",
                    "plan": "full",
                }),
            ))
            .await
            .unwrap(),
    )
    .await;
    let reference = created["checkout"]["reference"].as_str().unwrap().to_string();
    let payload = json!({
        "event": "charge.success",
        "data": { "reference": reference },
    })
    .to_string();

    // Bad signature: rejected, nothing changes.
    let response = h
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/webhooks/checkout")
                .header("content-type", "application/json")
                .header("x-paystack-signature", "deadbeef")
                .body(Body::from(payload.clone()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Valid signature: the booking settles.
    let signature = webhook_signature(CHECKOUT_SECRET, payload.as_bytes());
    let response = h
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/webhooks/checkout")
                .header("content-type", "application/json")
                .header("x-paystack-signature", signature)
                .body(Body::from(payload))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bookings = body_json(
        h.app
            .clone()
            .oneshot(get("/v1/bookings", Some(&token)))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(bookings[0]["payment_status"], "paid");
}

#[tokio::test]
async fn profile_routes_require_authentication() {
    let h = harness();
    let response = h.app.clone().oneshot(get("/v1/profile", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn profile_rename_reads_back_the_new_name() {
    let h = harness();
    let user_id = Uuid::new_v4();
    h.client.seed(
        Table::Profiles,
        vec![json!({
            "id": user_id,
            "full_name": "Asha N.",
            "email": "asha@example.com",
            "role": "user",
        })],
    );
    let token = token_for(user_id);

    let response = h
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri("/v1/profile")
                .header("content-type", "application/json")
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::from(json!({"full_name": "Asha Nyambura"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["full_name"], "Asha Nyambura");
}

#[tokio::test]
async fn volunteer_application_and_custom_request_flows() {
    let h = harness();
    let user_id = Uuid::new_v4();
    let token = token_for(user_id);
    let opportunity_id = Uuid::new_v4();

    let response = h
        .app
        .clone()
        .oneshot(post_json(
            "/v1/volunteer-applications",
            Some(&token),
            json!({
                "opportunity_id": opportunity_id,
                "name": "Asha N.",
                "email": "asha@example.com",
                "skills": "Teaching",
                "motivation": "Give back",
                "availability": "June to August",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = h
        .app
        .clone()
        .oneshot(post_json(
            "/v1/custom-requests",
            Some(&token),
            json!({
                "trip_details": "Gorilla trek then Zanzibar",
                "budget_cents": 500000,
                "full_name": "Asha N.",
                "email": "asha@example.com",
                "phone": "+254700000001",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let listed = body_json(
        h.app
            .clone()
            .oneshot(get("/v1/custom-requests", Some(&token)))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["status"], "pending");
}

#[tokio::test]
async fn invalid_bearer_token_is_rejected() {
    let h = harness();
    let response = h
        .app
        .clone()
        .oneshot(get("/v1/listings", Some("not-a-token")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
