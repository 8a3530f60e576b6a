use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use farmo_api::{app, AppState, AuthConfig};
use farmo_api::middleware::{CustomerClaims, ProviderClaims};
use farmo_core::{Category, LogNotifier, PriceUnit, ProviderCandidate};
use farmo_dispatch::InstantBookingService;
use farmo_store::{InMemoryBookingStore, InMemoryCategoryCatalog, InMemoryProviderDirectory};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

const SECRET: &str = "test-secret";

struct TestApp {
    router: Router,
    providers: Vec<Uuid>,
}

fn test_app(provider_lngs: &[f64]) -> TestApp {
    let mut category = Category::new("Tractor with driver", "tractor");
    category.instant_price = Some(80_000);
    category.instant_price_unit = PriceUnit::Hour;

    let catalog = Arc::new(InMemoryCategoryCatalog::new());
    catalog.upsert(category.clone()).unwrap();

    let directory = Arc::new(InMemoryProviderDirectory::new());
    let mut providers = Vec::new();
    for lng in provider_lngs {
        let candidate = ProviderCandidate {
            provider_id: Uuid::new_v4(),
            business_name: "Kale Krishi Seva".to_string(),
            is_verified: true,
            is_available: true,
            latitude: Some(0.0),
            longitude: Some(*lng),
        };
        providers.push(candidate.provider_id);
        directory.register(candidate, vec![category.id]).unwrap();
    }

    let service = Arc::new(InstantBookingService::new(
        catalog,
        directory,
        Arc::new(InMemoryBookingStore::new()),
        Arc::new(LogNotifier),
    ));
    let state = AppState::new(
        service,
        None,
        AuthConfig {
            secret: SECRET.to_string(),
        },
    );

    TestApp {
        router: app(state),
        providers,
    }
}

fn exp() -> usize {
    (Utc::now() + Duration::hours(1)).timestamp() as usize
}

fn customer_token(customer_id: Uuid) -> String {
    let claims = CustomerClaims {
        sub: customer_id.to_string(),
        role: "CUSTOMER".to_string(),
        exp: exp(),
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap()
}

fn provider_token(provider_id: Uuid) -> String {
    let claims = ProviderClaims {
        sub: provider_id.to_string(),
        role: "PROVIDER".to_string(),
        exp: exp(),
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap()
}

async fn call(router: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

fn create_body() -> Value {
    json!({
        "category_slug": "tractor",
        "lat": 0.0,
        "lng": 0.0,
        "quantity": 2,
        "address": "Survey 41, Baramati"
    })
}

#[tokio::test]
async fn test_instant_booking_happy_path() {
    let app = test_app(&[0.01, 0.03]);
    let customer = customer_token(Uuid::new_v4());
    let winner = provider_token(app.providers[0]);
    let loser = provider_token(app.providers[1]);

    let (status, created) = call(&app.router, "POST", "/api/v1/bookings/instant/", Some(&customer), Some(create_body())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "SEARCHING");
    assert_eq!(created["total_amount"], 160_000);
    let booking_id = created["booking_id"].as_str().unwrap().to_string();

    let (status, pending) = call(&app.router, "GET", "/api/v1/bookings/provider/instant/", Some(&winner), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pending["count"], 1);
    assert_eq!(pending["requests"][0]["booking_id"], booking_id.as_str());

    let accept_uri = format!("/api/v1/bookings/provider/instant/{}/accept/", booking_id);
    let (status, accepted) = call(&app.router, "POST", &accept_uri, Some(&winner), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(accepted["status"], "CONFIRMED");
    assert_eq!(accepted["start_job_otp"], "****");
    let end_otp = accepted["end_job_otp"].as_str().unwrap().to_string();

    let (status, lost) = call(&app.router, "POST", &accept_uri, Some(&loser), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(lost["code"], "ALREADY_DECIDED");

    let status_uri = format!("/api/v1/bookings/instant/{}/status/", booking_id);
    let (status, polled) = call(&app.router, "GET", &status_uri, Some(&customer), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(polled["status"], "CONFIRMED");
    assert_eq!(polled["end_job_otp"], "****");
    let start_otp = polled["start_job_otp"].as_str().unwrap().to_string();

    let action_uri = format!("/api/v1/bookings/provider/{}/action/", booking_id);
    let (status, started) = call(
        &app.router,
        "POST",
        &action_uri,
        Some(&winner),
        Some(json!({ "action": "start", "otp": start_otp })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(started["status"], "IN_PROGRESS");

    let (status, done) = call(
        &app.router,
        "POST",
        &action_uri,
        Some(&winner),
        Some(json!({ "action": "complete", "otp": end_otp })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(done["status"], "COMPLETED");
}

#[tokio::test]
async fn test_routes_require_matching_role() {
    let app = test_app(&[0.01]);
    let provider = provider_token(app.providers[0]);

    let (status, _) = call(&app.router, "POST", "/api/v1/bookings/instant/", None, Some(create_body())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = call(&app.router, "POST", "/api/v1/bookings/instant/", Some(&provider), Some(create_body())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let customer = customer_token(Uuid::new_v4());
    let (status, _) = call(&app.router, "GET", "/api/v1/bookings/provider/instant/", Some(&customer), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(&app.router, "GET", "/api/v1/bookings/provider/instant/", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_no_providers_nearby_is_unprocessable() {
    let app = test_app(&[2.0]);
    let customer = customer_token(Uuid::new_v4());

    let (status, body) = call(&app.router, "POST", "/api/v1/bookings/instant/", Some(&customer), Some(create_body())).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "NO_PROVIDERS_NEARBY");

    let booking_id = body["booking_id"].as_str().unwrap();
    let (status, polled) = call(
        &app.router,
        "GET",
        &format!("/api/v1/bookings/instant/{}/status/", booking_id),
        Some(&customer),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(polled["status"], "EXPIRED");
}

#[tokio::test]
async fn test_decline_and_cancel_over_http() {
    let app = test_app(&[0.01, 0.02]);
    let customer = customer_token(Uuid::new_v4());
    let first = provider_token(app.providers[0]);

    let (_, created) = call(&app.router, "POST", "/api/v1/bookings/instant/", Some(&customer), Some(create_body())).await;
    let booking_id = created["booking_id"].as_str().unwrap().to_string();

    let decline_uri = format!("/api/v1/bookings/provider/instant/{}/decline/", booking_id);
    let (status, ack) = call(&app.router, "POST", &decline_uri, Some(&first), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["remaining_pending"], 1);
    assert_eq!(ack["booking_status"], "SEARCHING");

    let (status, again) = call(&app.router, "POST", &decline_uri, Some(&first), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(again["code"], "NO_PENDING_REQUEST");

    let cancel_uri = format!("/api/v1/bookings/instant/{}/cancel/", booking_id);
    let (status, short) = call(&app.router, "POST", &cancel_uri, Some(&customer), Some(json!({ "reason": "nah" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(short["code"], "INVALID_REQUEST");

    let (status, cancelled) = call(
        &app.router,
        "POST",
        &cancel_uri,
        Some(&customer),
        Some(json!({ "reason": "Tractor arranged by a neighbour" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["status"], "CANCELLED");

    let stranger = customer_token(Uuid::new_v4());
    let (status, _) = call(
        &app.router,
        "GET",
        &format!("/api/v1/bookings/instant/{}/status/", booking_id),
        Some(&stranger),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
