//! Contract tests for the booking backend client against a stub server.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use bookline_client::{ApiError, HttpBookingApi};
use bookline_core::booking::{BookingId, BookingStatus, PaymentStatus};
use serde_json::json;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn booking_body(id: &str, status: &str, payment_status: Option<&str>) -> serde_json::Value {
    let mut body = json!({
        "id": id,
        "status": status,
        "scheduledDate": "2026-09-01T10:00:00Z",
        "createdAt": "2026-08-20T08:00:00Z",
        "totalAmount": 120.0,
    });
    if let Some(ps) = payment_status {
        body["payment"] = json!({
            "id": format!("pay_{id}"),
            "status": ps,
            "amount": 120.0,
            "createdAt": "2026-08-20T08:05:00Z",
        });
    }
    body
}

fn api_for(server: &MockServer) -> HttpBookingApi {
    HttpBookingApi::new(server.uri()).expect("client builds")
}

#[tokio::test]
async fn lists_bookings_from_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/bookings/my-bookings"))
        .and(query_param_is_missing("t"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "bookings": [
                booking_body("bk_1", "CONFIRMED", Some("ESCROW")),
                booking_body("bk_2", "ON_HOLD", None),
            ]
        })))
        .mount(&server)
        .await;

    let api = api_for(&server);
    let bookings = api.list_my_bookings(None).await.expect("fetch succeeds");

    assert_eq!(bookings.len(), 2);
    assert_eq!(bookings[0].status, BookingStatus::Confirmed);
    // Unrecognized statuses survive deserialization verbatim.
    assert_eq!(
        bookings[1].status,
        BookingStatus::Unknown("ON_HOLD".to_string())
    );
}

#[tokio::test]
async fn cache_bust_appends_nonce_parameter() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/bookings/my-bookings"))
        .and(query_param("t", "1756454400000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "bookings": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let api = api_for(&server);
    let bookings = api
        .list_my_bookings(Some(1_756_454_400_000))
        .await
        .expect("fetch succeeds");
    assert!(bookings.is_empty());
}

#[tokio::test]
async fn missing_bookings_key_is_malformed_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/bookings/my-bookings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .mount(&server)
        .await;

    let api = api_for(&server);
    let err = api.list_my_bookings(None).await.expect_err("must fail");
    assert!(matches!(err, ApiError::MalformedResponse(_)), "{err:?}");
}

#[tokio::test]
async fn server_error_message_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/book-service/bk_9/cancel"))
        .respond_with(
            ResponseTemplate::new(409).set_body_json(json!({ "error": "already in progress" })),
        )
        .mount(&server)
        .await;

    let api = api_for(&server);
    let err = api
        .cancel_booking(&BookingId::from("bk_9"))
        .await
        .expect_err("must fail");
    match err {
        ApiError::Http { status, message } => {
            assert_eq!(status, 409);
            assert_eq!(message, "already in progress");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn unstructured_error_body_gets_generic_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/book-service/bk_9/confirm-completion"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let api = api_for(&server);
    let err = api
        .confirm_completion(&BookingId::from("bk_9"))
        .await
        .expect_err("must fail");
    match err {
        ApiError::Http { status, message } => {
            assert_eq!(status, 500);
            assert!(message.contains("500"), "generic message: {message}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn unauthorized_maps_to_dedicated_variant() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let api = api_for(&server);
    let err = api.current_user().await.expect_err("must fail");
    assert!(matches!(err, ApiError::Unauthorized), "{err:?}");
}

#[tokio::test]
async fn payment_status_envelope_round_trips_unknown_values() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/book-service/bk_1/payment-status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "SETTLING" })))
        .mount(&server)
        .await;

    let api = api_for(&server);
    let status = api
        .payment_status(&BookingId::from("bk_1"))
        .await
        .expect("fetch succeeds");
    assert_eq!(status, PaymentStatus::Unknown("SETTLING".to_string()));
}

#[tokio::test]
async fn confirm_completion_succeeds_on_empty_2xx() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/book-service/bk_3/confirm-completion"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let api = api_for(&server);
    api.confirm_completion(&BookingId::from("bk_3"))
        .await
        .expect("confirm succeeds");
}

#[tokio::test]
async fn services_catalog_parses_bare_array() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/services"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "sv_1", "name": "Deep clean", "price": 80.0 },
            { "id": "sv_2", "name": "Window wash" },
        ])))
        .mount(&server)
        .await;

    let api = api_for(&server);
    let services = api.services().await.expect("fetch succeeds");
    assert_eq!(services.len(), 2);
    assert_eq!(services[0].name, "Deep clean");
    assert_eq!(services[1].price, None);
}

#[tokio::test]
async fn current_user_parses_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": { "id": "u_1", "name": "Sam", "email": "sam@example.com" }
        })))
        .mount(&server)
        .await;

    let api = api_for(&server);
    let user = api.current_user().await.expect("fetch succeeds");
    assert_eq!(user.id, "u_1");
    assert_eq!(user.name.as_deref(), Some("Sam"));
}
