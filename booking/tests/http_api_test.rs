//! HTTP client tests against a mock backend.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use serde_json::json;
use ticket_booking::api::http::HttpTicketsApi;
use ticket_booking::api::TicketsApi;
use ticket_booking::{normalize, ApiError, BookingRequest, TierId};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn client() -> (MockServer, HttpTicketsApi) {
    let server = MockServer::start().await;
    let api = HttpTicketsApi::new(server.uri()).unwrap();
    (server, api)
}

fn vip_request(quantity: u32) -> BookingRequest {
    BookingRequest {
        user_id: "user-1".to_string(),
        tier: TierId::new("VIP"),
        quantity,
    }
}

#[tokio::test]
async fn test_fetch_tickets() {
    let (server, api) = client().await;

    Mock::given(method("GET"))
        .and(path("/api/tickets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [
                {
                    "id": 1,
                    "tier": "VIP",
                    "label": "VIP Access",
                    "price": 100,
                    "totalQuantity": 10,
                    "availableQuantity": 4
                },
                {
                    "tier": "GA",
                    "label": "General Admission",
                    "price": 10.5,
                    "totalQuantity": 100,
                    "availableQuantity": 0
                }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let tiers = api.fetch_tickets().await.unwrap();

    assert_eq!(tiers.len(), 2);
    assert_eq!(tiers[0].id, Some(1));
    assert_eq!(tiers[0].tier, TierId::new("VIP"));
    assert_eq!(tiers[0].available_quantity, 4);
    assert!((tiers[1].price - 10.5).abs() < f64::EPSILON);
    assert!(tiers[1].is_sold_out());
}

#[tokio::test]
async fn test_book_tickets_sends_camel_case_body() {
    let (server, api) = client().await;

    Mock::given(method("POST"))
        .and(path("/api/tickets/book"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({ "userId": "user-1", "tier": "VIP", "quantity": 3 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {
                "tier": "VIP",
                "bookedQuantity": 3,
                "remainingQuantity": 7,
                "totalAmount": 300
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = api.book_tickets(vip_request(3)).await.unwrap();

    assert_eq!(result.tier, TierId::new("VIP"));
    assert_eq!(result.booked_quantity, 3);
    assert_eq!(result.remaining_quantity, 7);
    assert!((result.total_amount - 300.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_insufficient_tickets_rejection() {
    let (server, api) = client().await;

    Mock::given(method("POST"))
        .and(path("/api/tickets/book"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "success": false,
            "error": {
                "name": "ApiError",
                "code": "INSUFFICIENT_TICKETS",
                "message": "Only 2 tickets left",
                "status": 422
            }
        })))
        .mount(&server)
        .await;

    let error = api.book_tickets(vip_request(5)).await.unwrap_err();

    match &error {
        ApiError::Backend { http_status, payload } => {
            assert_eq!(*http_status, 422);
            let payload = payload.as_ref().unwrap();
            assert_eq!(payload.code.as_deref(), Some("INSUFFICIENT_TICKETS"));
            assert!(payload.details.is_empty());
        },
        other => panic!("Expected backend error, got {other:?}"),
    }
    assert_eq!(normalize(&error).message, "Not enough tickets available.");
}

#[tokio::test]
async fn test_validation_rejection_keeps_backend_message() {
    let (server, api) = client().await;

    Mock::given(method("POST"))
        .and(path("/api/tickets/book"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "success": false,
            "error": {
                "name": "ValidationError",
                "code": "VALIDATION_ERROR",
                "message": "Quantity must be positive",
                "status": 400,
                "details": [{ "path": "quantity", "message": "must be > 0" }]
            }
        })))
        .mount(&server)
        .await;

    let error = api.book_tickets(vip_request(0)).await.unwrap_err();

    assert_eq!(error.payload().unwrap().details.len(), 1);
    assert_eq!(normalize(&error).message, "Quantity must be positive");
}

#[tokio::test]
async fn test_non_json_server_error() {
    let (server, api) = client().await;

    Mock::given(method("GET"))
        .and(path("/api/tickets"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&server)
        .await;

    let error = api.fetch_tickets().await.unwrap_err();

    assert_eq!(
        error,
        ApiError::Backend {
            http_status: 502,
            payload: None
        }
    );
    assert_eq!(normalize(&error).message, "Something went wrong. Please try again.");
}

#[tokio::test]
async fn test_unsuccessful_envelope_with_ok_status() {
    let (server, api) = client().await;

    Mock::given(method("GET"))
        .and(path("/api/tickets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "error": {
                "code": "INTERNAL_ERROR",
                "message": "database unavailable",
                "status": 503
            }
        })))
        .mount(&server)
        .await;

    let error = api.fetch_tickets().await.unwrap_err();

    assert!(matches!(error, ApiError::Backend { http_status: 200, .. }));
    assert_eq!(normalize(&error).message, "Server error. Please try again later.");
}

#[tokio::test]
async fn test_malformed_success_body() {
    let (server, api) = client().await;

    Mock::given(method("GET"))
        .and(path("/api/tickets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .mount(&server)
        .await;

    let error = api.fetch_tickets().await.unwrap_err();
    assert!(matches!(error, ApiError::Decode(_)));

    Mock::given(method("POST"))
        .and(path("/api/tickets/book"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let error = api.book_tickets(vip_request(1)).await.unwrap_err();
    assert!(matches!(error, ApiError::Decode(_)));
}

#[tokio::test]
async fn test_unreachable_backend() {
    // Nothing listens on port 1
    let api = HttpTicketsApi::new("http://127.0.0.1:1").unwrap();
    let error = api.fetch_tickets().await.unwrap_err();

    assert!(matches!(error, ApiError::Transport(_)));
    assert_eq!(normalize(&error).message, "Something went wrong. Please try again.");
}
