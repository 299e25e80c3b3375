use assert_matches::assert_matches;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use notification_cell::*;
use shared_config::{AppConfig, StoreBackend};

fn config(gateway_url: &str) -> AppConfig {
    AppConfig {
        supabase_url: String::new(),
        supabase_anon_key: String::new(),
        supabase_jwt_secret: "secret".to_string(),
        store_backend: StoreBackend::Memory,
        sms_gateway_url: gateway_url.to_string(),
        sms_api_token: "sms-token".to_string(),
        sms_sender_name: "CAMPUS".to_string(),
        sms_country_code: "63".to_string(),
        campus_utc_offset_hours: 8,
        port: 3000,
    }
}

#[tokio::test]
async fn delivers_with_international_prefix() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .and(header("Authorization", "Bearer sms-token"))
        .and(body_json(json!({
            "to": "+639171234567",
            "from": "CAMPUS",
            "message": "hello"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "queued"})))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = HttpSmsGateway::new(&config(&server.uri())).unwrap();
    let outcome = gateway.send("09171234567", "hello").await;

    assert_eq!(outcome, SendOutcome::delivered());
}

#[tokio::test]
async fn gateway_rejection_is_reported_not_raised() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(ResponseTemplate::new(402).set_body_string("insufficient credits"))
        .mount(&server)
        .await;

    let gateway = HttpSmsGateway::new(&config(&server.uri())).unwrap();
    let outcome = gateway.send("9171234567", "hello").await;

    assert!(!outcome.success);
    assert!(outcome.error.unwrap().contains("insufficient credits"));
}

#[tokio::test]
async fn invalid_contact_never_reaches_gateway() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let gateway = HttpSmsGateway::new(&config(&server.uri())).unwrap();
    let outcome = gateway.send("12345", "hello").await;

    assert!(!outcome.success);
    assert!(outcome.error.unwrap().starts_with("Invalid contact number"));
}

#[tokio::test]
async fn unconfigured_gateway_falls_back_to_disabled_sender() {
    let mut unconfigured = config("");
    unconfigured.sms_api_token.clear();

    assert_matches!(HttpSmsGateway::new(&unconfigured), Err(NotificationError::NotConfigured));

    let sender = sender_from_config(&unconfigured);
    let outcome = sender.send("9171234567", "hello").await;
    assert_eq!(outcome, SendOutcome::failed("SMS gateway not configured"));
}
