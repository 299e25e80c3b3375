use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::NaiveDate;
use serde_json::{json, Value};
use tower::ServiceExt;

use appointment_cell::*;
use notification_cell::test_utils::RecordingSender;
use notification_cell::NotificationSender;
use shared_database::{DocumentStore, InMemoryStore};
use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestUser};

fn app(config: &TestConfig) -> Router {
    let store: Arc<dyn DocumentStore> = Arc::new(InMemoryStore::new());
    let sender: Arc<dyn NotificationSender> = Arc::new(RecordingSender::new());
    let workflow = AppointmentWorkflowService::new(config.to_arc(), store, sender)
        .with_today(NaiveDate::from_ymd_opt(2025, 3, 5).unwrap());

    appointment_routes(AppointmentState {
        config: config.to_arc(),
        workflow: Arc::new(workflow),
    })
}

fn post(uri: &str, user: &TestUser, config: &TestConfig, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Authorization", JwtTestUtils::bearer(user, config))
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str, user: &TestUser, config: &TestConfig) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("Authorization", JwtTestUtils::bearer(user, config))
        .body(Body::empty())
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn submission(date: &str) -> Value {
    json!({
        "kind": "visit",
        "selected_date": date,
        "time_range": "1:00pm-2:00pm",
        "office": "Cashier",
        "reason": "Tuition payment",
        "contact_number": "09171234567"
    })
}

#[tokio::test]
async fn requests_without_token_are_rejected() {
    let config = TestConfig::default();
    let response = app(&config)
        .oneshot(Request::builder().uri("/mine").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn submit_then_approve_over_http() {
    let config = TestConfig::default();
    let app = app(&config);
    let student = TestUser::student("ana@example.com");
    let staff = TestUser::staff("cashier@example.com", "Cashier");

    let created = app
        .clone()
        .oneshot(post("/", &student, &config, submission("2025-03-12")))
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::CREATED);
    let body = json_body(created).await;
    assert_eq!(body["appointment"]["status"], "pending");
    assert!(body["code"].as_str().unwrap().starts_with("CSH"));
    let id = body["appointment"]["id"].as_str().unwrap().to_string();

    let director = TestUser::director("director@example.com");
    let forbidden = app
        .clone()
        .oneshot(post(&format!("/{}/approve", id), &director, &config, json!({})))
        .await
        .unwrap();
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

    let approved = app
        .clone()
        .oneshot(post(&format!("/{}/approve", id), &staff, &config, json!({})))
        .await
        .unwrap();
    assert_eq!(approved.status(), StatusCode::OK);
    let body = json_body(approved).await;
    assert_eq!(body["appointment"]["status"], "approved");
    assert_eq!(body["warnings"], json!([]));

    let count = app
        .oneshot(get(
            "/slots/count?office=Cashier&date=2025-03-12&time_range=1%3A00pm-2%3A00pm",
            &student,
            &config,
        ))
        .await
        .unwrap();
    assert_eq!(count.status(), StatusCode::OK);
    let body = json_body(count).await;
    assert_eq!(body["approved"], 1);
    assert_eq!(body["capacity"], 4);
}

#[tokio::test]
async fn validation_rejections_map_to_unprocessable() {
    let config = TestConfig::default();
    let student = TestUser::student("ana@example.com");

    let weekend = app(&config)
        .oneshot(post("/", &student, &config, submission("2025-03-15")))
        .await
        .unwrap();
    assert_eq!(weekend.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(weekend).await;
    assert_eq!(body["error"], "Appointments cannot be scheduled on weekends");
}

#[tokio::test]
async fn complete_on_pending_is_a_conflict() {
    let config = TestConfig::default();
    let app = app(&config);
    let student = TestUser::student("ana@example.com");
    let admin = TestUser::admin("admin@example.com");

    let created = app
        .clone()
        .oneshot(post("/", &student, &config, submission("2025-03-12")))
        .await
        .unwrap();
    let id = json_body(created).await["appointment"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .clone()
        .oneshot(post(&format!("/{}/complete", id), &admin, &config, json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let missing = app
        .oneshot(post("/does-not-exist/decline", &admin, &config, json!({"reason": "Closed"})))
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn suspension_reports_declined_count() {
    let config = TestConfig::default();
    let app = app(&config);
    let client = TestUser::client("walkin@example.com");
    let staff = TestUser::staff("cashier@example.com", "Cashier");

    let created = app
        .clone()
        .oneshot(post("/", &client, &config, submission("2025-03-12")))
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(post(
            "/suspensions",
            &staff,
            &config,
            json!({
                "office": "Cashier",
                "start_date": "2025-03-10",
                "end_date": "2025-03-14",
                "reason": "Typhoon suspension"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["declined"], 1);

    let office = app
        .oneshot(get("/office/Cashier?status=declined", &staff, &config))
        .await
        .unwrap();
    assert_eq!(office.status(), StatusCode::OK);
    assert_eq!(json_body(office).await["total"], 1);
}
