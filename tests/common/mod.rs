#![allow(dead_code)]

use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::{header, StatusCode};
use actix_web::middleware::Logger;
use actix_web::{test, web, App};
use chrono::{Duration, TimeZone, Utc};
use serde_json::{json, Value};
use std::sync::Arc;

use todo_api::auth::{AuthResponse, AuthService, TokenCodec};
use todo_api::clock::ManualClock;
use todo_api::routes;
use todo_api::store::MemoryStore;
use todo_api::tasks::TaskService;

pub const SECRET: &[u8] = b"integration-test-secret-at-least-32-bytes";
pub const PASSWORD: &str = "Passw0rd!";

/// Services shared by a test app, kept so tests can move the clock.
pub struct TestState {
    pub clock: Arc<ManualClock>,
    pub auth: web::Data<AuthService>,
    pub tasks: web::Data<TaskService>,
}

pub fn state() -> TestState {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2025, 12, 25, 10, 30, 0).unwrap(),
    ));
    let store = Arc::new(MemoryStore::new());
    let codec = TokenCodec::new(SECRET, Duration::days(7)).unwrap();
    TestState {
        auth: web::Data::new(AuthService::new(store.clone(), codec, clock.clone(), 4)),
        tasks: web::Data::new(TaskService::new(store, clock.clone())),
        clock,
    }
}

/// Full application over in-memory stores, a manual clock and bcrypt cost 4.
pub async fn init_app(
    state: &TestState,
) -> impl Service<actix_http::Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>
{
    test::init_service(
        App::new()
            .app_data(state.auth.clone())
            .app_data(state.tasks.clone())
            .wrap(Logger::default())
            .configure(routes::config)
            .default_service(web::route().to(routes::not_found)),
    )
    .await
}

pub fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {}", token))
}

pub async fn register(
    app: &impl Service<
        actix_http::Request,
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
    >,
    email: &str,
) -> AuthResponse {
    let req = test::TestRequest::post()
        .uri("/api/v1/auth/register")
        .set_json(json!({ "email": email, "password": PASSWORD, "name": "Tester" }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    test::read_body_json(resp).await
}

/// Status and parsed JSON body of a response. Empty bodies parse as `Null`.
pub async fn status_and_json<B: MessageBody>(resp: ServiceResponse<B>) -> (StatusCode, Value) {
    let status = resp.status();
    let body = test::read_body(resp).await;
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

/// Asserts the error envelope and returns its `error` object.
pub fn assert_error(json: &Value, code: &str) -> Value {
    let error = &json["error"];
    assert_eq!(error["code"], code, "unexpected envelope: {}", json);
    assert!(error["message"].is_string());
    assert!(error["details"].is_object());
    assert!(error["timestamp"].as_str().unwrap().ends_with('Z'));
    error.clone()
}
