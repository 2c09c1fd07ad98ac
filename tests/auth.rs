mod common;

use actix_web::http::{header, StatusCode};
use actix_web::test;
use pretty_assertions::assert_eq;
use serde_json::json;

use common::{assert_error, init_app, register, state, status_and_json, PASSWORD};
use todo_api::auth::AuthResponse;
use todo_api::clock::Clock;
use todo_api::timestamp::parse_utc;

#[actix_rt::test]
async fn test_register_and_login_flow() {
    let state = state();
    let app = init_app(&state).await;

    let registered = register(&app, "integration@example.com").await;
    assert!(registered.user_id.starts_with("usr_"));
    assert_eq!(registered.token_type, "bearer");
    assert_eq!(registered.user.id, registered.user_id);
    assert_eq!(registered.user.email, "integration@example.com");
    assert_eq!(registered.user.name.as_deref(), Some("Tester"));

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .set_json(json!({ "email": "Integration@Example.com", "password": PASSWORD }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let logged_in: AuthResponse = test::read_body_json(resp).await;
    assert_eq!(logged_in.user_id, registered.user_id);
    assert_eq!(logged_in.expires_at, state.clock.now() + chrono::Duration::days(7));
}

#[actix_rt::test]
async fn test_auth_response_wire_format() {
    let state = state();
    let app = init_app(&state).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/register")
        .set_json(json!({ "email": "wire@example.com", "password": PASSWORD }))
        .to_request();
    let (status, json) = status_and_json(test::call_service(&app, req).await).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["expires_at"], "2026-01-01T10:30:00Z");
    assert_eq!(json["user"]["created_at"], "2025-12-25T10:30:00Z");
    assert!(json["user"]["name"].is_null());
    assert!(json["user"].get("password_hash").is_none());
    assert!(parse_utc(json["expires_at"].as_str().unwrap()).is_ok());
}

#[actix_rt::test]
async fn test_duplicate_email_conflicts() {
    let state = state();
    let app = init_app(&state).await;
    register(&app, "dup@example.com").await;

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/register")
        .set_json(json!({ "email": "DUP@example.com", "password": PASSWORD }))
        .to_request();
    let (status, json) = status_and_json(test::call_service(&app, req).await).await;

    assert_eq!(status, StatusCode::CONFLICT);
    let error = assert_error(&json, "EMAIL_ALREADY_EXISTS");
    assert_eq!(error["details"]["email"], "dup@example.com");
}

#[actix_rt::test]
async fn test_padded_email_is_accepted_by_register_and_login() {
    let state = state();
    let app = init_app(&state).await;

    let registered = register(&app, "  Padded@Example.com ").await;
    assert_eq!(registered.user.email, "padded@example.com");

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .set_json(json!({ "email": " PADDED@example.com  ", "password": PASSWORD }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let logged_in: AuthResponse = test::read_body_json(resp).await;
    assert_eq!(logged_in.user_id, registered.user_id);

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/register")
        .set_json(json!({ "email": "padded@EXAMPLE.com", "password": PASSWORD }))
        .to_request();
    let (status, json) = status_and_json(test::call_service(&app, req).await).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_error(&json, "EMAIL_ALREADY_EXISTS");
}

#[actix_rt::test]
async fn test_login_failures_are_indistinguishable() {
    let state = state();
    let app = init_app(&state).await;
    register(&app, "known@example.com").await;

    let mut bodies = Vec::new();
    for (email, password) in [
        ("known@example.com", "Wr0ngPassword"),
        ("unknown@example.com", PASSWORD),
    ] {
        let req = test::TestRequest::post()
            .uri("/api/v1/auth/login")
            .set_json(json!({ "email": email, "password": password }))
            .to_request();
        let (status, json) = status_and_json(test::call_service(&app, req).await).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let mut error = assert_error(&json, "INVALID_CREDENTIALS");
        error["timestamp"] = json!(null);
        bodies.push(error);
    }

    assert_eq!(bodies[0], bodies[1]);
}

#[actix_rt::test]
async fn test_invalid_registration_inputs() {
    let state = state();
    let app = init_app(&state).await;

    let cases = [
        (
            json!({ "email": "not-an-email", "password": PASSWORD }),
            StatusCode::UNPROCESSABLE_ENTITY,
            "VALIDATION_ERROR",
        ),
        (
            json!({ "email": "weak@example.com", "password": "password1" }),
            StatusCode::UNPROCESSABLE_ENTITY,
            "PASSWORD_TOO_WEAK",
        ),
        (
            json!({ "email": "short@example.com", "password": "Pa1" }),
            StatusCode::UNPROCESSABLE_ENTITY,
            "PASSWORD_TOO_WEAK",
        ),
        (
            json!({ "email": "extra@example.com", "password": PASSWORD, "role": "admin" }),
            StatusCode::BAD_REQUEST,
            "BAD_REQUEST",
        ),
        (
            json!({ "password": PASSWORD }),
            StatusCode::BAD_REQUEST,
            "BAD_REQUEST",
        ),
    ];

    for (payload, expected_status, expected_code) in cases {
        let req = test::TestRequest::post()
            .uri("/api/v1/auth/register")
            .set_json(&payload)
            .to_request();
        let (status, json) = status_and_json(test::call_service(&app, req).await).await;
        assert_eq!(status, expected_status, "payload: {}", payload);
        assert_error(&json, expected_code);
    }

    // Rejected registrations leave nothing behind.
    register(&app, "weak@example.com").await;
}

#[actix_rt::test]
async fn test_invalid_login_inputs() {
    let state = state();
    let app = init_app(&state).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload("{\"email\": ")
        .to_request();
    let (status, json) = status_and_json(test::call_service(&app, req).await).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error(&json, "BAD_REQUEST");

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .set_json(json!({ "email": "", "password": "" }))
        .to_request();
    let (status, json) = status_and_json(test::call_service(&app, req).await).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_error(&json, "VALIDATION_ERROR");
}

#[actix_rt::test]
async fn test_health_and_unknown_routes() {
    let state = state();
    let app = init_app(&state).await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let (status, json) = status_and_json(test::call_service(&app, req).await).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");

    let req = test::TestRequest::get().uri("/api/v2/nothing").to_request();
    let (status, json) = status_and_json(test::call_service(&app, req).await).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let error = assert_error(&json, "NOT_FOUND");
    assert_eq!(error["details"]["path"], "/api/v2/nothing");
}
