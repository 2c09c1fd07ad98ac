use actix_web::{get, HttpResponse, Responder};
use chrono::Utc;
use serde_json::json;

use crate::timestamp::format_utc;

/// Health check endpoint
///
/// Unauthenticated. Reports liveness, crate version and the current time.
#[get("/health")]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": format_utc(&Utc::now())
    }))
}
