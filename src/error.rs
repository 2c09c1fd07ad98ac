//!
//! # Custom Error Handling
//!
//! This module defines the custom error type `AppError` used throughout the application.
//! Every failure a request can run into, from a missing bearer token to an unreachable
//! database, is one of its variants.
//!
//! `AppError` implements `actix_web::error::ResponseError`, so handlers, extractors and
//! middleware can all return it and the client always receives the same envelope:
//!
//! ```json
//! { "error": { "code": "TASK_NOT_FOUND", "message": "Task not found",
//!              "details": { "task_id": 7 }, "timestamp": "2025-12-25T10:30:00Z" } }
//! ```
//!
//! `From` implementations for `validator::ValidationErrors`, `bcrypt::BcryptError`,
//! token codec errors and store errors allow easy conversion with the `?` operator.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use chrono::Utc;
use serde_json::{json, Map, Value};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use validator::ValidationErrors;

use crate::auth::token::TokenError;
use crate::store::StoreError;
use crate::timestamp::format_utc;

static EXPOSE_INTERNAL_DETAILS: AtomicBool = AtomicBool::new(false);

/// Controls whether 5xx responses carry the underlying failure in `details`.
/// Only enabled for `APP_ENV=development`.
pub fn expose_internal_details(enabled: bool) {
    EXPOSE_INTERNAL_DETAILS.store(enabled, Ordering::Relaxed);
}

fn internal_details_exposed() -> bool {
    EXPOSE_INTERNAL_DETAILS.load(Ordering::Relaxed)
}

/// Represents all possible errors that can occur within the application.
#[derive(Debug)]
pub enum AppError {
    /// Missing, malformed, expired or forged bearer token (HTTP 401).
    /// Deliberately carries no detail.
    Unauthenticated,
    /// Unknown email or wrong password; the two are never distinguished (HTTP 401).
    InvalidCredentials,
    /// The owner id in the path is not the authenticated caller (HTTP 403).
    Forbidden(String),
    /// No task with this id exists for the caller (HTTP 404). Also used when the
    /// task exists but belongs to someone else.
    TaskNotFound(i64),
    /// No route matches the request path (HTTP 404).
    NotFound(String),
    /// Registration email is already taken (HTTP 409).
    EmailAlreadyExists(String),
    /// Password does not meet the minimum policy (HTTP 422).
    PasswordTooWeak(String),
    /// Title empty after trimming or longer than 200 characters (HTTP 422).
    InvalidTitle(String),
    /// Description longer than 1000 characters (HTTP 422).
    InvalidDescription(String),
    /// An update request without any field to change (HTTP 422).
    NoFieldsProvided,
    /// Any other failed input validation (HTTP 422).
    ValidationError { message: String, details: Value },
    /// Body, query or path could not be parsed into the expected shape (HTTP 400).
    BadRequest(String),
    /// The backing store could not be reached (HTTP 503).
    ServiceUnavailable(String),
    /// Represents an unexpected server-side error (HTTP 500).
    InternalServerError(String),
    /// A database operation failed for a reason other than availability (HTTP 500).
    DatabaseError(String),
}

impl AppError {
    /// Stable machine-readable code placed in the envelope.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Unauthenticated => "UNAUTHENTICATED",
            AppError::InvalidCredentials => "INVALID_CREDENTIALS",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::TaskNotFound(_) => "TASK_NOT_FOUND",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::EmailAlreadyExists(_) => "EMAIL_ALREADY_EXISTS",
            AppError::PasswordTooWeak(_) => "PASSWORD_TOO_WEAK",
            AppError::InvalidTitle(_) => "INVALID_TITLE",
            AppError::InvalidDescription(_) => "INVALID_DESCRIPTION",
            AppError::NoFieldsProvided => "NO_FIELDS_PROVIDED",
            AppError::ValidationError { .. } => "VALIDATION_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            AppError::InternalServerError(_) | AppError::DatabaseError(_) => "INTERNAL_ERROR",
        }
    }

    /// Human-readable message placed in the envelope. Never contains internals.
    pub fn message(&self) -> String {
        match self {
            AppError::Unauthenticated => "Invalid or missing authentication token".into(),
            AppError::InvalidCredentials => "Invalid email or password".into(),
            AppError::Forbidden(_) => "You can only access your own tasks".into(),
            AppError::TaskNotFound(_) => "Task not found".into(),
            AppError::NotFound(_) => "Resource not found".into(),
            AppError::EmailAlreadyExists(_) => "An account with this email already exists".into(),
            AppError::PasswordTooWeak(msg)
            | AppError::InvalidTitle(msg)
            | AppError::InvalidDescription(msg)
            | AppError::BadRequest(msg) => msg.clone(),
            AppError::NoFieldsProvided => "At least one field must be provided".into(),
            AppError::ValidationError { message, .. } => message.clone(),
            AppError::ServiceUnavailable(_) => "Service temporarily unavailable".into(),
            AppError::InternalServerError(_) | AppError::DatabaseError(_) => {
                "An unexpected error occurred".into()
            }
        }
    }

    fn details(&self, expose_internal: bool) -> Value {
        match self {
            AppError::Forbidden(path_owner) => json!({ "user_id": path_owner }),
            AppError::TaskNotFound(task_id) => json!({ "task_id": task_id }),
            AppError::NotFound(path) => json!({ "path": path }),
            AppError::EmailAlreadyExists(email) => json!({ "email": email }),
            AppError::ValidationError { details, .. } => details.clone(),
            AppError::ServiceUnavailable(reason)
            | AppError::InternalServerError(reason)
            | AppError::DatabaseError(reason)
                if expose_internal =>
            {
                json!({ "reason": reason })
            }
            _ => json!({}),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Unauthenticated => write!(f, "Unauthenticated"),
            AppError::InvalidCredentials => write!(f, "Invalid credentials"),
            AppError::Forbidden(owner) => write!(f, "Forbidden: path owner {}", owner),
            AppError::TaskNotFound(id) => write!(f, "Task not found: {}", id),
            AppError::NotFound(path) => write!(f, "Not Found: {}", path),
            AppError::EmailAlreadyExists(email) => write!(f, "Email already exists: {}", email),
            AppError::PasswordTooWeak(msg) => write!(f, "Password too weak: {}", msg),
            AppError::InvalidTitle(msg) => write!(f, "Invalid title: {}", msg),
            AppError::InvalidDescription(msg) => write!(f, "Invalid description: {}", msg),
            AppError::NoFieldsProvided => write!(f, "No fields provided"),
            AppError::ValidationError { message, .. } => write!(f, "Validation Error: {}", message),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::ServiceUnavailable(msg) => write!(f, "Service Unavailable: {}", msg),
            AppError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database Error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

/// Converts `AppError` variants into `HttpResponse` objects carrying the error envelope.
impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::TaskNotFound(_) | AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::EmailAlreadyExists(_) => StatusCode::CONFLICT,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::PasswordTooWeak(_)
            | AppError::InvalidTitle(_)
            | AppError::InvalidDescription(_)
            | AppError::NoFieldsProvided
            | AppError::ValidationError { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::InternalServerError(_) | AppError::DatabaseError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        self.render(internal_details_exposed())
    }
}

impl AppError {
    /// Builds the error envelope. `expose_internal` adds the failure reason of
    /// 5xx errors to `details`.
    fn render(&self, expose_internal: bool) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("{}", self);
        }

        HttpResponse::build(status).json(json!({
            "error": {
                "code": self.code(),
                "message": self.message(),
                "details": self.details(expose_internal),
                "timestamp": format_utc(&Utc::now()),
            }
        }))
    }
}

/// Converts `validator::ValidationErrors` into the most specific `AppError`.
///
/// Field names decide the variant: `title` and `description` have their own error
/// codes, as does a failed `password_strength` check. Anything else becomes
/// `AppError::ValidationError` with the failing fields listed in `details`.
impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> AppError {
        let fields = errors.field_errors();
        let first_message = |field: &str, fallback: &str| -> String {
            fields
                .get(field)
                .and_then(|errs| errs.first())
                .and_then(|err| err.message.as_ref())
                .map(|msg| msg.to_string())
                .unwrap_or_else(|| fallback.to_string())
        };

        if fields.contains_key("title") {
            return AppError::InvalidTitle(first_message(
                "title",
                "Title must be between 1 and 200 characters",
            ));
        }
        if fields.contains_key("description") {
            return AppError::InvalidDescription(first_message(
                "description",
                "Description must be at most 1000 characters",
            ));
        }
        let weak_password = fields
            .get("password")
            .map_or(false, |errs| errs.iter().any(|e| e.code == "password_strength"));
        if weak_password {
            return AppError::PasswordTooWeak(first_message(
                "password",
                "Password does not meet the minimum requirements",
            ));
        }

        let mut details = Map::new();
        for (field, errs) in &fields {
            let codes: Vec<Value> = errs.iter().map(|e| Value::from(e.code.to_string())).collect();
            details.insert(field.to_string(), Value::Array(codes));
        }
        AppError::ValidationError {
            message: "Request validation failed".into(),
            details: Value::Object(details),
        }
    }
}

/// Converts `bcrypt::BcryptError` into `AppError::InternalServerError`.
impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::InternalServerError(format!("Password hashing failed: {}", error))
    }
}

/// Every token failure surfaces as a bare 401.
impl From<TokenError> for AppError {
    fn from(_: TokenError) -> AppError {
        AppError::Unauthenticated
    }
}

impl From<StoreError> for AppError {
    fn from(error: StoreError) -> AppError {
        match error {
            StoreError::Unavailable(msg) => AppError::ServiceUnavailable(msg),
            StoreError::Backend(msg) => AppError::DatabaseError(msg),
            // Callers that can explain a conflict map it themselves before it gets here.
            StoreError::Conflict(msg) => AppError::InternalServerError(format!("Unexpected conflict: {}", msg)),
        }
    }
}
