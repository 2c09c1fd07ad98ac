use crate::{
    auth::{AuthService, LoginRequest, RegisterRequest},
    error::AppError,
};
use actix_web::{post, web, HttpResponse, Responder};

/// Register a new user
///
/// Creates the account and returns a bearer token for it.
///
/// ## Responses:
/// - `201 Created`: `AuthResponse` with the new user's id, token and profile.
/// - `409 Conflict`: The email is already registered (case-insensitive).
/// - `422 Unprocessable Entity`: Invalid email, weak password or bad name.
#[post("/register")]
pub async fn register(
    auth: web::Data<AuthService>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    let response = auth.register(register_data.into_inner()).await?;
    Ok(HttpResponse::Created().json(response))
}

/// Login user
///
/// Exchanges email and password for a bearer token. An unknown email and a
/// wrong password produce the same `401 INVALID_CREDENTIALS` response.
#[post("/login")]
pub async fn login(
    auth: web::Data<AuthService>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    let response = auth.authenticate(login_data.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}
