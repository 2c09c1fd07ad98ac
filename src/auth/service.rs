//! Registration, login and per-request caller resolution.

use actix_web::web;
use std::sync::Arc;
use validator::Validate;

use super::password::{hash_password, verify_password};
use super::token::{IssuedToken, TokenCodec};
use super::{AuthResponse, CallerId, LoginRequest, RegisterRequest};
use crate::clock::Clock;
use crate::error::AppError;
use crate::models::user::normalize_email;
use crate::models::User;
use crate::store::{CredentialStore, StoreError};

pub struct AuthService {
    credentials: Arc<dyn CredentialStore>,
    codec: TokenCodec,
    clock: Arc<dyn Clock>,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        codec: TokenCodec,
        clock: Arc<dyn Clock>,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            credentials,
            codec,
            clock,
            bcrypt_cost,
        }
    }

    /// Creates an account and returns a token for it.
    ///
    /// Fails with `EmailAlreadyExists` on a case-insensitive email match, including
    /// when a concurrent registration wins the race at the store.
    pub async fn register(&self, mut request: RegisterRequest) -> Result<AuthResponse, AppError> {
        request.email = normalize_email(&request.email);
        request.validate()?;

        let email = request.email.clone();
        if self.credentials.find_user_by_email(&email).await?.is_some() {
            log::info!("Registration rejected: email already registered");
            return Err(AppError::EmailAlreadyExists(email));
        }

        let cost = self.bcrypt_cost;
        let password = request.password;
        let password_hash = run_blocking(move || hash_password(&password, cost)).await?;

        let name = request
            .name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());
        let user = User::new(email.clone(), name, password_hash, self.clock.now());

        let user = self
            .credentials
            .insert_user(user)
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => AppError::EmailAlreadyExists(email),
                other => other.into(),
            })?;

        log::info!("Registered user {}", user.id);
        self.respond(&user)
    }

    /// Exchanges email and password for a token.
    ///
    /// Unknown emails and wrong passwords both yield `InvalidCredentials`.
    pub async fn authenticate(&self, request: LoginRequest) -> Result<AuthResponse, AppError> {
        request.validate()?;

        let email = normalize_email(&request.email);
        let user = match self.credentials.find_user_by_email(&email).await? {
            Some(user) => user,
            None => {
                log::debug!("Login failed: unknown email");
                return Err(AppError::InvalidCredentials);
            }
        };

        let password = request.password;
        let password_hash = user.password_hash.clone();
        let matches = run_blocking(move || verify_password(&password, &password_hash)).await?;
        if !matches {
            log::debug!("Login failed: wrong password for {}", user.id);
            return Err(AppError::InvalidCredentials);
        }

        log::info!("User {} logged in", user.id);
        self.respond(&user)
    }

    /// Verifies a bearer token and returns the caller it names.
    pub fn resolve_caller(&self, token: &str) -> Result<CallerId, AppError> {
        self.codec
            .verify(token, self.clock.now())
            .map(CallerId::new)
            .map_err(|e| {
                log::debug!("Rejected bearer token: {}", e);
                AppError::from(e)
            })
    }

    fn respond(&self, user: &User) -> Result<AuthResponse, AppError> {
        let IssuedToken { token, expires_at } = self.codec.mint(&user.id, self.clock.now())?;
        Ok(AuthResponse {
            user_id: user.id.clone(),
            token,
            token_type: "bearer".to_string(),
            expires_at,
            user: user.profile(),
        })
    }
}

/// bcrypt is deliberately slow; keep it off the async workers.
async fn run_blocking<T, F>(work: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    web::block(work)
        .await
        .map_err(|e| AppError::InternalServerError(format!("Blocking task failed: {}", e)))?
}
