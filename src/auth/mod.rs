pub mod extractors;
pub mod middleware;
pub mod password;
pub mod service;
pub mod token;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::UserProfile;

// Re-export necessary items
pub use extractors::AuthorizedOwner;
pub use middleware::AuthMiddleware;
pub use password::{check_password_strength, hash_password, verify_password};
pub use service::AuthService;
pub use token::{Claims, TokenCodec, TokenError};

/// The owner id of an authenticated caller.
///
/// Only the auth service mints these, from a verified token. Nothing taken from a
/// path, query or body can be turned into a `CallerId`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallerId(String);

impl CallerId {
    pub(crate) fn new(owner_id: String) -> Self {
        Self(owner_id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CallerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Represents the payload for a user login request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    /// User's email address, matched case-insensitively.
    #[validate(length(min = 1))]
    pub email: String,
    /// User's password.
    #[validate(length(min = 1))]
    pub password: String,
}

/// Represents the payload for a new user registration request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    /// Email address for the new account. Must be a valid email format.
    #[validate(email)]
    pub email: String,
    /// Password for the new account. See [`check_password_strength`].
    #[validate(custom = "check_password_strength")]
    pub password: String,
    /// Optional display name, 1 to 255 characters.
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
}

/// Response structure after successful authentication (login or registration).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    /// The unique identifier of the authenticated user.
    pub user_id: String,
    /// The JWT to send as `Authorization: Bearer <token>`.
    pub token: String,
    /// Always `"bearer"`.
    pub token_type: String,
    /// Instant after which the token is rejected.
    #[serde(with = "crate::timestamp::utc_z")]
    pub expires_at: DateTime<Utc>,
    pub user: UserProfile,
}
