use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A registered account as held by the credential store.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct User {
    /// `usr_` followed by 32 lowercase hex characters.
    pub id: String,
    /// Lowercased, trimmed email address. Unique.
    pub email: String,
    pub name: Option<String>,
    /// bcrypt hash; never leaves the crate.
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        email: String,
        name: Option<String>,
        password_hash: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: generate_user_id(),
            email,
            name,
            password_hash,
            created_at,
        }
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
            created_at: self.created_at,
        }
    }
}

/// Public view of a user, returned alongside tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    #[serde(with = "crate::timestamp::utc_z")]
    pub created_at: DateTime<Utc>,
}

/// Generates an opaque, globally unique user id.
pub fn generate_user_id() -> String {
    format!("usr_{}", Uuid::new_v4().simple())
}

/// Case-insensitive identity of an email address.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
