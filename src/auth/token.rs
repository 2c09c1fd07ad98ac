use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::AppError;

/// Minimum accepted length of the signing secret, in bytes.
pub const MIN_SECRET_BYTES: usize = 32;

/// Represents the claims encoded within a JWT (JSON Web Token).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject of the token: the owner id.
    pub sub: String,
    /// Issued-at, seconds since epoch.
    pub iat: i64,
    /// Absolute expiry, seconds since epoch.
    pub exp: i64,
}

/// Reasons a token fails verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    /// The token cannot be parsed: wrong segment count, bad base64 or JSON,
    /// missing claims, unexpected algorithm.
    Malformed,
    /// The signature does not match the payload under our secret.
    SignatureInvalid,
    /// The embedded expiry is at or before the verification instant.
    Expired,
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TokenError::Malformed => write!(f, "token malformed"),
            TokenError::SignatureInvalid => write!(f, "token signature invalid"),
            TokenError::Expired => write!(f, "token expired"),
        }
    }
}

impl std::error::Error for TokenError {}

/// The signing secret is shorter than [`MIN_SECRET_BYTES`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecretTooShort(pub usize);

impl fmt::Display for SecretTooShort {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "token secret must be at least {} bytes, got {}",
            MIN_SECRET_BYTES, self.0
        )
    }
}

impl std::error::Error for SecretTooShort {}

/// A freshly minted token and the instant it stops being accepted.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Mints and verifies HS256 identity tokens.
///
/// Both operations take the current instant explicitly, so the codec is a pure
/// function of token, secret and time. There is no refresh: once `exp` passes the
/// holder has to log in again.
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("TokenCodec").field("ttl", &self.ttl).finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub fn new(secret: &[u8], ttl: Duration) -> Result<Self, SecretTooShort> {
        if secret.len() < MIN_SECRET_BYTES {
            return Err(SecretTooShort(secret.len()));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against the caller-supplied instant in `verify`.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issues a token for `owner_id`, valid until `now + ttl`.
    pub fn mint(&self, owner_id: &str, now: DateTime<Utc>) -> Result<IssuedToken, AppError> {
        let issued_at = now.timestamp();
        let expires_at = issued_at + self.ttl.num_seconds();
        let claims = Claims {
            sub: owner_id.to_string(),
            iat: issued_at,
            exp: expires_at,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::InternalServerError(format!("Failed to generate token: {}", e)))?;

        let expires_at = Utc
            .timestamp_opt(expires_at, 0)
            .single()
            .ok_or_else(|| AppError::InternalServerError("Token expiry out of range".into()))?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Checks signature, then expiry, and returns the owner id.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => TokenError::SignatureInvalid,
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            })?;

        if claims.sub.is_empty() {
            return Err(TokenError::Malformed);
        }
        if now.timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }
        Ok(claims.sub)
    }
}
