use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::auth::token::MIN_SECRET_BYTES;

const DEFAULT_MAX_CONNECTIONS: u32 = 20;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 30;
const DEFAULT_TOKEN_TTL_DAYS: i64 = 7;
const MAX_TOKEN_TTL_DAYS: i64 = 365;
const DEFAULT_BCRYPT_COST: u32 = 12;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    MissingSecret,
    SecretTooShort(usize),
    Invalid { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::MissingSecret => {
                write!(f, "JWT_SECRET (or BETTER_AUTH_SECRET) must be set")
            }
            ConfigError::SecretTooShort(len) => write!(
                f,
                "JWT_SECRET must be at least {} bytes, got {}",
                MIN_SECRET_BYTES, len
            ),
            ConfigError::Invalid { key, value } => write!(f, "Invalid value for {}: {:?}", key, value),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Clone)]
pub struct Config {
    /// `None` runs the server on in-memory stores.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,
    pub server_host: String,
    pub server_port: u16,
    pub jwt_secret: String,
    pub token_ttl_days: i64,
    pub bcrypt_cost: u32,
    pub app_env: String,
    /// Empty means any origin.
    pub cors_origins: Vec<String>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &self.database_url.as_ref().map(|_| "<set>"))
            .field("db_max_connections", &self.db_max_connections)
            .field("db_acquire_timeout", &self.db_acquire_timeout)
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl_days", &self.token_ttl_days)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("app_env", &self.app_env)
            .field("cors_origins", &self.cors_origins)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup. Blank values count
    /// as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let jwt_secret = get("JWT_SECRET")
            .or_else(|| get("BETTER_AUTH_SECRET"))
            .ok_or(ConfigError::MissingSecret)?;
        if jwt_secret.len() < MIN_SECRET_BYTES {
            return Err(ConfigError::SecretTooShort(jwt_secret.len()));
        }

        let token_ttl_days: i64 = parse_or(&get, "TOKEN_TTL_DAYS", DEFAULT_TOKEN_TTL_DAYS)?;
        if !(1..=MAX_TOKEN_TTL_DAYS).contains(&token_ttl_days) {
            return Err(invalid("TOKEN_TTL_DAYS", token_ttl_days));
        }

        let bcrypt_cost: u32 = parse_or(&get, "BCRYPT_COST", DEFAULT_BCRYPT_COST)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(invalid("BCRYPT_COST", bcrypt_cost));
        }

        let db_max_connections: u32 =
            parse_or(&get, "DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?;
        if db_max_connections == 0 {
            return Err(invalid("DATABASE_MAX_CONNECTIONS", db_max_connections));
        }

        let acquire_secs: u64 = parse_or(
            &get,
            "DATABASE_ACQUIRE_TIMEOUT_SECS",
            DEFAULT_ACQUIRE_TIMEOUT_SECS,
        )?;

        let cors_origins = get("CORS_ALLOWED_ORIGINS")
            .map(|list| {
                list.split(',')
                    .map(|origin| origin.trim().to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            database_url: get("DATABASE_URL"),
            db_max_connections,
            db_acquire_timeout: Duration::from_secs(acquire_secs),
            server_host: get("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            server_port: parse_or(&get, "SERVER_PORT", 8080)?,
            jwt_secret,
            token_ttl_days,
            bcrypt_cost,
            app_env: get("APP_ENV")
                .map(|env| env.to_lowercase())
                .unwrap_or_else(|| "production".to_string()),
            cors_origins,
        })
    }

    pub fn is_development(&self) -> bool {
        self.app_env == "development"
    }

    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.token_ttl_days)
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid { key, value: raw }),
        None => Ok(default),
    }
}

fn invalid(key: &'static str, value: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
    }
}
