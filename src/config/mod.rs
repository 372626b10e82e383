//! Configuration module for the banner backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::errors::AppError;

/// Longest accepted token lifetime: one year.
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// HS256 secret for bearer tokens
    pub jwt_secret: String,
    /// Lifetime of issued tokens, in hours
    pub token_ttl_hours: i64,
    /// Deadline for a single store operation
    pub store_timeout: Duration,
    /// CORS origin; any origin when unset
    pub allow_origin: Option<String>,
    /// Logins that receive admin rights when they sign up
    pub admin_logins: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let db_path = env::var("BANNER_DB_PATH")
            .unwrap_or_else(|_| "./data/banners.sqlite".to_string())
            .into();

        let bind_addr = env::var("BANNER_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .map_err(|e| AppError::Internal(format!("Invalid BANNER_BIND_ADDR format: {}", e)))?;

        let log_level = env::var("BANNER_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let jwt_secret = env::var("BANNER_JWT_SECRET")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| AppError::Internal("BANNER_JWT_SECRET must be set".to_string()))?;

        let token_ttl_hours = parse_var("BANNER_TOKEN_TTL_HOURS", 24)?;
        if !(1..=MAX_TOKEN_TTL_HOURS).contains(&token_ttl_hours) {
            return Err(AppError::Internal(format!(
                "BANNER_TOKEN_TTL_HOURS must be between 1 and {}, got {}",
                MAX_TOKEN_TTL_HOURS, token_ttl_hours
            )));
        }

        let store_timeout_secs: u64 = parse_var("BANNER_STORE_TIMEOUT_SECS", 10)?;
        if store_timeout_secs == 0 {
            return Err(AppError::Internal(
                "BANNER_STORE_TIMEOUT_SECS must be greater than zero".to_string(),
            ));
        }
        let store_timeout = Duration::from_secs(store_timeout_secs);

        let allow_origin = env::var("BANNER_ALLOW_ORIGIN")
            .ok()
            .filter(|s| !s.trim().is_empty());

        let admin_logins = env::var("BANNER_ADMIN_LOGINS")
            .map(|raw| parse_list(&raw))
            .unwrap_or_default();

        Ok(Self {
            db_path,
            bind_addr,
            log_level,
            jwt_secret,
            token_ttl_hours,
            store_timeout,
            allow_origin,
            admin_logins,
        })
    }

    /// Whether a freshly signed-up login gets admin rights.
    pub fn is_admin_login(&self, login: &str) -> bool {
        self.admin_logins.iter().any(|l| l == login)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T, AppError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Internal(format!("Invalid {} value: {:?}", name, raw))),
        Err(_) => Ok(default),
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
