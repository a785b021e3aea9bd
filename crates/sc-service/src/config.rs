use chrono::Duration;
use std::collections::HashMap;
use std::env;
use thiserror::Error;

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Session id rotation interval (30 minutes).
pub const DEFAULT_SESSION_ROTATION_SECONDS: i64 = 1800;

/// Idle lifetime of a stored session (24 minutes).
pub const DEFAULT_SESSION_IDLE_TIMEOUT_SECONDS: i64 = 1440;

pub const DEFAULT_SESSION_COOKIE_NAME: &str = "SOCIETYSESSID";

/// How an authenticated session's user status is trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusPolicy {
    /// Trust the status captured at login for the life of the session.
    Snapshot,
    /// Re-read the user record on every authenticated request.
    Revalidate,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_address: String,
    pub session_rotation: Duration,
    pub session_idle_timeout: Duration,
    pub session_cookie_name: String,
    pub session_cookie_secure: bool,
    pub status_policy: StatusPolicy,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing)
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let database_url = vars
            .get("DATABASE_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))?
            .clone();

        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let rotation_seconds = parse_positive_seconds(
            vars,
            "SESSION_ROTATION_SECONDS",
            DEFAULT_SESSION_ROTATION_SECONDS,
        )?;

        let idle_seconds = parse_positive_seconds(
            vars,
            "SESSION_IDLE_TIMEOUT_SECONDS",
            DEFAULT_SESSION_IDLE_TIMEOUT_SECONDS,
        )?;

        let session_cookie_name = vars
            .get("SESSION_COOKIE_NAME")
            .cloned()
            .unwrap_or_else(|| DEFAULT_SESSION_COOKIE_NAME.to_string());

        if session_cookie_name.is_empty()
            || !session_cookie_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(ConfigError::InvalidValue {
                name: "SESSION_COOKIE_NAME".to_string(),
                reason: "must be non-empty ASCII alphanumerics, '_' or '-'".to_string(),
            });
        }

        let session_cookie_secure = match vars.get("SESSION_COOKIE_SECURE").map(String::as_str) {
            None | Some("false") | Some("0") => false,
            Some("true") | Some("1") => true,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    name: "SESSION_COOKIE_SECURE".to_string(),
                    reason: format!("expected true or false, got '{}'", other),
                })
            }
        };

        let status_policy = match vars.get("SC_STATUS_POLICY").map(String::as_str) {
            None | Some("snapshot") => StatusPolicy::Snapshot,
            Some("revalidate") => StatusPolicy::Revalidate,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    name: "SC_STATUS_POLICY".to_string(),
                    reason: format!("expected snapshot or revalidate, got '{}'", other),
                })
            }
        };

        Ok(Config {
            database_url,
            bind_address,
            session_rotation: Duration::seconds(rotation_seconds),
            session_idle_timeout: Duration::seconds(idle_seconds),
            session_cookie_name,
            session_cookie_secure,
            status_policy,
        })
    }
}

fn parse_positive_seconds(
    vars: &HashMap<String, String>,
    name: &str,
    default: i64,
) -> Result<i64, ConfigError> {
    match vars.get(name) {
        None => Ok(default),
        Some(raw) => match raw.parse::<i64>() {
            Ok(value) if value > 0 => Ok(value),
            _ => Err(ConfigError::InvalidValue {
                name: name.to_string(),
                reason: format!("'{}' is not a positive number of seconds", raw),
            }),
        },
    }
}
