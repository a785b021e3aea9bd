use crate::models::{Role, RoleSet, LOGIN_PATH, LOGOUT_PATH};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Serialize;
use std::convert::Infallible;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScError {
    #[error("Authentication required")]
    NotAuthenticated,

    #[error("Insufficient role: {role} not in {required}")]
    InsufficientRole { role: Role, required: RoleSet },

    #[error("Invalid scope: {0}")]
    InvalidScope(String),

    #[error("CSRF token mismatch")]
    CsrfMismatch,

    #[error("Resource ownership denied")]
    OwnershipDenied,

    #[error("Email and password are required")]
    MissingCredentials,

    #[error("Invalid login")]
    InvalidCredentials,

    #[error("Account is inactive")]
    AccountInactive,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Cryptographic error: {0}")]
    Crypto(String),

    #[error("Internal server error")]
    Internal,
}

impl ScError {
    /// Whether this error is one of the access-denial outcomes.
    ///
    /// Denials stop the request with a generic message; they are never retried.
    pub fn is_denial(&self) -> bool {
        matches!(
            self,
            ScError::NotAuthenticated
                | ScError::InsufficientRole { .. }
                | ScError::InvalidScope(_)
                | ScError::CsrfMismatch
                | ScError::OwnershipDenied
        )
    }

    /// Bounded label for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            ScError::NotAuthenticated => "not_authenticated",
            ScError::InsufficientRole { .. } => "insufficient_role",
            ScError::InvalidScope(_) => "invalid_scope",
            ScError::CsrfMismatch => "csrf_mismatch",
            ScError::OwnershipDenied => "ownership_denied",
            ScError::MissingCredentials => "missing_credentials",
            ScError::InvalidCredentials => "invalid_credentials",
            ScError::AccountInactive => "account_inactive",
            ScError::Validation(_) => "validation",
            ScError::Database(_) => "database",
            ScError::Crypto(_) => "crypto",
            ScError::Internal => "internal",
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for ScError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ScError::NotAuthenticated => (
                StatusCode::UNAUTHORIZED,
                "NOT_AUTHENTICATED",
                "Authentication required".to_string(),
            ),
            // The required role set stays in server logs; the client only
            // learns that access was denied.
            ScError::InsufficientRole { .. } => (
                StatusCode::FORBIDDEN,
                "INSUFFICIENT_ROLE",
                "Access denied: Insufficient permissions".to_string(),
            ),
            ScError::InvalidScope(_) => (
                StatusCode::FORBIDDEN,
                "INVALID_SCOPE",
                "Access denied: Invalid scope".to_string(),
            ),
            ScError::CsrfMismatch => (
                StatusCode::FORBIDDEN,
                "CSRF_MISMATCH",
                "Invalid CSRF token".to_string(),
            ),
            ScError::OwnershipDenied => (
                StatusCode::FORBIDDEN,
                "OWNERSHIP_DENIED",
                "Access denied".to_string(),
            ),
            ScError::MissingCredentials => (
                StatusCode::BAD_REQUEST,
                "MISSING_CREDENTIALS",
                "Email and password are required.".to_string(),
            ),
            ScError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIALS",
                "Invalid login.".to_string(),
            ),
            ScError::AccountInactive => (
                StatusCode::FORBIDDEN,
                "ACCOUNT_INACTIVE",
                "Account is inactive.".to_string(),
            ),
            ScError::Validation(reason) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", reason.clone())
            }
            ScError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
                "An internal database error occurred".to_string(),
            ),
            ScError::Crypto(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CRYPTO_ERROR",
                "An internal cryptographic error occurred".to_string(),
            ),
            ScError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            ),
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(error_response)).into_response()
    }
}

/// Who is asking: a browser following links, or a script expecting JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientKind {
    Browser,
    Api,
}

impl ClientKind {
    pub fn detect(path: &str, headers: &HeaderMap) -> Self {
        let header_has = |name: header::HeaderName, needle: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|v| v.to_ascii_lowercase().contains(needle))
        };

        let xhr = headers
            .get("x-requested-with")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.eq_ignore_ascii_case("XMLHttpRequest"));

        if xhr || path.starts_with("/api/") || header_has(header::ACCEPT, "application/json") {
            ClientKind::Api
        } else {
            ClientKind::Browser
        }
    }

    /// Pair errors with this caller kind, for `map_err`.
    pub fn reject(self) -> impl Fn(ScError) -> Rejection {
        move |error| Rejection {
            error,
            client: self,
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ClientKind
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(ClientKind::detect(parts.uri.path(), &parts.headers))
    }
}

/// An error rendered for a specific caller kind.
///
/// Browsers are redirected on authentication and authorization denials:
/// to the login page, to their own landing page, or to forced logout.
/// Everything else renders as the JSON error body.
#[derive(Debug)]
pub struct Rejection {
    pub error: ScError,
    pub client: ClientKind,
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        if self.client == ClientKind::Browser {
            match &self.error {
                ScError::NotAuthenticated => return Redirect::to(LOGIN_PATH).into_response(),
                ScError::InsufficientRole { role, .. } => {
                    return Redirect::to(role.landing_path()).into_response()
                }
                ScError::InvalidScope(_) => return Redirect::to(LOGOUT_PATH).into_response(),
                _ => {}
            }
        }
        self.error.into_response()
    }
}
