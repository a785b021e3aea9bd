//! CSRF check for state-changing requests.
//!
//! Runs inside the session layer and before routing reaches a handler.
//! The candidate token comes from the `X-CSRF-Token` header or, for
//! urlencoded form posts, the `csrf_token` field.

use crate::errors::ScError;
use crate::middleware::session::SessionHandle;
use crate::observability::metrics::record_csrf_validation;
use axum::{
    body::{to_bytes, Body},
    extract::{FromRequest, Request},
    http::{header, HeaderMap, Method},
    middleware::Next,
    response::{IntoResponse, Response},
    Form,
};
use serde::Deserialize;
use tracing::{instrument, warn};

/// Header carrying the token for scripted clients.
pub const CSRF_HEADER: &str = "x-csrf-token";

/// Largest form body buffered while looking for the token.
const MAX_FORM_BYTES: usize = 64 * 1024;

#[derive(Deserialize)]
struct CsrfField {
    csrf_token: Option<String>,
}

fn is_state_changing(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

fn is_form(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/x-www-form-urlencoded"))
}

/// Reject state-changing requests whose token does not match the session's.
#[instrument(skip_all, name = "sc.middleware.csrf")]
pub async fn csrf_middleware(req: Request, next: Next) -> Response {
    if !is_state_changing(req.method()) {
        return next.run(req).await;
    }

    let Some(session) = req.extensions().get::<SessionHandle>().cloned() else {
        return ScError::Internal.into_response();
    };

    let header_token = req
        .headers()
        .get(CSRF_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let (req, candidate) = match header_token {
        Some(token) => (req, Some(token)),
        None if is_form(req.headers()) => match token_from_form(req).await {
            Ok(found) => found,
            Err(response) => return response,
        },
        None => (req, None),
    };

    let valid = session.lock().await.validate_csrf_token(candidate.as_deref());
    record_csrf_validation(valid);

    if !valid {
        warn!(
            target: "sc.csrf",
            method = %req.method(),
            path = %req.uri().path(),
            token_present = candidate.is_some(),
            "CSRF token mismatch"
        );
        return ScError::CsrfMismatch.into_response();
    }

    next.run(req).await
}

/// Buffer a form body, pull out `csrf_token`, and hand back an equivalent request.
async fn token_from_form(req: Request) -> Result<(Request, Option<String>), Response> {
    let (parts, body) = req.into_parts();
    let bytes = to_bytes(body, MAX_FORM_BYTES).await.map_err(|_| {
        ScError::Validation("Request body too large".to_string()).into_response()
    })?;

    let probe = Request::from_parts(parts.clone(), Body::from(bytes.clone()));
    let candidate = match Form::<CsrfField>::from_request(probe, &()).await {
        Ok(Form(field)) => field.csrf_token,
        Err(_) => None,
    };

    Ok((Request::from_parts(parts, Body::from(bytes)), candidate))
}
