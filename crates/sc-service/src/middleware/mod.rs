//! HTTP middleware.
//!
//! - `session` - load, expose and persist the server-side session
//! - `csrf` - token check on state-changing requests
//! - `security_headers` - fixed response headers
//! - `http_metrics` - request metrics (outermost)

pub mod csrf;
pub mod http_metrics;
pub mod security_headers;
pub mod session;

pub use csrf::{csrf_middleware, CSRF_HEADER};
pub use http_metrics::http_metrics_middleware;
pub use security_headers::security_headers_middleware;
pub use session::{session_middleware, SessionHandle};
