//! HTTP routes.
//!
//! Defines the Axum router and application state.

use crate::config::Config;
use crate::handlers;
use crate::middleware::{
    csrf_middleware, http_metrics_middleware, security_headers_middleware, session_middleware,
};
use crate::repositories::{
    ActivityLog, BuildingDirectory, FundLedger, MeetingRepository, UserDirectory,
};
use crate::session::SessionStore;
use axum::{
    middleware,
    routing::get,
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Application state shared across all handlers.
///
/// Every collaborator sits behind a trait object so tests can run the real
/// router over in-memory implementations.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub sessions: Arc<dyn SessionStore>,
    pub users: Arc<dyn UserDirectory>,
    pub buildings: Arc<dyn BuildingDirectory>,
    pub ledger: Arc<dyn FundLedger>,
    pub meetings: Arc<dyn MeetingRepository>,
    pub activity: Arc<dyn ActivityLog>,
}

/// Build the application routes.
///
/// - `/health`, `/metrics` - operational, no session
/// - `/auth/*`, `/`, dashboards and `/api/v1/*` - session and CSRF layers
///
/// Layer order, outermost first: HTTP metrics, timeout, trace, security
/// headers, session, CSRF. CSRF sits inside the session layer so it can
/// read the session token, and both run before routing reaches a handler.
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let operational_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .merge(
            Router::new()
                .route("/metrics", get(handlers::metrics_handler))
                .with_state(metrics_handle),
        );

    let app_routes = Router::new()
        .route("/", get(handlers::redirect_by_role))
        .route(
            "/auth/login",
            get(handlers::login_page).post(handlers::login),
        )
        .route("/auth/logout", get(handlers::logout))
        .route("/auth/csrf", get(handlers::csrf_token))
        // Dashboards
        .route("/admin/dashboard", get(handlers::admin_dashboard))
        .route("/pramukh/dashboard", get(handlers::pramukh_dashboard))
        .route("/building/dashboard", get(handlers::building_dashboard))
        .route("/member/dashboard", get(handlers::member_dashboard))
        // Society scope
        .route(
            "/api/v1/society/buildings",
            get(handlers::list_buildings).post(handlers::create_building),
        )
        .route(
            "/api/v1/society/fund",
            get(handlers::get_society_fund).post(handlers::create_society_fund_entry),
        )
        .route(
            "/api/v1/society/fund/reconcile",
            get(handlers::reconcile_society_fund),
        )
        .route(
            "/api/v1/society/meetings",
            get(handlers::list_society_meetings).post(handlers::create_meeting),
        )
        // Building scope
        .route(
            "/api/v1/building/fund",
            get(handlers::get_building_fund).post(handlers::create_building_fund_entry),
        )
        .route(
            "/api/v1/building/fund/reconcile",
            get(handlers::reconcile_building_fund),
        )
        .route(
            "/api/v1/building/meetings",
            get(handlers::list_building_meetings),
        )
        .route("/api/v1/me", get(handlers::get_me))
        .layer(middleware::from_fn(csrf_middleware))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session_middleware,
        ))
        .with_state(state);

    operational_routes
        .merge(app_routes)
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        // Outermost: sees every response, including 404/405 from routing.
        .layer(middleware::from_fn(http_metrics_middleware))
}
