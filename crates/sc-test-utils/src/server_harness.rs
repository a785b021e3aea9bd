//! In-process harness for end-to-end tests.
//!
//! Builds the real router over in-memory collaborators and drives it with
//! `tower::ServiceExt::oneshot`, carrying the session cookie between
//! requests the way a browser would.

use crate::fixtures;
use crate::mock_activity::MockActivityLog;
use crate::mock_buildings::MockBuildingDirectory;
use crate::mock_ledger::{MockFundLedger, Tenant};
use crate::mock_meetings::MockMeetingRepository;
use crate::mock_users::MockUserDirectory;
use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use metrics_exporter_prometheus::PrometheusBuilder;
use sc_service::config::Config;
use sc_service::middleware::CSRF_HEADER;
use sc_service::observability::metrics::init_metrics_recorder;
use sc_service::routes::{build_routes, AppState};
use sc_service::session::MemorySessionStore;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tower::ServiceExt;

/// Configuration used by the harness unless a test supplies its own.
pub fn test_config() -> Config {
    test_config_with(&[])
}

/// Harness configuration with extra environment-style overrides.
pub fn test_config_with(overrides: &[(&str, &str)]) -> Config {
    let mut vars = HashMap::from([(
        "DATABASE_URL".to_string(),
        "postgresql://unused/society".to_string(),
    )]);
    for (name, value) in overrides {
        vars.insert((*name).to_string(), (*value).to_string());
    }
    Config::from_vars(&vars).unwrap()
}

/// Response captured in full.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or_else(|e| {
            panic!(
                "body is not JSON ({e}): {}",
                String::from_utf8_lossy(&self.body)
            )
        })
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }

    pub fn set_cookie(&self) -> Option<&str> {
        self.headers
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
    }

    /// Error code from the JSON error body.
    pub fn error_code(&self) -> String {
        self.json()["error"]["code"]
            .as_str()
            .unwrap_or_default()
            .to_string()
    }
}

/// A running app plus handles to every in-memory collaborator.
pub struct TestApp {
    router: Router,
    cookie_name: String,
    cookie: Option<String>,
    pub sessions: Arc<MemorySessionStore>,
    pub users: MockUserDirectory,
    pub buildings: MockBuildingDirectory,
    pub ledger: MockFundLedger,
    pub meetings: MockMeetingRepository,
    pub activity: MockActivityLog,
}

impl TestApp {
    /// App seeded with the fixture users, building 42 in society 9, building
    /// 15 in society 7, and zero fund totals for both societies and buildings.
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: Config) -> Self {
        let users = fixtures::all_users()
            .into_iter()
            .fold(MockUserDirectory::new(), |dir, user| dir.with_user(user));
        let buildings = MockBuildingDirectory::new()
            .with_building(fixtures::BUILDING_ID, fixtures::OTHER_SOCIETY_ID, "Tower B")
            .with_building(fixtures::OWNED_BUILDING_ID, fixtures::SOCIETY_ID, "Tower A");
        let ledger = MockFundLedger::new()
            .with_tenant(Tenant::Society(fixtures::SOCIETY_ID), 0)
            .with_tenant(Tenant::Society(fixtures::OTHER_SOCIETY_ID), 0)
            .with_tenant(Tenant::Building(fixtures::BUILDING_ID), 0)
            .with_tenant(Tenant::Building(fixtures::OWNED_BUILDING_ID), 0);
        let meetings = MockMeetingRepository::new();
        let activity = MockActivityLog::new();
        let sessions = Arc::new(MemorySessionStore::new(config.session_idle_timeout));
        let cookie_name = config.session_cookie_name.clone();

        let state = Arc::new(AppState {
            config,
            sessions: sessions.clone(),
            users: Arc::new(users.clone()),
            buildings: Arc::new(buildings.clone()),
            ledger: Arc::new(ledger.clone()),
            meetings: Arc::new(meetings.clone()),
            activity: Arc::new(activity.clone()),
        });

        // A recorder can only be installed once per process; later apps
        // get a standalone one.
        let metrics_handle = init_metrics_recorder()
            .unwrap_or_else(|_| PrometheusBuilder::new().build_recorder().handle());

        TestApp {
            router: build_routes(state, metrics_handle),
            cookie_name,
            cookie: None,
            sessions,
            users,
            buildings,
            ledger,
            meetings,
            activity,
        }
    }

    /// Current session id held by the client.
    pub fn session_id(&self) -> Option<&str> {
        self.cookie.as_deref()
    }

    /// Replace the client's cookie, e.g. to replay an old session id.
    pub fn set_session_id(&mut self, id: Option<String>) {
        self.cookie = id;
    }

    /// Send a request with the current cookie and absorb any Set-Cookie.
    pub async fn send(&mut self, mut request: Request<Body>) -> TestResponse {
        if let Some(id) = &self.cookie {
            let value = format!("{}={}", self.cookie_name, id);
            request
                .headers_mut()
                .insert(header::COOKIE, value.parse().unwrap());
        }

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.into_body().collect().await.unwrap().to_bytes();

        if let Some(set_cookie) = headers.get(header::SET_COOKIE) {
            self.absorb_cookie(set_cookie.to_str().unwrap());
        }

        TestResponse {
            status,
            headers,
            body,
        }
    }

    fn absorb_cookie(&mut self, set_cookie: &str) {
        let pair = set_cookie.split(';').next().unwrap_or_default();
        let Some((name, value)) = pair.split_once('=') else {
            return;
        };
        if name != self.cookie_name {
            return;
        }
        if value.is_empty() || set_cookie.contains("Max-Age=0") {
            self.cookie = None;
        } else {
            self.cookie = Some(value.to_string());
        }
    }

    /// Browser-style GET.
    pub async fn get(&mut self, uri: &str) -> TestResponse {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        self.send(request).await
    }

    /// GET asking for JSON.
    pub async fn get_json(&mut self, uri: &str) -> TestResponse {
        let request = Request::builder()
            .uri(uri)
            .header(header::ACCEPT, "application/json")
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// JSON request with an optional CSRF header.
    pub async fn send_json(
        &mut self,
        method: Method,
        uri: &str,
        body: &Value,
        csrf_token: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "application/json");
        if let Some(token) = csrf_token {
            builder = builder.header(CSRF_HEADER, token);
        }
        let request = builder.body(Body::from(body.to_string())).unwrap();
        self.send(request).await
    }

    /// JSON POST carrying a freshly fetched CSRF token.
    pub async fn post_json(&mut self, uri: &str, body: &Value) -> TestResponse {
        let token = self.csrf_token().await;
        self.send_json(Method::POST, uri, body, Some(&token)).await
    }

    /// Urlencoded form POST, as a browser would submit it.
    pub async fn post_form(&mut self, uri: &str, fields: &[(&str, &str)]) -> TestResponse {
        let body = serde_urlencoded::to_string(fields).unwrap();
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    /// Fetch (and create if needed) the session's CSRF token.
    pub async fn csrf_token(&mut self) -> String {
        let response = self.get_json("/auth/csrf").await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.text());
        response.json()["csrf_token"].as_str().unwrap().to_string()
    }

    /// Browser-style login form submission with a valid CSRF token.
    pub async fn login(&mut self, email: &str, password: &str) -> TestResponse {
        let token = self.csrf_token().await;
        self.post_form(
            "/auth/login",
            &[
                ("email", email),
                ("password", password),
                ("csrf_token", &token),
            ],
        )
        .await
    }

    /// Log in with the fixture password and assert success.
    pub async fn login_as(&mut self, email: &str) -> TestResponse {
        let response = self.login(email, fixtures::TEST_PASSWORD).await;
        assert_eq!(
            response.status,
            StatusCode::SEE_OTHER,
            "login failed: {}",
            response.text()
        );
        response
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}
