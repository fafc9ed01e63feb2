//! Router construction and server lifecycle.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use time::Duration;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use opencourse_auth::TokenService;
use opencourse_db_postgres::PostgresStorage;

use crate::config::AppConfig;
use crate::handlers::{auth, chapters, courses, enrollments, system};
use crate::state::AppState;

pub struct OpencourseServer {
    addr: SocketAddr,
    app: Router,
}

pub fn build_app(state: AppState, cfg: &AppConfig) -> Router {
    let body_limit = cfg.server.body_limit_bytes;
    Router::new()
        // Health and info endpoints
        .route("/", get(system::root))
        .route("/healthz", get(system::healthz))
        .route("/readyz", get(system::readyz))
        // Credential service
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/token/refresh", post(auth::refresh))
        // Courses
        .route("/courses", get(courses::list).post(courses::create))
        .route(
            "/courses/{id}",
            get(courses::retrieve)
                .put(courses::update)
                .delete(courses::destroy),
        )
        .route("/courses/{id}/join", post(courses::join))
        .route("/courses/{id}/chapters", get(courses::chapters))
        // Chapters
        .route("/chapters", get(chapters::list).post(chapters::create))
        .route(
            "/chapters/{id}",
            get(chapters::retrieve)
                .put(chapters::update)
                .delete(chapters::destroy),
        )
        // Enrollments
        .route("/enrollments", get(enrollments::list))
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http.request",
                    http.method = %req.method(),
                    http.target = %req.uri(),
                )
            }),
        )
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// Builds the token service from the auth settings.
fn token_service(cfg: &AppConfig) -> TokenService {
    TokenService::new(&cfg.auth.jwt_secret, cfg.auth.issuer.clone())
        .with_access_lifetime(Duration::seconds(cfg.auth.access_token_lifetime_secs))
        .with_refresh_lifetime(Duration::seconds(cfg.auth.refresh_token_lifetime_secs))
}

pub struct ServerBuilder {
    config: AppConfig,
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
        }
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.config = cfg;
        self
    }

    /// Connects storage, runs migrations, and assembles the router.
    pub async fn build(self) -> anyhow::Result<OpencourseServer> {
        let cfg = self.config;

        let storage = PostgresStorage::connect(&cfg.database).await?;
        storage.migrate().await?;

        let tokens = Arc::new(token_service(&cfg));
        let state = AppState::new(storage, tokens);

        let addr = cfg.addr();
        let app = build_app(state, &cfg);

        Ok(OpencourseServer { addr, app })
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl OpencourseServer {
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    // Wait for Ctrl+C
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use tower::ServiceExt;

    /// App wired to a lazily-connecting pool: routes that fail before any
    /// query (validation, authentication) are exercisable without a
    /// database.
    fn test_app() -> Router {
        let mut cfg = AppConfig::default();
        cfg.auth.jwt_secret = "0123456789abcdef0123456789abcdef".to_string();
        cfg.database.url = "postgres://localhost:1/unreachable".to_string();

        let storage =
            PostgresStorage::connect_lazy(&cfg.database).expect("lazy pool creation failed");
        let tokens = Arc::new(token_service(&cfg));
        let state = AppState::new(storage, tokens);
        build_app(state, &cfg)
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
        };
        (status, json)
    }

    fn json_post(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_root_banner() {
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let (status, json) = send(test_app(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["service"], "OpenCourse Server");
    }

    #[tokio::test]
    async fn test_healthz() {
        let request = Request::builder()
            .uri("/healthz")
            .body(Body::empty())
            .unwrap();
        let (status, json) = send(test_app(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn test_protected_route_requires_token() {
        let request = Request::builder()
            .uri("/courses")
            .body(Body::empty())
            .unwrap();
        let (status, json) = send(test_app(), request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(json["error"].as_str().unwrap().contains("Authorization"));
    }

    #[tokio::test]
    async fn test_garbage_bearer_token_rejected() {
        let request = Request::builder()
            .uri("/enrollments")
            .header(header::AUTHORIZATION, "Bearer not.a.token")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(test_app(), request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_login_requires_both_fields() {
        let (status, json) = send(test_app(), json_post("/login", "{}")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Email and password are required");
    }

    #[tokio::test]
    async fn test_register_password_mismatch() {
        let body = r#"{
            "email": "ada@example.com",
            "username": "ada",
            "password": "sturdy-password-1",
            "password2": "sturdy-password-2"
        }"#;
        let (status, json) = send(test_app(), json_post("/register", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["password"], "Password fields didn't match.");
    }

    #[tokio::test]
    async fn test_register_collects_all_field_errors() {
        let body = r#"{"email": "not-an-email", "role": "admin"}"#;
        let (status, json) = send(test_app(), json_post("/register", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["email"], "Enter a valid email address.");
        assert_eq!(json["username"], "This field is required.");
        assert_eq!(json["password"], "This field is required.");
        assert_eq!(json["role"], "\"admin\" is not a valid choice.");
    }

    #[tokio::test]
    async fn test_register_rejects_weak_password() {
        let body = r#"{
            "email": "ada@example.com",
            "username": "ada",
            "password": "1234567890",
            "password2": "1234567890"
        }"#;
        let (status, json) = send(test_app(), json_post("/register", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["password"], "This password is entirely numeric.");
    }

    #[tokio::test]
    async fn test_refresh_rejects_garbage_token() {
        let (status, json) = send(
            test_app(),
            json_post("/token/refresh", r#"{"refresh": "garbage"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(json["error"].is_string());
    }

    #[tokio::test]
    async fn test_refresh_requires_field() {
        let (status, json) = send(test_app(), json_post("/token/refresh", "{}")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["refresh"], "This field is required.");
    }

    #[tokio::test]
    async fn test_access_token_rejected_for_refresh() {
        use opencourse_core::{Role, User};

        let cfg = {
            let mut cfg = AppConfig::default();
            cfg.auth.jwt_secret = "0123456789abcdef0123456789abcdef".to_string();
            cfg
        };
        let service = token_service(&cfg);
        let user = User::new("ada@example.com", "ada", "hash", Role::Student);
        let pair = service.issue_pair(&user).unwrap();

        let body = format!(r#"{{"refresh": "{}"}}"#, pair.access);
        let (status, _) = send(test_app(), json_post("/token/refresh", &body)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let request = Request::builder()
            .uri("/not-a-route")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(test_app(), request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
