//! Web surface of the service.
//!
//! Every route shares one [`AppState`] holding the immutable configuration
//! and the build orchestrator.

pub mod build;
pub mod language_server;

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::build::BuildOrchestrator;
use crate::config::Config;

/// Shared state injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub orchestrator: Arc<BuildOrchestrator>,
}

impl AppState {
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            orchestrator: Arc::new(BuildOrchestrator::new(config.clone())),
            config,
        }
    }
}

/// All routes, with tracing and a permissive CORS policy applied.
///
/// Build bodies are not size-limited here; limits belong to whatever fronts
/// the service.
pub fn routes(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(build::health))
        .route(
            "/api/build",
            post(build::build)
                .fallback(build::method_not_allowed)
                .layer(DefaultBodyLimit::disable()),
        )
        .route(
            "/language-server/c",
            get(language_server::c_language_server),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;
    use crate::config::{LanguageServerConfig, ServerConfig, ToolchainConfig};

    fn test_state(scratch: &std::path::Path) -> AppState {
        AppState::new(Arc::new(Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            toolchain: ToolchainConfig::new("/nonexistent/toolchain"),
            scratch_dir: scratch.to_path_buf(),
            language_server: LanguageServerConfig::default(),
        }))
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, String) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8_lossy(&body).into_owned())
    }

    fn post_json(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/build")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let dir = tempfile::TempDir::new().unwrap();
        let app = routes(test_state(dir.path()));
        let (status, body) = send(
            app,
            Request::builder().uri("/").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
    }

    #[tokio::test]
    async fn test_get_on_build_is_405() {
        let dir = tempfile::TempDir::new().unwrap();
        let app = routes(test_state(dir.path()));
        let (status, body) = send(
            app,
            Request::builder()
                .uri("/api/build")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body, "405 Method Not Allowed");
    }

    #[tokio::test]
    async fn test_malformed_json_is_400() {
        let dir = tempfile::TempDir::new().unwrap();
        let (status, body) = send(routes(test_state(dir.path())), post_json("{not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "400 Bad Request");
    }

    #[tokio::test]
    async fn test_unknown_output_is_400() {
        let dir = tempfile::TempDir::new().unwrap();
        let (status, _) = send(
            routes(test_state(dir.path())),
            post_json(r#"{"output":"elf","files":[]}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_traversal_filename_is_400_without_side_effects() {
        let dir = tempfile::TempDir::new().unwrap();
        let (status, _) = send(
            routes(test_state(dir.path())),
            post_json(
                r#"{"output":"wasm","files":[{"type":"c","name":"../../etc/x.c","src":"int x;"}]}"#,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_missing_toolchain_is_a_build_failure_not_an_http_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let (status, body) = send(
            routes(test_state(dir.path())),
            post_json(r#"{"output":"wasm","files":[{"type":"c","name":"main.c","src":"int x;"}]}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let result: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(result["success"], false);
        assert_eq!(result["message"], "Error during build of main.c");
        assert_eq!(result["output"], "");
        assert_eq!(result["tasks"].as_array().unwrap().len(), 1);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_cors_allows_any_origin() {
        let dir = tempfile::TempDir::new().unwrap();
        let response = routes(test_state(dir.path()))
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header("origin", "https://editor.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .and_then(|v| v.to_str().ok()),
            Some("*")
        );
    }
}
