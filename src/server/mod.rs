//! HTTP API
//!
//! - `GET  /api/health`  engine status
//! - `POST /api/analyze` run one prediction
//!
//! Every request runs its own analysis end to end; the only shared state is
//! the immutable analyzer behind an `Arc`.

mod error;
mod handlers;

pub use error::AppError;
pub use handlers::HealthResponse;

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::analysis::RiskAnalyzer;
use crate::config::{Config, ServerConfig};
use crate::constants::{network, server};
use crate::types::{GuardError, Result};

#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<RiskAnalyzer>,
}

impl AppState {
    pub fn new(analyzer: RiskAnalyzer) -> Self {
        Self {
            analyzer: Arc::new(analyzer),
        }
    }
}

/// CORS policy from configured origins; `*` anywhere allows any origin
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.iter().any(|o| o.trim() == "*") {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin.trim()) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(allowed))
}

pub fn router(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/analyze", post(handlers::analyze))
        .layer(DefaultBodyLimit::max(server::MAX_BODY_BYTES))
        .layer(cors_layer(&config.cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until Ctrl-C
pub async fn serve(config: &Config) -> Result<()> {
    let analyzer = RiskAnalyzer::from_config(config)?;

    if analyzer.has_credentials() {
        info!("Provider credential loaded");
    } else {
        warn!(
            "{} is not set; analyze requests will be rejected",
            network::API_KEY_ENV
        );
    }

    let app = router(AppState::new(analyzer), &config.server);
    let addr = config.server.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| GuardError::Server(format!("Failed to bind {}: {}", addr, e)))?;

    info!(
        address = %addr,
        engine = server::ENGINE_NAME,
        enrichment = %config.enrichment,
        models = ?config.provider.fallback_models,
        "DisasterGuard API listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| GuardError::Server(e.to_string()))?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C; running until killed");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::{
        ErrorCategory, GenerationConfig, ModelClient, ModelResponse, ProviderError,
    };
    use crate::analysis::AnalyzerSettings;
    use crate::config::EnrichmentMode;
    use async_trait::async_trait;
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
    };
    use serde_json::{Value, json};
    use std::sync::atomic::{AtomicU32, Ordering};
    use tower::ServiceExt;

    struct StubClient {
        has_key: bool,
        reply: Option<String>,
        calls: AtomicU32,
    }

    #[async_trait]
    impl ModelClient for StubClient {
        async fn generate(
            &self,
            model: &str,
            _content: &str,
            _config: &GenerationConfig,
        ) -> Result<ModelResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Some(text) => Ok(ModelResponse::from_text(model, text.clone())),
                None => Err(GuardError::Provider(
                    ProviderError::new(ErrorCategory::Unknown, "secret upstream detail")
                        .model(model),
                )),
            }
        }

        fn name(&self) -> &str {
            "stub"
        }

        fn has_credentials(&self) -> bool {
            self.has_key
        }
    }

    fn app_with(client: Arc<StubClient>, origins: &[&str]) -> Router {
        let analyzer = RiskAnalyzer::new(
            client,
            AnalyzerSettings {
                enrichment: EnrichmentMode::Off,
                ..AnalyzerSettings::default()
            },
        );
        let config = ServerConfig {
            cors_origins: origins.iter().map(|o| o.to_string()).collect(),
            ..ServerConfig::default()
        };
        router(AppState::new(analyzer), &config)
    }

    fn stub(has_key: bool, reply: Option<&str>) -> Arc<StubClient> {
        Arc::new(StubClient {
            has_key,
            reply: reply.map(String::from),
            calls: AtomicU32::new(0),
        })
    }

    fn analyze_request(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/analyze")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn test_health() {
        let app = app_with(stub(true, None), &["*"]);
        let response = app
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .expect("router call");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({"status": "online", "engine": "Neural-X V4.2", "language": "rust"})
        );
    }

    #[tokio::test]
    async fn test_analyze_success() {
        let reply = json!({
            "location": "Miami",
            "overallRiskLevel": "Extreme",
            "risks": [{"type": "Hurricane", "probability": 90, "severity": "Critical"}]
        })
        .to_string();
        let app = app_with(stub(true, Some(reply.as_str())), &["*"]);

        let response = app
            .oneshot(analyze_request(json!({"location": "Miami", "reports": [], "lang": "en"})))
            .await
            .expect("router call");

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["overallRiskLevel"], "Extreme");
        assert_eq!(body["risks"][0]["type"], "Hurricane");
        assert_eq!(body["sources"], json!([]));
        assert_eq!(body["activeAlerts"], json!([]));
        assert!(body["timestamp"].as_str().is_some());
    }

    #[tokio::test]
    async fn test_missing_credential_is_400_with_detail() {
        let client = stub(false, Some("{}"));
        let app = app_with(client.clone(), &["*"]);

        let response = app
            .oneshot(analyze_request(json!({"location": "Miami"})))
            .await
            .expect("router call");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await["detail"],
            "GEMINI_API_KEY environment variable is not set"
        );
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_internal_failure_hides_detail() {
        let app = app_with(stub(true, None), &["*"]);

        let response = app
            .oneshot(analyze_request(json!({"location": "Miami"})))
            .await
            .expect("router call");

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert_eq!(body["detail"], "Neural Core Sync Failure");
        assert!(!body.to_string().contains("secret upstream detail"));
    }

    #[tokio::test]
    async fn test_unknown_language_is_rejected() {
        let client = stub(true, Some("{}"));
        let app = app_with(client.clone(), &["*"]);

        let response = app
            .oneshot(analyze_request(json!({"location": "Miami", "lang": "de"})))
            .await
            .expect("router call");

        assert!(response.status().is_client_error());
        assert!(json_body(response).await["detail"].is_string());
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_wildcard_cors_allows_any_origin() {
        let app = app_with(stub(true, None), &["http://localhost:3000", "*"]);
        let response = app
            .oneshot(
                Request::get("/api/health")
                    .header(header::ORIGIN, "http://example.org")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .expect("router call");

        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn test_listed_cors_origin() {
        let app = app_with(stub(true, None), &["http://localhost:3000"]);
        let allowed = app
            .clone()
            .oneshot(
                Request::get("/api/health")
                    .header(header::ORIGIN, "http://localhost:3000")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .expect("router call");
        assert_eq!(
            allowed.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "http://localhost:3000"
        );

        let denied = app
            .oneshot(
                Request::get("/api/health")
                    .header(header::ORIGIN, "http://evil.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .expect("router call");
        assert!(denied.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }
}
