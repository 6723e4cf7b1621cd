// Router assembly
// Decision: /health and Swagger UI stay unprefixed; every API route (auth included) sits under API_PREFIX
// Decision: CORS is only layered on when origins are configured
// Decision: API bodies carry base64 images, so the body limit is raised above axum's 2 MB default

use axum::http::{header, HeaderValue, Method};
use axum::extract::{DefaultBodyLimit, State};
use axum::{routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api;
use crate::auth::{self, AuthConfig, AuthState};
use crate::images::ImageHost;
use crate::openapi::ApiDoc;
use crate::storage::StorageBackend;

/// Default prefix for API routes
pub const DEFAULT_API_PREFIX: &str = "/api/v1";

/// Largest request body accepted by API routes
pub const MAX_BODY_BYTES: usize = 20 * 1024 * 1024;

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Prefix for all API routes; empty mounts them at the root
    pub api_prefix: String,
    /// Origins allowed to call the API with credentials
    pub cors_origins: Vec<HeaderValue>,
    /// Run the graph reconcile pass before serving
    pub reconcile_on_startup: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            cors_origins: Vec::new(),
            reconcile_on_startup: false,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let host = std::env::var("HOST")
            .ok()
            .filter(|h| !h.is_empty())
            .unwrap_or(defaults.host);

        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.port);

        // Example: API_PREFIX="" serves routes like /auth/login
        let api_prefix = std::env::var("API_PREFIX").unwrap_or(defaults.api_prefix);

        // Example: CORS_ALLOWED_ORIGINS="https://app.example.com,https://admin.example.com"
        let cors_origins = std::env::var("CORS_ALLOWED_ORIGINS")
            .ok()
            .filter(|s| !s.is_empty())
            .map(|s| parse_origins(&s))
            .unwrap_or_default();

        let reconcile_on_startup = std::env::var("RECONCILE_ON_STARTUP")
            .map(|s| auth::config::parse_flag(&s))
            .unwrap_or(false);

        Self {
            host,
            port,
            api_prefix,
            cors_origins,
            reconcile_on_startup,
        }
    }

    /// Address to bind the HTTP listener to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_origins(value: &str) -> Vec<HeaderValue> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse().ok())
        .collect()
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    storage: &'static str,
}

/// State for health endpoint
#[derive(Clone)]
struct HealthState {
    storage: &'static str,
}

async fn health(State(state): State<HealthState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        storage: state.storage,
    })
}

/// Build the complete application router
pub fn build_router(
    db: StorageBackend,
    images: Arc<dyn ImageHost>,
    auth_config: AuthConfig,
    config: &ServerConfig,
) -> Router {
    let auth_state = AuthState::new(auth_config, db.clone());

    let profiles_state =
        api::profiles::ProfilesState::new(db.clone(), images.clone(), auth_state.clone());
    let recipes_state = api::recipes::RecipesState::new(db.clone(), images, auth_state.clone());
    let comments_state = api::comments::CommentsState::new(db.clone(), auth_state.clone());
    let health_state = HealthState { storage: db.kind() };

    let api_routes = Router::new()
        .merge(auth::routes(auth_state))
        .merge(api::profiles::routes(profiles_state))
        .merge(api::recipes::routes(recipes_state))
        .merge(api::comments::routes(comments_state))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES));

    let app = Router::new()
        .route("/health", get(health).with_state(health_state))
        .merge(build_router_with_prefix(api_routes, &config.api_prefix))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()));

    let app = if !config.cors_origins.is_empty() {
        app.layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(config.cors_origins.clone()))
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([
                    header::CONTENT_TYPE,
                    header::AUTHORIZATION,
                    header::ACCEPT,
                    header::ORIGIN,
                ])
                .allow_credentials(true),
        )
    } else {
        app
    };

    app.layer(TraceLayer::new_for_http())
}

/// Build router with optional API prefix (extracted for testing)
pub fn build_router_with_prefix<S: Clone + Send + Sync + 'static>(
    api_routes: Router<S>,
    api_prefix: &str,
) -> Router<S> {
    if api_prefix.is_empty() || api_prefix == "/" {
        api_routes
    } else {
        Router::new().nest(api_prefix, api_routes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_routes() -> Router {
        Router::new().route("/recipes", get(|| async { "ok" }))
    }

    #[tokio::test]
    async fn test_api_prefix_empty() {
        let app = build_router_with_prefix(test_routes(), "");

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/recipes")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"ok");
    }

    #[tokio::test]
    async fn test_api_prefix_set() {
        let app = build_router_with_prefix(test_routes(), "/api/v1");

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/recipes")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), 200);

        // Route should NOT work without prefix
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/recipes")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), 404);
    }

    #[test]
    fn test_parse_origins_skips_blanks() {
        let origins = parse_origins("https://app.example.com, ,https://admin.example.com");
        assert_eq!(origins.len(), 2);
        assert_eq!(origins[0], "https://app.example.com");
    }

    #[test]
    fn test_server_config_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr(), "0.0.0.0:3000");
        assert_eq!(config.api_prefix, "/api/v1");
        assert!(!config.reconcile_on_startup);
    }

    #[tokio::test]
    async fn test_health_reports_storage() {
        let app = build_router(
            StorageBackend::in_memory(),
            Arc::new(crate::images::InMemoryImageHost::new()),
            AuthConfig::default(),
            &ServerConfig::default(),
        );

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), 200);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["storage"], "memory");
    }
}
