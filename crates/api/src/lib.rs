//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes for accounts and role details
//! - The access token guard
//! - Request extractors
//! - Error responses

pub mod error;
pub mod extractors;
pub mod middleware;
pub mod routes;

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{
        HeaderName, HeaderValue, Method,
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, ORIGIN},
    },
};
use sea_orm::DatabaseConnection;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use agrichain_core::identity::IdentityService;
use agrichain_core::storage::{PUBLIC_PATH, PhotoStore};
use agrichain_db::UserRepository;
use agrichain_shared::{JwtService, config::CorsConfig};

/// Headroom for the non-file form fields of a multipart upload.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// JWT service for token validation.
    pub jwt_service: Arc<JwtService>,
    /// Profile photo storage.
    pub photos: Arc<PhotoStore>,
}

impl AppState {
    /// Identity service over the shared connection pool.
    #[must_use]
    pub fn identity_service(&self) -> IdentityService<UserRepository> {
        let repo = UserRepository::new((*self.db).clone());
        IdentityService::new(Arc::new(repo), self.photos.clone())
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState, cors: &CorsConfig) -> Router {
    let max_upload = usize::try_from(state.photos.config().max_file_size)
        .unwrap_or(usize::MAX)
        .saturating_add(FORM_OVERHEAD_BYTES);

    let mut router = Router::new().merge(routes::api_routes_with_state(state.clone()));

    if let Some(root) = state.photos.local_root() {
        info!(path = PUBLIC_PATH, root = %root.display(), "Serving profile photos");
        router = router.nest_service(PUBLIC_PATH, ServeDir::new(root));
    }

    router
        .layer(DefaultBodyLimit::max(max_upload))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors))
        .with_state(state)
}

/// CORS policy from configuration; `*` allows any origin without credentials.
fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
            Method::PATCH,
        ])
        .allow_headers([
            ORIGIN,
            HeaderName::from_static("x-requested-with"),
            CONTENT_TYPE,
            ACCEPT,
            AUTHORIZATION,
        ]);

    if config.allows_any_origin() {
        return layer.allow_origin(Any);
    }

    let origins = config.allowed_origins.iter().filter_map(|origin| {
        HeaderValue::from_str(origin)
            .inspect_err(|_| warn!(origin = %origin, "Ignoring invalid CORS origin"))
            .ok()
    });
    layer
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
}


#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_cors_preflight_allows_any_origin() {
        let app = create_router(test_support::test_state(), &CorsConfig::default());

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/users")
                    .header(ORIGIN, "https://cassava-telti.isi-net.org")
                    .header("access-control-request-method", "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn test_cors_allow_list_echoes_known_origin() {
        let cors = CorsConfig {
            allowed_origins: vec!["https://cassava-telti.isi-net.org".to_string()],
        };
        let app = create_router(test_support::test_state(), &cors);

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/users")
                    .header(ORIGIN, "https://cassava-telti.isi-net.org")
                    .header("access-control-request-method", "GET")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let headers = response.headers();
        assert_eq!(
            headers.get("access-control-allow-origin").unwrap(),
            "https://cassava-telti.isi-net.org"
        );
        assert_eq!(
            headers.get("access-control-allow-credentials").unwrap(),
            "true"
        );
    }
}
