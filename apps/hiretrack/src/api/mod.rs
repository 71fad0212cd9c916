//! # hiretrack HTTP API Module
//!
//! This module implements the HTTP REST API server using axum.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check (no authentication)
//! - `GET /api/status` - Record counts
//! - `/api/workflows`, `/api/workflows/{id}`, `/api/workflows/{id}/default`
//! - `/api/workflows/{id}/stages` (list, create or reorder),
//!   `/api/workflows/{id}/stages/{stageId}`
//! - `/api/positions`, `/api/positions/{id}`, `/api/positions/{id}/stages`
//! - `/api/candidates`, `/api/candidates/{id}`, `/api/candidates/{id}/notes`,
//!   `/api/notes/{id}`
//! - `/api/interviews`, `/api/interviews/{id}`, `/api/interviews/{id}/status`,
//!   `/api/interviews/{id}/feedback`, `/api/feedback/{id}`
//! - `/api/users`, `/api/users/{id}`, `/api/users/{id}/token`
//! - `/api/settings`
//!
//! Every `/api` route needs `Authorization: Bearer <token>`.
//!
//! ## Security Configuration
//!
//! See `crate::config`: CORS origins (localhost only by default), the global
//! rate limit (100 req/s by default) and the bootstrap admin token.

mod auth;
mod error;
mod extract;
mod handlers;
mod middleware;
mod types;

pub use auth::{resolve_actor, tokens_match};
pub use error::{ApiError, ApiResult, status_for};
pub use middleware::{GlobalRateLimiter, create_rate_limiter};
pub use types::{
    CreatedUserResponse, ErrorResponse, HealthResponse, InterviewQuery, StagesRequest,
    StatusResponse, StatusUpdateRequest, TokenResponse,
};

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{delete, get, patch, post},
};
use handlers::{candidates, interviews, positions, settings, users, workflows};
use hiretrack_core::{HireError, Store};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Maximum request body size (2 MiB).
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

const ALLOWED_METHODS: [Method; 5] = [
    Method::GET,
    Method::POST,
    Method::PATCH,
    Method::DELETE,
    Method::OPTIONS,
];

// =============================================================================
// SERVER STATE
// =============================================================================

/// HTTP-layer settings, resolved from `AppConfig`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiSettings {
    /// Comma-separated origins or `*`. `None` allows localhost only.
    pub cors_origins: Option<String>,
    /// Requests per second; 0 disables rate limiting.
    pub rate_limit: u32,
    /// Bootstrap ADMIN bearer token.
    pub admin_token: Option<String>,
}

/// Shared server state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub settings: Arc<ApiSettings>,
}

impl AppState {
    #[must_use]
    pub fn new(store: Store, settings: ApiSettings) -> Self {
        Self {
            store: Arc::new(store),
            settings: Arc::new(settings),
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build the CORS layer.
///
/// - `"*"`: any origin (development only)
/// - `None`: localhost only
/// - otherwise: the comma-separated list; invalid entries are skipped
fn build_cors_layer(origins: Option<&str>) -> CorsLayer {
    match origins.map(str::trim) {
        Some("*") => {
            tracing::warn!("CORS: Allowing ALL origins. This is insecure for production!");
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed: Vec<HeaderValue> = origins
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .filter_map(|s| match s.parse::<HeaderValue>() {
                    Ok(hv) => {
                        tracing::info!("CORS: Allowing origin: {}", s);
                        Some(hv)
                    }
                    Err(e) => {
                        tracing::warn!("CORS: Invalid origin '{}': {}", s, e);
                        None
                    }
                })
                .collect();

            if allowed.is_empty() {
                tracing::warn!("CORS: No valid origins configured, defaulting to localhost only");
                build_localhost_cors()
            } else {
                CorsLayer::new()
                    .allow_origin(allowed)
                    .allow_methods(ALLOWED_METHODS)
                    .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            }
        }
        None => {
            tracing::info!("CORS: No origins configured, defaulting to localhost only");
            build_localhost_cors()
        }
    }
}

fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8080",
    ]
    .into_iter()
    .filter_map(|o| o.parse::<HeaderValue>().ok())
    .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(ALLOWED_METHODS)
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/status", get(handlers::status_handler))
        // Workflows & stages
        .route(
            "/workflows",
            get(workflows::list_workflows).post(workflows::create_workflow),
        )
        .route(
            "/workflows/{id}",
            get(workflows::get_workflow)
                .patch(workflows::update_workflow)
                .delete(workflows::delete_workflow),
        )
        .route("/workflows/{id}/default", post(workflows::set_default_workflow))
        .route(
            "/workflows/{id}/stages",
            get(workflows::list_stages).post(workflows::post_stages),
        )
        .route(
            "/workflows/{id}/stages/{stage_id}",
            get(workflows::get_stage)
                .patch(workflows::update_stage)
                .delete(workflows::delete_stage),
        )
        // Positions
        .route(
            "/positions",
            get(positions::list_positions).post(positions::create_position),
        )
        .route(
            "/positions/{id}",
            get(positions::get_position)
                .patch(positions::update_position)
                .delete(positions::delete_position),
        )
        .route("/positions/{id}/stages", get(positions::position_stages))
        // Candidates & notes
        .route(
            "/candidates",
            get(candidates::list_candidates).post(candidates::create_candidate),
        )
        .route(
            "/candidates/{id}",
            get(candidates::get_candidate)
                .patch(candidates::update_candidate)
                .delete(candidates::delete_candidate),
        )
        .route(
            "/candidates/{id}/notes",
            get(candidates::list_notes).post(candidates::add_note),
        )
        .route("/notes/{id}", delete(candidates::delete_note))
        // Interviews & feedback
        .route(
            "/interviews",
            get(interviews::list_interviews).post(interviews::create_interview),
        )
        .route(
            "/interviews/{id}",
            get(interviews::get_interview)
                .patch(interviews::update_interview)
                .delete(interviews::delete_interview),
        )
        .route(
            "/interviews/{id}/status",
            patch(interviews::update_interview_status),
        )
        .route(
            "/interviews/{id}/feedback",
            get(interviews::list_feedback).post(interviews::submit_feedback),
        )
        .route(
            "/feedback/{id}",
            get(interviews::get_feedback).delete(interviews::delete_feedback),
        )
        // Users
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/{id}",
            get(users::get_user)
                .patch(users::update_user)
                .delete(users::delete_user),
        )
        .route("/users/{id}/token", post(users::rotate_token))
        // Settings
        .route(
            "/settings",
            get(settings::get_settings).patch(settings::update_settings),
        )
}

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing - logs all requests
/// 2. CORS - handles preflight requests
/// 3. Body limit
/// 4. Rate limiting (if enabled)
///
/// Authentication is per handler, through the `Caller` extractor.
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer(state.settings.cors_origins.as_deref());

    if state.settings.admin_token.is_some() {
        tracing::info!("Bootstrap admin token configured");
    } else {
        tracing::info!("No bootstrap admin token; only user API tokens authenticate");
    }

    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .nest("/api", api_routes())
        .fallback(handlers::not_found_handler);

    let rate_limit = state.settings.rate_limit;
    if rate_limit > 0 {
        tracing::info!("Rate limiting enabled: {} requests/second", rate_limit);
        router = router.layer(axum_middleware::from_fn_with_state(
            create_rate_limiter(rate_limit),
            middleware::rate_limit_middleware,
        ));
    } else {
        tracing::info!("Rate limiting disabled");
    }

    router
        .layer(axum::extract::DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Bind `addr` and serve until Ctrl+C.
pub async fn run_server(addr: &str, store: Store, settings: ApiSettings) -> Result<(), HireError> {
    let router = create_router(AppState::new(store, settings));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| HireError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("hiretrack HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| HireError::IoError(format!("Server error: {}", e)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Cannot listen for Ctrl+C; serving until killed");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, http::StatusCode};
    use tower::ServiceExt;

    fn router(settings: ApiSettings) -> Router {
        let store = Store::in_memory().expect("store");
        create_router(AppState::new(store, settings))
    }

    #[tokio::test]
    async fn localhost_preflight_is_allowed_by_default() {
        let response = router(ApiSettings::default())
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/api/workflows")
                    .header(header::ORIGIN, "http://localhost:3000")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .and_then(|v| v.to_str().ok()),
            Some("http://localhost:3000")
        );
    }

    #[tokio::test]
    async fn unknown_route_is_json_404() {
        let response = router(ApiSettings::default())
            .oneshot(
                Request::builder()
                    .uri("/api/nope")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok()),
            Some("application/json")
        );
    }

    #[tokio::test]
    async fn rate_limit_returns_429() {
        let app = router(ApiSettings {
            rate_limit: 1,
            ..ApiSettings::default()
        });
        let first = app
            .clone()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(first.status(), StatusCode::OK);

        let second = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}
