//! # API Endpoint Handlers
//!
//! Every handler follows the same shape: identify the caller, ask the
//! policy, call one `Store` operation, wrap the result. Store calls are
//! short redb transactions and run inline.

pub mod candidates;
pub mod interviews;
pub mod positions;
pub mod settings;
pub mod users;
pub mod workflows;

use super::{
    AppState,
    auth::Caller,
    error::ApiResult,
    types::{ErrorResponse, HealthResponse, StatusResponse},
};
use axum::{
    Json,
    extract::State,
    http::{StatusCode, Uri},
    response::IntoResponse,
};

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint. Never requires authentication.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// STATUS HANDLER
// =============================================================================

/// Record counts, for any authenticated caller.
pub async fn status_handler(
    State(state): State<AppState>,
    caller: Caller,
) -> ApiResult<Json<StatusResponse>> {
    caller.require()?;
    Ok(Json(state.store.status()?.into()))
}

// =============================================================================
// FALLBACK
// =============================================================================

/// JSON 404 for unknown routes.
pub async fn not_found_handler(uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::new(format!("No route for {}", uri.path()))),
    )
}
