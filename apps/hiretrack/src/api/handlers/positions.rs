//! Position endpoints, including stage resolution.

use crate::api::{
    AppState,
    auth::Caller,
    error::ApiResult,
    extract::{ApiJson, JsonBody},
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use hiretrack_core::{
    Action, Position, PositionId, PositionInput, PositionUpdate, Resource, Stage,
};

pub async fn list_positions(
    State(state): State<AppState>,
    caller: Caller,
) -> ApiResult<Json<Vec<Position>>> {
    caller.authorize(Action::Read, Resource::Position)?;
    Ok(Json(state.store.list_positions()?))
}

/// Create a position (ADMIN or MANAGER). 201 on success.
pub async fn create_position(
    State(state): State<AppState>,
    caller: Caller,
    body: JsonBody<PositionInput>,
) -> ApiResult<(StatusCode, Json<Position>)> {
    caller.authorize(Action::Create, Resource::Position)?;
    let ApiJson(input) = body?;
    let position = state.store.create_position(input)?;
    Ok((StatusCode::CREATED, Json(position)))
}

pub async fn get_position(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<u64>,
) -> ApiResult<Json<Position>> {
    caller.authorize(Action::Read, Resource::Position)?;
    Ok(Json(state.store.get_position(PositionId(id))?))
}

pub async fn update_position(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<u64>,
    body: JsonBody<PositionUpdate>,
) -> ApiResult<Json<Position>> {
    caller.authorize(Action::Update, Resource::Position)?;
    let ApiJson(update) = body?;
    Ok(Json(state.store.update_position(PositionId(id), update)?))
}

pub async fn delete_position(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<u64>,
) -> ApiResult<StatusCode> {
    caller.authorize(Action::Delete, Resource::Position)?;
    state.store.delete_position(PositionId(id))?;
    Ok(StatusCode::NO_CONTENT)
}

/// Stages interviews for this position may use: its own workflow's, else
/// the default workflow's, else `[]`.
pub async fn position_stages(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<u64>,
) -> ApiResult<Json<Vec<Stage>>> {
    caller.authorize(Action::Read, Resource::Stage)?;
    Ok(Json(state.store.resolve_stages(PositionId(id))?))
}
