//! User endpoints. API tokens are only ever returned by create and rotate.

use crate::api::{
    AppState,
    auth::Caller,
    error::ApiResult,
    extract::{ApiJson, JsonBody},
    types::{CreatedUserResponse, TokenResponse},
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use hiretrack_core::{Action, Resource, User, UserId, UserInput, UserUpdate};

pub async fn list_users(
    State(state): State<AppState>,
    caller: Caller,
) -> ApiResult<Json<Vec<User>>> {
    caller.authorize(Action::Read, Resource::User)?;
    Ok(Json(state.store.list_users()?))
}

pub async fn create_user(
    State(state): State<AppState>,
    caller: Caller,
    body: JsonBody<UserInput>,
) -> ApiResult<(StatusCode, Json<CreatedUserResponse>)> {
    caller.authorize(Action::Create, Resource::User)?;
    let ApiJson(input) = body?;
    let (user, api_token) = state.store.create_user(input)?;
    Ok((StatusCode::CREATED, Json(CreatedUserResponse { user, api_token })))
}

pub async fn get_user(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<u64>,
) -> ApiResult<Json<User>> {
    caller.authorize(Action::Read, Resource::User)?;
    Ok(Json(state.store.get_user(UserId(id))?))
}

pub async fn update_user(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<u64>,
    body: JsonBody<UserUpdate>,
) -> ApiResult<Json<User>> {
    caller.authorize(Action::Update, Resource::User)?;
    let ApiJson(update) = body?;
    Ok(Json(state.store.update_user(UserId(id), update)?))
}

pub async fn delete_user(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<u64>,
) -> ApiResult<StatusCode> {
    caller.authorize(Action::Delete, Resource::User)?;
    state.store.delete_user(UserId(id))?;
    Ok(StatusCode::NO_CONTENT)
}

/// Issue a fresh token; the previous one stops working.
pub async fn rotate_token(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<u64>,
) -> ApiResult<Json<TokenResponse>> {
    caller.authorize(Action::Update, Resource::User)?;
    let api_token = state.store.rotate_token(UserId(id))?;
    Ok(Json(TokenResponse { api_token }))
}
