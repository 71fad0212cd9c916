//! Application settings endpoints.

use crate::api::{
    AppState,
    auth::Caller,
    error::ApiResult,
    extract::{ApiJson, JsonBody},
};
use axum::{Json, extract::State};
use hiretrack_core::{Action, Resource, Settings, SettingsUpdate};

pub async fn get_settings(
    State(state): State<AppState>,
    caller: Caller,
) -> ApiResult<Json<Settings>> {
    caller.authorize(Action::Read, Resource::Settings)?;
    Ok(Json(state.store.settings()?))
}

pub async fn update_settings(
    State(state): State<AppState>,
    caller: Caller,
    body: JsonBody<SettingsUpdate>,
) -> ApiResult<Json<Settings>> {
    caller.authorize(Action::Update, Resource::Settings)?;
    let ApiJson(update) = body?;
    Ok(Json(state.store.update_settings(update)?))
}
