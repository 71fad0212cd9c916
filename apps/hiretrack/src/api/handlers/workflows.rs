//! Workflow and stage endpoints.
//!
//! `POST /api/workflows/{id}/stages` is overloaded: a body with a `stageIds`
//! key reorders the whole workflow, any other body creates one stage.
//!
//! Handlers authorize before they look at the body, so a caller without
//! the role gets 401/403 even when the body is malformed.

use crate::api::{
    AppState,
    auth::Caller,
    error::ApiResult,
    extract::{ApiJson, JsonBody},
    types::StagesRequest,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use hiretrack_core::{
    Action, Resource, Stage, StageId, StageUpdate, Workflow, WorkflowDetail, WorkflowId,
    WorkflowInput, WorkflowUpdate,
};

// =============================================================================
// WORKFLOWS
// =============================================================================

pub async fn list_workflows(
    State(state): State<AppState>,
    caller: Caller,
) -> ApiResult<Json<Vec<WorkflowDetail>>> {
    caller.authorize(Action::Read, Resource::Workflow)?;
    Ok(Json(state.store.list_workflows()?))
}

/// Create a workflow with optional inline stages. 201 on success.
pub async fn create_workflow(
    State(state): State<AppState>,
    caller: Caller,
    body: JsonBody<WorkflowInput>,
) -> ApiResult<(StatusCode, Json<WorkflowDetail>)> {
    caller.authorize(Action::Create, Resource::Workflow)?;
    let ApiJson(input) = body?;
    let detail = state.store.create_workflow(input)?;
    Ok((StatusCode::CREATED, Json(detail)))
}

pub async fn get_workflow(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<u64>,
) -> ApiResult<Json<WorkflowDetail>> {
    caller.authorize(Action::Read, Resource::Workflow)?;
    Ok(Json(state.store.get_workflow(WorkflowId(id))?))
}

pub async fn update_workflow(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<u64>,
    body: JsonBody<WorkflowUpdate>,
) -> ApiResult<Json<WorkflowDetail>> {
    caller.authorize(Action::Update, Resource::Workflow)?;
    let ApiJson(update) = body?;
    Ok(Json(state.store.update_workflow(WorkflowId(id), update)?))
}

/// Delete a non-default workflow and its stages. 412 for the default.
pub async fn delete_workflow(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<u64>,
) -> ApiResult<StatusCode> {
    caller.authorize(Action::Delete, Resource::Workflow)?;
    state.store.delete_workflow(WorkflowId(id))?;
    Ok(StatusCode::NO_CONTENT)
}

/// Make a workflow the default, clearing the previous one.
pub async fn set_default_workflow(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<u64>,
) -> ApiResult<Json<Workflow>> {
    caller.authorize(Action::Update, Resource::Workflow)?;
    Ok(Json(state.store.set_default(WorkflowId(id))?))
}

// =============================================================================
// STAGES
// =============================================================================

pub async fn list_stages(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<u64>,
) -> ApiResult<Json<Vec<Stage>>> {
    caller.authorize(Action::Read, Resource::Stage)?;
    Ok(Json(state.store.list_stages(WorkflowId(id))?))
}

/// Create a stage (201) or reorder every stage (200).
pub async fn post_stages(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<u64>,
    body: JsonBody<StagesRequest>,
) -> ApiResult<Response> {
    let workflow_id = WorkflowId(id);
    // An unreadable body names no action; check against create.
    let request = match body {
        Ok(ApiJson(request)) => request,
        Err(rejection) => {
            caller.authorize(Action::Create, Resource::Stage)?;
            return Err(rejection);
        }
    };
    match request {
        StagesRequest::Reorder { stage_ids } => {
            caller.authorize(Action::Update, Resource::Stage)?;
            let stages = state.store.reorder_stages(workflow_id, &stage_ids)?;
            Ok(Json(stages).into_response())
        }
        StagesRequest::Create(input) => {
            caller.authorize(Action::Create, Resource::Stage)?;
            let stage = state.store.create_stage(workflow_id, input)?;
            Ok((StatusCode::CREATED, Json(stage)).into_response())
        }
    }
}

pub async fn get_stage(
    State(state): State<AppState>,
    caller: Caller,
    Path((workflow_id, stage_id)): Path<(u64, u64)>,
) -> ApiResult<Json<Stage>> {
    caller.authorize(Action::Read, Resource::Stage)?;
    let stage = state
        .store
        .get_stage(WorkflowId(workflow_id), StageId(stage_id))?;
    Ok(Json(stage))
}

pub async fn update_stage(
    State(state): State<AppState>,
    caller: Caller,
    Path((workflow_id, stage_id)): Path<(u64, u64)>,
    body: JsonBody<StageUpdate>,
) -> ApiResult<Json<Stage>> {
    caller.authorize(Action::Update, Resource::Stage)?;
    let ApiJson(update) = body?;
    let stage = state
        .store
        .update_stage(WorkflowId(workflow_id), StageId(stage_id), update)?;
    Ok(Json(stage))
}

/// Delete a stage; later stages shift down by one.
pub async fn delete_stage(
    State(state): State<AppState>,
    caller: Caller,
    Path((workflow_id, stage_id)): Path<(u64, u64)>,
) -> ApiResult<StatusCode> {
    caller.authorize(Action::Delete, Resource::Stage)?;
    state
        .store
        .delete_stage(WorkflowId(workflow_id), StageId(stage_id))?;
    Ok(StatusCode::NO_CONTENT)
}
