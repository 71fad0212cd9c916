//! Interview and feedback endpoints.

use crate::api::{
    AppState,
    auth::Caller,
    error::ApiResult,
    extract::{ApiJson, ApiQuery, JsonBody},
    types::{InterviewQuery, StatusUpdateRequest},
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use hiretrack_core::{
    Action, FeedbackDetail, FeedbackId, FeedbackInput, Interview, InterviewId, InterviewInput,
    InterviewUpdate, Resource,
};

/// List interviews, optionally filtered by `?candidateId=` and `?positionId=`.
pub async fn list_interviews(
    State(state): State<AppState>,
    caller: Caller,
    ApiQuery(query): ApiQuery<InterviewQuery>,
) -> ApiResult<Json<Vec<Interview>>> {
    caller.authorize(Action::Read, Resource::Interview)?;
    Ok(Json(state.store.list_interviews(query.into())?))
}

pub async fn create_interview(
    State(state): State<AppState>,
    caller: Caller,
    body: JsonBody<InterviewInput>,
) -> ApiResult<(StatusCode, Json<Interview>)> {
    caller.authorize(Action::Create, Resource::Interview)?;
    let ApiJson(input) = body?;
    let interview = state.store.create_interview(input)?;
    Ok((StatusCode::CREATED, Json(interview)))
}

pub async fn get_interview(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<u64>,
) -> ApiResult<Json<Interview>> {
    caller.authorize(Action::Read, Resource::Interview)?;
    Ok(Json(state.store.get_interview(InterviewId(id))?))
}

pub async fn update_interview(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<u64>,
    body: JsonBody<InterviewUpdate>,
) -> ApiResult<Json<Interview>> {
    caller.authorize(Action::Update, Resource::Interview)?;
    let ApiJson(update) = body?;
    Ok(Json(state.store.update_interview(InterviewId(id), update)?))
}

/// Set the status. Any status may follow any other.
pub async fn update_interview_status(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<u64>,
    body: JsonBody<StatusUpdateRequest>,
) -> ApiResult<Json<Interview>> {
    caller.authorize(Action::Update, Resource::Interview)?;
    let ApiJson(request) = body?;
    let interview = state
        .store
        .update_interview_status(InterviewId(id), request.status)?;
    Ok(Json(interview))
}

pub async fn delete_interview(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<u64>,
) -> ApiResult<StatusCode> {
    caller.authorize(Action::Delete, Resource::Interview)?;
    state.store.delete_interview(InterviewId(id))?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// FEEDBACK
// =============================================================================

pub async fn list_feedback(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<u64>,
) -> ApiResult<Json<Vec<FeedbackDetail>>> {
    caller.authorize(Action::Read, Resource::Feedback)?;
    Ok(Json(state.store.list_feedback(InterviewId(id))?))
}

/// Submit feedback authored by the caller.
pub async fn submit_feedback(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<u64>,
    body: JsonBody<FeedbackInput>,
) -> ApiResult<(StatusCode, Json<FeedbackDetail>)> {
    let actor = caller.authorize(Action::Create, Resource::Feedback)?;
    let ApiJson(input) = body?;
    let detail = state
        .store
        .submit_feedback(InterviewId(id), actor.user_id, input)?;
    Ok((StatusCode::CREATED, Json(detail)))
}

pub async fn get_feedback(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<u64>,
) -> ApiResult<Json<FeedbackDetail>> {
    caller.authorize(Action::Read, Resource::Feedback)?;
    Ok(Json(state.store.get_feedback(FeedbackId(id))?))
}

pub async fn delete_feedback(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<u64>,
) -> ApiResult<StatusCode> {
    caller.authorize(Action::Delete, Resource::Feedback)?;
    state.store.delete_feedback(FeedbackId(id))?;
    Ok(StatusCode::NO_CONTENT)
}
