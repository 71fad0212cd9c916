//! Candidate and note endpoints.

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
    Action, Candidate, CandidateId, CandidateInput, CandidateUpdate, Note, NoteId, NoteInput,
    Resource,
};

pub async fn list_candidates(
    State(state): State<AppState>,
    caller: Caller,
) -> ApiResult<Json<Vec<Candidate>>> {
    caller.authorize(Action::Read, Resource::Candidate)?;
    Ok(Json(state.store.list_candidates()?))
}

pub async fn create_candidate(
    State(state): State<AppState>,
    caller: Caller,
    body: JsonBody<CandidateInput>,
) -> ApiResult<(StatusCode, Json<Candidate>)> {
    caller.authorize(Action::Create, Resource::Candidate)?;
    let ApiJson(input) = body?;
    let candidate = state.store.create_candidate(input)?;
    Ok((StatusCode::CREATED, Json(candidate)))
}

pub async fn get_candidate(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<u64>,
) -> ApiResult<Json<Candidate>> {
    caller.authorize(Action::Read, Resource::Candidate)?;
    Ok(Json(state.store.get_candidate(CandidateId(id))?))
}

pub async fn update_candidate(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<u64>,
    body: JsonBody<CandidateUpdate>,
) -> ApiResult<Json<Candidate>> {
    caller.authorize(Action::Update, Resource::Candidate)?;
    let ApiJson(update) = body?;
    Ok(Json(state.store.update_candidate(CandidateId(id), update)?))
}

/// Delete a candidate with its notes, interviews and feedback.
pub async fn delete_candidate(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<u64>,
) -> ApiResult<StatusCode> {
    caller.authorize(Action::Delete, Resource::Candidate)?;
    state.store.delete_candidate(CandidateId(id))?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// NOTES
// =============================================================================

pub async fn list_notes(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<u64>,
) -> ApiResult<Json<Vec<Note>>> {
    caller.authorize(Action::Read, Resource::Note)?;
    Ok(Json(state.store.list_notes(CandidateId(id))?))
}

/// Add a note authored by the caller.
pub async fn add_note(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<u64>,
    body: JsonBody<NoteInput>,
) -> ApiResult<(StatusCode, Json<Note>)> {
    let actor = caller.authorize(Action::Create, Resource::Note)?;
    let ApiJson(input) = body?;
    let note = state
        .store
        .add_note(CandidateId(id), actor.user_id, input)?;
    Ok((StatusCode::CREATED, Json(note)))
}

pub async fn delete_note(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<u64>,
) -> ApiResult<StatusCode> {
    caller.authorize(Action::Delete, Resource::Note)?;
    state.store.delete_note(NoteId(id))?;
    Ok(StatusCode::NO_CONTENT)
}
