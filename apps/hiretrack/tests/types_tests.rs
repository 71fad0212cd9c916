//! Unit tests for API types serialization/deserialization.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use hiretrack::api::{
    ErrorResponse, HealthResponse, InterviewQuery, StagesRequest, StatusResponse,
    StatusUpdateRequest,
};
use hiretrack_core::{
    CandidateId, FieldError, InterviewFilter, InterviewStatus, PositionInput, PositionUpdate,
    StageId, StageInput, StoreStatus, WorkflowId,
};

// =============================================================================
// HEALTH & STATUS
// =============================================================================

#[test]
fn test_health_response_default() {
    let health = HealthResponse::default();
    assert_eq!(health.status, "ok");
    assert!(!health.version.is_empty());
}

#[test]
fn test_status_response_is_flat() {
    let status = StatusResponse::from(StoreStatus {
        workflows: 2,
        stages: 7,
        ..StoreStatus::default()
    });
    let json = serde_json::to_value(&status).unwrap();
    assert_eq!(json["workflows"], 2);
    assert_eq!(json["stages"], 7);
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

// =============================================================================
// ERRORS
// =============================================================================

#[test]
fn test_error_response_omits_empty_details() {
    let json = serde_json::to_string(&ErrorResponse::new("Workflow not found: 3")).unwrap();
    assert_eq!(json, r#"{"error":"Workflow not found: 3"}"#);
}

#[test]
fn test_error_response_with_details() {
    let body = ErrorResponse {
        error: "Validation failed".to_string(),
        details: Some(vec![FieldError::new("name", "must not be empty")]),
    };
    let json = serde_json::to_value(&body).unwrap();
    assert_eq!(json["details"][0]["field"], "name");
    assert_eq!(json["details"][0]["message"], "must not be empty");
}

// =============================================================================
// STAGES REQUEST
// =============================================================================

#[test]
fn test_stage_ids_body_is_reorder() {
    let request: StagesRequest = serde_json::from_str(r#"{"stageIds":[3,1,2]}"#).unwrap();
    assert_eq!(
        request,
        StagesRequest::Reorder {
            stage_ids: vec![StageId(3), StageId(1), StageId(2)]
        }
    );
}

#[test]
fn test_empty_stage_ids_is_reorder() {
    let request: StagesRequest = serde_json::from_str(r#"{"stageIds":[]}"#).unwrap();
    assert_eq!(request, StagesRequest::Reorder { stage_ids: vec![] });
}

#[test]
fn test_name_body_is_create() {
    let request: StagesRequest =
        serde_json::from_str(r#"{"name":"Onsite","description":"Half day"}"#).unwrap();
    assert_eq!(
        request,
        StagesRequest::Create(StageInput {
            name: "Onsite".to_string(),
            description: Some("Half day".to_string()),
        })
    );
}

#[test]
fn test_body_matching_neither_shape_fails() {
    assert!(serde_json::from_str::<StagesRequest>(r#"{"order":2}"#).is_err());
    assert!(serde_json::from_str::<StagesRequest>(r#"{"stageIds":"1,2"}"#).is_err());
}

#[test]
fn test_bad_stage_ids_do_not_fall_back_to_create() {
    let result = serde_json::from_str::<StagesRequest>(r#"{"name":"Oops","stageIds":[2,"x"]}"#);
    let err = result.unwrap_err().to_string();
    assert!(err.contains("stageIds"), "{}", err);
}

#[test]
fn test_stage_ids_key_wins_over_name() {
    let request: StagesRequest =
        serde_json::from_str(r#"{"name":"Ignored","stageIds":[2,1]}"#).unwrap();
    assert_eq!(
        request,
        StagesRequest::Reorder {
            stage_ids: vec![StageId(2), StageId(1)]
        }
    );
}

// =============================================================================
// INTERVIEWS
// =============================================================================

#[test]
fn test_interview_query_to_filter() {
    let query: InterviewQuery =
        serde_json::from_str(r#"{"candidateId":4}"#).unwrap();
    let filter = InterviewFilter::from(query);
    assert_eq!(filter.candidate_id, Some(CandidateId(4)));
    assert_eq!(filter.position_id, None);
}

#[test]
fn test_status_update_uses_wire_names() {
    let request: StatusUpdateRequest = serde_json::from_str(r#"{"status":"NO_SHOW"}"#).unwrap();
    assert_eq!(request.status, InterviewStatus::NoShow);
    assert!(serde_json::from_str::<StatusUpdateRequest>(r#"{"status":"LATE"}"#).is_err());
}

// =============================================================================
// INPUT DTOs AT THE BOUNDARY
// =============================================================================

#[test]
fn test_position_input_defaults_active() {
    let input: PositionInput = serde_json::from_str(r#"{"title":"SRE"}"#).unwrap();
    assert!(input.is_active);
    assert_eq!(input.workflow_id, None);
}

#[test]
fn test_position_update_null_differs_from_absent() {
    let cleared: PositionUpdate = serde_json::from_str(r#"{"workflowId":null}"#).unwrap();
    assert_eq!(cleared.workflow_id, Some(None));

    let set: PositionUpdate = serde_json::from_str(r#"{"workflowId":5}"#).unwrap();
    assert_eq!(set.workflow_id, Some(Some(WorkflowId(5))));

    let untouched: PositionUpdate = serde_json::from_str(r#"{"title":"SRE II"}"#).unwrap();
    assert_eq!(untouched.workflow_id, None);
}
