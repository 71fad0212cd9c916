//! # API Request/Response Types
//!
//! JSON structures specific to the HTTP layer. Domain records and input
//! DTOs from `hiretrack_core` are sent and received as they are.

use hiretrack_core::{
    CandidateId, FieldError, InterviewFilter, InterviewStatus, PositionId, StageId, StageInput,
    StoreStatus, User,
};
use serde::{Deserialize, Deserializer, Serialize, de::Error as _};
use serde_json::{Map, Value};

// =============================================================================
// HEALTH & STATUS
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Record counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub version: String,
    #[serde(flatten)]
    pub counts: StoreStatus,
}

impl From<StoreStatus> for StatusResponse {
    fn from(counts: StoreStatus) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            counts,
        }
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// Body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }
}

// =============================================================================
// STAGES
// =============================================================================

/// Body of `POST /api/workflows/{id}/stages`.
///
/// A body carrying a `stageIds` key is a full reorder, and fails as one if
/// the ids do not parse. Any other body is a new stage `{name, description?}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StagesRequest {
    Reorder { stage_ids: Vec<StageId> },
    Create(StageInput),
}

impl<'de> Deserialize<'de> for StagesRequest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut body = Map::<String, Value>::deserialize(deserializer)?;
        match body.remove("stageIds") {
            Some(ids) => serde_json::from_value(ids)
                .map(|stage_ids| Self::Reorder { stage_ids })
                .map_err(|e| D::Error::custom(format!("stageIds: {}", e))),
            None => serde_json::from_value(Value::Object(body))
                .map(Self::Create)
                .map_err(D::Error::custom),
        }
    }
}

// =============================================================================
// INTERVIEWS
// =============================================================================

/// Query string of `GET /api/interviews`.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewQuery {
    pub candidate_id: Option<CandidateId>,
    pub position_id: Option<PositionId>,
}

impl From<InterviewQuery> for InterviewFilter {
    fn from(query: InterviewQuery) -> Self {
        Self {
            candidate_id: query.candidate_id,
            position_id: query.position_id,
        }
    }
}

/// Body of `PATCH /api/interviews/{id}/status`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: InterviewStatus,
}

// =============================================================================
// USERS
// =============================================================================

/// A newly created user with its first API token.
///
/// The token is shown once; later reads return the plain `User`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedUserResponse {
    #[serde(flatten)]
    pub user: User,
    pub api_token: String,
}

/// Response of `POST /api/users/{id}/token`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub api_token: String,
}
