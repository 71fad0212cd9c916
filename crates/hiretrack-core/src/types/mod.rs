//! # Core Type Definitions
//!
//! This module contains all core types for the hiretrack domain:
//! - Record identifiers (`WorkflowId`, `StageId`, `PositionId`, ...)
//! - Persisted records (`Workflow`, `Stage`, `Position`, `Interview`, ...)
//! - Closed enumerations (`Role`, `InterviewStatus`, `CandidateStatus`, `Recommendation`)
//! - Error types (`HireError`, `FieldError`)
//!
//! ## Encoding
//!
//! Records are stored with postcard and returned over HTTP as camelCase JSON.
//! Because postcard is positional, record types never use
//! `skip_serializing_if`, `flatten` or internally tagged enums.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// Identifier of a hiring workflow.
    WorkflowId
);
id_type!(
    /// Identifier of a stage inside a workflow.
    StageId
);
id_type!(
    /// Identifier of an open (or closed) position.
    PositionId
);
id_type!(
    /// Identifier of a candidate.
    CandidateId
);
id_type!(
    /// Identifier of a scheduled interview.
    InterviewId
);
id_type!(
    /// Identifier of an interview feedback entry.
    FeedbackId
);
id_type!(
    /// Identifier of a per-skill rating attached to feedback.
    SkillAssessmentId
);
id_type!(
    /// Identifier of a free-form candidate note.
    NoteId
);
id_type!(
    /// Identifier of a user account.
    UserId
);

// =============================================================================
// ENUMERATIONS
// =============================================================================

/// Account role. Drives every authorization decision (see `policy`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Manager,
    Interviewer,
    User,
}

impl Role {
    /// Wire name of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Manager => "MANAGER",
            Self::Interviewer => "INTERVIEWER",
            Self::User => "USER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = HireError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(Self::Admin),
            "MANAGER" => Ok(Self::Manager),
            "INTERVIEWER" => Ok(Self::Interviewer),
            "USER" => Ok(Self::User),
            other => Err(HireError::invalid(
                "role",
                format!("unknown role '{}'; expected ADMIN, MANAGER, INTERVIEWER or USER", other),
            )),
        }
    }
}

/// Interview lifecycle status.
///
/// Transitions are caller-driven: any status may be written over any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InterviewStatus {
    #[default]
    Scheduled,
    Completed,
    Canceled,
    NoShow,
}

/// Where a candidate stands in the hiring pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CandidateStatus {
    #[default]
    New,
    Screening,
    Interviewing,
    Offered,
    Hired,
    Rejected,
}

/// Interviewer's overall hiring recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recommendation {
    StrongHire,
    Hire,
    NoHire,
    StrongNoHire,
}

// =============================================================================
// WORKFLOWS & STAGES
// =============================================================================

/// A named, ordered sequence of interview stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    pub id: WorkflowId,
    pub name: String,
    pub description: Option<String>,
    /// At most one workflow has this set at any time.
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One ordered step within a workflow.
///
/// Within a workflow the `order` values are exactly `0..n`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    pub id: StageId,
    pub workflow_id: WorkflowId,
    pub name: String,
    pub description: Option<String>,
    pub order: u32,
}

/// A workflow together with its stages sorted by `order`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowDetail {
    #[serde(flatten)]
    pub workflow: Workflow,
    pub stages: Vec<Stage>,
}

// =============================================================================
// POSITIONS & CANDIDATES
// =============================================================================

/// An opening that candidates interview for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub id: PositionId,
    pub title: String,
    pub department: Option<String>,
    pub description: Option<String>,
    /// `None` means "use the default workflow".
    pub workflow_id: Option<WorkflowId>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: CandidateId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub resume_url: Option<String>,
    pub position_id: Option<PositionId>,
    pub status: CandidateStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    pub candidate_id: CandidateId,
    pub author_id: Option<UserId>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// INTERVIEWS & FEEDBACK
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interview {
    pub id: InterviewId,
    pub candidate_id: CandidateId,
    pub position_id: PositionId,
    /// Stage of the position's resolved workflow, if any.
    pub stage_id: Option<StageId>,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: u32,
    pub location: Option<String>,
    pub status: InterviewStatus,
    pub interviewer_ids: Vec<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub id: FeedbackId,
    pub interview_id: InterviewId,
    pub author_id: Option<UserId>,
    pub recommendation: Recommendation,
    /// Overall rating, `MIN_RATING..=MAX_RATING`.
    pub rating: u8,
    pub comments: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillAssessment {
    pub id: SkillAssessmentId,
    pub feedback_id: FeedbackId,
    pub skill: String,
    pub rating: u8,
    pub notes: Option<String>,
}

/// Feedback with its skill assessments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackDetail {
    #[serde(flatten)]
    pub feedback: Feedback,
    pub skills: Vec<SkillAssessment>,
}

// =============================================================================
// USERS & SETTINGS
// =============================================================================

/// A user account. API tokens live in their own table and never appear here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Application-wide settings (singleton).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub company_name: String,
    pub default_interview_minutes: u32,
    pub default_location: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            company_name: "hiretrack".to_string(),
            default_interview_minutes: crate::primitives::DEFAULT_INTERVIEW_MINUTES,
            default_location: None,
        }
    }
}

/// Row counts per table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStatus {
    pub workflows: u64,
    pub stages: u64,
    pub positions: u64,
    pub candidates: u64,
    pub interviews: u64,
    pub feedback: u64,
    pub users: u64,
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors that can occur in hiretrack.
///
/// `SerializationError` and `IoError` are internal failures; every other
/// variant is a caller-facing condition.
#[derive(Debug, Error)]
pub enum HireError {
    /// No credentials were presented, or they matched no account.
    #[error("Authentication required")]
    Unauthenticated,

    /// The caller's role may not perform the action.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Input failed validation, reported field by field.
    #[error("Validation failed: {}", summarize(.0))]
    Validation(Vec<FieldError>),

    /// The referenced record does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: u64 },

    /// The operation is refused in the record's current state.
    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    /// A record could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// The underlying store failed.
    #[error("I/O error: {0}")]
    IoError(String),
}

impl HireError {
    /// Shorthand for a single-field validation failure.
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation(vec![FieldError::new(field, message)])
    }

    /// True for failures the caller cannot fix by changing the request.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::SerializationError(_) | Self::IoError(_))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!("admin".parse::<Role>().ok(), Some(Role::Admin));
        assert_eq!(" Interviewer ".parse::<Role>().ok(), Some(Role::Interviewer));
        assert!(matches!(
            "owner".parse::<Role>(),
            Err(HireError::Validation(_))
        ));
    }

    #[test]
    fn role_display_matches_wire_name() {
        for role in [Role::Admin, Role::Manager, Role::Interviewer, Role::User] {
            assert_eq!(role.to_string().parse::<Role>().ok(), Some(role));
        }
    }

    #[test]
    fn validation_error_lists_every_field() {
        let err = HireError::Validation(vec![
            FieldError::new("name", "must not be empty"),
            FieldError::new("email", "must contain '@'"),
        ]);
        let message = err.to_string();
        assert!(message.contains("name: must not be empty"));
        assert!(message.contains("email: must contain '@'"));
        assert!(!err.is_internal());
    }

    #[test]
    fn not_found_names_the_kind() {
        let err = HireError::NotFound {
            kind: "Workflow",
            id: 7,
        };
        assert_eq!(err.to_string(), "Workflow not found: 7");
    }

    #[test]
    fn ids_display_as_plain_numbers() {
        assert_eq!(StageId(42).to_string(), "42");
        assert!(WorkflowId(1) < WorkflowId(2));
    }
}
