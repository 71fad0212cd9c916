//! # hiretrack-core
//!
//! Domain model and persistence for the hiretrack interview tracker - THE LOGIC.
//!
//! The heart of the crate is the workflow engine: every workflow owns an
//! ordered list of stages whose `order` values are always exactly `0..n`,
//! and at most one workflow is the default. Positions resolve their stages
//! through their own workflow, falling back to the default one.
//!
//! ## Architectural Constraints
//!
//! - Has NO async, NO network dependencies (pure Rust)
//! - Every mutation touching more than one row runs in a single redb
//!   write transaction, so invariants hold after every committed call
//! - Authorization is decided in one place (`policy`), never ad hoc

// =============================================================================
// MODULES
// =============================================================================

pub mod candidates;
pub mod feedback;
pub mod input;
pub mod interviews;
pub mod policy;
pub mod positions;
pub mod primitives;
pub mod settings;
pub mod stages;
pub mod storage;
pub mod types;
pub mod users;
pub mod workflows;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    Candidate, CandidateId, CandidateStatus, Feedback, FeedbackDetail, FeedbackId, FieldError,
    HireError, Interview, InterviewId, InterviewStatus, Note, NoteId, Position, PositionId,
    Recommendation, Role, Settings, SkillAssessment, SkillAssessmentId, Stage, StageId,
    StoreStatus, User, UserId, Workflow, WorkflowDetail, WorkflowId,
};

// =============================================================================
// RE-EXPORTS: Inputs, Policy, Storage
// =============================================================================

pub use input::{
    CandidateInput, CandidateUpdate, FeedbackInput, InterviewInput, InterviewUpdate, NoteInput,
    PositionInput, PositionUpdate, SettingsUpdate, SkillInput, StageInput, StageUpdate,
    UserInput, UserUpdate, WorkflowInput, WorkflowUpdate,
};
pub use interviews::InterviewFilter;
pub use policy::{Action, Actor, Resource, allows, authorize};
pub use storage::{Store, log_and_default};
