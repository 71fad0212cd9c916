//! # Input DTOs
//!
//! Every create/update operation takes one of these explicit structures.
//! They are deserialized at the boundary (HTTP body, CLI flags), validated
//! here field by field, and only then reach storage.
//!
//! Update structures are partial. Nullable fields use `Option<Option<T>>`:
//! absent leaves the field alone, `null` clears it, a value replaces it.

use crate::primitives::{
    MAX_DESCRIPTION_LENGTH, MAX_INTERVIEW_MINUTES, MAX_INTERVIEWERS, MAX_NAME_LENGTH,
    MAX_NOTE_LENGTH, MAX_RATING, MAX_SKILLS_PER_FEEDBACK, MAX_STAGES_PER_WORKFLOW,
    MIN_INTERVIEW_MINUTES, MIN_RATING,
};
use crate::{
    CandidateId, CandidateStatus, FieldError, HireError, InterviewStatus, PositionId,
    Recommendation, Role, StageId, UserId, WorkflowId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Deserialize a present field (including `null`) as `Some(_)`.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn default_true() -> bool {
    true
}

// =============================================================================
// NORMALIZATION
// =============================================================================

/// Trim surrounding whitespace.
pub(crate) fn clean(value: &str) -> String {
    value.trim().to_string()
}

/// Trim, mapping blank strings to `None`.
pub(crate) fn clean_opt(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

// =============================================================================
// FIELD CHECKS
// =============================================================================

/// Collects field errors so a caller sees every problem at once.
#[derive(Debug, Default)]
struct Checks {
    errors: Vec<FieldError>,
}

impl Checks {
    fn push(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    fn required(&mut self, field: &str, value: &str, max: usize) {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.push(field, "must not be empty");
        } else if trimmed.chars().count() > max {
            self.push(field, format!("must be at most {} characters", max));
        }
    }

    fn optional(&mut self, field: &str, value: Option<&str>, max: usize) {
        if let Some(v) = value
            && v.trim().chars().count() > max
        {
            self.push(field, format!("must be at most {} characters", max));
        }
    }

    fn email(&mut self, field: &str, value: &str) {
        self.required(field, value, MAX_NAME_LENGTH);
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            let valid = trimmed
                .split_once('@')
                .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
            if !valid {
                self.push(field, "must be a valid email address");
            }
        }
    }

    fn rating(&mut self, field: &str, value: u8) {
        if !(MIN_RATING..=MAX_RATING).contains(&value) {
            self.push(
                field,
                format!("must be between {} and {}", MIN_RATING, MAX_RATING),
            );
        }
    }

    fn duration(&mut self, field: &str, value: u32) {
        if !(MIN_INTERVIEW_MINUTES..=MAX_INTERVIEW_MINUTES).contains(&value) {
            self.push(
                field,
                format!(
                    "must be between {} and {} minutes",
                    MIN_INTERVIEW_MINUTES, MAX_INTERVIEW_MINUTES
                ),
            );
        }
    }

    fn finish(self) -> Result<(), HireError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(HireError::Validation(self.errors))
        }
    }
}

// =============================================================================
// WORKFLOWS & STAGES
// =============================================================================

/// A new stage: `{name, description?}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl StageInput {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }

    pub fn validate(&self) -> Result<(), HireError> {
        let mut checks = Checks::default();
        self.check(&mut checks, "");
        checks.finish()
    }

    fn check(&self, checks: &mut Checks, prefix: &str) {
        checks.required(&format!("{}name", prefix), &self.name, MAX_NAME_LENGTH);
        checks.optional(
            &format!("{}description", prefix),
            self.description.as_deref(),
            MAX_DESCRIPTION_LENGTH,
        );
    }
}

/// Partial stage update. Order is only changed through reordering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
}

impl StageUpdate {
    pub fn validate(&self) -> Result<(), HireError> {
        let mut checks = Checks::default();
        if let Some(name) = &self.name {
            checks.required("name", name, MAX_NAME_LENGTH);
        }
        if let Some(description) = &self.description {
            checks.optional("description", description.as_deref(), MAX_DESCRIPTION_LENGTH);
        }
        checks.finish()
    }
}

/// A new workflow, optionally with inline stages (`order = index`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub stages: Vec<StageInput>,
}

impl WorkflowInput {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), HireError> {
        let mut checks = Checks::default();
        checks.required("name", &self.name, MAX_NAME_LENGTH);
        checks.optional(
            "description",
            self.description.as_deref(),
            MAX_DESCRIPTION_LENGTH,
        );
        if self.stages.len() > MAX_STAGES_PER_WORKFLOW {
            checks.push(
                "stages",
                format!("at most {} stages are allowed", MAX_STAGES_PER_WORKFLOW),
            );
        }
        for (index, stage) in self.stages.iter().enumerate() {
            stage.check(&mut checks, &format!("stages[{}].", index));
        }
        checks.finish()
    }
}

/// Partial workflow update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_default: Option<bool>,
}

impl WorkflowUpdate {
    pub fn validate(&self) -> Result<(), HireError> {
        let mut checks = Checks::default();
        if let Some(name) = &self.name {
            checks.required("name", name, MAX_NAME_LENGTH);
        }
        if let Some(description) = &self.description {
            checks.optional("description", description.as_deref(), MAX_DESCRIPTION_LENGTH);
        }
        checks.finish()
    }
}

// =============================================================================
// POSITIONS
// =============================================================================

/// A new position: `{title, department?, workflowId?, isActive}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionInput {
    pub title: String,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub workflow_id: Option<WorkflowId>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl PositionInput {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            department: None,
            description: None,
            workflow_id: None,
            is_active: true,
        }
    }

    pub fn validate(&self) -> Result<(), HireError> {
        let mut checks = Checks::default();
        checks.required("title", &self.title, MAX_NAME_LENGTH);
        checks.optional("department", self.department.as_deref(), MAX_NAME_LENGTH);
        checks.optional(
            "description",
            self.description.as_deref(),
            MAX_DESCRIPTION_LENGTH,
        );
        checks.finish()
    }
}

/// Partial position update. `workflowId: null` detaches the workflow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub department: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub workflow_id: Option<Option<WorkflowId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl PositionUpdate {
    pub fn validate(&self) -> Result<(), HireError> {
        let mut checks = Checks::default();
        if let Some(title) = &self.title {
            checks.required("title", title, MAX_NAME_LENGTH);
        }
        if let Some(department) = &self.department {
            checks.optional("department", department.as_deref(), MAX_NAME_LENGTH);
        }
        if let Some(description) = &self.description {
            checks.optional("description", description.as_deref(), MAX_DESCRIPTION_LENGTH);
        }
        checks.finish()
    }
}

// =============================================================================
// CANDIDATES & NOTES
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateInput {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub resume_url: Option<String>,
    #[serde(default)]
    pub position_id: Option<PositionId>,
    #[serde(default)]
    pub status: Option<CandidateStatus>,
}

impl CandidateInput {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), HireError> {
        let mut checks = Checks::default();
        checks.required("name", &self.name, MAX_NAME_LENGTH);
        checks.email("email", &self.email);
        checks.optional("phone", self.phone.as_deref(), MAX_NAME_LENGTH);
        checks.optional(
            "resumeUrl",
            self.resume_url.as_deref(),
            MAX_DESCRIPTION_LENGTH,
        );
        checks.finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub phone: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub resume_url: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub position_id: Option<Option<PositionId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<CandidateStatus>,
}

impl CandidateUpdate {
    pub fn validate(&self) -> Result<(), HireError> {
        let mut checks = Checks::default();
        if let Some(name) = &self.name {
            checks.required("name", name, MAX_NAME_LENGTH);
        }
        if let Some(email) = &self.email {
            checks.email("email", email);
        }
        if let Some(phone) = &self.phone {
            checks.optional("phone", phone.as_deref(), MAX_NAME_LENGTH);
        }
        if let Some(resume_url) = &self.resume_url {
            checks.optional("resumeUrl", resume_url.as_deref(), MAX_DESCRIPTION_LENGTH);
        }
        checks.finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteInput {
    pub content: String,
}

impl NoteInput {
    pub fn validate(&self) -> Result<(), HireError> {
        let mut checks = Checks::default();
        checks.required("content", &self.content, MAX_NOTE_LENGTH);
        checks.finish()
    }
}

// =============================================================================
// INTERVIEWS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewInput {
    pub candidate_id: CandidateId,
    pub position_id: PositionId,
    #[serde(default)]
    pub stage_id: Option<StageId>,
    pub scheduled_at: DateTime<Utc>,
    /// Falls back to `Settings::default_interview_minutes`.
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub interviewer_ids: Vec<UserId>,
}

impl InterviewInput {
    pub fn validate(&self) -> Result<(), HireError> {
        let mut checks = Checks::default();
        if let Some(minutes) = self.duration_minutes {
            checks.duration("durationMinutes", minutes);
        }
        checks.optional("location", self.location.as_deref(), MAX_NAME_LENGTH);
        check_interviewers(&mut checks, &self.interviewer_ids);
        checks.finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewUpdate {
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub stage_id: Option<Option<StageId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub location: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interviewer_ids: Option<Vec<UserId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<InterviewStatus>,
}

impl InterviewUpdate {
    pub fn validate(&self) -> Result<(), HireError> {
        let mut checks = Checks::default();
        if let Some(minutes) = self.duration_minutes {
            checks.duration("durationMinutes", minutes);
        }
        if let Some(location) = &self.location {
            checks.optional("location", location.as_deref(), MAX_NAME_LENGTH);
        }
        if let Some(ids) = &self.interviewer_ids {
            check_interviewers(&mut checks, ids);
        }
        checks.finish()
    }
}

fn check_interviewers(checks: &mut Checks, ids: &[UserId]) {
    if ids.len() > MAX_INTERVIEWERS {
        checks.push(
            "interviewerIds",
            format!("at most {} interviewers are allowed", MAX_INTERVIEWERS),
        );
    }
    let mut seen = std::collections::BTreeSet::new();
    if !ids.iter().all(|id| seen.insert(*id)) {
        checks.push("interviewerIds", "must not contain duplicates");
    }
}

// =============================================================================
// FEEDBACK
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillInput {
    pub skill: String,
    pub rating: u8,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackInput {
    pub recommendation: Recommendation,
    pub rating: u8,
    #[serde(default)]
    pub comments: Option<String>,
    #[serde(default)]
    pub skills: Vec<SkillInput>,
}

impl FeedbackInput {
    pub fn validate(&self) -> Result<(), HireError> {
        let mut checks = Checks::default();
        checks.rating("rating", self.rating);
        checks.optional(
            "comments",
            self.comments.as_deref(),
            MAX_DESCRIPTION_LENGTH,
        );
        if self.skills.len() > MAX_SKILLS_PER_FEEDBACK {
            checks.push(
                "skills",
                format!("at most {} skills are allowed", MAX_SKILLS_PER_FEEDBACK),
            );
        }
        for (index, skill) in self.skills.iter().enumerate() {
            checks.required(
                &format!("skills[{}].skill", index),
                &skill.skill,
                MAX_NAME_LENGTH,
            );
            checks.rating(&format!("skills[{}].rating", index), skill.rating);
            checks.optional(
                &format!("skills[{}].notes", index),
                skill.notes.as_deref(),
                MAX_DESCRIPTION_LENGTH,
            );
        }
        checks.finish()
    }
}

// =============================================================================
// USERS & SETTINGS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInput {
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl UserInput {
    pub fn validate(&self) -> Result<(), HireError> {
        let mut checks = Checks::default();
        checks.required("name", &self.name, MAX_NAME_LENGTH);
        checks.email("email", &self.email);
        checks.finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl UserUpdate {
    pub fn validate(&self) -> Result<(), HireError> {
        let mut checks = Checks::default();
        if let Some(name) = &self.name {
            checks.required("name", name, MAX_NAME_LENGTH);
        }
        if let Some(email) = &self.email {
            checks.email("email", email);
        }
        checks.finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_interview_minutes: Option<u32>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub default_location: Option<Option<String>>,
}

impl SettingsUpdate {
    pub fn validate(&self) -> Result<(), HireError> {
        let mut checks = Checks::default();
        if let Some(name) = &self.company_name {
            checks.required("companyName", name, MAX_NAME_LENGTH);
        }
        if let Some(minutes) = self.default_interview_minutes {
            checks.duration("defaultInterviewMinutes", minutes);
        }
        if let Some(location) = &self.default_location {
            checks.optional("defaultLocation", location.as_deref(), MAX_NAME_LENGTH);
        }
        checks.finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(result: Result<(), HireError>) -> Vec<String> {
        match result {
            Err(HireError::Validation(errors)) => errors.into_iter().map(|e| e.field).collect(),
            Err(other) => vec![format!("unexpected: {}", other)],
            Ok(()) => vec![],
        }
    }

    #[test]
    fn blank_workflow_name_rejected() {
        let input = WorkflowInput::new("   ");
        assert_eq!(fields(input.validate()), vec!["name"]);
    }

    #[test]
    fn inline_stage_errors_carry_index() {
        let mut input = WorkflowInput::new("Engineering");
        input.stages = vec![StageInput::new("Phone Screen"), StageInput::new("")];
        assert_eq!(fields(input.validate()), vec!["stages[1].name"]);
    }

    #[test]
    fn too_many_inline_stages_rejected() {
        let mut input = WorkflowInput::new("Huge");
        input.stages = (0..=MAX_STAGES_PER_WORKFLOW)
            .map(|i| StageInput::new(format!("Stage {}", i)))
            .collect();
        assert_eq!(fields(input.validate()), vec!["stages"]);
    }

    #[test]
    fn overlong_name_rejected() {
        let input = StageInput::new("x".repeat(MAX_NAME_LENGTH + 1));
        assert_eq!(fields(input.validate()), vec!["name"]);
    }

    #[test]
    fn candidate_reports_every_bad_field() {
        let input = CandidateInput::new("", "not-an-email");
        assert_eq!(fields(input.validate()), vec!["name", "email"]);
    }

    #[test]
    fn email_needs_domain_with_dot() {
        assert!(CandidateInput::new("Ada", "ada@example.com").validate().is_ok());
        assert_eq!(
            fields(CandidateInput::new("Ada", "ada@localhost").validate()),
            vec!["email"]
        );
    }

    #[test]
    fn feedback_rating_bounds() {
        let mut input = FeedbackInput {
            recommendation: Recommendation::Hire,
            rating: 0,
            comments: None,
            skills: vec![SkillInput {
                skill: "Rust".to_string(),
                rating: 6,
                notes: None,
            }],
        };
        assert_eq!(fields(input.validate()), vec!["rating", "skills[0].rating"]);

        input.rating = 4;
        input.skills[0].rating = 5;
        assert!(input.validate().is_ok());
    }

    #[test]
    fn duplicate_interviewers_rejected() {
        let update = InterviewUpdate {
            interviewer_ids: Some(vec![UserId(1), UserId(1)]),
            ..InterviewUpdate::default()
        };
        assert_eq!(fields(update.validate()), vec!["interviewerIds"]);
    }

    #[test]
    fn clean_opt_drops_blank_values() {
        assert_eq!(clean_opt(Some("  ")), None);
        assert_eq!(clean_opt(Some(" QA ")), Some("QA".to_string()));
        assert_eq!(clean_opt(None), None);
        assert_eq!(clean("  Onsite "), "Onsite");
    }

    #[test]
    fn nullable_distinguishes_absent_from_null() {
        let absent: PositionUpdate = serde_json::from_str("{}").expect("absent");
        assert_eq!(absent.workflow_id, None);

        let cleared: PositionUpdate =
            serde_json::from_str(r#"{"workflowId":null}"#).expect("null");
        assert_eq!(cleared.workflow_id, Some(None));

        let set: PositionUpdate = serde_json::from_str(r#"{"workflowId":3}"#).expect("set");
        assert_eq!(set.workflow_id, Some(Some(WorkflowId(3))));
    }

    #[test]
    fn position_defaults_to_active() {
        let input: PositionInput =
            serde_json::from_str(r#"{"title":"Backend Engineer"}"#).expect("parse");
        assert!(input.is_active);
        assert_eq!(input.workflow_id, None);
    }

    #[test]
    fn settings_duration_checked() {
        let update = SettingsUpdate {
            default_interview_minutes: Some(5),
            ..SettingsUpdate::default()
        };
        assert_eq!(fields(update.validate()), vec!["defaultInterviewMinutes"]);
    }
}
