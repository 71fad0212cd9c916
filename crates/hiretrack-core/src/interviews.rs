//! # Interviews
//!
//! Scheduling, interviewer assignment and status tracking.
//!
//! An interview's stage must be one of the stages resolved for its
//! position (the position's workflow, or the default workflow). Status is
//! caller-driven: any status may replace any other.

use crate::feedback::delete_feedback_where;
use crate::input::clean_opt;
use crate::positions::resolve_for;
use crate::settings::load_settings;
use crate::storage::{
    Bytes, CANDIDATES, INTERVIEWS, POSITIONS, Record, SINGLETONS, STAGES, Store, USERS,
    WORKFLOW_STAGES, WORKFLOWS, next_id, put, require, require_ref, scan,
};
use crate::{
    Candidate, CandidateId, HireError, Interview, InterviewId, InterviewInput, InterviewStatus,
    InterviewUpdate, Position, PositionId, StageId, User, UserId,
};
use chrono::{DateTime, Utc};
use redb::{Table, WriteTransaction};
use std::collections::BTreeSet;

/// Optional filters for [`Store::list_interviews`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InterviewFilter {
    pub candidate_id: Option<CandidateId>,
    pub position_id: Option<PositionId>,
}

impl InterviewFilter {
    fn matches(&self, interview: &Interview) -> bool {
        self.candidate_id.is_none_or(|id| interview.candidate_id == id)
            && self.position_id.is_none_or(|id| interview.position_id == id)
    }
}

// =============================================================================
// CASCADE HELPERS
// =============================================================================

/// Drop the stage of every interview pointing at one of `stages`.
pub(crate) fn clear_stage_references(
    interviews: &mut Table<'_, u64, Bytes>,
    stages: &BTreeSet<StageId>,
    now: DateTime<Utc>,
) -> Result<usize, HireError> {
    if stages.is_empty() {
        return Ok(0);
    }
    let mut cleared = 0;
    for mut interview in scan::<Interview>(&*interviews)? {
        if interview.stage_id.is_some_and(|id| stages.contains(&id)) {
            interview.stage_id = None;
            interview.updated_at = now;
            put(interviews, &interview)?;
            cleared += 1;
        }
    }
    Ok(cleared)
}

/// Remove a user from every interviewer list.
pub(crate) fn remove_interviewer(
    interviews: &mut Table<'_, u64, Bytes>,
    user_id: UserId,
    now: DateTime<Utc>,
) -> Result<usize, HireError> {
    let mut touched = 0;
    for mut interview in scan::<Interview>(&*interviews)? {
        if interview.interviewer_ids.contains(&user_id) {
            interview.interviewer_ids.retain(|id| *id != user_id);
            interview.updated_at = now;
            put(interviews, &interview)?;
            touched += 1;
        }
    }
    Ok(touched)
}

/// Delete every interview matching `matches`, with its feedback.
///
/// Opens the interview, feedback and skill tables itself; callers must not
/// hold them.
pub(crate) fn delete_interviews_where(
    txn: &WriteTransaction,
    matches: impl Fn(&Interview) -> bool,
) -> Result<usize, HireError> {
    let doomed: BTreeSet<InterviewId> = {
        let mut interviews = txn.open_table(INTERVIEWS)?;
        let doomed: BTreeSet<InterviewId> = scan::<Interview>(&interviews)?
            .into_iter()
            .filter(|i| matches(i))
            .map(|i| i.id)
            .collect();
        for id in &doomed {
            interviews.remove(id.0)?;
        }
        doomed
    };
    if !doomed.is_empty() {
        delete_feedback_where(txn, |f| doomed.contains(&f.interview_id))?;
    }
    Ok(doomed.len())
}

// =============================================================================
// REFERENCE CHECKS
// =============================================================================

/// Check that `stage_id` is one of the stages resolved for `position`.
fn check_stage(txn: &WriteTransaction, position: &Position, stage_id: StageId) -> Result<(), HireError> {
    let workflows = txn.open_table(WORKFLOWS)?;
    let index = txn.open_table(WORKFLOW_STAGES)?;
    let stages = txn.open_table(STAGES)?;
    let resolved = resolve_for(position, &workflows, &index, &stages)?;
    if resolved.iter().any(|s| s.id == stage_id) {
        Ok(())
    } else {
        Err(HireError::invalid(
            "stageId",
            format!(
                "stage {} is not part of the workflow used by position {}",
                stage_id, position.id
            ),
        ))
    }
}

fn check_interviewers(txn: &WriteTransaction, ids: &[UserId]) -> Result<(), HireError> {
    let users = txn.open_table(USERS)?;
    for id in ids {
        require_ref::<User>(&users, id.0, "interviewerIds")?;
    }
    Ok(())
}

// =============================================================================
// OPERATIONS
// =============================================================================

impl Store {
    /// Schedule an interview.
    ///
    /// Missing duration and location fall back to the stored settings.
    ///
    /// # Errors
    ///
    /// `Validation` for bad input, including references to a candidate,
    /// position, stage or interviewer that does not exist.
    pub fn create_interview(&self, input: InterviewInput) -> Result<Interview, HireError> {
        input.validate()?;

        let interview = self.write(|txn| {
            {
                let candidates = txn.open_table(CANDIDATES)?;
                require_ref::<Candidate>(&candidates, input.candidate_id.0, "candidateId")?;
            }
            let position: Position = {
                let positions = txn.open_table(POSITIONS)?;
                require_ref(&positions, input.position_id.0, "positionId")?
            };
            if let Some(stage_id) = input.stage_id {
                check_stage(txn, &position, stage_id)?;
            }
            check_interviewers(txn, &input.interviewer_ids)?;

            let settings = load_settings(&txn.open_table(SINGLETONS)?)?;
            let now = Utc::now();
            let interview = Interview {
                id: InterviewId(next_id(txn, Interview::KIND)?),
                candidate_id: input.candidate_id,
                position_id: input.position_id,
                stage_id: input.stage_id,
                scheduled_at: input.scheduled_at,
                duration_minutes: input
                    .duration_minutes
                    .unwrap_or(settings.default_interview_minutes),
                location: clean_opt(input.location.as_deref()).or(settings.default_location),
                status: InterviewStatus::Scheduled,
                interviewer_ids: input.interviewer_ids.clone(),
                created_at: now,
                updated_at: now,
            };
            put(&mut txn.open_table(INTERVIEWS)?, &interview)?;
            Ok(interview)
        })?;

        tracing::info!(
            interview_id = %interview.id,
            candidate_id = %interview.candidate_id,
            position_id = %interview.position_id,
            "Interview scheduled"
        );
        Ok(interview)
    }

    pub fn get_interview(&self, id: InterviewId) -> Result<Interview, HireError> {
        self.read(|txn| require(&txn.open_table(INTERVIEWS)?, id.0))
    }

    /// Interviews matching `filter`, soonest first.
    pub fn list_interviews(&self, filter: InterviewFilter) -> Result<Vec<Interview>, HireError> {
        let mut interviews: Vec<Interview> = self.read(|txn| scan(&txn.open_table(INTERVIEWS)?))?;
        interviews.retain(|i| filter.matches(i));
        interviews.sort_by_key(|i| (i.scheduled_at, i.id));
        Ok(interviews)
    }

    /// Partially update an interview.
    ///
    /// A new stage is checked against the stages resolved for the
    /// interview's position at the time of the update.
    pub fn update_interview(
        &self,
        id: InterviewId,
        update: InterviewUpdate,
    ) -> Result<Interview, HireError> {
        update.validate()?;

        self.write(|txn| {
            let mut interview: Interview = require(&txn.open_table(INTERVIEWS)?, id.0)?;

            if let Some(stage) = update.stage_id {
                if let Some(stage_id) = stage {
                    let position: Position =
                        require(&txn.open_table(POSITIONS)?, interview.position_id.0)?;
                    check_stage(txn, &position, stage_id)?;
                }
                interview.stage_id = stage;
            }
            if let Some(ids) = &update.interviewer_ids {
                check_interviewers(txn, ids)?;
                interview.interviewer_ids = ids.clone();
            }
            if let Some(at) = update.scheduled_at {
                interview.scheduled_at = at;
            }
            if let Some(minutes) = update.duration_minutes {
                interview.duration_minutes = minutes;
            }
            if let Some(location) = &update.location {
                interview.location = clean_opt(location.as_deref());
            }
            if let Some(status) = update.status {
                interview.status = status;
            }
            interview.updated_at = Utc::now();

            put(&mut txn.open_table(INTERVIEWS)?, &interview)?;
            Ok(interview)
        })
    }

    /// Overwrite the status. Every transition is allowed.
    pub fn update_interview_status(
        &self,
        id: InterviewId,
        status: InterviewStatus,
    ) -> Result<Interview, HireError> {
        let (interview, previous) = self.write(|txn| {
            let mut interviews = txn.open_table(INTERVIEWS)?;
            let mut interview: Interview = require(&interviews, id.0)?;
            let previous = interview.status;
            interview.status = status;
            interview.updated_at = Utc::now();
            put(&mut interviews, &interview)?;
            Ok((interview, previous))
        })?;

        tracing::info!(
            interview_id = %id,
            from = ?previous,
            to = ?status,
            "Interview status changed"
        );
        Ok(interview)
    }

    /// Delete an interview with its feedback.
    pub fn delete_interview(&self, id: InterviewId) -> Result<(), HireError> {
        self.write(|txn| {
            require::<Interview>(&txn.open_table(INTERVIEWS)?, id.0)?;
            delete_interviews_where(txn, |i| i.id == id)
        })?;
        tracing::info!(interview_id = %id, "Interview deleted");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::{
        CandidateInput, PositionInput, Role, SettingsUpdate, StageInput, UserInput,
        WorkflowInput,
    };

    struct Fixture {
        store: Store,
        candidate: CandidateId,
        position: PositionId,
        stages: Vec<StageId>,
    }

    fn fixture() -> Fixture {
        let store = Store::in_memory().expect("store");
        let workflow = store
            .create_workflow(WorkflowInput {
                is_default: true,
                stages: vec![StageInput::new("Phone Screen"), StageInput::new("Onsite")],
                ..WorkflowInput::new("Engineering")
            })
            .expect("workflow");
        let position = store
            .create_position(PositionInput::new("Backend Engineer"))
            .expect("position");
        let candidate = store
            .create_candidate(CandidateInput::new("Grace Hopper", "grace@example.com"))
            .expect("candidate");
        Fixture {
            store,
            candidate: candidate.id,
            position: position.id,
            stages: workflow.stages.iter().map(|s| s.id).collect(),
        }
    }

    fn input(f: &Fixture) -> InterviewInput {
        InterviewInput {
            candidate_id: f.candidate,
            position_id: f.position,
            stage_id: Some(f.stages[0]),
            scheduled_at: Utc::now(),
            duration_minutes: None,
            location: None,
            interviewer_ids: vec![],
        }
    }

    #[test]
    fn defaults_come_from_settings() {
        let f = fixture();
        f.store
            .update_settings(SettingsUpdate {
                default_interview_minutes: Some(45),
                default_location: Some(Some("Room 4".to_string())),
                ..SettingsUpdate::default()
            })
            .expect("settings");

        let interview = f.store.create_interview(input(&f)).expect("create");
        assert_eq!(interview.duration_minutes, 45);
        assert_eq!(interview.location.as_deref(), Some("Room 4"));
        assert_eq!(interview.status, InterviewStatus::Scheduled);
    }

    #[test]
    fn stage_outside_resolved_workflow_is_rejected() {
        let f = fixture();
        let other = f
            .store
            .create_workflow(WorkflowInput {
                stages: vec![StageInput::new("Portfolio Review")],
                ..WorkflowInput::new("Design")
            })
            .expect("other");

        let mut bad = input(&f);
        bad.stage_id = Some(other.stages[0].id);
        match f.store.create_interview(bad) {
            Err(HireError::Validation(errors)) => assert_eq!(errors[0].field, "stageId"),
            result => panic!("expected validation error, got {:?}", result),
        }
    }

    #[test]
    fn unknown_references_are_validation_errors() {
        let f = fixture();
        let mut bad = input(&f);
        bad.candidate_id = CandidateId(404);
        assert!(matches!(
            f.store.create_interview(bad),
            Err(HireError::Validation(_))
        ));

        let mut bad = input(&f);
        bad.interviewer_ids = vec![UserId(404)];
        assert!(matches!(
            f.store.create_interview(bad),
            Err(HireError::Validation(_))
        ));
    }

    #[test]
    fn any_status_can_follow_any_other() {
        let f = fixture();
        let interview = f.store.create_interview(input(&f)).expect("create");
        for status in [
            InterviewStatus::Completed,
            InterviewStatus::Scheduled,
            InterviewStatus::NoShow,
            InterviewStatus::Canceled,
            InterviewStatus::Completed,
        ] {
            let updated = f
                .store
                .update_interview_status(interview.id, status)
                .expect("status");
            assert_eq!(updated.status, status);
        }
    }

    #[test]
    fn deleting_stage_clears_interview_reference() {
        let f = fixture();
        let interview = f.store.create_interview(input(&f)).expect("create");
        let workflow = f.store.default_workflow().expect("default").expect("exists");

        f.store
            .delete_stage(workflow.workflow.id, f.stages[0])
            .expect("delete stage");
        assert_eq!(f.store.get_interview(interview.id).expect("get").stage_id, None);
    }

    #[test]
    fn update_assigns_interviewers_and_stage() {
        let f = fixture();
        let (user, _) = f
            .store
            .create_user(UserInput {
                name: "Linus".to_string(),
                email: "linus@example.com".to_string(),
                role: Role::Interviewer,
            })
            .expect("user");
        let interview = f.store.create_interview(input(&f)).expect("create");

        let updated = f
            .store
            .update_interview(
                interview.id,
                InterviewUpdate {
                    stage_id: Some(Some(f.stages[1])),
                    interviewer_ids: Some(vec![user.id]),
                    location: Some(None),
                    ..InterviewUpdate::default()
                },
            )
            .expect("update");
        assert_eq!(updated.stage_id, Some(f.stages[1]));
        assert_eq!(updated.interviewer_ids, vec![user.id]);
        assert_eq!(updated.location, None);
    }

    #[test]
    fn filters_by_candidate_and_position() {
        let f = fixture();
        let first = f.store.create_interview(input(&f)).expect("first");
        let other = f
            .store
            .create_candidate(CandidateInput::new("Alan Turing", "alan@example.com"))
            .expect("candidate");
        let mut second = input(&f);
        second.candidate_id = other.id;
        f.store.create_interview(second).expect("second");

        let only_first = f
            .store
            .list_interviews(InterviewFilter {
                candidate_id: Some(f.candidate),
                position_id: None,
            })
            .expect("list");
        assert_eq!(only_first, vec![first]);

        let by_position = f
            .store
            .list_interviews(InterviewFilter {
                candidate_id: None,
                position_id: Some(f.position),
            })
            .expect("list");
        assert_eq!(by_position.len(), 2);
    }
}
