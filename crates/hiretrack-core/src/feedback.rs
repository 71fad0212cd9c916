//! # Feedback
//!
//! Interview feedback and the per-skill assessments attached to it.
//! Deleting feedback removes its assessments in the same transaction.

use crate::input::{clean, clean_opt};
use crate::storage::{
    Bytes, FEEDBACK, INTERVIEWS, Record, SKILL_ASSESSMENTS, Store, next_id, put, require, scan,
};
use crate::{
    Feedback, FeedbackDetail, FeedbackId, FeedbackInput, HireError, Interview, InterviewId,
    SkillAssessment, SkillAssessmentId, UserId,
};
use chrono::Utc;
use redb::{ReadableTable, WriteTransaction};
use std::collections::BTreeSet;

fn attach_skills(
    skills: &impl ReadableTable<u64, Bytes>,
    feedback: Vec<Feedback>,
) -> Result<Vec<FeedbackDetail>, HireError> {
    let all = scan::<SkillAssessment>(skills)?;
    Ok(feedback
        .into_iter()
        .map(|feedback| FeedbackDetail {
            skills: all
                .iter()
                .filter(|s| s.feedback_id == feedback.id)
                .cloned()
                .collect(),
            feedback,
        })
        .collect())
}

/// Delete every feedback entry matching `matches`, with its skill assessments.
///
/// Opens the feedback and skill tables itself; callers must not hold them.
pub(crate) fn delete_feedback_where(
    txn: &WriteTransaction,
    matches: impl Fn(&Feedback) -> bool,
) -> Result<usize, HireError> {
    let mut feedback = txn.open_table(FEEDBACK)?;
    let mut skills = txn.open_table(SKILL_ASSESSMENTS)?;

    let doomed: BTreeSet<FeedbackId> = scan::<Feedback>(&feedback)?
        .into_iter()
        .filter(|f| matches(f))
        .map(|f| f.id)
        .collect();
    for id in &doomed {
        feedback.remove(id.0)?;
    }
    for skill in scan::<SkillAssessment>(&skills)? {
        if doomed.contains(&skill.feedback_id) {
            skills.remove(skill.id.0)?;
        }
    }
    Ok(doomed.len())
}

impl Store {
    /// Record feedback for an interview.
    ///
    /// # Errors
    ///
    /// - `Validation` for bad ratings or text
    /// - `NotFound` if the interview does not exist
    pub fn submit_feedback(
        &self,
        interview_id: InterviewId,
        author_id: Option<UserId>,
        input: FeedbackInput,
    ) -> Result<FeedbackDetail, HireError> {
        input.validate()?;

        let detail = self.write(|txn| {
            {
                let interviews = txn.open_table(INTERVIEWS)?;
                require::<Interview>(&interviews, interview_id.0)?;
            }

            let feedback = Feedback {
                id: FeedbackId(next_id(txn, Feedback::KIND)?),
                interview_id,
                author_id,
                recommendation: input.recommendation,
                rating: input.rating,
                comments: clean_opt(input.comments.as_deref()),
                created_at: Utc::now(),
            };

            let mut skills = Vec::with_capacity(input.skills.len());
            for skill in &input.skills {
                skills.push(SkillAssessment {
                    id: SkillAssessmentId(next_id(txn, SkillAssessment::KIND)?),
                    feedback_id: feedback.id,
                    skill: clean(&skill.skill),
                    rating: skill.rating,
                    notes: clean_opt(skill.notes.as_deref()),
                });
            }

            let mut feedback_table = txn.open_table(FEEDBACK)?;
            put(&mut feedback_table, &feedback)?;
            let mut skill_table = txn.open_table(SKILL_ASSESSMENTS)?;
            for skill in &skills {
                put(&mut skill_table, skill)?;
            }
            Ok(FeedbackDetail { feedback, skills })
        })?;

        tracing::info!(
            interview_id = %interview_id,
            feedback_id = %detail.feedback.id,
            skills = detail.skills.len(),
            "Feedback submitted"
        );
        Ok(detail)
    }

    pub fn get_feedback(&self, id: FeedbackId) -> Result<FeedbackDetail, HireError> {
        self.read(|txn| {
            let feedback = txn.open_table(FEEDBACK)?;
            let skills = txn.open_table(SKILL_ASSESSMENTS)?;
            let entry: Feedback = require(&feedback, id.0)?;
            let mut details = attach_skills(&skills, vec![entry])?;
            details.pop().ok_or(HireError::NotFound {
                kind: Feedback::KIND,
                id: id.0,
            })
        })
    }

    /// Feedback for one interview, oldest first.
    pub fn list_feedback(&self, interview_id: InterviewId) -> Result<Vec<FeedbackDetail>, HireError> {
        self.read(|txn| {
            let interviews = txn.open_table(INTERVIEWS)?;
            require::<Interview>(&interviews, interview_id.0)?;

            let feedback = txn.open_table(FEEDBACK)?;
            let skills = txn.open_table(SKILL_ASSESSMENTS)?;
            let entries = scan::<Feedback>(&feedback)?
                .into_iter()
                .filter(|f| f.interview_id == interview_id)
                .collect();
            attach_skills(&skills, entries)
        })
    }

    pub fn delete_feedback(&self, id: FeedbackId) -> Result<(), HireError> {
        self.write(|txn| {
            {
                let feedback = txn.open_table(FEEDBACK)?;
                require::<Feedback>(&feedback, id.0)?;
            }
            delete_feedback_where(txn, |f| f.id == id)
        })?;
        tracing::info!(feedback_id = %id, "Feedback deleted");
        Ok(())
    }
}
