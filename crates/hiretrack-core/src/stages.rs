//! # Stage Ordering Engine
//!
//! Keeps the stages of every workflow densely ordered: for a workflow with
//! `n` stages the `order` values are exactly `0..n`, each once.
//!
//! - Create appends at `max + 1` (0 for an empty workflow).
//! - Delete removes the stage and shifts every higher sibling down by one.
//! - Reorder replaces the whole assignment from a full permutation of ids.
//!
//! Each operation runs in a single write transaction, so a concurrent
//! reader never observes a gap or a duplicate.

use crate::input::{clean, clean_opt};
use crate::interviews::clear_stage_references;
use crate::primitives::MAX_STAGES_PER_WORKFLOW;
use crate::storage::{
    Bytes, INTERVIEWS, Record, STAGES, Store, WORKFLOW_STAGES, WORKFLOWS, next_id, put, require,
};
use crate::{FieldError, HireError, Stage, StageId, StageInput, StageUpdate, Workflow, WorkflowId};
use chrono::Utc;
use redb::{ReadableTable, Table};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// TABLE HELPERS
// =============================================================================

/// Ids of every stage in a workflow, via the `(workflow, stage)` index.
pub(crate) fn stage_ids(
    index: &impl ReadableTable<(u64, u64), ()>,
    workflow_id: WorkflowId,
) -> Result<Vec<StageId>, HireError> {
    let mut ids = Vec::new();
    for entry in index.range((workflow_id.0, 0u64)..=(workflow_id.0, u64::MAX))? {
        let (key, _) = entry?;
        ids.push(StageId(key.value().1));
    }
    Ok(ids)
}

/// Stages of a workflow sorted by `order`.
pub(crate) fn ordered_stages(
    index: &impl ReadableTable<(u64, u64), ()>,
    stages: &impl ReadableTable<u64, Bytes>,
    workflow_id: WorkflowId,
) -> Result<Vec<Stage>, HireError> {
    let mut list = stage_ids(index, workflow_id)?
        .into_iter()
        .map(|id| require::<Stage>(stages, id.0))
        .collect::<Result<Vec<_>, _>>()?;
    list.sort_by_key(|s| (s.order, s.id));
    Ok(list)
}

/// Load a stage, treating a stage of another workflow as missing.
fn require_in(
    stages: &impl ReadableTable<u64, Bytes>,
    workflow_id: WorkflowId,
    stage_id: StageId,
) -> Result<Stage, HireError> {
    let stage: Stage = require(stages, stage_id.0)?;
    if stage.workflow_id != workflow_id {
        return Err(HireError::NotFound {
            kind: Stage::KIND,
            id: stage_id.0,
        });
    }
    Ok(stage)
}

/// Insert a stage and its index entry.
pub(crate) fn insert_stage(
    stages: &mut Table<'_, u64, Bytes>,
    index: &mut Table<'_, (u64, u64), ()>,
    stage: &Stage,
) -> Result<(), HireError> {
    put(stages, stage)?;
    index.insert((stage.workflow_id.0, stage.id.0), ())?;
    Ok(())
}

fn touch_workflow(
    workflows: &mut Table<'_, u64, Bytes>,
    workflow_id: WorkflowId,
) -> Result<(), HireError> {
    let mut workflow: Workflow = require(&*workflows, workflow_id.0)?;
    workflow.updated_at = Utc::now();
    put(workflows, &workflow)
}

/// Check that `requested` is exactly a permutation of `current`.
fn check_permutation(
    workflow_id: WorkflowId,
    current: &[Stage],
    requested: &[StageId],
) -> Result<(), HireError> {
    let members: BTreeSet<StageId> = current.iter().map(|s| s.id).collect();
    let mut seen = BTreeSet::new();
    let mut errors = Vec::new();

    for id in requested {
        if !members.contains(id) {
            errors.push(FieldError::new(
                "stageIds",
                format!("stage {} does not belong to workflow {}", id, workflow_id),
            ));
        } else if !seen.insert(*id) {
            errors.push(FieldError::new(
                "stageIds",
                format!("stage {} appears more than once", id),
            ));
        }
    }

    let missing: Vec<String> = members
        .difference(&seen)
        .map(ToString::to_string)
        .collect();
    if requested.len() != members.len() || !missing.is_empty() {
        errors.push(FieldError::new(
            "stageIds",
            format!(
                "expected all {} stages of the workflow, got {} (missing: [{}])",
                members.len(),
                requested.len(),
                missing.join(", ")
            ),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(HireError::Validation(errors))
    }
}

// =============================================================================
// OPERATIONS
// =============================================================================

impl Store {
    /// Append a stage at the end of a workflow.
    ///
    /// # Errors
    ///
    /// - `Validation` for bad input
    /// - `NotFound` if the workflow does not exist
    /// - `PreconditionFailed` if the workflow already holds `MAX_STAGES_PER_WORKFLOW` stages
    pub fn create_stage(&self, workflow_id: WorkflowId, input: StageInput) -> Result<Stage, HireError> {
        input.validate()?;

        let stage = self.write(|txn| {
            let mut workflows = txn.open_table(WORKFLOWS)?;
            let mut stages = txn.open_table(STAGES)?;
            let mut index = txn.open_table(WORKFLOW_STAGES)?;

            touch_workflow(&mut workflows, workflow_id)?;

            let existing = ordered_stages(&index, &stages, workflow_id)?;
            if existing.len() >= MAX_STAGES_PER_WORKFLOW {
                return Err(HireError::PreconditionFailed(format!(
                    "workflow {} already has the maximum of {} stages",
                    workflow_id, MAX_STAGES_PER_WORKFLOW
                )));
            }
            let order = existing
                .iter()
                .map(|s| s.order)
                .max()
                .map_or(0, |max| max.saturating_add(1));

            let stage = Stage {
                id: StageId(next_id(txn, Stage::KIND)?),
                workflow_id,
                name: clean(&input.name),
                description: clean_opt(input.description.as_deref()),
                order,
            };
            insert_stage(&mut stages, &mut index, &stage)?;
            Ok(stage)
        })?;

        tracing::info!(
            workflow_id = %workflow_id,
            stage_id = %stage.id,
            order = stage.order,
            "Stage created"
        );
        Ok(stage)
    }

    /// Fetch one stage of a workflow.
    pub fn get_stage(&self, workflow_id: WorkflowId, stage_id: StageId) -> Result<Stage, HireError> {
        self.read(|txn| {
            let stages = txn.open_table(STAGES)?;
            require_in(&stages, workflow_id, stage_id)
        })
    }

    /// Stages of a workflow sorted by `order`.
    ///
    /// # Errors
    ///
    /// `NotFound` if the workflow does not exist.
    pub fn list_stages(&self, workflow_id: WorkflowId) -> Result<Vec<Stage>, HireError> {
        self.read(|txn| {
            let workflows = txn.open_table(WORKFLOWS)?;
            require::<Workflow>(&workflows, workflow_id.0)?;
            let stages = txn.open_table(STAGES)?;
            let index = txn.open_table(WORKFLOW_STAGES)?;
            ordered_stages(&index, &stages, workflow_id)
        })
    }

    /// Change a stage's name or description. The order is left untouched.
    pub fn update_stage(
        &self,
        workflow_id: WorkflowId,
        stage_id: StageId,
        update: StageUpdate,
    ) -> Result<Stage, HireError> {
        update.validate()?;

        self.write(|txn| {
            let mut workflows = txn.open_table(WORKFLOWS)?;
            let mut stages = txn.open_table(STAGES)?;

            let mut stage = require_in(&stages, workflow_id, stage_id)?;
            if let Some(name) = &update.name {
                stage.name = clean(name);
            }
            if let Some(description) = &update.description {
                stage.description = clean_opt(description.as_deref());
            }
            put(&mut stages, &stage)?;
            touch_workflow(&mut workflows, workflow_id)?;
            Ok(stage)
        })
    }

    /// Delete a stage and close the gap it leaves.
    ///
    /// In one transaction: the stage row and its index entry are removed,
    /// every sibling with a higher order moves down by one, and interviews
    /// pointing at the stage lose their stage reference.
    ///
    /// # Errors
    ///
    /// `NotFound` if the stage does not exist or belongs to another workflow.
    pub fn delete_stage(&self, workflow_id: WorkflowId, stage_id: StageId) -> Result<(), HireError> {
        let (shifted, detached) = self.write(|txn| {
            let mut workflows = txn.open_table(WORKFLOWS)?;
            let mut stages = txn.open_table(STAGES)?;
            let mut index = txn.open_table(WORKFLOW_STAGES)?;
            let mut interviews = txn.open_table(INTERVIEWS)?;

            let stage = require_in(&stages, workflow_id, stage_id)?;
            stages.remove(stage_id.0)?;
            index.remove((workflow_id.0, stage_id.0))?;

            let mut shifted = 0usize;
            for mut sibling in ordered_stages(&index, &stages, workflow_id)? {
                if sibling.order > stage.order {
                    sibling.order -= 1;
                    put(&mut stages, &sibling)?;
                    shifted += 1;
                }
            }

            let detached =
                clear_stage_references(&mut interviews, &BTreeSet::from([stage_id]), Utc::now())?;
            touch_workflow(&mut workflows, workflow_id)?;
            Ok((shifted, detached))
        })?;

        tracing::info!(
            workflow_id = %workflow_id,
            stage_id = %stage_id,
            shifted,
            detached_interviews = detached,
            "Stage deleted"
        );
        Ok(())
    }

    /// Replace the order of every stage in a workflow.
    ///
    /// `stage_ids` must be exactly a permutation of the workflow's current
    /// stages; stage `stage_ids[i]` gets `order = i`. Returns the stages in
    /// their new order.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the workflow does not exist
    /// - `Validation` (nothing written) if the ids are not a permutation
    pub fn reorder_stages(
        &self,
        workflow_id: WorkflowId,
        stage_ids: &[StageId],
    ) -> Result<Vec<Stage>, HireError> {
        let reordered = self.write(|txn| {
            let mut workflows = txn.open_table(WORKFLOWS)?;
            let mut stages = txn.open_table(STAGES)?;
            let index = txn.open_table(WORKFLOW_STAGES)?;

            require::<Workflow>(&workflows, workflow_id.0)?;
            let current = ordered_stages(&index, &stages, workflow_id)?;
            check_permutation(workflow_id, &current, stage_ids)?;

            let mut by_id: BTreeMap<StageId, Stage> =
                current.into_iter().map(|s| (s.id, s)).collect();
            let mut reordered = Vec::with_capacity(stage_ids.len());
            for (position, id) in stage_ids.iter().enumerate() {
                if let Some(mut stage) = by_id.remove(id) {
                    stage.order = position as u32;
                    put(&mut stages, &stage)?;
                    reordered.push(stage);
                }
            }

            if !reordered.is_empty() {
                touch_workflow(&mut workflows, workflow_id)?;
            }
            Ok(reordered)
        })?;

        tracing::info!(workflow_id = %workflow_id, stages = reordered.len(), "Stages reordered");
        Ok(reordered)
    }
}

// =============================================================================
// TESTS
// =============================================================================
