//! # Workflows
//!
//! Workflow aggregate operations. The invariant kept here:
//! at most one workflow has `is_default = true`, and once a default exists
//! it can only be moved, never dropped.
//!
//! Making a workflow the default clears every other holder inside the same
//! write transaction ("clear-then-set"), so readers see exactly one default
//! before and after.

use crate::input::{clean, clean_opt};
use crate::interviews::clear_stage_references;
use crate::stages::{insert_stage, ordered_stages, stage_ids};
use crate::storage::{
    Bytes, INTERVIEWS, POSITIONS, Record, STAGES, Store, WORKFLOW_STAGES, WORKFLOWS, next_id, put,
    require, scan,
};
use crate::{
    HireError, Position, Stage, StageId, Workflow, WorkflowDetail, WorkflowId, WorkflowInput,
    WorkflowUpdate,
};
use chrono::{DateTime, Utc};
use redb::{ReadTransaction, ReadableTable, Table};
use std::collections::BTreeSet;

/// The current default workflow, if any.
pub(crate) fn find_default(
    workflows: &impl ReadableTable<u64, Bytes>,
) -> Result<Option<Workflow>, HireError> {
    Ok(scan::<Workflow>(workflows)?
        .into_iter()
        .find(|w| w.is_default))
}

/// Clear `is_default` on every workflow except `keep`.
fn clear_default(
    workflows: &mut Table<'_, u64, Bytes>,
    keep: WorkflowId,
    now: DateTime<Utc>,
) -> Result<(), HireError> {
    for mut workflow in scan::<Workflow>(&*workflows)? {
        if workflow.is_default && workflow.id != keep {
            workflow.is_default = false;
            workflow.updated_at = now;
            put(workflows, &workflow)?;
            tracing::debug!(workflow_id = %workflow.id, "Default cleared");
        }
    }
    Ok(())
}

fn detail(txn: &ReadTransaction, workflow: Workflow) -> Result<WorkflowDetail, HireError> {
    let index = txn.open_table(WORKFLOW_STAGES)?;
    let stages = txn.open_table(STAGES)?;
    let stages = ordered_stages(&index, &stages, workflow.id)?;
    Ok(WorkflowDetail { workflow, stages })
}

impl Store {
    /// Create a workflow, optionally with inline stages and as the new default.
    ///
    /// Inline stages get `order = index`.
    pub fn create_workflow(&self, input: WorkflowInput) -> Result<WorkflowDetail, HireError> {
        input.validate()?;
        let now = Utc::now();

        let created = self.write(|txn| {
            let id = WorkflowId(next_id(txn, Workflow::KIND)?);
            let mut workflows = txn.open_table(WORKFLOWS)?;
            let mut stages = txn.open_table(STAGES)?;
            let mut index = txn.open_table(WORKFLOW_STAGES)?;

            if input.is_default {
                clear_default(&mut workflows, id, now)?;
            }

            let workflow = Workflow {
                id,
                name: clean(&input.name),
                description: clean_opt(input.description.as_deref()),
                is_default: input.is_default,
                created_at: now,
                updated_at: now,
            };
            put(&mut workflows, &workflow)?;

            let mut created_stages = Vec::with_capacity(input.stages.len());
            for (order, stage_input) in input.stages.iter().enumerate() {
                let stage = Stage {
                    id: StageId(next_id(txn, Stage::KIND)?),
                    workflow_id: id,
                    name: clean(&stage_input.name),
                    description: clean_opt(stage_input.description.as_deref()),
                    order: order as u32,
                };
                insert_stage(&mut stages, &mut index, &stage)?;
                created_stages.push(stage);
            }

            Ok(WorkflowDetail {
                workflow,
                stages: created_stages,
            })
        })?;

        tracing::info!(
            workflow_id = %created.workflow.id,
            is_default = created.workflow.is_default,
            stages = created.stages.len(),
            "Workflow created"
        );
        Ok(created)
    }

    /// A workflow with its ordered stages.
    pub fn get_workflow(&self, id: WorkflowId) -> Result<WorkflowDetail, HireError> {
        self.read(|txn| {
            let workflow = {
                let workflows = txn.open_table(WORKFLOWS)?;
                require::<Workflow>(&workflows, id.0)?
            };
            detail(txn, workflow)
        })
    }

    /// Every workflow with its ordered stages, sorted by name then id.
    pub fn list_workflows(&self) -> Result<Vec<WorkflowDetail>, HireError> {
        self.read(|txn| {
            let mut workflows = {
                let table = txn.open_table(WORKFLOWS)?;
                scan::<Workflow>(&table)?
            };
            workflows.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
            workflows
                .into_iter()
                .map(|workflow| detail(txn, workflow))
                .collect()
        })
    }

    /// The default workflow with its ordered stages, if one exists.
    pub fn default_workflow(&self) -> Result<Option<WorkflowDetail>, HireError> {
        self.read(|txn| {
            let default = {
                let workflows = txn.open_table(WORKFLOWS)?;
                find_default(&workflows)?
            };
            default.map(|workflow| detail(txn, workflow)).transpose()
        })
    }

    /// Make a workflow the default.
    ///
    /// A no-op when it already is; otherwise every other holder is cleared
    /// in the same transaction.
    pub fn set_default(&self, id: WorkflowId) -> Result<Workflow, HireError> {
        let (workflow, changed) = self.write(|txn| {
            let mut workflows = txn.open_table(WORKFLOWS)?;
            let mut workflow: Workflow = require(&workflows, id.0)?;
            if workflow.is_default {
                return Ok((workflow, false));
            }

            let now = Utc::now();
            clear_default(&mut workflows, id, now)?;
            workflow.is_default = true;
            workflow.updated_at = now;
            put(&mut workflows, &workflow)?;
            Ok((workflow, true))
        })?;

        if changed {
            tracing::info!(workflow_id = %id, "Default workflow changed");
        }
        Ok(workflow)
    }

    /// Partially update a workflow.
    ///
    /// # Errors
    ///
    /// `PreconditionFailed` when `is_default = false` is requested for the
    /// current default; move the default to another workflow instead.
    pub fn update_workflow(
        &self,
        id: WorkflowId,
        update: WorkflowUpdate,
    ) -> Result<WorkflowDetail, HireError> {
        update.validate()?;

        self.write(|txn| {
            let mut workflows = txn.open_table(WORKFLOWS)?;
            let mut workflow: Workflow = require(&workflows, id.0)?;
            let now = Utc::now();

            match update.is_default {
                Some(false) if workflow.is_default => {
                    return Err(HireError::PreconditionFailed(format!(
                        "workflow {} is the default; make another workflow the default instead",
                        id
                    )));
                }
                Some(true) if !workflow.is_default => {
                    clear_default(&mut workflows, id, now)?;
                    workflow.is_default = true;
                }
                _ => {}
            }
            if let Some(name) = &update.name {
                workflow.name = clean(name);
            }
            if let Some(description) = &update.description {
                workflow.description = clean_opt(description.as_deref());
            }
            workflow.updated_at = now;
            put(&mut workflows, &workflow)?;

            let index = txn.open_table(WORKFLOW_STAGES)?;
            let stages = txn.open_table(STAGES)?;
            let stages = ordered_stages(&index, &stages, id)?;
            Ok(WorkflowDetail { workflow, stages })
        })
    }

    /// Delete a non-default workflow.
    ///
    /// Cascades in one transaction: its stages are removed, interviews at
    /// those stages lose their stage, positions using it fall back to the
    /// default workflow.
    ///
    /// # Errors
    ///
    /// `PreconditionFailed` while the workflow is the default.
    pub fn delete_workflow(&self, id: WorkflowId) -> Result<(), HireError> {
        let (removed_stages, detached_positions) = self.write(|txn| {
            let mut workflows = txn.open_table(WORKFLOWS)?;
            let workflow: Workflow = require(&workflows, id.0)?;
            if workflow.is_default {
                return Err(HireError::PreconditionFailed(format!(
                    "workflow {} is the default and cannot be deleted",
                    id
                )));
            }

            let mut stages = txn.open_table(STAGES)?;
            let mut index = txn.open_table(WORKFLOW_STAGES)?;
            let ids: BTreeSet<StageId> = stage_ids(&index, id)?.into_iter().collect();
            for stage_id in &ids {
                stages.remove(stage_id.0)?;
                index.remove((id.0, stage_id.0))?;
            }

            let now = Utc::now();
            let mut interviews = txn.open_table(INTERVIEWS)?;
            clear_stage_references(&mut interviews, &ids, now)?;

            let mut positions = txn.open_table(POSITIONS)?;
            let mut detached = 0usize;
            for mut position in scan::<Position>(&positions)? {
                if position.workflow_id == Some(id) {
                    position.workflow_id = None;
                    position.updated_at = now;
                    put(&mut positions, &position)?;
                    detached += 1;
                }
            }

            workflows.remove(id.0)?;
            Ok((ids.len(), detached))
        })?;

        tracing::info!(
            workflow_id = %id,
            removed_stages,
            detached_positions,
            "Workflow deleted"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PositionInput, StageInput};

    fn defaults(store: &Store) -> Vec<WorkflowId> {
        store
            .list_workflows()
            .expect("list")
            .into_iter()
            .filter(|w| w.workflow.is_default)
            .map(|w| w.workflow.id)
            .collect()
    }

    fn default_input(name: &str) -> WorkflowInput {
        WorkflowInput {
            is_default: true,
            ..WorkflowInput::new(name)
        }
    }

    #[test]
    fn inline_stages_get_index_order() {
        let store = Store::in_memory().expect("store");
        let input = WorkflowInput {
            stages: vec![
                StageInput::new("Phone Screen"),
                StageInput::new("Onsite"),
                StageInput::new("Offer"),
            ],
            ..WorkflowInput::new("Engineering")
        };
        let created = store.create_workflow(input).expect("create");
        let orders: Vec<u32> = created.stages.iter().map(|s| s.order).collect();
        assert_eq!(orders, vec![0, 1, 2]);

        let fetched = store.get_workflow(created.workflow.id).expect("get");
        assert_eq!(fetched, created);
    }

    #[test]
    fn creating_default_moves_the_flag() {
        let store = Store::in_memory().expect("store");
        let first = store.create_workflow(default_input("D")).expect("D");
        assert_eq!(defaults(&store), vec![first.workflow.id]);

        let second = store.create_workflow(default_input("N")).expect("N");
        assert_eq!(defaults(&store), vec![second.workflow.id]);
        assert!(!store.get_workflow(first.workflow.id).expect("D").workflow.is_default);
    }

    #[test]
    fn set_default_is_idempotent() {
        let store = Store::in_memory().expect("store");
        let a = store.create_workflow(WorkflowInput::new("A")).expect("A");
        let b = store.create_workflow(default_input("B")).expect("B");

        store.set_default(a.workflow.id).expect("set");
        assert_eq!(defaults(&store), vec![a.workflow.id]);
        store.set_default(a.workflow.id).expect("again");
        assert_eq!(defaults(&store), vec![a.workflow.id]);
        assert!(!store.get_workflow(b.workflow.id).expect("B").workflow.is_default);
    }

    #[test]
    fn unsetting_current_default_is_refused() {
        let store = Store::in_memory().expect("store");
        let d = store.create_workflow(default_input("D")).expect("D");
        let err = store
            .update_workflow(
                d.workflow.id,
                WorkflowUpdate {
                    is_default: Some(false),
                    ..WorkflowUpdate::default()
                },
            )
            .expect_err("unset default");
        assert!(matches!(err, HireError::PreconditionFailed(_)));
        assert_eq!(defaults(&store), vec![d.workflow.id]);
    }

    #[test]
    fn update_can_take_the_default() {
        let store = Store::in_memory().expect("store");
        let d = store.create_workflow(default_input("D")).expect("D");
        let other = store.create_workflow(WorkflowInput::new("X")).expect("X");

        let updated = store
            .update_workflow(
                other.workflow.id,
                WorkflowUpdate {
                    name: Some("Sales".to_string()),
                    is_default: Some(true),
                    ..WorkflowUpdate::default()
                },
            )
            .expect("update");
        assert!(updated.workflow.is_default);
        assert_eq!(updated.workflow.name, "Sales");
        assert!(!store.get_workflow(d.workflow.id).expect("D").workflow.is_default);
    }

    #[test]
    fn default_workflow_cannot_be_deleted() {
        let store = Store::in_memory().expect("store");
        let d = store.create_workflow(default_input("D")).expect("D");
        let err = store.delete_workflow(d.workflow.id).expect_err("delete default");
        assert!(matches!(err, HireError::PreconditionFailed(_)));
        assert!(store.get_workflow(d.workflow.id).is_ok());
    }

    #[test]
    fn delete_cascades_stages_and_detaches_positions() {
        let store = Store::in_memory().expect("store");
        let w = store
            .create_workflow(WorkflowInput {
                stages: vec![StageInput::new("A"), StageInput::new("B")],
                ..WorkflowInput::new("W")
            })
            .expect("W");
        let position = store
            .create_position(PositionInput {
                workflow_id: Some(w.workflow.id),
                ..PositionInput::new("Backend Engineer")
            })
            .expect("position");

        store.delete_workflow(w.workflow.id).expect("delete");

        assert!(matches!(
            store.get_workflow(w.workflow.id),
            Err(HireError::NotFound { .. })
        ));
        assert_eq!(store.status().expect("status").stages, 0);
        assert_eq!(
            store.get_position(position.id).expect("position").workflow_id,
            None
        );
    }

    #[test]
    fn list_sorted_by_name() {
        let store = Store::in_memory().expect("store");
        for name in ["Sales", "Engineering", "Design"] {
            store.create_workflow(WorkflowInput::new(name)).expect("create");
        }
        let names: Vec<String> = store
            .list_workflows()
            .expect("list")
            .into_iter()
            .map(|w| w.workflow.name)
            .collect();
        assert_eq!(names, vec!["Design", "Engineering", "Sales"]);
        assert!(store.default_workflow().expect("default").is_none());
    }
}
