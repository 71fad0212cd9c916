//! # Positions
//!
//! Position CRUD and position-to-stage resolution.
//!
//! A position names the workflow its interviews follow. When it names
//! none, the default workflow applies; when there is no default either,
//! the position simply has no stages. That empty result is a valid state,
//! not an error.

use crate::input::{clean, clean_opt};
use crate::interviews::delete_interviews_where;
use crate::stages::ordered_stages;
use crate::storage::{
    Bytes, CANDIDATES, POSITIONS, Record, STAGES, Store, WORKFLOW_STAGES, WORKFLOWS, fetch,
    next_id, put, require, require_ref, scan,
};
use crate::workflows::find_default;
use crate::{
    Candidate, HireError, Position, PositionId, PositionInput, PositionUpdate, Stage, Workflow,
    WorkflowId,
};
use chrono::Utc;
use redb::{ReadableTable, WriteTransaction};

/// Ordered stages usable for interviews at `position`.
pub(crate) fn resolve_for(
    position: &Position,
    workflows: &impl ReadableTable<u64, Bytes>,
    index: &impl ReadableTable<(u64, u64), ()>,
    stages: &impl ReadableTable<u64, Bytes>,
) -> Result<Vec<Stage>, HireError> {
    let own = match position.workflow_id {
        Some(id) => fetch::<Workflow>(workflows, id.0)?,
        None => None,
    };
    let workflow = match own {
        Some(workflow) => Some(workflow),
        None => find_default(workflows)?,
    };
    match workflow {
        Some(workflow) => ordered_stages(index, stages, workflow.id),
        None => Ok(Vec::new()),
    }
}

fn check_workflow(txn: &WriteTransaction, id: Option<WorkflowId>) -> Result<(), HireError> {
    if let Some(id) = id {
        require_ref::<Workflow>(&txn.open_table(WORKFLOWS)?, id.0, "workflowId")?;
    }
    Ok(())
}

impl Store {
    /// Create a position.
    ///
    /// # Errors
    ///
    /// `Validation` for bad input or a `workflow_id` that does not exist.
    pub fn create_position(&self, input: PositionInput) -> Result<Position, HireError> {
        input.validate()?;

        let position = self.write(|txn| {
            check_workflow(txn, input.workflow_id)?;
            let now = Utc::now();
            let position = Position {
                id: PositionId(next_id(txn, Position::KIND)?),
                title: clean(&input.title),
                department: clean_opt(input.department.as_deref()),
                description: clean_opt(input.description.as_deref()),
                workflow_id: input.workflow_id,
                is_active: input.is_active,
                created_at: now,
                updated_at: now,
            };
            put(&mut txn.open_table(POSITIONS)?, &position)?;
            Ok(position)
        })?;

        tracing::info!(position_id = %position.id, title = %position.title, "Position created");
        Ok(position)
    }

    pub fn get_position(&self, id: PositionId) -> Result<Position, HireError> {
        self.read(|txn| require(&txn.open_table(POSITIONS)?, id.0))
    }

    /// Every position, sorted by title then id.
    pub fn list_positions(&self) -> Result<Vec<Position>, HireError> {
        let mut positions: Vec<Position> = self.read(|txn| scan(&txn.open_table(POSITIONS)?))?;
        positions.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(positions)
    }

    /// Partially update a position. `workflow_id: Some(None)` detaches it
    /// from its workflow so it follows the default again.
    pub fn update_position(
        &self,
        id: PositionId,
        update: PositionUpdate,
    ) -> Result<Position, HireError> {
        update.validate()?;

        self.write(|txn| {
            let mut positions = txn.open_table(POSITIONS)?;
            let mut position: Position = require(&positions, id.0)?;

            if let Some(workflow_id) = update.workflow_id {
                check_workflow(txn, workflow_id)?;
                position.workflow_id = workflow_id;
            }
            if let Some(title) = &update.title {
                position.title = clean(title);
            }
            if let Some(department) = &update.department {
                position.department = clean_opt(department.as_deref());
            }
            if let Some(description) = &update.description {
                position.description = clean_opt(description.as_deref());
            }
            if let Some(active) = update.is_active {
                position.is_active = active;
            }
            position.updated_at = Utc::now();
            put(&mut positions, &position)?;
            Ok(position)
        })
    }

    /// Delete a position.
    ///
    /// Its interviews (with their feedback) go with it; candidates applying
    /// to it are kept but detached.
    pub fn delete_position(&self, id: PositionId) -> Result<(), HireError> {
        let (interviews, detached) = self.write(|txn| {
            let mut positions = txn.open_table(POSITIONS)?;
            require::<Position>(&positions, id.0)?;
            positions.remove(id.0)?;

            let interviews = delete_interviews_where(txn, |i| i.position_id == id)?;

            let mut candidates = txn.open_table(CANDIDATES)?;
            let now = Utc::now();
            let mut detached = 0usize;
            for mut candidate in scan::<Candidate>(&candidates)? {
                if candidate.position_id == Some(id) {
                    candidate.position_id = None;
                    candidate.updated_at = now;
                    put(&mut candidates, &candidate)?;
                    detached += 1;
                }
            }
            Ok((interviews, detached))
        })?;

        tracing::info!(
            position_id = %id,
            interviews,
            detached_candidates = detached,
            "Position deleted"
        );
        Ok(())
    }

    /// The ordered stages interviews for a position may use.
    ///
    /// The position's own workflow wins; otherwise the default workflow;
    /// otherwise an empty list.
    ///
    /// # Errors
    ///
    /// `NotFound` if the position does not exist.
    pub fn resolve_stages(&self, id: PositionId) -> Result<Vec<Stage>, HireError> {
        self.read(|txn| {
            let position: Position = require(&txn.open_table(POSITIONS)?, id.0)?;
            let workflows = txn.open_table(WORKFLOWS)?;
            let index = txn.open_table(WORKFLOW_STAGES)?;
            let stages = txn.open_table(STAGES)?;
            resolve_for(&position, &workflows, &index, &stages)
        })
    }
}
