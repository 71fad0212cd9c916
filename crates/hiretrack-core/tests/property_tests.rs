//! # Property-Based Tests
//!
//! Ordering and default-workflow invariants under random operation sequences.

use hiretrack_core::{HireError, StageId, StageInput, Store, WorkflowId, WorkflowInput};
use proptest::collection::vec;
use proptest::prelude::*;
use std::collections::BTreeSet;

// =============================================================================
// OPERATION MODEL
// =============================================================================

#[derive(Debug, Clone)]
enum Op {
    /// Create a stage in workflow `w % n`.
    Create(usize),
    /// Delete the `i % len`-th stage (by order) of workflow `w % n`.
    Delete(usize, usize),
    /// Reorder workflow `w % n` by rotating its stages `k` places.
    Rotate(usize, usize),
    /// Reorder workflow `w % n` with a stage list missing its last entry.
    BadReorder(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => any::<usize>().prop_map(Op::Create),
        2 => (any::<usize>(), any::<usize>()).prop_map(|(w, i)| Op::Delete(w, i)),
        2 => (any::<usize>(), any::<usize>()).prop_map(|(w, k)| Op::Rotate(w, k)),
        1 => any::<usize>().prop_map(Op::BadReorder),
    ]
}

fn ids(store: &Store, workflow: WorkflowId) -> Vec<StageId> {
    store
        .list_stages(workflow)
        .expect("list")
        .into_iter()
        .map(|s| s.id)
        .collect()
}

fn assert_dense(store: &Store, workflow: WorkflowId) -> Result<(), TestCaseError> {
    let orders: Vec<u32> = store
        .list_stages(workflow)
        .expect("list")
        .into_iter()
        .map(|s| s.order)
        .collect();
    let expected: Vec<u32> = (0..orders.len() as u32).collect();
    prop_assert_eq!(orders, expected);
    Ok(())
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// Stage orders stay exactly 0..n after any mix of create/delete/reorder.
    #[test]
    fn stage_order_stays_dense(ops in vec(op(), 1..48)) {
        let store = Store::in_memory().expect("store");
        let workflows: Vec<WorkflowId> = ["Engineering", "Sales"]
            .iter()
            .map(|name| store.create_workflow(WorkflowInput::new(*name)).expect("workflow").workflow.id)
            .collect();
        let pick = |w: usize| workflows[w % workflows.len()];

        for op in ops {
            match op {
                Op::Create(w) => {
                    store.create_stage(pick(w), StageInput::new("Stage")).expect("create");
                }
                Op::Delete(w, i) => {
                    let current = ids(&store, pick(w));
                    if !current.is_empty() {
                        store.delete_stage(pick(w), current[i % current.len()]).expect("delete");
                    }
                }
                Op::Rotate(w, k) => {
                    let mut current = ids(&store, pick(w));
                    if !current.is_empty() {
                        let by = k % current.len();
                        current.rotate_left(by);
                    }
                    let result = store.reorder_stages(pick(w), &current).expect("reorder");
                    let got: Vec<StageId> = result.iter().map(|s| s.id).collect();
                    prop_assert_eq!(got, current);
                }
                Op::BadReorder(w) => {
                    let mut current = ids(&store, pick(w));
                    if current.pop().is_some() {
                        let before = store.list_stages(pick(w)).expect("before");
                        let result = store.reorder_stages(pick(w), &current);
                        prop_assert!(matches!(result, Err(HireError::Validation(_))));
                        prop_assert_eq!(store.list_stages(pick(w)).expect("after"), before);
                    }
                }
            }
            for workflow in &workflows {
                assert_dense(&store, *workflow)?;
            }
        }
    }

    /// At most one default at any time; after set_default(X) only X is default.
    #[test]
    fn single_default_workflow(
        defaults in vec(any::<bool>(), 1..8),
        targets in vec(any::<usize>(), 0..12),
    ) {
        let store = Store::in_memory().expect("store");
        let mut created = Vec::new();
        for (i, is_default) in defaults.iter().enumerate() {
            let detail = store
                .create_workflow(WorkflowInput {
                    is_default: *is_default,
                    ..WorkflowInput::new(format!("Workflow {}", i))
                })
                .expect("create");
            created.push(detail.workflow.id);
        }

        let count_defaults = |store: &Store| -> BTreeSet<WorkflowId> {
            store
                .list_workflows()
                .expect("list")
                .into_iter()
                .filter(|w| w.workflow.is_default)
                .map(|w| w.workflow.id)
                .collect()
        };
        prop_assert!(count_defaults(&store).len() <= 1);

        for target in targets {
            let id = created[target % created.len()];
            store.set_default(id).expect("set default");
            prop_assert_eq!(count_defaults(&store), BTreeSet::from([id]));
        }
    }

    /// Reorder accepts exactly the permutations of the current stage set.
    #[test]
    fn reorder_accepts_only_permutations(
        stage_count in 0usize..8,
        picks in vec(0usize..10, 0..10),
    ) {
        let store = Store::in_memory().expect("store");
        let workflow = store
            .create_workflow(WorkflowInput {
                stages: (0..stage_count).map(|i| StageInput::new(format!("S{}", i))).collect(),
                ..WorkflowInput::new("W")
            })
            .expect("workflow");
        let current: Vec<StageId> = workflow.stages.iter().map(|s| s.id).collect();

        // Indices past the end stand in for foreign ids.
        let requested: Vec<StageId> = picks
            .iter()
            .map(|&i| current.get(i).copied().unwrap_or(StageId(10_000 + i as u64)))
            .collect();

        let is_permutation = requested.len() == current.len()
            && requested.iter().collect::<BTreeSet<_>>() == current.iter().collect::<BTreeSet<_>>();

        let result = store.reorder_stages(workflow.workflow.id, &requested);
        prop_assert_eq!(result.is_ok(), is_permutation);
        assert_dense(&store, workflow.workflow.id)?;
    }
}
