//! # redb-backed Storage
//!
//! All records live in a single redb database, providing:
//! - ACID transactions (every multi-row change commits or aborts as a unit)
//! - Crash safety (copy-on-write B-trees)
//! - MVCC (concurrent readers, single writer)
//!
//! ## Layout
//!
//! Each record type has its own `u64 -> postcard bytes` table. Two index
//! tables complement them:
//! - `workflow_stages`: `(workflow_id, stage_id) -> ()` for per-workflow range scans
//! - `user_tokens`: `user_id -> api token`
//!
//! Ids come from per-kind sequences in the `metadata` table and start at 1.
//!
//! Domain operations are `impl Store` blocks spread over the sibling
//! modules (`workflows`, `stages`, `positions`, ...). Helpers here are
//! written against `ReadableTable` so the same code serves read and write
//! transactions.

use crate::{
    Candidate, Feedback, HireError, Interview, Note, Position, SkillAssessment, Stage,
    StoreStatus, User, Workflow,
};
use redb::backends::InMemoryBackend;
use redb::{
    Database, ReadTransaction, ReadableDatabase, ReadableTable, ReadableTableMetadata, Table,
    TableDefinition, WriteTransaction,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;

// =============================================================================
// TABLES
// =============================================================================

pub(crate) const WORKFLOWS: TableDefinition<u64, &[u8]> = TableDefinition::new("workflows");
pub(crate) const STAGES: TableDefinition<u64, &[u8]> = TableDefinition::new("stages");
pub(crate) const POSITIONS: TableDefinition<u64, &[u8]> = TableDefinition::new("positions");
pub(crate) const CANDIDATES: TableDefinition<u64, &[u8]> = TableDefinition::new("candidates");
pub(crate) const NOTES: TableDefinition<u64, &[u8]> = TableDefinition::new("notes");
pub(crate) const INTERVIEWS: TableDefinition<u64, &[u8]> = TableDefinition::new("interviews");
pub(crate) const FEEDBACK: TableDefinition<u64, &[u8]> = TableDefinition::new("feedback");
pub(crate) const SKILL_ASSESSMENTS: TableDefinition<u64, &[u8]> =
    TableDefinition::new("skill_assessments");
pub(crate) const USERS: TableDefinition<u64, &[u8]> = TableDefinition::new("users");

/// Index: (workflow_id, stage_id) -> ()
pub(crate) const WORKFLOW_STAGES: TableDefinition<(u64, u64), ()> =
    TableDefinition::new("workflow_stages");

/// API tokens: user_id -> token
pub(crate) const USER_TOKENS: TableDefinition<u64, &str> = TableDefinition::new("user_tokens");

/// Singleton blobs: key -> postcard bytes
pub(crate) const SINGLETONS: TableDefinition<&str, &[u8]> = TableDefinition::new("singletons");

/// Id sequences: kind -> last issued id
const METADATA: TableDefinition<&str, u64> = TableDefinition::new("metadata");

/// Shorthand for the value type of every record table.
pub(crate) type Bytes = &'static [u8];

// =============================================================================
// ERROR CONVERSION
// =============================================================================

macro_rules! io_error_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for HireError {
                fn from(e: $ty) -> Self {
                    HireError::IoError(e.to_string())
                }
            }
        )*
    };
}

io_error_from!(
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);

// =============================================================================
// RECORDS
// =============================================================================

/// A postcard-encoded row in a `u64`-keyed table.
pub(crate) trait Record: Serialize + DeserializeOwned {
    /// Human-readable kind, used in `NotFound` errors.
    const KIND: &'static str;

    fn key(&self) -> u64;
}

macro_rules! record {
    ($ty:ty, $kind:literal) => {
        impl Record for $ty {
            const KIND: &'static str = $kind;

            fn key(&self) -> u64 {
                self.id.0
            }
        }
    };
}

record!(Workflow, "Workflow");
record!(Stage, "Stage");
record!(Position, "Position");
record!(Candidate, "Candidate");
record!(Note, "Note");
record!(Interview, "Interview");
record!(Feedback, "Feedback");
record!(SkillAssessment, "SkillAssessment");
record!(User, "User");

pub(crate) fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, HireError> {
    postcard::to_allocvec(value).map_err(|e| HireError::SerializationError(e.to_string()))
}

pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, HireError> {
    postcard::from_bytes(bytes).map_err(|e| HireError::SerializationError(e.to_string()))
}

/// Load a record by id.
pub(crate) fn fetch<T: Record>(
    table: &impl ReadableTable<u64, Bytes>,
    id: u64,
) -> Result<Option<T>, HireError> {
    match table.get(id)? {
        Some(data) => Ok(Some(decode(data.value())?)),
        None => Ok(None),
    }
}

/// Load a record by id, failing with `NotFound`.
pub(crate) fn require<T: Record>(
    table: &impl ReadableTable<u64, Bytes>,
    id: u64,
) -> Result<T, HireError> {
    fetch(table, id)?.ok_or(HireError::NotFound { kind: T::KIND, id })
}

/// Load a record referenced from an input field.
///
/// A dangling reference in a request body is the caller's mistake, so it
/// fails with `Validation` on `field` rather than `NotFound`.
pub(crate) fn require_ref<T: Record>(
    table: &impl ReadableTable<u64, Bytes>,
    id: u64,
    field: &str,
) -> Result<T, HireError> {
    fetch(table, id)?
        .ok_or_else(|| HireError::invalid(field, format!("{} {} does not exist", T::KIND, id)))
}

/// Load every record of a table in id order.
pub(crate) fn scan<T: Record>(table: &impl ReadableTable<u64, Bytes>) -> Result<Vec<T>, HireError> {
    let mut records = Vec::new();
    for entry in table.iter()? {
        let (_, value) = entry?;
        records.push(decode(value.value())?);
    }
    Ok(records)
}

/// Insert or overwrite a record.
pub(crate) fn put<T: Record>(table: &mut Table<'_, u64, Bytes>, record: &T) -> Result<(), HireError> {
    let bytes = encode(record)?;
    table.insert(record.key(), bytes.as_slice())?;
    Ok(())
}

/// Issue the next id of a sequence.
///
/// Must not be called while the caller holds the metadata table open.
pub(crate) fn next_id(txn: &WriteTransaction, sequence: &str) -> Result<u64, HireError> {
    let mut meta = txn.open_table(METADATA)?;
    let current = meta.get(sequence)?.map(|v| v.value()).unwrap_or(0);
    let next = current.saturating_add(1);
    meta.insert(sequence, next)?;
    Ok(next)
}

// =============================================================================
// STORE
// =============================================================================

/// Handle to the hiretrack database.
///
/// `Store` is `Send + Sync`; redb serializes writers internally, so a
/// shared `Arc<Store>` is all a server needs.
pub struct Store {
    db: Database,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").finish_non_exhaustive()
    }
}

impl Store {
    /// Open or create a database file at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, HireError> {
        let db = Database::create(path.as_ref())?;
        Self::init(db)
    }

    /// Create a volatile database held entirely in memory.
    pub fn in_memory() -> Result<Self, HireError> {
        let db = Database::builder().create_with_backend(InMemoryBackend::new())?;
        Self::init(db)
    }

    /// Create every table so read transactions never hit a missing table.
    fn init(db: Database) -> Result<Self, HireError> {
        let write_txn = db.begin_write()?;
        {
            for table in [
                WORKFLOWS,
                STAGES,
                POSITIONS,
                CANDIDATES,
                NOTES,
                INTERVIEWS,
                FEEDBACK,
                SKILL_ASSESSMENTS,
                USERS,
            ] {
                let _ = write_txn.open_table(table)?;
            }
            let _ = write_txn.open_table(WORKFLOW_STAGES)?;
            let _ = write_txn.open_table(USER_TOKENS)?;
            let _ = write_txn.open_table(SINGLETONS)?;
            let _ = write_txn.open_table(METADATA)?;
        }
        write_txn.commit()?;
        Ok(Self { db })
    }

    /// Run `f` inside one write transaction.
    ///
    /// Commits when `f` succeeds; aborts (discarding every write) when it fails.
    pub(crate) fn write<T>(
        &self,
        f: impl FnOnce(&WriteTransaction) -> Result<T, HireError>,
    ) -> Result<T, HireError> {
        let write_txn = self.db.begin_write()?;
        match f(&write_txn) {
            Ok(value) => {
                write_txn.commit()?;
                Ok(value)
            }
            Err(e) => {
                if let Err(abort) = write_txn.abort() {
                    tracing::warn!(error = %abort, "Failed to abort write transaction");
                }
                Err(e)
            }
        }
    }

    /// Run `f` against a consistent read snapshot.
    pub(crate) fn read<T>(
        &self,
        f: impl FnOnce(&ReadTransaction) -> Result<T, HireError>,
    ) -> Result<T, HireError> {
        let read_txn = self.db.begin_read()?;
        f(&read_txn)
    }

    /// Row counts for the main tables.
    pub fn status(&self) -> Result<StoreStatus, HireError> {
        self.read(|txn| {
            Ok(StoreStatus {
                workflows: txn.open_table(WORKFLOWS)?.len()?,
                stages: txn.open_table(STAGES)?.len()?,
                positions: txn.open_table(POSITIONS)?.len()?,
                candidates: txn.open_table(CANDIDATES)?.len()?,
                interviews: txn.open_table(INTERVIEWS)?.len()?,
                feedback: txn.open_table(FEEDBACK)?.len()?,
                users: txn.open_table(USERS)?.len()?,
            })
        })
    }

    /// Compact the database file (optional optimization).
    pub fn compact(&mut self) -> Result<bool, HireError> {
        self.db
            .compact()
            .map_err(|e| HireError::IoError(e.to_string()))
    }
}

// =============================================================================
// ERROR LOGGING HELPERS
// =============================================================================

/// Log a failed read and fall back to the default value.
///
/// For display paths (listings, summaries) where an empty result is an
/// acceptable degradation. Write paths must propagate instead.
pub fn log_and_default<T: Default>(result: Result<T, HireError>, context: &str) -> T {
    match result {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(context, error = %e, "Read failed; using empty result");
            T::default()
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WorkflowInput;

    #[test]
    fn sequences_start_at_one_and_increase() {
        let store = Store::in_memory().expect("store");
        let ids = store
            .write(|txn| {
                let a = next_id(txn, "test")?;
                let b = next_id(txn, "test")?;
                let c = next_id(txn, "other")?;
                Ok((a, b, c))
            })
            .expect("ids");
        assert_eq!(ids, (1, 2, 1));
    }

    #[test]
    fn records_are_keyed_by_id_and_missing_ones_name_their_kind() {
        use crate::{Stage, StageId, WorkflowId};

        let store = Store::in_memory().expect("store");
        let stage = Stage {
            id: StageId(4),
            workflow_id: WorkflowId(1),
            name: "Screen".to_string(),
            description: None,
            order: 0,
        };
        store
            .write(|txn| put(&mut txn.open_table(STAGES)?, &stage))
            .expect("put");

        let (found, missing) = store
            .read(|txn| {
                let stages = txn.open_table(STAGES)?;
                Ok((require::<Stage>(&stages, 4)?, require::<Stage>(&stages, 5)))
            })
            .expect("read");
        assert_eq!(found, stage);
        assert!(matches!(
            missing,
            Err(HireError::NotFound { kind: "Stage", id: 5 })
        ));
    }

    #[test]
    fn failed_write_rolls_back() {
        let store = Store::in_memory().expect("store");
        let result: Result<(), HireError> = store.write(|txn| {
            next_id(txn, "test")?;
            Err(HireError::PreconditionFailed("boom".to_string()))
        });
        assert!(result.is_err());

        let id = store.write(|txn| next_id(txn, "test")).expect("id");
        assert_eq!(id, 1, "aborted transaction must not consume the sequence");
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("hiretrack.db");

        {
            let mut store = Store::open(&path).expect("open");
            store
                .create_workflow(WorkflowInput::new("Engineering"))
                .expect("create");
            store.compact().expect("compact");
        }

        let store = Store::open(&path).expect("reopen");
        let workflows = store.list_workflows().expect("list");
        assert_eq!(workflows.len(), 1);
        assert_eq!(workflows[0].workflow.name, "Engineering");
    }

    #[test]
    fn status_counts_rows() {
        let store = Store::in_memory().expect("store");
        assert_eq!(store.status().expect("status"), StoreStatus::default());

        store
            .create_workflow(WorkflowInput::new("Sales"))
            .expect("create");
        assert_eq!(store.status().expect("status").workflows, 1);
    }

    #[test]
    fn log_and_default_swallows_errors() {
        let value: Vec<u32> =
            log_and_default(Err(HireError::IoError("disk".to_string())), "test");
        assert!(value.is_empty());
        assert_eq!(log_and_default(Ok(3u32), "test"), 3);
    }
}
