use async_trait::async_trait;
use thiserror::Error;

use vigil_types::{Violation, ViolationReport, ViolationStatus};

pub mod mem;
pub use mem::InMemoryViolationStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("violation {0} not found")]
    NotFound(i64),
    #[error("conflict: violation {id} is {actual}, expected {expected}")]
    Conflict {
        id: i64,
        expected: ViolationStatus,
        actual: ViolationStatus,
    },
    #[error("storage error: {0}")]
    Storage(String),
}

/// The authoritative violation record store.
///
/// All writes go through `insert` and `transition_status`; records are never
/// deleted and no other field is mutable after insert.
#[async_trait]
pub trait ViolationStore: Send + Sync {
    /// Validate the report, assign the next sequential id, stamp
    /// `status = PENDING` and `created_at = now`, and return the stored copy.
    async fn insert(&self, report: ViolationReport) -> Result<Violation, StoreError>;

    /// All records, most recent first. An empty store yields an empty vec.
    async fn list_all(&self) -> Result<Vec<Violation>, StoreError>;

    async fn get_by_id(&self, id: i64) -> Result<Violation, StoreError>;

    /// Atomic check-and-set on `status`: succeeds only if the record's
    /// current status equals `expected`, otherwise fails with `Conflict`
    /// and mutates nothing. This is the guard against double issuance.
    async fn transition_status(
        &self,
        id: i64,
        expected: ViolationStatus,
        next: ViolationStatus,
    ) -> Result<Violation, StoreError>;
}
