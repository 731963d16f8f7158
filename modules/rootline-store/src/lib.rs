//! Persistence layer for the genealogy graph and its work queue.
//!
//! The [`Store`] trait is the storage seam the discovery engine is written
//! against. `PgStore` is the Postgres implementation; `MemoryStore` (behind
//! the `test-support` feature) backs the scenario tests.

pub mod error;
pub mod pg;

#[cfg(any(test, feature = "test-support"))]
pub mod memory;

pub use error::{Result, StoreError};
pub use pg::PgStore;

#[cfg(any(test, feature = "test-support"))]
pub use memory::MemoryStore;

use async_trait::async_trait;
use uuid::Uuid;

use rootline_common::{
    Direction, EnrichmentUpdate, NewMergeLogEntry, NewPerson, NewRelationship, ParentType, Person,
    QueueJob, Relationship, SourceType,
};

/// Typed storage operations used by the discovery engine. All mutations are
/// upserts keyed by unique tuples, so repeated application after a crash is
/// safe.
#[async_trait]
pub trait Store: Send + Sync {
    // --- Persons ---

    async fn person(&self, id: Uuid) -> Result<Option<Person>>;
    async fn person_by_external_id(&self, external_id: &str) -> Result<Option<Person>>;
    /// Case-insensitive exact name lookup.
    async fn person_by_name(&self, name: &str) -> Result<Option<Person>>;
    async fn create_person(&self, new: NewPerson) -> Result<Person>;
    async fn set_external_id(&self, id: Uuid, external_id: &str) -> Result<()>;
    async fn set_birth_year(&self, id: Uuid, year: i32) -> Result<()>;
    async fn mark_researched(&self, id: Uuid) -> Result<()>;
    async fn assign_genesis(&self, id: Uuid, code: &str) -> Result<()>;
    async fn dissolve_genesis(&self, id: Uuid) -> Result<()>;
    async fn genesis_count(&self) -> Result<i64>;
    async fn unresearched(&self, limit: i64) -> Result<Vec<Person>>;
    async fn has_father_edge(&self, person_id: Uuid) -> Result<bool>;
    /// Apply only the present fields of the update; absent fields keep
    /// their stored values.
    async fn apply_enrichment(&self, id: Uuid, update: EnrichmentUpdate) -> Result<()>;
    async fn next_person_missing_details(&self) -> Result<Option<Person>>;
    async fn persons_without_categories(&self, limit: i64) -> Result<Vec<Person>>;
    /// Persons flagged genesis that in fact have a father edge.
    async fn genesis_with_father(&self, limit: i64) -> Result<Vec<Person>>;

    // --- Relationships ---

    async fn relationship(
        &self,
        child_id: Uuid,
        parent_id: Uuid,
        parent_type: ParentType,
    ) -> Result<Option<Relationship>>;
    async fn primary_relationship(
        &self,
        child_id: Uuid,
        parent_type: ParentType,
    ) -> Result<Option<Relationship>>;
    /// Upsert keyed by `(child_id, parent_id, parent_type)`: a conflicting
    /// insert updates confidence instead of duplicating the edge.
    async fn insert_relationship(&self, new: NewRelationship) -> Result<Relationship>;
    async fn set_confidence(&self, relationship_id: Uuid, confidence: f32) -> Result<()>;
    async fn demote_to_branch(&self, relationship_id: Uuid) -> Result<()>;
    async fn promote_to_primary(&self, relationship_id: Uuid) -> Result<()>;
    /// Attach a provenance record, deduplicated by `(relationship_id, url)`.
    async fn add_relationship_source(
        &self,
        relationship_id: Uuid,
        url: &str,
        source_type: SourceType,
    ) -> Result<()>;

    // --- Work queue ---

    /// Insert a pending job unless one already exists for this person.
    async fn enqueue(&self, person_id: Uuid, direction: Direction, priority: i32) -> Result<()>;
    /// Claim the highest-priority, oldest pending job, transitioning it to
    /// `processing`. At most one claimant per job under concurrent access.
    async fn claim_next(&self) -> Result<Option<QueueJob>>;
    async fn complete_job(&self, job_id: Uuid) -> Result<()>;
    /// Return a job to `pending` for another attempt.
    async fn release_job(&self, job_id: Uuid, attempts: i32) -> Result<()>;
    /// Terminal failure (until the next mass reset).
    async fn fail_job(&self, job_id: Uuid, attempts: i32) -> Result<()>;
    async fn failed_count(&self) -> Result<i64>;
    /// Reset all failed jobs to pending with attempts cleared. Returns the
    /// number of jobs revived.
    async fn reset_failed(&self) -> Result<u64>;

    // --- Audit ---

    async fn append_merge_log(&self, entry: NewMergeLogEntry) -> Result<()>;
    async fn log_activity(
        &self,
        person_id: Option<Uuid>,
        person_name: &str,
        action: &str,
        detail: &str,
    ) -> Result<()>;

    // --- Categories ---

    async fn category_by_name(&self, name: &str) -> Result<Option<Uuid>>;
    async fn assign_category(&self, person_id: Uuid, category_id: Uuid) -> Result<()>;
}
