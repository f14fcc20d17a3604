// [libs/infra/db-adapter/src/adapter.rs]
use async_trait::async_trait;
use atlas_models::{Artifact, ChecksumFingerprint, CheckpointState, DlqEntry, Event, Head, Jurisdiction, Source};

use crate::errors::DbError;

/// Thin persistence seam. §3 is explicit that "a `DatabaseAdapter` and
/// a key/value-ish table interface are assumed" — this trait is that
/// interface. It owns storage, not policy: the DLQ backoff state
/// machine lives in `atlas-download-dlq`, the checkpoint resume logic
/// lives in `apps/ingest-orchestrator`. This crate only stores and
/// returns rows.
#[async_trait]
pub trait DatabaseAdapter: Send + Sync {
    async fn upsert_jurisdiction(&self, jurisdiction: Jurisdiction) -> Result<(), DbError>;
    async fn get_jurisdiction(&self, id: &str) -> Result<Option<Jurisdiction>, DbError>;
    async fn list_jurisdictions(&self) -> Result<Vec<Jurisdiction>, DbError>;

    async fn upsert_source(&self, source: Source) -> Result<(), DbError>;
    async fn get_source(&self, id: &str) -> Result<Option<Source>, DbError>;
    async fn list_sources(&self) -> Result<Vec<Source>, DbError>;

    /// Artifacts are append-only (§3): a second `insert_artifact` with
    /// the same `id` is a conflict, not an upsert.
    async fn insert_artifact(&self, artifact: Artifact) -> Result<(), DbError>;
    async fn get_artifact(&self, id: &str) -> Result<Option<Artifact>, DbError>;

    /// At most one head per jurisdiction; repointing is an upsert keyed
    /// by `jurisdiction_id` (§3).
    async fn get_head(&self, jurisdiction_id: &str) -> Result<Option<Head>, DbError>;
    async fn upsert_head(&self, head: Head) -> Result<(), DbError>;

    /// Events are append-only audit trail entries, never mutated.
    async fn log_event(&self, event: Event) -> Result<(), DbError>;
    async fn list_events_for_run(&self, run_id: &str) -> Result<Vec<Event>, DbError>;

    async fn upsert_dlq_entry(&self, entry: DlqEntry) -> Result<(), DbError>;
    async fn get_dlq_entry(&self, id: &str) -> Result<Option<DlqEntry>, DbError>;
    async fn list_dlq_entries(&self) -> Result<Vec<DlqEntry>, DbError>;

    async fn save_checkpoint(&self, checkpoint: CheckpointState) -> Result<(), DbError>;
    async fn load_checkpoint(&self, id: &str) -> Result<Option<CheckpointState>, DbError>;
    async fn list_checkpoints(&self) -> Result<Vec<CheckpointState>, DbError>;

    /// C2's per-source cached fingerprint, updated last in the C8
    /// per-jurisdiction write ordering (§5: "artifact insert → head
    /// upsert → event log → checksum-cache update").
    async fn get_checksum_cache(&self, source_id: &str) -> Result<Option<ChecksumFingerprint>, DbError>;
    async fn upsert_checksum_cache(&self, source_id: &str, fingerprint: ChecksumFingerprint) -> Result<(), DbError>;
}
