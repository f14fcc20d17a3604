// [libs/infra/db-adapter/src/memory.rs]
use std::collections::HashMap;

use async_trait::async_trait;
use atlas_models::{Artifact, ChecksumFingerprint, CheckpointState, DlqEntry, Event, Head, Jurisdiction, Source};
use tokio::sync::RwLock;

use crate::adapter::DatabaseAdapter;
use crate::errors::DbError;

/// Reference `DatabaseAdapter` for tests and local runs. Each table
/// gets its own lock so a write to `sources` never blocks a read of
/// `events` — mirroring §5's "mutating operations serialize under a
/// per-table lock" rather than a single global mutex.
#[derive(Default)]
pub struct InMemoryAdapter {
    jurisdictions: RwLock<HashMap<String, Jurisdiction>>,
    sources: RwLock<HashMap<String, Source>>,
    artifacts: RwLock<HashMap<String, Artifact>>,
    heads: RwLock<HashMap<String, Head>>,
    events: RwLock<Vec<Event>>,
    dlq: RwLock<HashMap<String, DlqEntry>>,
    checkpoints: RwLock<HashMap<String, CheckpointState>>,
    checksum_cache: RwLock<HashMap<String, ChecksumFingerprint>>,
}

impl InMemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DatabaseAdapter for InMemoryAdapter {
    async fn upsert_jurisdiction(&self, jurisdiction: Jurisdiction) -> Result<(), DbError> {
        self.jurisdictions
            .write()
            .await
            .insert(jurisdiction.id.clone(), jurisdiction);
        Ok(())
    }

    async fn get_jurisdiction(&self, id: &str) -> Result<Option<Jurisdiction>, DbError> {
        Ok(self.jurisdictions.read().await.get(id).cloned())
    }

    async fn list_jurisdictions(&self) -> Result<Vec<Jurisdiction>, DbError> {
        Ok(self.jurisdictions.read().await.values().cloned().collect())
    }

    async fn upsert_source(&self, source: Source) -> Result<(), DbError> {
        self.sources.write().await.insert(source.id.clone(), source);
        Ok(())
    }

    async fn get_source(&self, id: &str) -> Result<Option<Source>, DbError> {
        Ok(self.sources.read().await.get(id).cloned())
    }

    async fn list_sources(&self) -> Result<Vec<Source>, DbError> {
        Ok(self.sources.read().await.values().cloned().collect())
    }

    async fn insert_artifact(&self, artifact: Artifact) -> Result<(), DbError> {
        let mut guard = self.artifacts.write().await;
        if guard.contains_key(&artifact.id) {
            return Err(DbError::Conflict(format!(
                "artifact {} already exists (artifacts are append-only)",
                artifact.id
            )));
        }
        guard.insert(artifact.id.clone(), artifact);
        Ok(())
    }

    async fn get_artifact(&self, id: &str) -> Result<Option<Artifact>, DbError> {
        Ok(self.artifacts.read().await.get(id).cloned())
    }

    async fn get_head(&self, jurisdiction_id: &str) -> Result<Option<Head>, DbError> {
        Ok(self.heads.read().await.get(jurisdiction_id).cloned())
    }

    async fn upsert_head(&self, head: Head) -> Result<(), DbError> {
        self.heads
            .write()
            .await
            .insert(head.jurisdiction_id.clone(), head);
        Ok(())
    }

    async fn log_event(&self, event: Event) -> Result<(), DbError> {
        self.events.write().await.push(event);
        Ok(())
    }

    async fn list_events_for_run(&self, run_id: &str) -> Result<Vec<Event>, DbError> {
        Ok(self
            .events
            .read()
            .await
            .iter()
            .filter(|e| e.run_id == run_id)
            .cloned()
            .collect())
    }

    async fn upsert_dlq_entry(&self, entry: DlqEntry) -> Result<(), DbError> {
        self.dlq.write().await.insert(entry.id.clone(), entry);
        Ok(())
    }

    async fn get_dlq_entry(&self, id: &str) -> Result<Option<DlqEntry>, DbError> {
        Ok(self.dlq.read().await.get(id).cloned())
    }

    async fn list_dlq_entries(&self) -> Result<Vec<DlqEntry>, DbError> {
        Ok(self.dlq.read().await.values().cloned().collect())
    }

    async fn save_checkpoint(&self, checkpoint: CheckpointState) -> Result<(), DbError> {
        self.checkpoints
            .write()
            .await
            .insert(checkpoint.id.clone(), checkpoint);
        Ok(())
    }

    async fn load_checkpoint(&self, id: &str) -> Result<Option<CheckpointState>, DbError> {
        Ok(self.checkpoints.read().await.get(id).cloned())
    }

    async fn list_checkpoints(&self) -> Result<Vec<CheckpointState>, DbError> {
        Ok(self.checkpoints.read().await.values().cloned().collect())
    }

    async fn get_checksum_cache(&self, source_id: &str) -> Result<Option<ChecksumFingerprint>, DbError> {
        Ok(self.checksum_cache.read().await.get(source_id).cloned())
    }

    async fn upsert_checksum_cache(&self, source_id: &str, fingerprint: ChecksumFingerprint) -> Result<(), DbError> {
        self.checksum_cache
            .write()
            .await
            .insert(source_id.to_string(), fingerprint);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlas_models::{EventKind, JurisdictionType};

    fn jurisdiction(id: &str) -> Jurisdiction {
        Jurisdiction::new(id, format!("Jurisdiction {id}"), JurisdictionType::State)
    }

    #[tokio::test]
    async fn upsert_then_get_round_trips() {
        let db = InMemoryAdapter::new();
        db.upsert_jurisdiction(jurisdiction("06")).await.unwrap();
        let got = db.get_jurisdiction("06").await.unwrap();
        assert_eq!(got.unwrap().id, "06");
    }

    #[tokio::test]
    async fn missing_row_is_none_not_error() {
        let db = InMemoryAdapter::new();
        assert!(db.get_source("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn inserting_a_duplicate_artifact_id_conflicts() {
        let db = InMemoryAdapter::new();
        let artifact = Artifact {
            id: "art_1".into(),
            jurisdiction_id: "06".into(),
            content_sha256: "abc".into(),
            record_count: 10,
            bbox: None,
            etag: None,
            last_modified: None,
            created_at: chrono::Utc::now(),
        };
        db.insert_artifact(artifact.clone()).await.unwrap();
        let err = db.insert_artifact(artifact).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict(_)));
    }

    #[tokio::test]
    async fn events_filter_by_run_id() {
        let db = InMemoryAdapter::new();
        db.log_event(Event::new("run_a", EventKind::Fetch)).await.unwrap();
        db.log_event(Event::new("run_b", EventKind::Fetch)).await.unwrap();
        db.log_event(Event::new("run_a", EventKind::Update)).await.unwrap();
        let events = db.list_events_for_run("run_a").await.unwrap();
        assert_eq!(events.len(), 2);
    }

    #[tokio::test]
    async fn checksum_cache_upsert_then_get_round_trips() {
        let db = InMemoryAdapter::new();
        let fp = ChecksumFingerprint {
            etag: Some("v1".into()),
            last_modified: None,
            checked_at: chrono::Utc::now(),
            next_check_at: None,
        };
        db.upsert_checksum_cache("src_1", fp.clone()).await.unwrap();
        let got = db.get_checksum_cache("src_1").await.unwrap().unwrap();
        assert_eq!(got.etag, fp.etag);
    }

    #[tokio::test]
    async fn checksum_cache_miss_is_none() {
        let db = InMemoryAdapter::new();
        assert!(db.get_checksum_cache("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn head_upsert_replaces_previous_pointer() {
        let db = InMemoryAdapter::new();
        let head_v1 = Head {
            jurisdiction_id: "06".into(),
            artifact_id: "art_1".into(),
            updated_at: chrono::Utc::now(),
        };
        let head_v2 = Head {
            artifact_id: "art_2".into(),
            ..head_v1.clone()
        };
        db.upsert_head(head_v1).await.unwrap();
        db.upsert_head(head_v2).await.unwrap();
        let got = db.get_head("06").await.unwrap().unwrap();
        assert_eq!(got.artifact_id, "art_2");
    }
}
