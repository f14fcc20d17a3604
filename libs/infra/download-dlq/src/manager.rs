// [libs/infra/download-dlq/src/manager.rs]
use std::sync::Arc;

use atlas_db_adapter::DatabaseAdapter;
use atlas_models::{DlqEntry, DlqStatus};
use chrono::Utc;
use tracing::{info, instrument, warn};

use crate::backoff::BackoffPolicy;
use crate::errors::DlqError;

/// Arguments to [`DlqManager::persist_failure`]. Mirrors the fields
/// that make up a `DlqEntry`'s deterministic key plus the failure that
/// triggered this call.
#[derive(Debug, Clone)]
pub struct PersistFailureOptions {
    pub job_id: Option<String>,
    pub url: String,
    pub layer: String,
    pub state_fips: Option<String>,
    pub year: u32,
    pub error: String,
    pub max_attempts: u32,
}

pub struct DlqManager<D: DatabaseAdapter> {
    db: Arc<D>,
    backoff: BackoffPolicy,
}

/// Manual impl instead of `#[derive(Clone)]`: the derive would add a
/// spurious `D: Clone` bound even though cloning only touches the
/// `Arc<D>` handle and the `Copy` backoff policy.
impl<D: DatabaseAdapter> Clone for DlqManager<D> {
    fn clone(&self) -> Self {
        Self {
            db: Arc::clone(&self.db),
            backoff: self.backoff,
        }
    }
}

impl<D: DatabaseAdapter> DlqManager<D> {
    pub fn new(db: Arc<D>, backoff: BackoffPolicy) -> Self {
        Self { db, backoff }
    }

    /// §4.3: upsert keyed by the deterministic id. A first failure
    /// starts `pending` with `attempt_count = 1`; a repeat failure on
    /// the same key increments and reschedules, flipping to `exhausted`
    /// once `attempt_count >= max_attempts`.
    #[instrument(skip(self, opts), fields(url = %opts.url, layer = %opts.layer))]
    pub async fn persist_failure(&self, opts: PersistFailureOptions) -> Result<DlqEntry, DlqError> {
        let id = DlqEntry::deterministic_id(
            &opts.url,
            &opts.layer,
            opts.state_fips.as_deref(),
            opts.year,
        );
        let now = Utc::now();
        let existing = self.db.get_dlq_entry(&id).await?;

        let entry = match existing {
            None => DlqEntry {
                id: id.clone(),
                job_id: opts.job_id,
                url: opts.url,
                layer: opts.layer,
                state_fips: opts.state_fips,
                year: opts.year,
                attempt_count: 1,
                max_attempts: opts.max_attempts,
                last_error: opts.error,
                last_attempt_at: now,
                next_retry_at: Some(now + self.backoff.delay_for_attempt(1)),
                status: DlqStatus::Pending,
                created_at: now,
                resolved_at: None,
            },
            Some(mut row) => {
                row.attempt_count += 1;
                row.last_error = opts.error;
                row.last_attempt_at = now;
                row.status = if row.attempt_count >= row.max_attempts {
                    DlqStatus::Exhausted
                } else {
                    row.status
                };
                row.next_retry_at = if row.status == DlqStatus::Exhausted {
                    None
                } else {
                    Some(now + self.backoff.delay_for_attempt(row.attempt_count))
                };
                row
            }
        };

        if entry.status == DlqStatus::Exhausted {
            warn!(id = %entry.id, attempts = entry.attempt_count, "dlq entry exhausted");
        } else {
            info!(id = %entry.id, attempts = entry.attempt_count, "dlq entry persisted");
        }

        self.db.upsert_dlq_entry(entry.clone()).await?;
        Ok(entry)
    }

    /// §4.3: rows in `{pending, retrying}` whose `next_retry_at` is
    /// null or past, ordered by `last_attempt_at` ascending (oldest
    /// failures retried first), capped at `limit`.
    pub async fn get_retryable(&self, limit: usize) -> Result<Vec<DlqEntry>, DlqError> {
        let now = Utc::now();
        let mut rows: Vec<DlqEntry> = self
            .db
            .list_dlq_entries()
            .await?
            .into_iter()
            .filter(|e| matches!(e.status, DlqStatus::Pending | DlqStatus::Retrying))
            .filter(|e| e.next_retry_at.map_or(true, |t| t <= now))
            .collect();
        rows.sort_by_key(|e| e.last_attempt_at);
        rows.truncate(limit);
        Ok(rows)
    }

    pub async fn mark_retrying(&self, id: &str) -> Result<DlqEntry, DlqError> {
        self.transition(id, DlqStatus::Retrying, false).await
    }

    /// Resolving is only valid after a retry through the boundary
    /// provider succeeded (§4.3) — this call records that outcome, it
    /// doesn't perform the retry.
    pub async fn mark_resolved(&self, id: &str) -> Result<DlqEntry, DlqError> {
        self.transition(id, DlqStatus::Resolved, true).await
    }

    pub async fn mark_exhausted(&self, id: &str) -> Result<DlqEntry, DlqError> {
        self.transition(id, DlqStatus::Exhausted, false).await
    }

    pub async fn increment_attempt(&self, id: &str) -> Result<DlqEntry, DlqError> {
        let mut entry = self
            .db
            .get_dlq_entry(id)
            .await?
            .ok_or_else(|| DlqError::NotFound(id.to_string()))?;
        entry.attempt_count += 1;
        entry.last_attempt_at = Utc::now();
        if entry.attempt_count >= entry.max_attempts {
            entry.status = DlqStatus::Exhausted;
            entry.next_retry_at = None;
        } else {
            entry.next_retry_at = Some(Utc::now() + self.backoff.delay_for_attempt(entry.attempt_count));
        }
        self.db.upsert_dlq_entry(entry.clone()).await?;
        Ok(entry)
    }

    async fn transition(&self, id: &str, status: DlqStatus, resolved: bool) -> Result<DlqEntry, DlqError> {
        let mut entry = self
            .db
            .get_dlq_entry(id)
            .await?
            .ok_or_else(|| DlqError::NotFound(id.to_string()))?;
        entry.status = status;
        if resolved {
            entry.resolved_at = Some(Utc::now());
            entry.next_retry_at = None;
        }
        self.db.upsert_dlq_entry(entry.clone()).await?;
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlas_db_adapter::InMemoryAdapter;

    fn opts() -> PersistFailureOptions {
        PersistFailureOptions {
            job_id: Some("job_1".into()),
            url: "https://example.test/cd.zip".into(),
            layer: "cd".into(),
            state_fips: Some("06".into()),
            year: 2024,
            error: "timeout".into(),
            max_attempts: 3,
        }
    }

    #[tokio::test]
    async fn first_failure_is_pending_with_one_attempt() {
        let manager = DlqManager::new(Arc::new(InMemoryAdapter::new()), BackoffPolicy::default());
        let entry = manager.persist_failure(opts()).await.unwrap();
        assert_eq!(entry.attempt_count, 1);
        assert_eq!(entry.status, DlqStatus::Pending);
        assert!(entry.next_retry_at.is_some());
    }

    #[tokio::test]
    async fn repeated_failure_on_same_key_increments_and_eventually_exhausts() {
        let manager = DlqManager::new(Arc::new(InMemoryAdapter::new()), BackoffPolicy::default());
        manager.persist_failure(opts()).await.unwrap();
        manager.persist_failure(opts()).await.unwrap();
        let third = manager.persist_failure(opts()).await.unwrap();
        assert_eq!(third.attempt_count, 3);
        assert_eq!(third.status, DlqStatus::Exhausted);
        assert!(third.next_retry_at.is_none());
    }

    #[tokio::test]
    async fn get_retryable_excludes_exhausted_and_resolved() {
        let manager = DlqManager::new(Arc::new(InMemoryAdapter::new()), BackoffPolicy::default());
        let entry = manager.persist_failure(opts()).await.unwrap();
        let retryable = manager.get_retryable(10).await.unwrap();
        assert_eq!(retryable.len(), 1);

        manager.mark_resolved(&entry.id).await.unwrap();
        assert!(manager.get_retryable(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn persist_failure_is_idempotent_on_the_deterministic_key() {
        let manager = DlqManager::new(Arc::new(InMemoryAdapter::new()), BackoffPolicy::default());
        manager.persist_failure(opts()).await.unwrap();
        manager.persist_failure(opts()).await.unwrap();
        let all = manager.db.list_dlq_entries().await.unwrap();
        assert_eq!(all.len(), 1, "same key must upsert, not duplicate rows");
    }
}
