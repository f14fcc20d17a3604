// [apps/ingest-orchestrator/src/batch.rs]
//! Batch Ingestion Orchestrator (C7, §4.7): multi-state, multi-layer
//! TIGER downloads with per-batch checkpointing, a consecutive-failure
//! circuit breaker, and DLQ routing for retryable state failures.

use std::collections::BTreeSet;
use std::sync::Arc;

use atlas_boundary_providers::{BoundaryProvider, DownloadOptions, Scope};
use atlas_db_adapter::DatabaseAdapter;
use atlas_download_dlq::{DlqManager, PersistFailureOptions};
use atlas_models::{AtlasError, BatchIngestOptions, CheckpointState, Event, EventKind};
use atlas_validators::count::validate_count;
use chrono::Utc;
use sha2::{Digest, Sha256};
use tokio::sync::Semaphore;
use tracing::{info, instrument, warn};

use crate::checkpoint_io::{new_checkpoint_id, write_checkpoint_file};
use crate::errors::OrchestratorError;

/// Outcome of one state within one batch (§4.7): a state succeeds only
/// if every requested layer succeeds; the first layer failure fails
/// the whole state and stops further layers for it.
#[derive(Debug, Clone)]
enum StateOutcome {
    Success { boundary_count: u64 },
    Failed { retryable: bool, error: String, layer: String },
}

pub struct BatchOrchestrator<D: DatabaseAdapter> {
    db: Arc<D>,
    provider: Arc<dyn BoundaryProvider>,
    dlq: DlqManager<D>,
}

#[derive(Debug, Clone)]
pub struct BatchIngestResult {
    pub checkpoint: CheckpointState,
    pub circuit_breaker_tripped: bool,
}

impl<D: DatabaseAdapter> BatchOrchestrator<D> {
    pub fn new(db: Arc<D>, provider: Arc<dyn BoundaryProvider>, dlq: DlqManager<D>) -> Self {
        Self { db, provider, dlq }
    }

    /// §4.7 contract: iterate `options.states` in batches of
    /// `max_concurrent_states`, writing a checkpoint after every batch.
    #[instrument(skip(self, options), fields(states = options.states.len(), layers = ?options.layers))]
    pub async fn ingest_batch(&self, options: BatchIngestOptions) -> Result<BatchIngestResult, OrchestratorError> {
        let id = new_checkpoint_id();
        let mut checkpoint = CheckpointState::new(id, options);
        self.run_from_checkpoint(&mut checkpoint).await?;
        Ok(BatchIngestResult {
            circuit_breaker_tripped: checkpoint.circuit_open,
            checkpoint,
        })
    }

    /// §4.7 resume contract: loads the checkpoint and restarts with
    /// `pending ∪ (retry_failed ? failed : ∅)`. An empty resulting
    /// pending set is a no-op that returns the stored checkpoint as-is.
    pub async fn resume_from_checkpoint(
        &self,
        checkpoint_id: &str,
        retry_failed: bool,
    ) -> Result<BatchIngestResult, OrchestratorError> {
        let mut checkpoint = self
            .db
            .load_checkpoint(checkpoint_id)
            .await?
            .ok_or_else(|| OrchestratorError::CheckpointNotFound(checkpoint_id.to_string()))?;

        let mut resumed_pending: BTreeSet<String> = checkpoint.pending_states.clone();
        if retry_failed {
            resumed_pending.extend(checkpoint.failed_states.iter().cloned());
            checkpoint.failed_states.clear();
        }
        if resumed_pending.is_empty() {
            return Ok(BatchIngestResult {
                circuit_breaker_tripped: checkpoint.circuit_open,
                checkpoint,
            });
        }
        checkpoint.pending_states = resumed_pending;
        self.run_from_checkpoint(&mut checkpoint).await?;
        Ok(BatchIngestResult {
            circuit_breaker_tripped: checkpoint.circuit_open,
            checkpoint,
        })
    }

    pub async fn reset_circuit_breaker(&self, checkpoint_id: &str) -> Result<CheckpointState, OrchestratorError> {
        let mut checkpoint = self
            .db
            .load_checkpoint(checkpoint_id)
            .await?
            .ok_or_else(|| OrchestratorError::CheckpointNotFound(checkpoint_id.to_string()))?;
        checkpoint.circuit_open = false;
        checkpoint.consecutive_failures = 0;
        checkpoint.updated_at = Utc::now();
        self.db.save_checkpoint(checkpoint.clone()).await?;
        write_checkpoint_file(checkpoint.options.checkpoint_dir.as_ref(), &checkpoint);
        Ok(checkpoint)
    }

    /// §4.7: pulls retryable DLQ rows and reinvokes the provider with
    /// `force_refresh=true`, transitioning DLQ state per outcome.
    pub async fn retry_from_dlq(&self, limit: usize) -> Result<usize, OrchestratorError> {
        let retryable = self.dlq.get_retryable(limit).await?;
        let mut resolved = 0;
        for entry in retryable {
            self.dlq.mark_retrying(&entry.id).await?;
            let opts = DownloadOptions {
                layer: entry.layer.clone(),
                scope: entry
                    .state_fips
                    .clone()
                    .map(Scope::State)
                    .unwrap_or(Scope::National),
                year: entry.year,
                force_refresh: true,
            };
            match self.provider.fetch_layer(&opts).await {
                Ok(_) => {
                    self.dlq.mark_resolved(&entry.id).await?;
                    resolved += 1;
                }
                Err(e) => {
                    self.dlq.increment_attempt(&entry.id).await?;
                    warn!(dlq_id = %entry.id, error = %e, "dlq retry failed again");
                }
            }
        }
        Ok(resolved)
    }

    async fn run_from_checkpoint(&self, checkpoint: &mut CheckpointState) -> Result<(), OrchestratorError> {
        let batch_size = checkpoint.options.max_concurrent_states.max(1);
        let run_id = checkpoint.id.clone();

        loop {
            if checkpoint.circuit_open {
                info!(checkpoint_id = %checkpoint.id, "circuit open, skipping remaining batches");
                break;
            }
            let batch: Vec<String> = checkpoint.pending_states.iter().take(batch_size).cloned().collect();
            if batch.is_empty() {
                break;
            }

            let semaphore = Arc::new(Semaphore::new(batch_size));
            let mut handles = Vec::with_capacity(batch.len());

            for state_fips in &batch {
                let permit = Arc::clone(&semaphore).acquire_owned().await.expect("semaphore not closed");
                let state_fips = state_fips.clone();
                let layers = checkpoint.options.layers.clone();
                let year = checkpoint.options.year;
                let force_refresh = checkpoint.options.force_refresh;
                let provider = Arc::clone(&self.provider);
                let run_id = run_id.clone();
                let db = Arc::clone(&self.db);

                handles.push(tokio::spawn(async move {
                    let _permit = permit;
                    let outcome = ingest_one_state(&provider, &state_fips, &layers, year, force_refresh).await;
                    log_state_event(&db, &run_id, &state_fips, &outcome).await;
                    (state_fips, outcome)
                }));
            }

            for handle in handles {
                let (state_fips, outcome) = handle.await.expect("ingest task does not panic");
                checkpoint.pending_states.remove(&state_fips);
                match outcome {
                    StateOutcome::Success { boundary_count } => {
                        checkpoint.completed_states.insert(state_fips);
                        checkpoint.boundary_count += boundary_count;
                        checkpoint.consecutive_failures = 0;
                    }
                    StateOutcome::Failed { retryable, error, layer } => {
                        checkpoint.failed_states.insert(state_fips.clone());
                        checkpoint.consecutive_failures += 1;
                        if retryable {
                            self.dlq
                                .persist_failure(PersistFailureOptions {
                                    job_id: Some(checkpoint.id.clone()),
                                    url: format!("state={state_fips}"),
                                    layer,
                                    state_fips: Some(state_fips),
                                    year: checkpoint.options.year,
                                    error,
                                    max_attempts: 3,
                                })
                                .await?;
                        }
                        if checkpoint.consecutive_failures >= checkpoint.options.circuit_breaker_threshold {
                            checkpoint.circuit_open = true;
                            warn!(
                                checkpoint_id = %checkpoint.id,
                                threshold = checkpoint.options.circuit_breaker_threshold,
                                "circuit breaker tripped"
                            );
                        }
                    }
                }
            }
            checkpoint.updated_at = Utc::now();
            debug_assert!(checkpoint.is_well_formed());
            if let Err(e) = self.db.save_checkpoint(checkpoint.clone()).await {
                warn!(checkpoint_id = %checkpoint.id, error = %e, "checkpoint db write failed");
            }
            write_checkpoint_file(checkpoint.options.checkpoint_dir.as_ref(), checkpoint);
        }
        Ok(())
    }
}

/// One state: every layer sequential (§4.7 "layers within a state are
/// sequential to keep Census FTP pressure bounded"); the first layer
/// failure stops the remaining layers for this state.
async fn ingest_one_state(
    provider: &Arc<dyn BoundaryProvider>,
    state_fips: &str,
    layers: &[String],
    year: u32,
    force_refresh: bool,
) -> StateOutcome {
    let mut boundary_count = 0u64;
    for layer in layers {
        let opts = DownloadOptions {
            layer: layer.clone(),
            scope: Scope::State(state_fips.to_string()),
            year,
            force_refresh,
        };
        match provider.fetch_layer(&opts).await {
            Ok(boundaries) => {
                let validation = validate_count(layer, Some(state_fips), boundaries.len() as u64);
                if !validation.matches {
                    return StateOutcome::Failed {
                        retryable: false,
                        error: format!("count validation failed for layer {layer}: {:?}", validation.issues),
                        layer: layer.clone(),
                    };
                }
                boundary_count += boundaries.len() as u64;
            }
            Err(e) => {
                let atlas_err: AtlasError = e.into();
                return StateOutcome::Failed {
                    retryable: atlas_err.is_retryable(),
                    error: atlas_err.to_string(),
                    layer: layer.clone(),
                };
            }
        }
    }
    StateOutcome::Success { boundary_count }
}

async fn log_state_event<D: DatabaseAdapter>(db: &Arc<D>, run_id: &str, state_fips: &str, outcome: &StateOutcome) {
    let event = match outcome {
        StateOutcome::Success { boundary_count } => Event::new(run_id, EventKind::Fetch)
            .for_jurisdiction(state_fips)
            .with_payload(serde_json::json!({ "boundary_count": boundary_count })),
        StateOutcome::Failed { error, layer, .. } => Event::new(run_id, EventKind::Error)
            .for_jurisdiction(state_fips)
            .with_payload(serde_json::json!({ "layer": layer }))
            .with_error(error.clone()),
    };
    if let Err(e) = db.log_event(event).await {
        warn!(state_fips, error = %e, "failed to log state event");
    }
}

/// §4.8 snapshot hash: `sha256(sorted_comma_joined(jurisdiction_ids))`.
/// Shared by the batch and incremental orchestrators since both name
/// it identically in §4.7/§4.8.
pub fn snapshot_hash(jurisdiction_ids: &[String]) -> String {
    let mut sorted = jurisdiction_ids.to_vec();
    sorted.sort();
    let joined = sorted.join(",");
    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_hash_is_order_independent() {
        let a = snapshot_hash(&["06".to_string(), "36".to_string()]);
        let b = snapshot_hash(&["36".to_string(), "06".to_string()]);
        assert_eq!(a, b);
    }

    #[test]
    fn snapshot_hash_differs_on_membership_change() {
        let a = snapshot_hash(&["06".to_string()]);
        let b = snapshot_hash(&["06".to_string(), "36".to_string()]);
        assert_ne!(a, b);
    }
}
