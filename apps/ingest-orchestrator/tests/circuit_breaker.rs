// [apps/ingest-orchestrator/tests/circuit_breaker.rs]
//! §8 scenario 4 ("circuit breaker"): three consecutive state failures
//! trip the breaker at `circuit_breaker_threshold=3`, the remaining
//! batches are skipped, and the tripped checkpoint's `pending_states`
//! stays non-empty for a later `resume_from_checkpoint`.

use std::sync::Arc;

use async_trait::async_trait;
use atlas_boundary_providers::{BoundaryProvider, DownloadOptions, ProviderError, RawFile};
use atlas_db_adapter::InMemoryAdapter;
use atlas_download_dlq::{BackoffPolicy, DlqManager};
use atlas_ingest_orchestrator::BatchOrchestrator;
use atlas_models::{BatchIngestOptions, NormalizedBoundary};

/// Fails (with a retryable network error) for a fixed set of states,
/// succeeds with an empty boundary set for everything else. The layer
/// name used in these tests (`"test-layer"`) has no reference-catalog
/// entry, so the count validator always passes regardless of how many
/// boundaries come back (§4.6: an unknown (layer, state) pair is
/// informational, never an error).
struct FlakyProvider {
    failing_states: Vec<&'static str>,
}

#[async_trait]
impl BoundaryProvider for FlakyProvider {
    async fn download_layer(&self, opts: &DownloadOptions) -> Result<Vec<RawFile>, ProviderError> {
        let state = match &opts.scope {
            atlas_boundary_providers::Scope::State(s) => s.clone(),
            atlas_boundary_providers::Scope::National => "us".to_string(),
        };
        if self.failing_states.iter().any(|&s| s == state) {
            // An unparseable URL fails inside the request builder before
            // any socket is touched, so this yields a genuine
            // `reqwest::Error` synchronously, with no real network I/O.
            let transport_err = reqwest::Client::new()
                .get("not a valid url")
                .send()
                .await
                .expect_err("an unparseable URL never builds a request");
            return Err(ProviderError::Network(transport_err));
        }
        Ok(vec![])
    }

    async fn transform(
        &self,
        _raw_files: Vec<RawFile>,
        _opts: &DownloadOptions,
    ) -> Result<Vec<NormalizedBoundary>, ProviderError> {
        Ok(vec![])
    }
}

fn options(states: &[&str], checkpoint_dir: &std::path::Path) -> BatchIngestOptions {
    BatchIngestOptions {
        states: states.iter().map(|s| s.to_string()).collect(),
        layers: vec!["test-layer".to_string()],
        year: 2024,
        max_concurrent_states: 2,
        circuit_breaker_threshold: 3,
        checkpoint_dir: checkpoint_dir.to_string_lossy().to_string(),
        force_refresh: false,
    }
}

#[tokio::test]
async fn three_consecutive_state_failures_trip_the_breaker_and_halt_remaining_batches() {
    let db = Arc::new(InMemoryAdapter::new());
    let provider: Arc<dyn BoundaryProvider> = Arc::new(FlakyProvider {
        failing_states: vec!["01", "02", "03"],
    });
    let dlq = DlqManager::new(Arc::clone(&db), BackoffPolicy::default());
    let orchestrator = BatchOrchestrator::new(db, provider, dlq);
    let checkpoint_dir = tempfile::tempdir().unwrap();

    let states = ["01", "02", "03", "04", "05", "06", "07", "08", "09", "10"];
    let result = orchestrator
        .ingest_batch(options(&states, checkpoint_dir.path()))
        .await
        .unwrap();

    assert!(result.circuit_breaker_tripped);
    assert!(result.checkpoint.circuit_open);
    assert!(result.checkpoint.failed_states.contains("01"));
    assert!(result.checkpoint.failed_states.contains("02"));
    assert!(result.checkpoint.failed_states.contains("03"));
    // The breaker trips inside the {03, 04} batch before any state beyond
    // it is ever scheduled — everything from "05" on is still pending.
    assert!(!result.checkpoint.pending_states.is_empty());
    assert!(result.checkpoint.is_well_formed());
}

#[tokio::test]
async fn resetting_the_breaker_lets_a_resumed_run_make_progress_again() {
    let db = Arc::new(InMemoryAdapter::new());
    let provider: Arc<dyn BoundaryProvider> = Arc::new(FlakyProvider {
        failing_states: vec!["01", "02", "03"],
    });
    let dlq = DlqManager::new(Arc::clone(&db), BackoffPolicy::default());
    let orchestrator = BatchOrchestrator::new(db, provider, dlq);
    let checkpoint_dir = tempfile::tempdir().unwrap();

    let states = ["01", "02", "03", "04", "05"];
    let tripped = orchestrator
        .ingest_batch(options(&states, checkpoint_dir.path()))
        .await
        .unwrap();
    assert!(tripped.checkpoint.circuit_open);

    let reset = orchestrator
        .reset_circuit_breaker(&tripped.checkpoint.id)
        .await
        .unwrap();
    assert!(!reset.circuit_open);
    assert_eq!(reset.consecutive_failures, 0);

    // `retry_failed=false`: only the states still sitting in
    // `pending_states` ("05", which the breaker never got to) are
    // resumed, not "01"/"02"/"03" which would just fail again.
    let resumed = orchestrator
        .resume_from_checkpoint(&tripped.checkpoint.id, false)
        .await
        .unwrap();
    assert!(resumed.checkpoint.pending_states.is_empty());
    assert!(resumed.checkpoint.completed_states.contains("05"));
    assert!(!resumed.checkpoint.circuit_open);
}
