// [apps/ingest-orchestrator/src/main.rs]
//! CLI shell over the batch (C7) and incremental (C8) orchestrators.
//! Argument parsing itself is out of scope (spec §1); this binary only
//! has to honor the command contracts and exit codes in §6: `ingest
//! batch`, `ingest resume`, `detect incremental|full|force`, each
//! exiting `0` on success and `2` on error.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use atlas_boundary_providers::{BoundaryProvider, TigerBulkProvider};
use atlas_change_detector::{ChangeDetector, ChangeDetectorConfig};
use atlas_db_adapter::{DatabaseAdapter, SqliteAdapter};
use atlas_download_dlq::{BackoffPolicy, DlqManager};
use atlas_ingest_orchestrator::{BatchOrchestrator, IncrementalOrchestrator, ProviderRegistry};
use atlas_models::{BatchIngestOptions, PortalFamily};
use clap::{Parser, Subcommand};
use tracing::error;

#[derive(Parser, Debug)]
#[command(name = "ingest-orchestrator", version, about = "Shadow Atlas batch and incremental boundary ingestion")]
struct Cli {
    /// Path to the durable sqlite store. A fresh file is created if absent.
    #[arg(long, global = true, default_value = "shadow-atlas.sqlite3")]
    db_path: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// §4.7: multi-state, multi-layer batch download with checkpointing.
    Batch {
        #[arg(long, value_delimiter = ',')]
        states: Vec<String>,
        #[arg(long, value_delimiter = ',')]
        layers: Vec<String>,
        #[arg(long, default_value_t = 2024)]
        year: u32,
        #[arg(long, default_value_t = 5)]
        max_concurrent_states: usize,
        #[arg(long, default_value_t = 5)]
        circuit_breaker_threshold: u32,
        #[arg(long, default_value = "./checkpoints")]
        checkpoint_dir: String,
        #[arg(long, default_value_t = false)]
        force_refresh: bool,
    },
    /// §4.7 resume contract.
    Resume {
        #[arg(long)]
        checkpoint: String,
        #[arg(long, default_value_t = true)]
        retry_failed: bool,
    },
    /// §4.8 entry points.
    Detect {
        #[command(subcommand)]
        mode: DetectMode,
    },
}

#[derive(Subcommand, Debug)]
enum DetectMode {
    Incremental,
    Full,
    Force,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    if let Err(e) = run().await {
        error!(error = %e, "ingest-orchestrator command failed");
        eprintln!("error: {e:#}");
        std::process::exit(2);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let db = Arc::new(SqliteAdapter::open(&cli.db_path).context("opening sqlite store")?);

    match cli.command {
        Command::Batch {
            states,
            layers,
            year,
            max_concurrent_states,
            circuit_breaker_threshold,
            checkpoint_dir,
            force_refresh,
        } => {
            let orchestrator = batch_orchestrator(Arc::clone(&db));
            let options = BatchIngestOptions {
                states,
                layers,
                year,
                max_concurrent_states,
                circuit_breaker_threshold,
                checkpoint_dir,
                force_refresh,
            };
            let result = orchestrator.ingest_batch(options).await?;
            print_batch_result(&result);
        }
        Command::Resume { checkpoint, retry_failed } => {
            let orchestrator = batch_orchestrator(Arc::clone(&db));
            let result = orchestrator.resume_from_checkpoint(&checkpoint, retry_failed).await?;
            print_batch_result(&result);
        }
        Command::Detect { mode } => {
            let orchestrator = incremental_orchestrator(Arc::clone(&db));
            match mode {
                DetectMode::Incremental => {
                    let summary = orchestrator.run_incremental_refresh().await?;
                    println!(
                        "run {} — fresh={} skipped={} dlq_enqueued={} errored={}",
                        summary.run_id, summary.fresh, summary.skipped, summary.dlq_enqueued, summary.errored
                    );
                }
                DetectMode::Full => {
                    let summary = orchestrator.run_full_snapshot().await?;
                    println!(
                        "run {} — {} jurisdictions, snapshot {}",
                        summary.run_id, summary.jurisdiction_count, summary.snapshot_hash
                    );
                }
                DetectMode::Force => {
                    let summary = orchestrator.force_check_all().await?;
                    println!(
                        "run {} — fresh={} skipped={} dlq_enqueued={} errored={}",
                        summary.run_id, summary.fresh, summary.skipped, summary.dlq_enqueued, summary.errored
                    );
                }
            }
        }
    }
    Ok(())
}

fn print_batch_result(result: &atlas_ingest_orchestrator::BatchIngestResult) {
    println!(
        "checkpoint {} — completed={} failed={} pending={} circuit_open={} breaker_tripped={}",
        result.checkpoint.id,
        result.checkpoint.completed_states.len(),
        result.checkpoint.failed_states.len(),
        result.checkpoint.pending_states.len(),
        result.checkpoint.circuit_open,
        result.circuit_breaker_tripped,
    );
}

const CACHE_DIR: &str = "./cache";

fn batch_orchestrator<D: DatabaseAdapter>(db: Arc<D>) -> BatchOrchestrator<D> {
    let provider: Arc<dyn BoundaryProvider> = Arc::new(TigerBulkProvider::new(CACHE_DIR));
    let dlq = DlqManager::new(Arc::clone(&db), BackoffPolicy::default());
    BatchOrchestrator::new(db, provider, dlq)
}

fn incremental_orchestrator<D: DatabaseAdapter>(db: Arc<D>) -> IncrementalOrchestrator<D> {
    let providers = Arc::new(
        ProviderRegistry::new().register(PortalFamily::Tiger, Arc::new(TigerBulkProvider::new(CACHE_DIR))),
    );
    let detector = Arc::new(ChangeDetector::new(ChangeDetectorConfig::default()));
    let dlq = DlqManager::new(Arc::clone(&db), BackoffPolicy::default());
    IncrementalOrchestrator::new(db, providers, detector, dlq, 10)
}
