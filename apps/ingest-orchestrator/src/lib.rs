// [apps/ingest-orchestrator/src/lib.rs]
//! Library surface for the batch (C7) and incremental (C8) boundary
//! ingestion orchestrators. `main.rs` is a thin CLI shell over this.

pub mod batch;
pub mod checkpoint_io;
pub mod errors;
pub mod incremental;
pub mod providers;

pub use batch::{snapshot_hash, BatchIngestResult, BatchOrchestrator};
pub use checkpoint_io::{checkpoint_file_path, new_checkpoint_id, write_checkpoint_file};
pub use errors::OrchestratorError;
pub use incremental::{FullSnapshotSummary, IncrementalOrchestrator, IncrementalRunSummary};
pub use providers::ProviderRegistry;
