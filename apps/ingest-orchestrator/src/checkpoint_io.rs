// [apps/ingest-orchestrator/src/checkpoint_io.rs]
//! Checkpoint ID minting and the on-disk pretty-JSON mirror (§4.7,
//! §6). The `DatabaseAdapter` row is authoritative for resume; the
//! file under `checkpoint_dir` is a best-effort operator-visible copy
//! and a write failure here is logged, not propagated.

use std::path::{Path, PathBuf};

use atlas_models::CheckpointState;
use rand::distributions::Alphanumeric;
use rand::Rng;
use tracing::warn;

/// `ckpt_<unix-millis>_<6-char-random>` (§3, §4.7).
pub fn new_checkpoint_id() -> String {
    let ts = chrono::Utc::now().timestamp_millis();
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect();
    format!("ckpt_{ts}_{suffix}")
}

pub fn checkpoint_file_path(checkpoint_dir: &Path, id: &str) -> PathBuf {
    checkpoint_dir.join(format!("{id}.json"))
}

/// Best-effort; errors are logged rather than surfaced so a full disk
/// or permissions problem never aborts an otherwise-successful batch.
pub fn write_checkpoint_file(checkpoint_dir: &Path, checkpoint: &CheckpointState) {
    if let Err(e) = try_write_checkpoint_file(checkpoint_dir, checkpoint) {
        warn!(checkpoint_id = %checkpoint.id, error = %e, "checkpoint file write failed");
    }
}

fn try_write_checkpoint_file(checkpoint_dir: &Path, checkpoint: &CheckpointState) -> std::io::Result<()> {
    std::fs::create_dir_all(checkpoint_dir)?;
    let path = checkpoint_file_path(checkpoint_dir, &checkpoint.id);
    let body = serde_json::to_string_pretty(checkpoint)?;
    std::fs::write(path, body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minted_ids_have_the_expected_shape_and_are_unique() {
        let a = new_checkpoint_id();
        let b = new_checkpoint_id();
        assert!(a.starts_with("ckpt_"));
        assert_ne!(a, b);
        assert_eq!(a.split('_').count(), 3);
    }
}
