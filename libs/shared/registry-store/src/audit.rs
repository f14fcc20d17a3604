// [libs/shared/registry-store/src/audit.rs]
//! Append-only audit log (§4.9, §6): every mutating registry
//! operation writes a record here *before* the primary NDJSON file is
//! rewritten, so a crash leaves at most one orphaned audit record
//! rather than a primary-file write with no audit trail.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use atlas_models::RegistryEntry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::RegistryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOp {
    Add,
    Update,
    Delete,
    Quarantine,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub op: AuditOp,
    pub registry: &'static str,
    pub fips: String,
    pub before: Option<RegistryEntry>,
    pub after: Option<RegistryEntry>,
    pub reason: Option<String>,
    pub command: String,
    pub actor: String,
    pub ts: DateTime<Utc>,
}

pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join("audit.ndjson"),
        }
    }

    /// Appends one record. NDJSON append is itself atomic for
    /// single-line writes on POSIX filesystems under the directory's
    /// advisory lock (the caller holds that lock for the whole
    /// mutating operation, not just this append).
    pub fn append(&self, record: &AuditRecord) -> Result<(), RegistryError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(file, "{}", serde_json::to_string(record)?)?;
        file.sync_all()?;
        Ok(())
    }

    pub fn read_all(&self) -> Result<Vec<AuditRecord>, RegistryError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let contents = std::fs::read_to_string(&self.path)?;
        contents
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| serde_json::from_str(l).map_err(RegistryError::from))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn appended_records_read_back_in_order() {
        let dir = tempdir().unwrap();
        let log = AuditLog::new(dir.path());
        let record = AuditRecord {
            op: AuditOp::Add,
            registry: "known-portals",
            fips: "0644000".to_string(),
            before: None,
            after: None,
            reason: Some("initial discovery".to_string()),
            command: "registry add --fips 0644000".to_string(),
            actor: "test-actor".to_string(),
            ts: Utc::now(),
        };
        log.append(&record).unwrap();
        log.append(&record).unwrap();

        let all = log.read_all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].fips, "0644000");
    }
}
