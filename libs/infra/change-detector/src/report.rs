// [libs/infra/change-detector/src/report.rs]
use atlas_models::ChecksumFingerprint;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectTrigger {
    Scheduled,
    Manual,
    Forced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    New,
    Modified,
    Deleted,
}

/// §4.2 output type. `old_checksum` is `None` iff `change_type == New`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeReport {
    pub source_id: String,
    pub url: String,
    pub old_checksum: Option<String>,
    pub new_checksum: Option<String>,
    pub detected_at: DateTime<Utc>,
    pub trigger: DetectTrigger,
    pub change_type: ChangeType,
}

/// What `check_one` found for a single source: either nothing worth
/// reporting, or a `ChangeReport` plus the fingerprint that should be
/// cached going forward.
#[derive(Debug, Clone)]
pub enum DetectionOutcome {
    NoChange,
    /// Both etag and last-modified were absent; the source can't be
    /// fingerprinted at all, so it's treated as unchanged (§4.2).
    Unfingerprintable,
    Changed {
        report: ChangeReport,
        fingerprint: ChecksumFingerprint,
    },
}

fn fingerprint_key(fp: &ChecksumFingerprint) -> Option<String> {
    fp.etag.clone().or_else(|| fp.last_modified.clone())
}

pub(crate) fn checksum_of(fp: Option<&ChecksumFingerprint>) -> Option<String> {
    fp.and_then(fingerprint_key)
}
