// [libs/domain/atlas-models/src/dlq.rs]
// =================================================================
// APARATO: DEAD-LETTER QUEUE ENTRY (C3)
// RESPONSABILIDAD: REGISTRO PERSISTENTE DE DESCARGAS FALLIDAS
// =================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DlqStatus {
    Pending,
    Retrying,
    Exhausted,
    Resolved,
}

/// `{id, job_id?, url, layer, state_fips?, year, attempt_count,
/// max_attempts, last_error, last_attempt_at, next_retry_at?, status,
/// created_at, resolved_at?}` (§3). `id` is a SHA-256–derived
/// deterministic key of `(url, layer, state_fips|"national", year)` so
/// repeated `persist_failure` calls upsert the same row (§4.3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DlqEntry {
    pub id: String,
    pub job_id: Option<String>,
    pub url: String,
    pub layer: String,
    pub state_fips: Option<String>,
    pub year: u32,
    pub attempt_count: u32,
    pub max_attempts: u32,
    pub last_error: String,
    pub last_attempt_at: DateTime<Utc>,
    pub next_retry_at: Option<DateTime<Utc>>,
    pub status: DlqStatus,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl DlqEntry {
    /// Deterministic key so `persist_failure` is idempotent per
    /// `(url, layer, state_fips, year)` (§3, §8).
    pub fn deterministic_id(url: &str, layer: &str, state_fips: Option<&str>, year: u32) -> String {
        let scope = state_fips.unwrap_or("national");
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        hasher.update(b"\0");
        hasher.update(layer.as_bytes());
        hasher.update(b"\0");
        hasher.update(scope.as_bytes());
        hasher.update(b"\0");
        hasher.update(year.to_string().as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_id_is_stable_for_same_key() {
        let a = DlqEntry::deterministic_id("https://x/y.zip", "cd", Some("06"), 2024);
        let b = DlqEntry::deterministic_id("https://x/y.zip", "cd", Some("06"), 2024);
        assert_eq!(a, b);
    }

    #[test]
    fn deterministic_id_defaults_missing_state_to_national() {
        let a = DlqEntry::deterministic_id("https://x/y.zip", "cd", None, 2024);
        let b = DlqEntry::deterministic_id("https://x/y.zip", "cd", Some("national"), 2024);
        assert_eq!(a, b);
    }

    #[test]
    fn deterministic_id_differs_on_any_key_component() {
        let base = DlqEntry::deterministic_id("https://x/y.zip", "cd", Some("06"), 2024);
        assert_ne!(base, DlqEntry::deterministic_id("https://x/z.zip", "cd", Some("06"), 2024));
        assert_ne!(base, DlqEntry::deterministic_id("https://x/y.zip", "sldu", Some("06"), 2024));
        assert_ne!(base, DlqEntry::deterministic_id("https://x/y.zip", "cd", Some("36"), 2024));
        assert_ne!(base, DlqEntry::deterministic_id("https://x/y.zip", "cd", Some("06"), 2020));
    }
}
