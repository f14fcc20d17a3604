// [libs/domain/atlas-models/src/registry.rs]
// =================================================================
// APARATO: REGISTRY ENTRY VARIANTS (C9)
// RESPONSABILIDAD: TIPOS ETIQUETADOS PARA KNOWN/QUARANTINED/AT-LARGE
// =================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// §3: discriminant for why a portal was quarantined rather than
/// soft-deleted silently — each pattern names a concrete prior failure
/// mode so `stats` can bucket by cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuarantinePattern {
    CvraGisUnavailable,
    HybridGisUnavailable,
    ContainmentFailure,
    SingleFeature,
    WardGisUnavailable,
    WrongData,
    ExclusivityTopologyError,
    Unknown,
}

/// One of three variants, discriminated by which NDJSON file the entry
/// was read from (§3, §9) — a tagged sum, not field-probing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum RegistryEntry {
    Known {
        fips: String,
        city_name: String,
        state: String,
        portal_type: String,
        download_url: String,
        feature_count: u32,
        last_verified: DateTime<Utc>,
        confidence: u8,
        discovered_by: String,
        notes: Option<String>,
    },
    Quarantined {
        fips: String,
        city_name: String,
        state: String,
        portal_type: String,
        download_url: String,
        feature_count: u32,
        discovered_by: String,
        notes: Option<String>,
        quarantine_reason: String,
        matched_pattern: QuarantinePattern,
        quarantined_at: DateTime<Utc>,
    },
    AtLarge {
        fips: String,
        city_name: String,
        state: String,
    },
}

impl RegistryEntry {
    pub fn fips(&self) -> &str {
        match self {
            RegistryEntry::Known { fips, .. } => fips,
            RegistryEntry::Quarantined { fips, .. } => fips,
            RegistryEntry::AtLarge { fips, .. } => fips,
        }
    }

    /// Quarantined entries are confidence≡0 by construction (§3).
    pub fn confidence(&self) -> u8 {
        match self {
            RegistryEntry::Known { confidence, .. } => *confidence,
            RegistryEntry::Quarantined { .. } => 0,
            RegistryEntry::AtLarge { .. } => 100,
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            RegistryEntry::Known { .. } => "known-portals",
            RegistryEntry::Quarantined { .. } => "quarantined-portals",
            RegistryEntry::AtLarge { .. } => "at-large-cities",
        }
    }
}
