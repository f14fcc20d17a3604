// [libs/domain/atlas-models/src/source.rs]
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

/// §3: `portal_family ∈ {tiger, arcgis, state-gis, ckan, socrata,
/// arcgis-hub, curated, geojson, shapefile, kml}`. A closed enum per
/// §9's "dynamic typing → variant types" design note, not a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PortalFamily {
    Tiger,
    Arcgis,
    StateGis,
    Ckan,
    Socrata,
    ArcgisHub,
    Curated,
    Geojson,
    Shapefile,
    Kml,
}

/// §3: an ordered sequence of calendar-driven schedule rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UpdateTrigger {
    /// Due when the current month equals `month` (1–12).
    Annual { month: u32 },
    /// Due when the current year is one of `years`. Stored as a small
    /// fixed array since redistricting cycles are sparse (every ~10y).
    Redistricting { years: [u32; 4] },
    /// Due when the current year equals `year`.
    Census { year: u32 },
    /// Never auto-due.
    Manual,
}

impl UpdateTrigger {
    /// §4.2 schedule evaluation: does this trigger fire at `now`?
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self {
            UpdateTrigger::Annual { month } => now.month() == *month,
            UpdateTrigger::Redistricting { years } => {
                years.iter().any(|&y| y == now.year() as u32)
            }
            UpdateTrigger::Census { year } => now.year() as u32 == *year,
            UpdateTrigger::Manual => false,
        }
    }
}

/// `{etag?, last_modified?, checked_at, next_check_at}`. At least one
/// of `etag`/`last_modified` must be non-empty to constitute a
/// fingerprint (§3); the `is_fingerprintable` helper enforces that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecksumFingerprint {
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    pub checked_at: DateTime<Utc>,
    pub next_check_at: Option<DateTime<Utc>>,
}

impl ChecksumFingerprint {
    pub fn is_fingerprintable(&self) -> bool {
        self.etag.as_deref().is_some_and(|s| !s.is_empty())
            || self.last_modified.as_deref().is_some_and(|s| !s.is_empty())
    }

    /// Fingerprints are compared preferring `ETag`, falling back to
    /// `Last-Modified`, matching HTTP HEAD semantics (§4.2).
    pub fn changed_from(&self, other: &ChecksumFingerprint) -> bool {
        match (&self.etag, &other.etag) {
            (Some(a), Some(b)) => return a != b,
            _ => {}
        }
        self.last_modified != other.last_modified
    }
}

/// `{id, url, portal_family, jurisdiction_id, boundary_layer,
/// update_triggers}` (§3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub id: String,
    pub url: String,
    pub portal_family: PortalFamily,
    pub jurisdiction_id: String,
    pub boundary_layer: String,
    pub update_triggers: Vec<UpdateTrigger>,
}

impl Source {
    /// §4.2: due when any trigger matches wall-clock `now`, independent
    /// of `next_check_at` (the caller ORs this with the stored
    /// fingerprint's `next_check_at ≤ now`).
    pub fn is_due_by_schedule(&self, now: DateTime<Utc>) -> bool {
        self.update_triggers.iter().any(|t| t.is_due(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn annual_trigger_fires_only_in_its_month() {
        let trigger = UpdateTrigger::Annual { month: 3 };
        assert!(trigger.is_due(Utc.with_ymd_and_hms(2026, 3, 15, 0, 0, 0).unwrap()));
        assert!(!trigger.is_due(Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).unwrap()));
    }

    #[test]
    fn manual_trigger_never_auto_due() {
        assert!(!UpdateTrigger::Manual.is_due(Utc::now()));
    }

    #[test]
    fn fingerprint_requires_etag_or_last_modified() {
        let none = ChecksumFingerprint {
            etag: None,
            last_modified: None,
            checked_at: Utc::now(),
            next_check_at: None,
        };
        assert!(!none.is_fingerprintable());

        let with_etag = ChecksumFingerprint {
            etag: Some("abc".into()),
            ..none
        };
        assert!(with_etag.is_fingerprintable());
    }

    #[test]
    fn etag_change_takes_priority_over_last_modified() {
        let base = ChecksumFingerprint {
            etag: Some("v1".into()),
            last_modified: Some("Mon".into()),
            checked_at: Utc::now(),
            next_check_at: None,
        };
        let same_etag_different_lm = ChecksumFingerprint {
            last_modified: Some("Tue".into()),
            ..base.clone()
        };
        // ETag identical => not changed, even though Last-Modified differs.
        assert!(!same_etag_different_lm.changed_from(&base));

        let different_etag = ChecksumFingerprint {
            etag: Some("v2".into()),
            ..base.clone()
        };
        assert!(different_etag.changed_from(&base));
    }
}
