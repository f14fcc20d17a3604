// [libs/shared/registry-store/src/store.rs]
//! CRUD + stats + drift-diff over the three NDJSON registry files
//! (§4.9), with the audit-before-mutation ordering (§5, §9) enforced
//! by every mutating method here.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use atlas_models::registry::QuarantinePattern;
use atlas_models::RegistryEntry;
use chrono::{DateTime, Utc};
use fd_lock::RwLock;
use serde::{Deserialize, Serialize};
use std::fs::File;

use crate::audit::{AuditLog, AuditOp, AuditRecord};
use crate::errors::RegistryError;
use crate::ndjson::{read_entries, write_entries};

const KNOWN_FILE: &str = "known-portals";
const QUARANTINED_FILE: &str = "quarantined-portals";
const AT_LARGE_FILE: &str = "at-large-cities";

#[derive(Debug, Clone, Default)]
pub struct AddOptions {
    pub skip_validation: bool,
    pub command: String,
    pub actor: String,
}

#[derive(Debug, Clone)]
pub struct DeleteOptions {
    pub hard: bool,
    pub force: bool,
    pub reason: String,
    pub matched_pattern: QuarantinePattern,
    pub command: String,
    pub actor: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListFilter {
    pub state: Option<String>,
    pub portal_type: Option<String>,
    pub min_confidence: Option<u8>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryStats {
    pub by_state: BTreeMap<String, u32>,
    pub by_portal_type: BTreeMap<String, u32>,
    pub by_quarantine_pattern: BTreeMap<String, u32>,
    /// Histogram buckets: `0-19`, `20-39`, `40-59`, `60-79`, `80-100`.
    pub confidence_histogram: BTreeMap<String, u32>,
    /// `<30d`, `30-90d`, `90-180d`, `>180d`, keyed on `Known.last_verified`.
    pub staleness_buckets: BTreeMap<String, u32>,
    pub by_discovered_by: BTreeMap<String, u32>,
}

pub struct RegistryStore {
    data_dir: PathBuf,
    audit: AuditLog,
}

impl RegistryStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            audit: AuditLog::new(&data_dir),
            data_dir,
        }
    }

    fn path(&self, file: &str) -> PathBuf {
        self.data_dir.join(format!("{file}.ndjson"))
    }

    fn read_all(&self) -> Result<(Vec<RegistryEntry>, Vec<RegistryEntry>, Vec<RegistryEntry>), RegistryError> {
        Ok((
            read_entries(&self.path(KNOWN_FILE))?,
            read_entries(&self.path(QUARANTINED_FILE))?,
            read_entries(&self.path(AT_LARGE_FILE))?,
        ))
    }

    /// §4.9: "Concurrent writers are serialized by an advisory lock on
    /// the directory." A dedicated lock file under `data_dir` is the
    /// lock target; the three registry files themselves are rewritten
    /// only while this guard is held.
    fn acquire_lock(&self) -> Result<RwLock<File>, RegistryError> {
        std::fs::create_dir_all(&self.data_dir)?;
        let lock_path = self.data_dir.join(".registry.lock");
        let file = std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .open(lock_path)?;
        Ok(RwLock::new(file))
    }

    fn find_registry(&self, fips: &str) -> Result<Option<(RegistryEntry, &'static str)>, RegistryError> {
        let (known, quarantined, at_large) = self.read_all()?;
        if let Some(e) = known.into_iter().find(|e| e.fips() == fips) {
            return Ok(Some((e, KNOWN_FILE)));
        }
        if let Some(e) = quarantined.into_iter().find(|e| e.fips() == fips) {
            return Ok(Some((e, QUARANTINED_FILE)));
        }
        if let Some(e) = at_large.into_iter().find(|e| e.fips() == fips) {
            return Ok(Some((e, AT_LARGE_FILE)));
        }
        Ok(None)
    }

    pub fn get(&self, fips: &str) -> Result<Option<(RegistryEntry, &'static str)>, RegistryError> {
        self.find_registry(fips)
    }

    /// §4.9: "FIPS must not exist in any of the three files." A
    /// liveness check against `download_url` is implied unless
    /// `skip_validation` is set; the network check itself lives
    /// upstream (this crate only enforces the uniqueness invariant).
    pub fn add(&self, entry: RegistryEntry, opts: AddOptions) -> Result<(), RegistryError> {
        let mut lock = self.acquire_lock()?;
        let _guard = lock.write()?;

        if self.find_registry(entry.fips())?.is_some() {
            return Err(RegistryError::DuplicateFips(entry.fips().to_string(), entry.file_name()));
        }

        let _ = opts.skip_validation; // liveness-check policy is the caller's concern.

        self.audit.append(&AuditRecord {
            op: AuditOp::Add,
            registry: entry.file_name(),
            fips: entry.fips().to_string(),
            before: None,
            after: Some(entry.clone()),
            reason: None,
            command: opts.command,
            actor: opts.actor,
            ts: Utc::now(),
        })?;

        let file_name = entry.file_name();
        let mut entries = read_entries(&self.path(file_name))?;
        entries.push(entry);
        write_entries(&self.path(file_name), file_name, entries)?;
        Ok(())
    }

    /// Field-level patch via JSON merge (§4.9). `fips` is immutable;
    /// any other top-level field present in `patch` overwrites the
    /// stored value. Patching across registries (e.g. turning a
    /// `Known` into a `Quarantined`) is not this method's job — use
    /// `delete` (soft) for that state transition.
    pub fn update(
        &self,
        fips: &str,
        patch: serde_json::Value,
        command: String,
        actor: String,
    ) -> Result<RegistryEntry, RegistryError> {
        if patch.get("fips").is_some() {
            return Err(RegistryError::ImmutableField("fips"));
        }
        let mut lock = self.acquire_lock()?;
        let _guard = lock.write()?;

        let (before, file_name) = self
            .find_registry(fips)?
            .ok_or_else(|| RegistryError::NotFound(fips.to_string()))?;

        let mut value = serde_json::to_value(&before)?;
        if let (Some(obj), Some(patch_obj)) = (value.as_object_mut(), patch.as_object()) {
            for (k, v) in patch_obj {
                obj.insert(k.clone(), v.clone());
            }
        }
        let after: RegistryEntry = serde_json::from_value(value)?;

        self.audit.append(&AuditRecord {
            op: AuditOp::Update,
            registry: file_name,
            fips: fips.to_string(),
            before: Some(before),
            after: Some(after.clone()),
            reason: None,
            command,
            actor,
            ts: Utc::now(),
        })?;

        let mut entries = read_entries(&self.path(file_name))?;
        if let Some(slot) = entries.iter_mut().find(|e| e.fips() == fips) {
            *slot = after.clone();
        }
        write_entries(&self.path(file_name), file_name, entries)?;
        Ok(after)
    }

    /// Soft delete (default): move to `quarantined-portals` with a
    /// reason and pattern. Hard delete requires `force` (§4.9).
    pub fn delete(&self, fips: &str, opts: DeleteOptions) -> Result<(), RegistryError> {
        let mut lock = self.acquire_lock()?;
        let _guard = lock.write()?;

        let (before, file_name) = self
            .find_registry(fips)?
            .ok_or_else(|| RegistryError::NotFound(fips.to_string()))?;

        if opts.hard && !opts.force {
            return Err(RegistryError::HardDeleteRequiresForce(fips.to_string()));
        }

        let after = if opts.hard {
            None
        } else {
            Some(soft_delete_to_quarantined(&before, &opts.reason, opts.matched_pattern))
        };

        self.audit.append(&AuditRecord {
            op: if opts.hard { AuditOp::Delete } else { AuditOp::Quarantine },
            registry: file_name,
            fips: fips.to_string(),
            before: Some(before),
            after: after.clone(),
            reason: Some(opts.reason),
            command: opts.command,
            actor: opts.actor,
            ts: Utc::now(),
        })?;

        let mut source_entries = read_entries(&self.path(file_name))?;
        source_entries.retain(|e| e.fips() != fips);
        write_entries(&self.path(file_name), file_name, source_entries)?;

        if let Some(quarantined_entry) = after {
            let mut quarantined = read_entries(&self.path(QUARANTINED_FILE))?;
            quarantined.push(quarantined_entry);
            write_entries(&self.path(QUARANTINED_FILE), QUARANTINED_FILE, quarantined)?;
        }
        Ok(())
    }

    pub fn list(&self, filter: &ListFilter) -> Result<Vec<RegistryEntry>, RegistryError> {
        let (known, quarantined, at_large) = self.read_all()?;
        let all = known.into_iter().chain(quarantined).chain(at_large);
        Ok(all
            .filter(|e| entry_matches_filter(e, filter))
            .collect())
    }

    pub fn stats(&self) -> Result<RegistryStats, RegistryError> {
        let (known, quarantined, at_large) = self.read_all()?;
        let mut stats = RegistryStats::default();
        let now = Utc::now();

        for entry in known.iter().chain(at_large.iter()) {
            bump(&mut stats.by_state, state_of(entry));
        }
        for entry in known.iter().chain(quarantined.iter()).chain(at_large.iter()) {
            bump(&mut stats.by_portal_type, portal_type_of(entry));
        }
        for entry in &quarantined {
            if let RegistryEntry::Quarantined { matched_pattern, .. } = entry {
                bump(&mut stats.by_quarantine_pattern, format!("{matched_pattern:?}"));
            }
        }
        for entry in known.iter().chain(quarantined.iter()) {
            bump(&mut stats.confidence_histogram, confidence_bucket(entry.confidence()));
        }
        for entry in &known {
            if let RegistryEntry::Known {
                last_verified,
                discovered_by,
                ..
            } = entry
            {
                bump(&mut stats.staleness_buckets, staleness_bucket(*last_verified, now));
                bump(&mut stats.by_discovered_by, discovered_by.clone());
            }
        }

        Ok(stats)
    }

    /// §4.9: compare the NDJSON registries to the generated code
    /// artifact, producing per-registry `{added, removed, modified,
    /// identical}` with field-level diffs. `generated` is the set of
    /// entries baked into the generated artifact, keyed by FIPS.
    pub fn diff(&self, generated: &[RegistryEntry]) -> Result<DriftReport, RegistryError> {
        let (known, quarantined, at_large) = self.read_all()?;
        Ok(DriftReport {
            known: diff_one(&known, generated, KNOWN_FILE),
            quarantined: diff_one(&quarantined, generated, QUARANTINED_FILE),
            at_large: diff_one(&at_large, generated, AT_LARGE_FILE),
        })
    }
}

fn soft_delete_to_quarantined(
    entry: &RegistryEntry,
    reason: &str,
    matched_pattern: QuarantinePattern,
) -> RegistryEntry {
    let (fips, city_name, state, portal_type, download_url, feature_count, discovered_by, notes) = match entry {
        RegistryEntry::Known {
            fips,
            city_name,
            state,
            portal_type,
            download_url,
            feature_count,
            discovered_by,
            notes,
            ..
        } => (
            fips.clone(),
            city_name.clone(),
            state.clone(),
            portal_type.clone(),
            download_url.clone(),
            *feature_count,
            discovered_by.clone(),
            notes.clone(),
        ),
        RegistryEntry::AtLarge { fips, city_name, state } => (
            fips.clone(),
            city_name.clone(),
            state.clone(),
            "unknown".to_string(),
            String::new(),
            0,
            "registry-delete".to_string(),
            None,
        ),
        RegistryEntry::Quarantined { .. } => unreachable!("already quarantined entries are not re-quarantined"),
    };
    RegistryEntry::Quarantined {
        fips,
        city_name,
        state,
        portal_type,
        download_url,
        feature_count,
        discovered_by,
        notes,
        quarantine_reason: reason.to_string(),
        matched_pattern,
        quarantined_at: Utc::now(),
    }
}

fn state_of(entry: &RegistryEntry) -> String {
    match entry {
        RegistryEntry::Known { state, .. } | RegistryEntry::AtLarge { state, .. } => state.clone(),
        RegistryEntry::Quarantined { state, .. } => state.clone(),
    }
}

fn portal_type_of(entry: &RegistryEntry) -> String {
    match entry {
        RegistryEntry::Known { portal_type, .. } | RegistryEntry::Quarantined { portal_type, .. } => {
            portal_type.clone()
        }
        RegistryEntry::AtLarge { .. } => "at-large".to_string(),
    }
}

fn confidence_bucket(confidence: u8) -> String {
    match confidence {
        0..=19 => "0-19",
        20..=39 => "20-39",
        40..=59 => "40-59",
        60..=79 => "60-79",
        _ => "80-100",
    }
    .to_string()
}

fn staleness_bucket(last_verified: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let days = (now - last_verified).num_days();
    match days {
        d if d < 30 => "<30d",
        d if d < 90 => "30-90d",
        d if d < 180 => "90-180d",
        _ => ">180d",
    }
    .to_string()
}

fn bump(map: &mut BTreeMap<String, u32>, key: String) {
    *map.entry(key).or_insert(0) += 1;
}

fn entry_matches_filter(entry: &RegistryEntry, filter: &ListFilter) -> bool {
    if let Some(state) = &filter.state {
        if &state_of(entry) != state {
            return false;
        }
    }
    if let Some(portal_type) = &filter.portal_type {
        if &portal_type_of(entry) != portal_type {
            return false;
        }
    }
    if let Some(min_confidence) = filter.min_confidence {
        if entry.confidence() < min_confidence {
            return false;
        }
    }
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDiff {
    pub field: String,
    pub ndjson_value: serde_json::Value,
    pub generated_value: serde_json::Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub modified: BTreeMap<String, Vec<FieldDiff>>,
    pub identical: Vec<String>,
}

impl RegistryDiff {
    /// §4.9: exit code 1 indicates out-of-sync; 0 is sync.
    pub fn in_sync(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DriftReport {
    pub known: RegistryDiff,
    pub quarantined: RegistryDiff,
    pub at_large: RegistryDiff,
}

impl DriftReport {
    pub fn in_sync(&self) -> bool {
        self.known.in_sync() && self.quarantined.in_sync() && self.at_large.in_sync()
    }
}

fn diff_one(ndjson: &[RegistryEntry], generated: &[RegistryEntry], registry: &'static str) -> RegistryDiff {
    let generated_for_registry: BTreeMap<&str, &RegistryEntry> = generated
        .iter()
        .filter(|e| e.file_name() == registry)
        .map(|e| (e.fips(), e))
        .collect();
    let ndjson_by_fips: BTreeMap<&str, &RegistryEntry> = ndjson.iter().map(|e| (e.fips(), e)).collect();

    let mut diff = RegistryDiff::default();

    for (fips, ndjson_entry) in &ndjson_by_fips {
        match generated_for_registry.get(fips) {
            None => diff.added.push(fips.to_string()),
            Some(generated_entry) => {
                let field_diffs = field_level_diff(ndjson_entry, generated_entry);
                if field_diffs.is_empty() {
                    diff.identical.push(fips.to_string());
                } else {
                    diff.modified.insert(fips.to_string(), field_diffs);
                }
            }
        }
    }
    for fips in generated_for_registry.keys() {
        if !ndjson_by_fips.contains_key(fips) {
            diff.removed.push(fips.to_string());
        }
    }
    diff.added.sort();
    diff.removed.sort();
    diff.identical.sort();
    diff
}

fn field_level_diff(a: &RegistryEntry, b: &RegistryEntry) -> Vec<FieldDiff> {
    let (Ok(va), Ok(vb)) = (serde_json::to_value(a), serde_json::to_value(b)) else {
        return Vec::new();
    };
    let (Some(oa), Some(ob)) = (va.as_object(), vb.as_object()) else {
        return Vec::new();
    };
    let mut keys: Vec<&String> = oa.keys().chain(ob.keys()).collect();
    keys.sort();
    keys.dedup();
    keys.into_iter()
        .filter_map(|k| {
            let av = oa.get(k).cloned().unwrap_or(serde_json::Value::Null);
            let bv = ob.get(k).cloned().unwrap_or(serde_json::Value::Null);
            if av != bv {
                Some(FieldDiff {
                    field: k.clone(),
                    ndjson_value: av,
                    generated_value: bv,
                })
            } else {
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn at_large(fips: &str, city: &str) -> RegistryEntry {
        RegistryEntry::AtLarge {
            fips: fips.to_string(),
            city_name: city.to_string(),
            state: "CA".to_string(),
        }
    }

    fn opts() -> AddOptions {
        AddOptions {
            skip_validation: true,
            command: "registry add".to_string(),
            actor: "test".to_string(),
        }
    }

    #[test]
    fn add_then_get_round_trips() {
        let dir = tempdir().unwrap();
        let store = RegistryStore::new(dir.path());
        store.add(at_large("0667000", "Palo Alto"), opts()).unwrap();

        let (entry, registry) = store.get("0667000").unwrap().unwrap();
        assert_eq!(registry, AT_LARGE_FILE);
        assert_eq!(entry.fips(), "0667000");
    }

    #[test]
    fn add_rejects_duplicate_fips_across_registries() {
        let dir = tempdir().unwrap();
        let store = RegistryStore::new(dir.path());
        store.add(at_large("0667000", "Palo Alto"), opts()).unwrap();
        let err = store.add(at_large("0667000", "Palo Alto"), opts()).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateFips(_, _)));
    }

    #[test]
    fn soft_delete_moves_entry_to_quarantined() {
        let dir = tempdir().unwrap();
        let store = RegistryStore::new(dir.path());
        store.add(at_large("0667000", "Palo Alto"), opts()).unwrap();

        store
            .delete(
                "0667000",
                DeleteOptions {
                    hard: false,
                    force: false,
                    reason: "wrong data".to_string(),
                    matched_pattern: QuarantinePattern::WrongData,
                    command: "registry delete".to_string(),
                    actor: "test".to_string(),
                },
            )
            .unwrap();

        let (entry, registry) = store.get("0667000").unwrap().unwrap();
        assert_eq!(registry, QUARANTINED_FILE);
        assert!(matches!(entry, RegistryEntry::Quarantined { .. }));
    }

    #[test]
    fn hard_delete_without_force_is_rejected() {
        let dir = tempdir().unwrap();
        let store = RegistryStore::new(dir.path());
        store.add(at_large("0667000", "Palo Alto"), opts()).unwrap();

        let err = store
            .delete(
                "0667000",
                DeleteOptions {
                    hard: true,
                    force: false,
                    reason: "test".to_string(),
                    matched_pattern: QuarantinePattern::Unknown,
                    command: "registry delete --hard".to_string(),
                    actor: "test".to_string(),
                },
            )
            .unwrap_err();
        assert!(matches!(err, RegistryError::HardDeleteRequiresForce(_)));
    }

    #[test]
    fn update_rejects_patching_the_fips_field() {
        let dir = tempdir().unwrap();
        let store = RegistryStore::new(dir.path());
        store.add(at_large("0667000", "Palo Alto"), opts()).unwrap();

        let err = store
            .update(
                "0667000",
                serde_json::json!({"fips": "9999999"}),
                "registry update".to_string(),
                "test".to_string(),
            )
            .unwrap_err();
        assert!(matches!(err, RegistryError::ImmutableField("fips")));
    }

    #[test]
    fn every_mutation_has_a_corresponding_audit_record() {
        let dir = tempdir().unwrap();
        let store = RegistryStore::new(dir.path());
        store.add(at_large("0667000", "Palo Alto"), opts()).unwrap();
        store
            .delete(
                "0667000",
                DeleteOptions {
                    hard: false,
                    force: false,
                    reason: "test".to_string(),
                    matched_pattern: QuarantinePattern::Unknown,
                    command: "registry delete".to_string(),
                    actor: "test".to_string(),
                },
            )
            .unwrap();

        let records = store.audit.read_all().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].op as u8, AuditOp::Add as u8);
    }

    #[test]
    fn diff_reports_out_of_sync_when_ndjson_has_an_entry_absent_from_generated() {
        let dir = tempdir().unwrap();
        let store = RegistryStore::new(dir.path());
        store.add(at_large("0667000", "Palo Alto"), opts()).unwrap();

        let report = store.diff(&[]).unwrap();
        assert!(!report.in_sync());
        assert_eq!(report.at_large.added, vec!["0667000".to_string()]);
    }

    #[test]
    fn diff_reports_in_sync_when_ndjson_matches_generated_exactly() {
        let dir = tempdir().unwrap();
        let store = RegistryStore::new(dir.path());
        let entry = at_large("0667000", "Palo Alto");
        store.add(entry.clone(), opts()).unwrap();

        let report = store.diff(&[entry]).unwrap();
        assert!(report.in_sync());
    }
}
