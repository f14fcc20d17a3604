// [libs/shared/registry-store/src/ndjson.rs]
//! NDJSON file discipline (§6, §9): a header line, one JSON object per
//! entry line (no embedded newlines), LF endings, and atomic rewrite
//! (write-to-temp, fsync, rename) under an advisory per-directory lock.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use atlas_models::RegistryEntry;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::RegistryError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NdjsonHeader {
    #[serde(rename = "_schema")]
    pub schema: String,
    #[serde(rename = "_file")]
    pub file: String,
    #[serde(rename = "_created")]
    pub created: String,
}

impl NdjsonHeader {
    pub fn new(file: &'static str) -> Self {
        Self {
            schema: "shadow-atlas-registry/1".to_string(),
            file: file.to_string(),
            created: Utc::now().to_rfc3339(),
        }
    }
}

/// Reads a registry NDJSON file, skipping the header line. A missing
/// file is treated as an empty registry (first-run bootstrap), not an
/// error.
pub fn read_entries(path: &Path) -> Result<Vec<RegistryEntry>, RegistryError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut entries = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        if i == 0 && line.contains("\"_schema\"") {
            continue; // header line
        }
        entries.push(serde_json::from_str(&line)?);
    }
    Ok(entries)
}

/// Rewrites the registry file atomically: sorted by FIPS ascending
/// (§6), write-to-temp + fsync + rename (§4.9, §9).
pub fn write_entries(
    path: &Path,
    file_name: &'static str,
    mut entries: Vec<RegistryEntry>,
) -> Result<(), RegistryError> {
    entries.sort_by(|a, b| a.fips().cmp(b.fips()));

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;
    let tmp_path = tmp_path_for(path);
    {
        let mut tmp = File::create(&tmp_path)?;
        let header = NdjsonHeader::new(file_name);
        writeln!(tmp, "{}", serde_json::to_string(&header)?)?;
        for entry in &entries {
            writeln!(tmp, "{}", serde_json::to_string(entry)?)?;
        }
        tmp.sync_all()?;
    }
    fs::rename(&tmp_path, path)?;
    Ok(())
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let file_name = tmp
        .file_name()
        .map(|n| format!(".{}.tmp", n.to_string_lossy()))
        .unwrap_or_else(|| ".registry.tmp".to_string());
    tmp.set_file_name(file_name);
    tmp
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlas_models::RegistryEntry;
    use tempfile::tempdir;

    fn at_large(fips: &str) -> RegistryEntry {
        RegistryEntry::AtLarge {
            fips: fips.to_string(),
            city_name: "Testville".to_string(),
            state: "CA".to_string(),
        }
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("at-large-cities.ndjson");
        assert!(read_entries(&path).unwrap().is_empty());
    }

    #[test]
    fn write_then_read_round_trips_and_sorts_by_fips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("at-large-cities.ndjson");
        write_entries(&path, "at-large-cities", vec![at_large("0667000"), at_large("0644000")]).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        assert!(lines.next().unwrap().contains("_schema"));

        let read_back = read_entries(&path).unwrap();
        assert_eq!(read_back.len(), 2);
        assert_eq!(read_back[0].fips(), "0644000");
        assert_eq!(read_back[1].fips(), "0667000");
    }

    #[test]
    fn rewrite_is_byte_identical_modulo_header_timestamp() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("at-large-cities.ndjson");
        write_entries(&path, "at-large-cities", vec![at_large("0644000")]).unwrap();
        let first = fs::read_to_string(&path).unwrap();

        let entries = read_entries(&path).unwrap();
        write_entries(&path, "at-large-cities", entries).unwrap();
        let second = fs::read_to_string(&path).unwrap();

        let first_body: Vec<&str> = first.lines().skip(1).collect();
        let second_body: Vec<&str> = second.lines().skip(1).collect();
        assert_eq!(first_body, second_body);
    }
}
