// [apps/registry-cli/src/main.rs]
//! Registry & Audit Log (C9) CLI shell. Per spec §6 this binary's
//! contract is its subcommands and exit codes, not its argument
//! grammar: `registry list|get|add|update|delete|stats|diff`, exiting
//! `0` on success / in-sync, `1` when `diff` finds drift, `2` on error.

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use atlas_models::registry::QuarantinePattern;
use atlas_models::RegistryEntry;
use atlas_reference_catalog::expected_district_count;
use atlas_registry_store::{AddOptions, DeleteOptions, ListFilter, RegistryStore};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::error;

#[derive(Parser, Debug)]
#[command(name = "registry-cli", version, about = "Shadow Atlas portal registry & audit log")]
struct Cli {
    /// Directory holding known-portals.ndjson, quarantined-portals.ndjson, at-large-cities.ndjson, audit.ndjson.
    #[arg(long, global = true, default_value = "./registry-data")]
    data_dir: PathBuf,

    #[arg(long, global = true, default_value = "registry-cli")]
    actor: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Get {
        #[arg(long)]
        fips: String,
    },
    List {
        #[arg(long)]
        state: Option<String>,
        #[arg(long)]
        portal_type: Option<String>,
        #[arg(long)]
        min_confidence: Option<u8>,
    },
    Add {
        #[arg(long)]
        fips: String,
        #[arg(long)]
        city_name: String,
        #[arg(long)]
        state: String,
        #[arg(long)]
        portal_type: String,
        #[arg(long)]
        download_url: String,
        /// Observed feature count — cross-checked against the C1 district gate (§4.1, §4.5, §8 scenario 1).
        #[arg(long)]
        count: u32,
        #[arg(long, default_value = "registry-cli")]
        discovered_by: String,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long, default_value_t = false)]
        skip_validation: bool,
    },
    Update {
        #[arg(long)]
        fips: String,
        /// JSON object of fields to patch, e.g. '{"confidence":80}'.
        #[arg(long)]
        patch: String,
    },
    Delete {
        #[arg(long)]
        fips: String,
        #[arg(long, default_value_t = false)]
        hard: bool,
        #[arg(long, default_value_t = false)]
        force: bool,
        #[arg(long, default_value = "unspecified")]
        reason: String,
        #[arg(long, default_value = "unknown")]
        matched_pattern: String,
    },
    Stats,
    Diff {
        /// Path to a JSON array of `RegistryEntry` standing in for the generated code artifact.
        #[arg(long)]
        generated: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    let command_line = format!("{:?}", cli.command);
    match run(cli, command_line) {
        Ok(ExitOutcome::Ok) => std::process::exit(0),
        Ok(ExitOutcome::DriftDetected) => std::process::exit(1),
        Err(e) => {
            error!(error = %e, "registry-cli command failed");
            eprintln!("error: {e:#}");
            std::process::exit(2);
        }
    }
}

enum ExitOutcome {
    Ok,
    DriftDetected,
}

fn run(cli: Cli, command_line: String) -> Result<ExitOutcome> {
    let store = RegistryStore::new(&cli.data_dir);

    match cli.command {
        Command::Get { fips } => match store.get(&fips)? {
            Some((entry, file)) => {
                println!("{file}: {}", serde_json::to_string_pretty(&entry)?);
                Ok(ExitOutcome::Ok)
            }
            None => Err(anyhow!("no entry for fips {fips}")),
        },
        Command::List { state, portal_type, min_confidence } => {
            let filter = ListFilter { state, portal_type, min_confidence };
            let entries = store.list(&filter)?;
            for entry in &entries {
                println!("{}", serde_json::to_string(entry)?);
            }
            eprintln!("{} entries", entries.len());
            Ok(ExitOutcome::Ok)
        }
        Command::Add {
            fips,
            city_name,
            state,
            portal_type,
            download_url,
            count,
            discovered_by,
            notes,
            skip_validation,
        } => {
            let confidence = gate_confidence(&fips, count)?;
            let entry = RegistryEntry::Known {
                fips,
                city_name,
                state,
                portal_type,
                download_url,
                feature_count: count,
                last_verified: Utc::now(),
                confidence,
                discovered_by,
                notes,
            };
            store.add(
                entry,
                AddOptions {
                    skip_validation,
                    command: command_line,
                    actor: cli.actor,
                },
            )?;
            Ok(ExitOutcome::Ok)
        }
        Command::Update { fips, patch } => {
            let patch: serde_json::Value = serde_json::from_str(&patch)?;
            let updated = store.update(&fips, patch, command_line, cli.actor)?;
            println!("{}", serde_json::to_string_pretty(&updated)?);
            Ok(ExitOutcome::Ok)
        }
        Command::Delete { fips, hard, force, reason, matched_pattern } => {
            store.delete(
                &fips,
                DeleteOptions {
                    hard,
                    force,
                    reason,
                    matched_pattern: parse_quarantine_pattern(&matched_pattern),
                    command: command_line,
                    actor: cli.actor,
                },
            )?;
            Ok(ExitOutcome::Ok)
        }
        Command::Stats => {
            let stats = store.stats()?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
            Ok(ExitOutcome::Ok)
        }
        Command::Diff { generated } => {
            let generated: Vec<RegistryEntry> = serde_json::from_str(&std::fs::read_to_string(generated)?)?;
            let report = store.diff(&generated)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            if report.in_sync() {
                Ok(ExitOutcome::Ok)
            } else {
                Ok(ExitOutcome::DriftDetected)
            }
        }
    }
}

/// §4.1, §4.5, §8 scenario 1: `registry add --fips 3915000 --count 74`
/// must fail — the same district-count gate the portal scanner applies
/// to discovered candidates also gates a manual `add`, so a bad count
/// can't be registered just because it bypassed the scanner.
fn gate_confidence(fips: &str, observed_count: u32) -> Result<u8> {
    let Some(expected) = expected_district_count(fips) else {
        return Ok(50);
    };
    match expected.expected {
        None => {
            if observed_count == 1 {
                Ok(100)
            } else {
                Err(anyhow!(
                    "{} is an at-large jurisdiction (no sub-districts expected); got {observed_count} feature(s)",
                    expected.city_name
                ))
            }
        }
        Some(expected_n) => {
            let diff = (observed_count as i64 - expected_n as i64).abs();
            if diff == 0 {
                Ok(100)
            } else if diff <= 2 {
                Ok(70)
            } else {
                Err(anyhow!(
                    "Expected {expected_n} districts, found {observed_count} (diff: {diff}) for {}",
                    expected.city_name
                ))
            }
        }
    }
}

fn parse_quarantine_pattern(s: &str) -> QuarantinePattern {
    match s {
        "cvra_gis_unavailable" => QuarantinePattern::CvraGisUnavailable,
        "hybrid_gis_unavailable" => QuarantinePattern::HybridGisUnavailable,
        "containment_failure" => QuarantinePattern::ContainmentFailure,
        "single_feature" => QuarantinePattern::SingleFeature,
        "ward_gis_unavailable" => QuarantinePattern::WardGisUnavailable,
        "wrong_data" => QuarantinePattern::WrongData,
        "exclusivity_topology_error" => QuarantinePattern::ExclusivityTopologyError,
        _ => QuarantinePattern::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cincinnati_add_is_rejected() {
        let err = gate_confidence("3915000", 74).unwrap_err();
        assert!(err.to_string().contains("Expected 9 districts, found 74 (diff: 65)"));
    }

    #[test]
    fn exact_match_is_fully_confident() {
        assert_eq!(gate_confidence("3915000", 9).unwrap(), 100);
    }

    #[test]
    fn unknown_fips_passes_through() {
        assert_eq!(gate_confidence("9999999", 4).unwrap(), 50);
    }
}
