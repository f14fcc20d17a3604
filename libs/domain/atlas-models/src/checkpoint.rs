// [libs/domain/atlas-models/src/checkpoint.rs]
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Options a batch run was started with, persisted verbatim into the
/// checkpoint so `resume_from_checkpoint` can replay them (§4.7).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchIngestOptions {
    pub states: Vec<String>,
    pub layers: Vec<String>,
    pub year: u32,
    pub max_concurrent_states: usize,
    pub circuit_breaker_threshold: u32,
    pub checkpoint_dir: String,
    pub force_refresh: bool,
}

impl Default for BatchIngestOptions {
    fn default() -> Self {
        Self {
            states: Vec::new(),
            layers: Vec::new(),
            year: 2024,
            max_concurrent_states: 5,
            circuit_breaker_threshold: 5,
            checkpoint_dir: "./checkpoints".to_string(),
            force_refresh: false,
        }
    }
}

/// `{id, started_at, updated_at, completed_states, failed_states,
/// pending_states, options, circuit_open, consecutive_failures,
/// boundary_count}` (§3). `id = "ckpt_" + timestamp + "_" + 6-char-random`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointState {
    pub id: String,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_states: BTreeSet<String>,
    pub failed_states: BTreeSet<String>,
    pub pending_states: BTreeSet<String>,
    pub options: BatchIngestOptions,
    pub circuit_open: bool,
    pub consecutive_failures: u32,
    pub boundary_count: u64,
}

impl CheckpointState {
    pub fn new(id: String, options: BatchIngestOptions) -> Self {
        let now = Utc::now();
        let pending_states = options.states.iter().cloned().collect();
        Self {
            id,
            started_at: now,
            updated_at: now,
            completed_states: BTreeSet::new(),
            failed_states: BTreeSet::new(),
            pending_states,
            options,
            circuit_open: false,
            consecutive_failures: 0,
            boundary_count: 0,
        }
    }

    /// §8 universal invariant: `completed ∪ failed ∪ pending =
    /// options.states` and the three sets are pairwise disjoint.
    pub fn is_well_formed(&self) -> bool {
        let disjoint_cf = self.completed_states.is_disjoint(&self.failed_states);
        let disjoint_cp = self.completed_states.is_disjoint(&self.pending_states);
        let disjoint_fp = self.failed_states.is_disjoint(&self.pending_states);
        if !(disjoint_cf && disjoint_cp && disjoint_fp) {
            return false;
        }
        let union: BTreeSet<String> = self
            .completed_states
            .iter()
            .chain(self.failed_states.iter())
            .chain(self.pending_states.iter())
            .cloned()
            .collect();
        let expected: BTreeSet<String> = self.options.states.iter().cloned().collect();
        union == expected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(states: &[&str]) -> BatchIngestOptions {
        BatchIngestOptions {
            states: states.iter().map(|s| s.to_string()).collect(),
            layers: vec!["cd".into()],
            ..Default::default()
        }
    }

    #[test]
    fn fresh_checkpoint_has_all_states_pending_and_is_well_formed() {
        let ckpt = CheckpointState::new("ckpt_1".into(), opts(&["01", "02", "04"]));
        assert_eq!(ckpt.pending_states.len(), 3);
        assert!(ckpt.completed_states.is_empty());
        assert!(ckpt.failed_states.is_empty());
        assert!(ckpt.is_well_formed());
    }

    #[test]
    fn moving_a_state_between_sets_keeps_it_well_formed() {
        let mut ckpt = CheckpointState::new("ckpt_1".into(), opts(&["01", "02"]));
        ckpt.pending_states.remove("01");
        ckpt.completed_states.insert("01".to_string());
        assert!(ckpt.is_well_formed());
    }

    #[test]
    fn duplicate_membership_across_sets_is_not_well_formed() {
        let mut ckpt = CheckpointState::new("ckpt_1".into(), opts(&["01"]));
        // Simulate a bug: "01" left in pending AND marked completed.
        ckpt.completed_states.insert("01".to_string());
        assert!(!ckpt.is_well_formed());
    }
}
