// [libs/domain/atlas-models/src/run.rs]
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// A single run_id tags every event logged during one orchestrator run
/// (§4.8, §5, §8). Newtype instead of a bare `String` so call sites
/// can't accidentally pass a jurisdiction ID or artifact ID where a
/// run ID is expected.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RunId(String);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Cooperative cancellation signal threaded through a run (§5). A
/// single `Arc<AtomicBool>` is enough to satisfy "abort in-flight
/// requests via their timeout, checkpoint before terminating" — no
/// need for a full `tokio-util` `CancellationToken` when the only
/// consumer is a poll-before-each-suspension-point check.
#[derive(Debug, Clone, Default)]
pub struct CancelSignal(Arc<AtomicBool>);

impl CancelSignal {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_signal_is_observable_through_clones() {
        let signal = CancelSignal::new();
        let cloned = signal.clone();
        assert!(!cloned.is_cancelled());
        signal.cancel();
        assert!(cloned.is_cancelled());
    }

    #[test]
    fn run_ids_are_unique() {
        assert_ne!(RunId::new(), RunId::new());
    }
}
