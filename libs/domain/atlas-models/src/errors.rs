// [libs/domain/atlas-models/src/errors.rs]
// =================================================================
// APARATO: ERROR TAXONOMY (ESTRATO L2)
// RESPONSABILIDAD: CLASIFICACIÓN DE FALLOS CROSS-CUTTING (C4/C6/C7/C8)
// =================================================================

use thiserror::Error;

/// Error kind taxonomy shared across C4 (boundary provider), C6
/// (validators), C7 (batch orchestrator) and C8 (incremental
/// orchestrator). This is the one enum every owning crate converts
/// its narrower, crate-local error type into at its boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Transient: timeouts, DNS, connection reset, 429, 5xx.
    Network,
    /// Non-retryable: hash mismatch, malformed archive.
    Integrity,
    /// Non-retryable: 404, empty result set.
    NotFound,
    /// Non-retryable: missing features, invalid geometry type, bad GEOID.
    Schema,
    /// Non-retryable logically, but the source may self-correct: count
    /// mismatch, topology failure, coverage gap.
    Validation,
    /// Fatal at startup.
    ReferenceDataInvalid,
    /// Fatal at startup (e.g. `ALLOW_TEST_PARAMS` set in a release build).
    Config,
    /// DB write failure, non-retryable for the current operation.
    Storage,
    /// Soft failure returned when the circuit breaker is open.
    CircuitOpen,
}

impl ErrorKind {
    /// §7 propagation rule: network and 5xx/429-shaped failures are
    /// retryable; everything else routes to a permanent failure sink
    /// (checkpoint `failed_states`, DLQ `exhausted`, or an `ERROR` event).
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::Network)
    }
}

#[derive(Error, Debug)]
#[error("[ATLAS_{kind:?}]: {message}")]
pub struct AtlasError {
    pub kind: ErrorKind,
    pub message: String,
}

impl AtlasError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Network, message)
    }

    pub fn integrity(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Integrity, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn schema(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Schema, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn reference_data_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ReferenceDataInvalid, message)
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Storage, message)
    }

    pub fn circuit_open(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CircuitOpen, message)
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_network_errors_are_retryable() {
        assert!(AtlasError::network("timeout").is_retryable());
        assert!(!AtlasError::integrity("hash mismatch").is_retryable());
        assert!(!AtlasError::not_found("404").is_retryable());
        assert!(!AtlasError::schema("bad geoid").is_retryable());
        assert!(!AtlasError::validation("count mismatch").is_retryable());
        assert!(!AtlasError::storage("write failed").is_retryable());
        assert!(!AtlasError::circuit_open("breaker tripped").is_retryable());
    }
}
