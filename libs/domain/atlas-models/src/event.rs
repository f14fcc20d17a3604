// [libs/domain/atlas-models/src/event.rs]
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Append-only `{run_id, jurisdiction_id?, kind, payload, duration_ms?,
/// error?, ts}` (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    Fetch,
    Update,
    Error,
    Skip,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub run_id: String,
    pub jurisdiction_id: Option<String>,
    pub kind: EventKind,
    pub payload: serde_json::Value,
    pub duration_ms: Option<u64>,
    pub error: Option<String>,
    pub ts: DateTime<Utc>,
}

impl Event {
    pub fn new(run_id: impl Into<String>, kind: EventKind) -> Self {
        Self {
            run_id: run_id.into(),
            jurisdiction_id: None,
            kind,
            payload: serde_json::Value::Null,
            duration_ms: None,
            error: None,
            ts: Utc::now(),
        }
    }

    pub fn for_jurisdiction(mut self, jurisdiction_id: impl Into<String>) -> Self {
        self.jurisdiction_id = Some(jurisdiction_id.into());
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}
