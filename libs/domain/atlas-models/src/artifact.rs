// [libs/domain/atlas-models/src/artifact.rs]
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box, `[min_lon, min_lat, max_lon, max_lat]`.
pub type Bbox = [f64; 4];

/// Immutable record (§3). Two artifacts with the same `content_sha256`
/// are semantically identical; artifacts are never mutated once
/// persisted — callers that need a new state insert a new `Artifact`
/// row and repoint the `Head`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: String,
    pub jurisdiction_id: String,
    pub content_sha256: String,
    pub record_count: u64,
    pub bbox: Option<Bbox>,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Mutable pointer `{jurisdiction_id → artifact_id}`. At most one head
/// per jurisdiction (§3); the `DatabaseAdapter` enforces this as an
/// upsert keyed by `jurisdiction_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Head {
    pub jurisdiction_id: String,
    pub artifact_id: String,
    pub updated_at: DateTime<Utc>,
}
