// [libs/infra/portal-scanner/src/candidate.rs]
use atlas_models::PortalFamily;
use serde::{Deserialize, Serialize};

/// §4.5 output type. `score` is the raw title-scorer result before the
/// district-count gate adjusts `confidence`; callers that only want
/// surfaced candidates should look at entries that survived
/// [`crate::gate::apply_district_gate`], not this struct alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalCandidate {
    pub id: String,
    pub title: String,
    pub description: String,
    pub url: String,
    pub download_url: String,
    pub score: u8,
    pub portal_type: PortalFamily,
    pub feature_count: Option<u64>,
}
