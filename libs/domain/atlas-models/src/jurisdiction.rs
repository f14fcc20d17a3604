// [libs/domain/atlas-models/src/jurisdiction.rs]
use serde::{Deserialize, Serialize};

/// Closed set of jurisdiction shapes the reference catalog and
/// validators need to exhaustively match on. `spec.md` describes the
/// jurisdiction ID as a free string; the *type* tag is made a closed
/// enum here so C1/C6 can match on it instead of parsing the ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JurisdictionType {
    State,
    Place,
    County,
    CountySubdivision,
    SchoolDistrict,
    VotingDistrict,
    /// `layer:state:vintage`-style composite IDs (§3).
    Composite,
}

/// Identified by a stable string ID (7-digit Census PLACE FIPS, 2-digit
/// state FIPS, or a composite `layer:state:vintage` ID). The parent is
/// stored as an ID, never a live pointer (§9's graph-like-references
/// design note) — resolving it is the `DatabaseAdapter`'s job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jurisdiction {
    pub id: String,
    pub name: String,
    pub parent_id: Option<String>,
    pub jurisdiction_type: JurisdictionType,
}

impl Jurisdiction {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        jurisdiction_type: JurisdictionType,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parent_id: None,
            jurisdiction_type,
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }
}
