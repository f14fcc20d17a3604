// [libs/domain/validators/src/lib.rs]
// =================================================================
// APARATO: COUNT & TOPOLOGY VALIDATORS (ESTRATO L2, C6)
// RESPONSABILIDAD: CONTRASTAR BOUNDARIES NORMALIZADOS CONTRA C1
// =================================================================
//!
//! Three validators, none of which throw: each produces a structured
//! result with `errors`/`warnings`/`issues` that the caller decides
//! policy on (§4.6, §7 — "C6 produces structured `ValidationError`
//! aggregates without throwing; callers decide policy").
//!
//! - [`count`]: observed feature count vs. [`atlas_reference_catalog::expected_count`].
//! - [`topology`]: self-intersection, pairwise overlap, coverage/gap,
//!   and the school-district dual-system tie-break.
//! - [`geoid`]: per-layer GEOID format.

pub mod count;
pub mod geoid;
pub mod topology;

pub use count::{CountIssue, CountSeverity, CountValidationResult};
pub use geoid::{validate_geoid, GeoidError};
pub use topology::{
    GapAnalysis, OverlapFinding, SelfIntersectionFinding, TopologyValidationResult,
};
