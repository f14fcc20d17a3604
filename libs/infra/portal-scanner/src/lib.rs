// [libs/infra/portal-scanner/src/lib.rs]
// =================================================================
// APARATO: PORTAL SCANNER (ESTRATO L3, C5)
// RESPONSABILIDAD: DESCUBRIMIENTO DE CAPAS DE FRONTERA POR JURISDICCIÓN
// =================================================================
//!
//! Four discovery strategies run in order and merged (§4.5): a fixed
//! table of pre-registered state-portal layers, an ArcGIS Hub keyword
//! search, a CKAN/Socrata catalog search, and a depth-capped ArcGIS
//! REST tree traversal. Every surfaced candidate passes through the
//! district-count gate ([`gate::apply_district_gate`]) before it's
//! returned — the explicit defense against the Cincinnati failure
//! mode (§4.1, §8 scenario 1).

pub mod candidate;
pub mod errors;
pub mod gate;
mod scanner;
pub mod scoring;
mod strategy_catalog;
mod strategy_direct;
mod strategy_hub;
mod strategy_rest;

pub use candidate::PortalCandidate;
pub use errors::ScanError;
pub use gate::{apply_district_gate, GatedCandidate, GateRejection};
pub use scanner::{PortalScanner, ScanTargets};
pub use strategy_catalog::{search_ckan, search_socrata};
pub use strategy_direct::{candidates_for as direct_layer_candidates, verify_polygonal};
pub use strategy_hub::search as search_hub;
pub use strategy_rest::{should_prune_folder, layer_is_governance_candidate, RestEnumerator, MAX_DEPTH, MIN_REQUEST_DELAY, SKIP_LIST};
