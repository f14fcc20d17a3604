// [libs/core/reference-catalog/src/lib.rs]
// =================================================================
// APARATO: REFERENCE CATALOG (C1)
// RESPONSABILIDAD: CONTEO ESPERADO Y REGLAS DE TOPOLOGÍA, ESTÁTICOS
// =================================================================
//!
//! Static, process-wide, read-only tables (§4.1): expected feature
//! counts per (layer, state), topology rules per layer, the
//! dual-system school-district policy, the Cincinnati district-count
//! gate, and the state FIPS/abbreviation/name mapping. Nothing here
//! does I/O; `validate_at_startup` is meant to be called once, eagerly,
//! by whichever binary composes this crate.

pub mod counts;
pub mod district_gate;
pub mod state_fips;
pub mod topology;

pub use atlas_models::{AtlasError, ErrorKind};
pub use counts::expected_count;
pub use district_gate::{expected_district_count, ExpectedDistrictCount};
pub use state_fips::{abbr_for_fips, fips_for_abbr, name_for_fips, STATE_FIPS_TABLE};
pub use topology::{dual_system_state, school_district_overlap_allowed, topology_rules, SchoolDistrictLayer, TopologyRules};

/// Runs every cross-sum invariant in §8 and fails loudly if any one of
/// them is violated (§4.1: "fails with `ReferenceDataInvalid` on any
/// internal inconsistency at startup; this is fatal"). Call this once
/// at process start, before serving any traffic.
pub fn validate_at_startup() -> Result<(), AtlasError> {
    counts::validate_cross_sums().map_err(AtlasError::reference_data_invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startup_validation_passes_on_the_shipped_tables() {
        assert!(validate_at_startup().is_ok());
    }
}
