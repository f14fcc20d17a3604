// [libs/core/reference-catalog/src/topology.rs]
//! Topology rules per boundary layer (§4.1, §4.6) and the dual-system
//! school-district overlap policy.

/// `{must_tile_within_parent, parent_layer?, max_overlap_pct,
/// max_gap_pct, tolerance_m, overlaps_permitted,
/// complete_coverage_required}` (§4.1).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TopologyRules {
    pub must_tile_within_parent: bool,
    pub parent_layer: Option<&'static str>,
    pub max_overlap_pct: f64,
    pub max_gap_pct: f64,
    pub tolerance_m: f64,
    pub overlaps_permitted: bool,
    pub complete_coverage_required: bool,
}

const DEFAULT_TOLERANCE_M: f64 = 1.0;

/// `topology_rules(layer) → TopologyRules` (§4.1). Tiling layers
/// (counties, VTDs, school districts, state legislative districts)
/// must tile within their parent; congressional districts are tiling
/// within the state but permitted a small redistricting-era overlap
/// tolerance at their boundary edges.
pub fn topology_rules(layer: &str) -> TopologyRules {
    match layer.to_ascii_uppercase().as_str() {
        "COUNTY" => TopologyRules {
            must_tile_within_parent: true,
            parent_layer: Some("STATE"),
            max_overlap_pct: 0.5,
            max_gap_pct: 5.0,
            tolerance_m: DEFAULT_TOLERANCE_M,
            overlaps_permitted: false,
            complete_coverage_required: true,
        },
        "CD" => TopologyRules {
            must_tile_within_parent: true,
            parent_layer: Some("STATE"),
            max_overlap_pct: 0.5,
            max_gap_pct: 5.0,
            tolerance_m: DEFAULT_TOLERANCE_M,
            overlaps_permitted: false,
            complete_coverage_required: true,
        },
        "SLDU" | "SLDL" => TopologyRules {
            must_tile_within_parent: true,
            parent_layer: Some("STATE"),
            max_overlap_pct: 0.5,
            max_gap_pct: 5.0,
            tolerance_m: DEFAULT_TOLERANCE_M,
            overlaps_permitted: false,
            complete_coverage_required: true,
        },
        "VTD" => TopologyRules {
            must_tile_within_parent: true,
            parent_layer: Some("COUNTY"),
            max_overlap_pct: 1.0,
            max_gap_pct: 5.0,
            tolerance_m: DEFAULT_TOLERANCE_M,
            overlaps_permitted: false,
            complete_coverage_required: true,
        },
        "UNSD" | "ELSD" | "SCSD" => TopologyRules {
            must_tile_within_parent: true,
            parent_layer: Some("STATE"),
            max_overlap_pct: 0.5,
            max_gap_pct: 10.0,
            tolerance_m: DEFAULT_TOLERANCE_M,
            // Overlaps are allowed between ELSD and SCSD in dual-system
            // states (§4.6 tie-break table) — handled separately by
            // `school_district_overlap_allowed`, not by this flag, since
            // it is conditional on the pair and the state.
            overlaps_permitted: false,
            complete_coverage_required: false,
        },
        "PLACE" | "COUSUB" => TopologyRules {
            must_tile_within_parent: false,
            parent_layer: Some("STATE"),
            max_overlap_pct: 0.0,
            max_gap_pct: 100.0,
            tolerance_m: DEFAULT_TOLERANCE_M,
            overlaps_permitted: false,
            complete_coverage_required: false,
        },
        _ => TopologyRules {
            must_tile_within_parent: false,
            parent_layer: None,
            max_overlap_pct: 0.0,
            max_gap_pct: 100.0,
            tolerance_m: DEFAULT_TOLERANCE_M,
            overlaps_permitted: true,
            complete_coverage_required: false,
        },
    }
}

/// §3 states whose school districts split elementary/secondary into
/// overlapping territory: CT, IL, ME, MA, MT, NH, NJ, RI, VT.
const DUAL_SYSTEM_STATE_FIPS: &[&str] = &["09", "17", "23", "25", "30", "33", "34", "44", "50"];

/// `dual_system_state?(fips) → bool` (§4.1).
pub fn dual_system_state(state_fips: &str) -> bool {
    DUAL_SYSTEM_STATE_FIPS.contains(&state_fips)
}

/// School district layer pair, order-independent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchoolDistrictLayer {
    Unsd,
    Elsd,
    Scsd,
}

/// §4.6 tie-break table: ELSD-SCSD overlap is allowed only in
/// dual-system states; every other school-district pair never
/// overlaps.
pub fn school_district_overlap_allowed(
    a: SchoolDistrictLayer,
    b: SchoolDistrictLayer,
    state_fips: &str,
) -> bool {
    use SchoolDistrictLayer::*;
    matches!((a, b), (Elsd, Scsd) | (Scsd, Elsd)) && dual_system_state(state_fips)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connecticut_is_a_dual_system_state() {
        assert!(dual_system_state("09"));
        assert!(!dual_system_state("06"));
    }

    #[test]
    fn elsd_scsd_overlap_allowed_only_in_dual_system_states() {
        assert!(school_district_overlap_allowed(
            SchoolDistrictLayer::Elsd,
            SchoolDistrictLayer::Scsd,
            "09"
        ));
        assert!(!school_district_overlap_allowed(
            SchoolDistrictLayer::Elsd,
            SchoolDistrictLayer::Scsd,
            "06"
        ));
    }

    #[test]
    fn unsd_never_overlaps_anything() {
        assert!(!school_district_overlap_allowed(
            SchoolDistrictLayer::Unsd,
            SchoolDistrictLayer::Unsd,
            "09"
        ));
        assert!(!school_district_overlap_allowed(
            SchoolDistrictLayer::Unsd,
            SchoolDistrictLayer::Elsd,
            "09"
        ));
    }

    #[test]
    fn county_layer_requires_complete_coverage() {
        let rules = topology_rules("county");
        assert!(rules.complete_coverage_required);
        assert!(rules.must_tile_within_parent);
        assert_eq!(rules.parent_layer, Some("STATE"));
    }
}
