// [libs/domain/validators/src/topology.rs]
//! Topology validator (§4.6): self-intersection, pairwise overlap,
//! coverage/gap, and the school-district dual-system tie-break, all
//! against a [`GeoKernel`] so the geometry engine stays swappable.

use atlas_geo_kernel::GeoKernel;
use atlas_models::NormalizedBoundary;
use atlas_reference_catalog::{
    dual_system_state, name_for_fips, school_district_overlap_allowed, topology_rules, SchoolDistrictLayer,
    TopologyRules,
};
use geo::BoundingRect;
use geo_types::{Geometry, MultiPolygon};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelfIntersectionFinding {
    pub geoid: String,
    pub kink_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlapFinding {
    pub geoid_a: String,
    pub geoid_b: String,
    pub overlap_pct: f64,
    /// Set when the overlap is a permitted dual-system ELSD/SCSD pair
    /// (§4.6 tie-break table) — surfaced as an informational note, not
    /// an error.
    pub allowed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapAnalysis {
    pub coverage_pct: f64,
    pub gap_pct: f64,
    /// Bounding boxes of the gap regions (`parent - union(children)`),
    /// one per disjoint polygon in the difference.
    pub gap_regions: Vec<[f64; 4]>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologyValidationResult {
    pub valid: bool,
    pub layer: String,
    pub boundary_count: usize,
    pub overlaps: Vec<OverlapFinding>,
    pub gap_analysis: Option<GapAnalysis>,
    pub self_intersections: Vec<SelfIntersectionFinding>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub summary: String,
}

fn as_multipolygon(geometry: &Geometry<f64>) -> MultiPolygon<f64> {
    match geometry {
        Geometry::Polygon(p) => MultiPolygon(vec![p.clone()]),
        Geometry::MultiPolygon(mp) => mp.clone(),
        // Construction-time invariants in atlas-models guarantee every
        // NormalizedBoundary is Polygon or MultiPolygon (§4.4).
        _ => MultiPolygon(vec![]),
    }
}

/// Area below which an overlap/gap is floating-point noise rather than
/// a real topology defect, derived from `tolerance_m` (§4.6: "points
/// within tolerance_m are treated as coincident").
fn noise_floor_area(tolerance_m: f64) -> f64 {
    tolerance_m * tolerance_m
}

/// State-level dual-system note (§4.6, §8 scenario 3): surfaced for an
/// ELSD/SCSD layer in a dual-system state whether or not any ELSD/SCSD
/// pair in this particular batch actually overlaps — the policy is a
/// property of the state, not of any one overlap.
fn dual_system_note(layer: &str, state_fips: Option<&str>) -> Option<String> {
    let state_fips = state_fips?;
    if !matches!(layer.to_ascii_uppercase().as_str(), "ELSD" | "SCSD") {
        return None;
    }
    if !dual_system_state(state_fips) {
        return None;
    }
    let state_name = match name_for_fips(state_fips) {
        Some(name) => name,
        None => state_fips,
    };
    Some(format!(
        "{state_name} uses a dual elementary/secondary school district system — ELSD/SCSD overlap is permitted and expected, not a topology defect"
    ))
}

/// Self-intersection check: every boundary's rings are tested for
/// kinks; any kink is an error (§4.6).
pub fn check_self_intersections(
    boundaries: &[NormalizedBoundary],
    kernel: &dyn GeoKernel,
) -> Vec<SelfIntersectionFinding> {
    boundaries
        .iter()
        .filter_map(|b| {
            let mp = as_multipolygon(&b.geometry);
            let kinks = kernel.kinks(&mp);
            if kinks.is_empty() {
                None
            } else {
                Some(SelfIntersectionFinding {
                    geoid: b.geoid.clone(),
                    kink_count: kinks.len(),
                })
            }
        })
        .collect()
}

/// Pairwise overlap check within a single layer: `overlap_pct =
/// area(∩) / min(area(a), area(b))` (§4.6). Same-layer boundaries are
/// never an allowed overlap — the dual-system allowance is strictly
/// cross-layer (ELSD vs SCSD), handled by
/// [`check_school_district_overlaps`].
pub fn check_pairwise_overlaps(
    boundaries: &[NormalizedBoundary],
    rules: &TopologyRules,
    kernel: &dyn GeoKernel,
) -> Vec<OverlapFinding> {
    let mut findings = Vec::new();
    let noise_floor = noise_floor_area(rules.tolerance_m);
    for i in 0..boundaries.len() {
        for j in (i + 1)..boundaries.len() {
            let a = as_multipolygon(&boundaries[i].geometry);
            let b = as_multipolygon(&boundaries[j].geometry);
            let inter_area = kernel.area(&kernel.intersection(&a, &b));
            if inter_area <= noise_floor {
                continue;
            }
            let min_area = kernel.area(&a).min(kernel.area(&b));
            if min_area <= 0.0 {
                continue;
            }
            let overlap_pct = (inter_area / min_area) * 100.0;
            if overlap_pct > rules.max_overlap_pct {
                findings.push(OverlapFinding {
                    geoid_a: boundaries[i].geoid.clone(),
                    geoid_b: boundaries[j].geoid.clone(),
                    overlap_pct,
                    allowed: false,
                });
            }
        }
    }
    findings
}

/// §4.6 tie-break: cross-layer ELSD/SCSD overlap check. Overlaps
/// between the two sets are permitted iff `dual_system_state?(state)`;
/// every other school-district layer never overlaps anything (that's
/// enforced by calling [`check_pairwise_overlaps`] within each set
/// separately).
pub fn check_school_district_overlaps(
    elsd: &[NormalizedBoundary],
    scsd: &[NormalizedBoundary],
    state_fips: &str,
    tolerance_m: f64,
    kernel: &dyn GeoKernel,
) -> Vec<OverlapFinding> {
    let allowed = school_district_overlap_allowed(
        SchoolDistrictLayer::Elsd,
        SchoolDistrictLayer::Scsd,
        state_fips,
    );
    let noise_floor = noise_floor_area(tolerance_m);
    let mut findings = Vec::new();
    for e in elsd {
        for s in scsd {
            let a = as_multipolygon(&e.geometry);
            let b = as_multipolygon(&s.geometry);
            let inter_area = kernel.area(&kernel.intersection(&a, &b));
            if inter_area <= noise_floor {
                continue;
            }
            let min_area = kernel.area(&a).min(kernel.area(&b));
            if min_area <= 0.0 {
                continue;
            }
            findings.push(OverlapFinding {
                geoid_a: e.geoid.clone(),
                geoid_b: s.geoid.clone(),
                overlap_pct: (inter_area / min_area) * 100.0,
                allowed,
            });
        }
    }
    findings
}

/// Coverage/gap check for tiling layers only (§4.6): union the
/// children, compare to the parent's area, locate gap regions by
/// geometric difference. `>= 95%` coverage or the layer is invalid;
/// gap% above `max_gap_pct` is an error independent of that floor.
pub fn check_coverage(
    parent: &MultiPolygon<f64>,
    children: &[NormalizedBoundary],
    rules: &TopologyRules,
    kernel: &dyn GeoKernel,
) -> GapAnalysis {
    let mut union = MultiPolygon(vec![]);
    for child in children {
        let mp = as_multipolygon(&child.geometry);
        union = kernel.union(&union, &mp);
    }
    let parent_area = kernel.area(parent);
    let union_area = kernel.area(&union);
    let coverage_pct = if parent_area > 0.0 {
        (union_area / parent_area * 100.0).min(100.0)
    } else {
        100.0
    };
    let gap = kernel.difference(parent, &union);
    let gap_area = kernel.area(&gap);
    let gap_pct = if parent_area > 0.0 {
        gap_area / parent_area * 100.0
    } else {
        0.0
    };
    let noise_floor = noise_floor_area(rules.tolerance_m);
    let gap_regions = gap
        .0
        .iter()
        .filter_map(|p| {
            let mp = MultiPolygon(vec![p.clone()]);
            if kernel.area(&mp) <= noise_floor {
                return None;
            }
            p.bounding_rect().map(|r| [r.min().x, r.min().y, r.max().x, r.max().y])
        })
        .collect();
    GapAnalysis {
        coverage_pct,
        gap_pct,
        gap_regions,
    }
}

/// Runs the full suite for one layer's boundaries within an optional
/// parent, producing the aggregate result (§4.6 output contract).
/// Cross-layer school-district checks are run separately by the
/// caller via [`check_school_district_overlaps`] and merged in.
///
/// `state_fips`, when given, is used only to surface the dual-system
/// note (§4.6, §8 scenario 3): an ELSD/SCSD layer validated in a
/// [`dual_system_state`] gets an informational note regardless of
/// whether any overlap pair actually triggered in this batch — the
/// overlap allowance is a property of the *state*, not of any one pair.
pub fn validate_topology(
    layer: &str,
    boundaries: &[NormalizedBoundary],
    parent: Option<&MultiPolygon<f64>>,
    state_fips: Option<&str>,
    kernel: &dyn GeoKernel,
) -> TopologyValidationResult {
    let rules = topology_rules(layer);
    let self_intersections = check_self_intersections(boundaries, kernel);
    let overlaps = check_pairwise_overlaps(boundaries, &rules, kernel);

    let gap_analysis = if rules.must_tile_within_parent {
        parent.map(|p| check_coverage(p, boundaries, &rules, kernel))
    } else {
        None
    };

    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if !self_intersections.is_empty() {
        errors.push(format!(
            "{} boundary(ies) have self-intersecting rings",
            self_intersections.len()
        ));
    }
    if let Some(note) = dual_system_note(layer, state_fips) {
        warnings.push(note);
    }
    for finding in &overlaps {
        if finding.allowed {
            warnings.push(format!(
                "{} and {} overlap ({:.2}%) — permitted dual-system pair",
                finding.geoid_a, finding.geoid_b, finding.overlap_pct
            ));
        } else {
            errors.push(format!(
                "{} and {} overlap {:.2}%, exceeding max_overlap_pct {:.2}%",
                finding.geoid_a, finding.geoid_b, finding.overlap_pct, rules.max_overlap_pct
            ));
        }
    }
    if let Some(gap) = &gap_analysis {
        if rules.complete_coverage_required && gap.coverage_pct < 95.0 {
            errors.push(format!(
                "coverage {:.2}% is below the 95% floor for a tiling layer",
                gap.coverage_pct
            ));
        }
        if gap.gap_pct > rules.max_gap_pct {
            errors.push(format!(
                "gap {:.2}% exceeds max_gap_pct {:.2}%",
                gap.gap_pct, rules.max_gap_pct
            ));
        }
    }

    let valid = errors.is_empty();
    let summary = if valid {
        format!(
            "{layer}: {} boundaries, {} warnings, no errors",
            boundaries.len(),
            warnings.len()
        )
    } else {
        format!(
            "{layer}: {} boundaries, {} errors, {} warnings",
            boundaries.len(),
            errors.len(),
            warnings.len()
        )
    };

    TopologyValidationResult {
        valid,
        layer: layer.to_string(),
        boundary_count: boundaries.len(),
        overlaps,
        gap_analysis,
        self_intersections,
        errors,
        warnings,
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlas_geo_kernel::GeoCrateKernel;
    use geo_types::polygon;
    use std::collections::BTreeMap;

    fn square_boundary(geoid: &str, x0: f64, y0: f64, side: f64) -> NormalizedBoundary {
        let poly: geo_types::Polygon<f64> = polygon![
            (x: x0, y: y0),
            (x: x0 + side, y: y0),
            (x: x0 + side, y: y0 + side),
            (x: x0, y: y0 + side),
            (x: x0, y: y0),
        ];
        NormalizedBoundary::new(geoid, geoid, "county", Geometry::Polygon(poly), "06", BTreeMap::new())
            .unwrap()
    }

    #[test]
    fn non_overlapping_tiles_fully_cover_their_parent() {
        let kernel = GeoCrateKernel;
        let parent = MultiPolygon(vec![polygon![
            (x: 0.0, y: 0.0), (x: 2.0, y: 0.0), (x: 2.0, y: 1.0), (x: 0.0, y: 1.0), (x: 0.0, y: 0.0),
        ]]);
        let children = vec![square_boundary("a", 0.0, 0.0, 1.0), square_boundary("b", 1.0, 0.0, 1.0)];
        let result = validate_topology("county", &children, Some(&parent), None, &kernel);
        assert!(result.valid);
        assert!(result.overlaps.is_empty());
        assert!(result.gap_analysis.unwrap().coverage_pct > 99.0);
    }

    #[test]
    fn overlapping_tiles_are_reported_as_errors() {
        let kernel = GeoCrateKernel;
        let children = vec![square_boundary("a", 0.0, 0.0, 2.0), square_boundary("b", 1.0, 0.0, 2.0)];
        let result = validate_topology("county", &children, None, None, &kernel);
        assert!(!result.valid);
        assert_eq!(result.overlaps.len(), 1);
    }

    #[test]
    fn dual_system_elsd_scsd_overlap_is_a_warning_not_an_error() {
        let kernel = GeoCrateKernel;
        let elsd = vec![square_boundary("e1", 0.0, 0.0, 2.0)];
        let scsd = vec![square_boundary("s1", 0.0, 0.0, 2.0)];
        let findings = check_school_district_overlaps(&elsd, &scsd, "09", 1.0, &kernel);
        assert_eq!(findings.len(), 1);
        assert!(findings[0].allowed);
    }

    #[test]
    fn dual_system_overlap_rejected_outside_dual_system_states() {
        let kernel = GeoCrateKernel;
        let elsd = vec![square_boundary("e1", 0.0, 0.0, 2.0)];
        let scsd = vec![square_boundary("s1", 0.0, 0.0, 2.0)];
        let findings = check_school_district_overlaps(&elsd, &scsd, "06", 1.0, &kernel);
        assert_eq!(findings.len(), 1);
        assert!(!findings[0].allowed);
    }

    #[test]
    fn gap_in_coverage_is_reported() {
        let kernel = GeoCrateKernel;
        let parent = MultiPolygon(vec![polygon![
            (x: 0.0, y: 0.0), (x: 3.0, y: 0.0), (x: 3.0, y: 1.0), (x: 0.0, y: 1.0), (x: 0.0, y: 0.0),
        ]]);
        // Only covers 1 of 3 square units -> big gap.
        let children = vec![square_boundary("a", 0.0, 0.0, 1.0)];
        let result = validate_topology("county", &children, Some(&parent), None, &kernel);
        assert!(!result.valid);
        assert!(result.gap_analysis.unwrap().coverage_pct < 95.0);
    }

    #[test]
    fn dual_system_note_is_emitted_for_elsd_even_with_zero_overlapping_pairs() {
        // §8 scenario 3: 166 ELSD boundaries and 0 SCSD boundaries in
        // Connecticut — no ELSD/SCSD pair exists to overlap, but the
        // state-level note must still be emitted.
        let kernel = GeoCrateKernel;
        let children: Vec<NormalizedBoundary> = (0..166)
            .map(|i| square_boundary(&format!("elsd_{i}"), i as f64 * 3.0, 0.0, 1.0))
            .collect();
        let result = validate_topology("elsd", &children, None, Some("09"), &kernel);
        assert!(result.valid);
        assert!(result
            .warnings
            .iter()
            .any(|w| w.contains("Connecticut") && w.contains("dual")));
    }

    #[test]
    fn dual_system_note_is_absent_outside_dual_system_states() {
        let kernel = GeoCrateKernel;
        let children = vec![square_boundary("elsd_1", 0.0, 0.0, 1.0)];
        let result = validate_topology("elsd", &children, None, Some("06"), &kernel);
        assert!(result.warnings.iter().all(|w| !w.contains("dual")));
    }

    #[test]
    fn dual_system_note_is_absent_for_non_school_district_layers() {
        let kernel = GeoCrateKernel;
        let children = vec![square_boundary("c1", 0.0, 0.0, 1.0)];
        let result = validate_topology("county", &children, None, Some("09"), &kernel);
        assert!(result.warnings.iter().all(|w| !w.contains("dual")));
    }
}
