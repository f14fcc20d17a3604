// [libs/infra/portal-scanner/src/gate.rs]
//! The district-count gate (§4.1, §4.5, §8 scenario 1) — the explicit
//! defense against the Cincinnati failure mode (9 elected council
//! districts vs. ~74 non-electoral community council planning areas).
//! Every candidate is cross-checked against C1's expected-district
//! table before being surfaced; candidates that fail the gate are
//! dropped outright, not merely down-scored.

use atlas_reference_catalog::expected_district_count;

use crate::candidate::PortalCandidate;

/// A candidate that survived the gate, carrying the confidence the
/// gate assigned (not the raw title-score on [`PortalCandidate`]).
#[derive(Debug, Clone)]
pub struct GatedCandidate {
    pub candidate: PortalCandidate,
    pub confidence: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateRejection {
    pub candidate_id: String,
    pub reason: String,
}

/// §4.5 district-count gate:
/// - exact match => confidence 100
/// - |diff| <= 2 => confidence 70 (recent-redistricting tolerance)
/// - |diff| > 2 => rejected
/// - expected is at-large (`None`) and `feature_count == 1` =>
///   confidence 100; any other feature count => rejected
/// - unknown jurisdiction => confidence 50, passed through
pub fn apply_district_gate(
    candidate: PortalCandidate,
    place_fips: &str,
) -> Result<GatedCandidate, GateRejection> {
    let candidate_id = candidate.id.clone();
    let observed = candidate.feature_count;

    let Some(expected) = expected_district_count(place_fips) else {
        return Ok(GatedCandidate {
            confidence: 50,
            candidate,
        });
    };

    match expected.expected {
        None => match observed {
            Some(1) => Ok(GatedCandidate {
                confidence: 100,
                candidate,
            }),
            _ => Err(GateRejection {
                candidate_id,
                reason: format!(
                    "{} is an at-large jurisdiction (no sub-districts expected); \
                     candidate reports {:?} feature(s)",
                    expected.city_name, observed
                ),
            }),
        },
        Some(expected_n) => {
            let observed_n = observed.unwrap_or(0);
            let diff = (observed_n as i64 - expected_n as i64).abs();
            if diff == 0 {
                Ok(GatedCandidate {
                    confidence: 100,
                    candidate,
                })
            } else if diff <= 2 {
                Ok(GatedCandidate {
                    confidence: 70,
                    candidate,
                })
            } else {
                Err(GateRejection {
                    candidate_id,
                    reason: format!(
                        "Expected {expected_n} districts, found {observed_n} (diff: {diff}) for {}",
                        expected.city_name
                    ),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlas_models::PortalFamily;

    fn candidate(feature_count: Option<u64>) -> PortalCandidate {
        PortalCandidate {
            id: "cand_1".into(),
            title: "Cincinnati Community Councils".into(),
            description: String::new(),
            url: "https://example.test".into(),
            download_url: "https://example.test/download".into(),
            score: 80,
            portal_type: PortalFamily::ArcgisHub,
            feature_count,
        }
    }

    #[test]
    fn cincinnati_gate_rejects_seventy_four_community_councils() {
        let err = apply_district_gate(candidate(Some(74)), "3915000").unwrap_err();
        assert!(err.reason.contains("Expected 9 districts, found 74 (diff: 65)"));
    }

    #[test]
    fn exact_match_yields_full_confidence() {
        let gated = apply_district_gate(candidate(Some(9)), "3915000").unwrap();
        assert_eq!(gated.confidence, 100);
    }

    #[test]
    fn small_diff_within_redistricting_tolerance() {
        let gated = apply_district_gate(candidate(Some(11)), "3915000").unwrap();
        assert_eq!(gated.confidence, 70);
    }

    #[test]
    fn at_large_jurisdiction_requires_exactly_one_feature() {
        let gated = apply_district_gate(candidate(Some(1)), "0667000").unwrap();
        assert_eq!(gated.confidence, 100);

        let err = apply_district_gate(candidate(Some(5)), "0667000").unwrap_err();
        assert!(err.reason.contains("at-large"));
    }

    #[test]
    fn unknown_jurisdiction_passes_through_at_half_confidence() {
        let gated = apply_district_gate(candidate(Some(4)), "9999999").unwrap();
        assert_eq!(gated.confidence, 50);
    }
}
