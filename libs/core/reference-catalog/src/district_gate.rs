// [libs/core/reference-catalog/src/district_gate.rs]
//! `expected_district_count(place_fips)` — the explicit defense against
//! the Cincinnati failure mode (§4.1, §4.5, §8 scenario 1): a place
//! with many non-governance subdivisions (neighborhoods, community
//! councils) must not be mistaken for one with that many elected
//! districts.

/// `{expected: int | None (at-large), city_name, notes?}` (§4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpectedDistrictCount {
    pub expected: Option<u32>,
    pub city_name: &'static str,
    pub notes: Option<&'static str>,
}

/// Known place FIPS → expected elected-district count. `None` marks an
/// at-large council (one citywide seat per candidate, no sub-districts).
const PLACE_DISTRICT_TABLE: &[(&str, ExpectedDistrictCount)] = &[
    (
        "3915000",
        ExpectedDistrictCount {
            expected: Some(9),
            city_name: "Cincinnati",
            notes: Some(
                "9 elected council districts; do not confuse with the city's ~74 \
                 community council planning areas, which are not electoral boundaries.",
            ),
        },
    ),
    (
        "0644000",
        ExpectedDistrictCount {
            expected: Some(15),
            city_name: "Los Angeles",
            notes: Some("15 council districts, elected by district, not at-large."),
        },
    ),
    (
        "0667000",
        ExpectedDistrictCount {
            expected: None,
            city_name: "Palo Alto",
            notes: Some("city council elected at-large citywide; no sub-districts expected."),
        },
    ),
];

/// `expected_district_count(place_fips) → {expected, city_name, notes}` (§4.1).
pub fn expected_district_count(place_fips: &str) -> Option<ExpectedDistrictCount> {
    PLACE_DISTRICT_TABLE
        .iter()
        .find(|(fips, _)| *fips == place_fips)
        .map(|(_, v)| *v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cincinnati_expects_nine_districts() {
        let entry = expected_district_count("3915000").expect("cincinnati entry");
        assert_eq!(entry.expected, Some(9));
        assert_eq!(entry.city_name, "Cincinnati");
    }

    #[test]
    fn unknown_place_returns_none() {
        assert!(expected_district_count("9999999").is_none());
    }
}
