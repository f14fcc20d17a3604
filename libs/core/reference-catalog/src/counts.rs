// [libs/core/reference-catalog/src/counts.rs]
//! Expected per-(layer, state) feature counts and the cross-sum
//! invariants checked at startup (§4.1, §8).

/// 2020-apportionment congressional district counts, keyed by state
/// FIPS. Sums to 435 (§8). DC is intentionally absent (no voting CD).
pub const EXPECTED_CD_BY_STATE: &[(&str, u32)] = &[
    ("01", 7), ("02", 1), ("04", 9), ("05", 4), ("06", 52),
    ("08", 8), ("09", 5), ("10", 1), ("12", 28), ("13", 14),
    ("15", 2), ("16", 2), ("17", 17), ("18", 9), ("19", 4),
    ("20", 4), ("21", 6), ("22", 6), ("23", 2), ("24", 8),
    ("25", 9), ("26", 13), ("27", 8), ("28", 4), ("29", 8),
    ("30", 2), ("31", 3), ("32", 4), ("33", 2), ("34", 12),
    ("35", 3), ("36", 26), ("37", 14), ("38", 1), ("39", 15),
    ("40", 5), ("41", 6), ("42", 17), ("44", 2), ("45", 7),
    ("46", 1), ("47", 9), ("48", 38), ("49", 4), ("50", 1),
    ("51", 11), ("53", 10), ("54", 2), ("55", 8), ("56", 1),
];

/// County (and county-equivalent) counts by state FIPS. Sums to 3,143
/// (§8). DC is counted as its own single county-equivalent.
pub const EXPECTED_COUNTIES_BY_STATE: &[(&str, u32)] = &[
    ("01", 67), ("02", 30), ("04", 15), ("05", 75), ("06", 58),
    ("08", 64), ("09", 8), ("10", 3), ("11", 1), ("12", 67),
    ("13", 159), ("15", 5), ("16", 44), ("17", 102), ("18", 92),
    ("19", 99), ("20", 105), ("21", 120), ("22", 64), ("23", 16),
    ("24", 24), ("25", 14), ("26", 83), ("27", 87), ("28", 82),
    ("29", 115), ("30", 56), ("31", 93), ("32", 17), ("33", 10),
    ("34", 21), ("35", 33), ("36", 62), ("37", 100), ("38", 53),
    ("39", 88), ("40", 77), ("41", 36), ("42", 67), ("44", 5),
    ("45", 46), ("46", 66), ("47", 95), ("48", 254), ("49", 29),
    ("50", 14), ("51", 133), ("53", 39), ("54", 55), ("55", 72),
    ("56", 23),
];

/// State legislative upper-chamber (SLDU) seat counts. Nebraska (31)
/// is the sole unicameral legislature: its single chamber is modeled
/// as SLDU=49, SLDL=0 (§8).
pub const EXPECTED_SLDU_BY_STATE: &[(&str, u32)] = &[
    ("01", 35), ("02", 20), ("04", 30), ("05", 35), ("06", 40),
    ("08", 35), ("09", 36), ("10", 21), ("11", 0), ("12", 40),
    ("13", 56), ("15", 25), ("16", 35), ("17", 59), ("18", 50),
    ("19", 50), ("20", 40), ("21", 38), ("22", 39), ("23", 35),
    ("24", 47), ("25", 40), ("26", 38), ("27", 67), ("28", 52),
    ("29", 34), ("30", 50), ("31", 49), ("32", 21), ("33", 24),
    ("34", 40), ("35", 42), ("36", 63), ("37", 50), ("38", 47),
    ("39", 33), ("40", 48), ("41", 30), ("42", 50), ("44", 38),
    ("45", 46), ("46", 35), ("47", 33), ("48", 31), ("49", 29),
    ("50", 30), ("51", 40), ("53", 49), ("54", 17), ("55", 33),
    ("56", 30),
];

/// State legislative lower-chamber (SLDL) seat counts. Nebraska (31)
/// is 0 — its legislature has no separate lower chamber (§8).
pub const EXPECTED_SLDL_BY_STATE: &[(&str, u32)] = &[
    ("01", 105), ("02", 40), ("04", 60), ("05", 100), ("06", 80),
    ("08", 65), ("09", 151), ("10", 41), ("11", 0), ("12", 120),
    ("13", 180), ("15", 51), ("16", 70), ("17", 118), ("18", 100),
    ("19", 100), ("20", 125), ("21", 100), ("22", 105), ("23", 151),
    ("24", 141), ("25", 160), ("26", 110), ("27", 134), ("28", 122),
    ("29", 163), ("30", 100), ("31", 0), ("32", 42), ("33", 400),
    ("34", 80), ("35", 70), ("36", 150), ("37", 120), ("38", 94),
    ("39", 99), ("40", 101), ("41", 60), ("42", 203), ("44", 75),
    ("45", 124), ("46", 70), ("47", 99), ("48", 150), ("49", 75),
    ("50", 150), ("51", 100), ("53", 98), ("54", 100), ("55", 99),
    ("56", 60),
];

fn lookup(table: &[(&str, u32)], fips: &str) -> Option<u32> {
    table.iter().find(|(f, _)| *f == fips).map(|(_, n)| *n)
}

/// `expected_count(layer, state?) → integer | None` (§4.1). `layer` is
/// matched case-insensitively against the TIGER layer code.
pub fn expected_count(layer: &str, state_fips: Option<&str>) -> Option<u32> {
    let layer_upper = layer.to_ascii_uppercase();
    match (layer_upper.as_str(), state_fips) {
        ("CD", Some(fips)) => lookup(EXPECTED_CD_BY_STATE, fips),
        ("CD", None) => Some(EXPECTED_CD_BY_STATE.iter().map(|(_, n)| *n).sum()),
        ("COUNTY", Some(fips)) => lookup(EXPECTED_COUNTIES_BY_STATE, fips),
        ("COUNTY", None) => Some(EXPECTED_COUNTIES_BY_STATE.iter().map(|(_, n)| *n).sum()),
        ("SLDU", Some(fips)) => lookup(EXPECTED_SLDU_BY_STATE, fips),
        ("SLDL", Some(fips)) => lookup(EXPECTED_SLDL_BY_STATE, fips),
        _ => None,
    }
}

/// Every cross-sum invariant §8 requires, run once at startup
/// (§4.1's `ReferenceDataInvalid` fatal-at-startup contract).
pub fn validate_cross_sums() -> Result<(), String> {
    let cd_sum: u32 = EXPECTED_CD_BY_STATE.iter().map(|(_, n)| *n).sum();
    if cd_sum != 435 {
        return Err(format!("EXPECTED_CD_BY_STATE sums to {cd_sum}, expected 435"));
    }

    let county_sum: u32 = EXPECTED_COUNTIES_BY_STATE.iter().map(|(_, n)| *n).sum();
    if county_sum != 3143 {
        return Err(format!(
            "EXPECTED_COUNTIES_BY_STATE sums to {county_sum}, expected 3143"
        ));
    }

    match lookup(EXPECTED_SLDU_BY_STATE, "31") {
        Some(49) => {}
        other => return Err(format!("SLDU['31'] = {other:?}, expected Some(49)")),
    }

    match lookup(EXPECTED_SLDL_BY_STATE, "31") {
        Some(0) => {}
        other => return Err(format!("SLDL['31'] = {other:?}, expected Some(0)")),
    }

    // Every state FIPS participating in the per-state tables must have
    // an entry in each — a missing entry for a participating state is
    // as much an invariant violation as a wrong sum.
    for (fips, _, _) in crate::state_fips::STATE_FIPS_TABLE {
        if *fips == "11" {
            continue; // DC has no congressional district.
        }
        if lookup(EXPECTED_CD_BY_STATE, fips).is_none() {
            return Err(format!("state {fips} missing from EXPECTED_CD_BY_STATE"));
        }
        if lookup(EXPECTED_COUNTIES_BY_STATE, fips).is_none() {
            return Err(format!("state {fips} missing from EXPECTED_COUNTIES_BY_STATE"));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cross_sums_hold() {
        assert!(validate_cross_sums().is_ok());
    }

    #[test]
    fn california_expects_fifty_two_congressional_districts() {
        assert_eq!(expected_count("cd", Some("06")), Some(52));
        assert_eq!(expected_count("CD", Some("06")), Some(52));
    }

    #[test]
    fn nebraska_is_unicameral() {
        assert_eq!(expected_count("sldu", Some("31")), Some(49));
        assert_eq!(expected_count("sldl", Some("31")), Some(0));
    }

    #[test]
    fn unknown_layer_returns_none() {
        assert_eq!(expected_count("unsd", Some("06")), None);
    }
}
