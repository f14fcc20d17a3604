// [libs/domain/validators/src/geoid.rs]
//! GEOID format validator (§4.6): `validate_geoid(geoid, state_fips,
//! layer)` enforces digit-only strings of the layer-specific length,
//! prefixed by the state FIPS.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeoidError {
    #[error("GEOID '{geoid}' contains a non-digit character")]
    NotDigits { geoid: String },
    #[error("GEOID '{geoid}' has length {actual}, expected {expected} for layer {layer}")]
    WrongLength {
        geoid: String,
        layer: String,
        actual: usize,
        expected: usize,
    },
    #[error("GEOID '{geoid}' is not prefixed by state FIPS {state_fips}")]
    WrongStatePrefix { geoid: String, state_fips: String },
    #[error("layer '{0}' has no registered GEOID length")]
    UnknownLayer(String),
}

/// Layer-specific total GEOID length (state FIPS prefix included).
fn expected_length(layer: &str) -> Option<usize> {
    match layer.to_ascii_uppercase().as_str() {
        "CD" => Some(4),
        "COUNTY" => Some(5),
        "SLDU" | "SLDL" => Some(5),
        "PLACE" => Some(7),
        "UNSD" | "ELSD" | "SCSD" => Some(7),
        "COUSUB" => Some(10),
        "VTD" => Some(11),
        _ => None,
    }
}

/// `validate_geoid(geoid, state_fips, layer)` (§4.6). Enforces a
/// digit-only string of the layer's expected length, prefixed by
/// `state_fips`. An unrecognized layer is itself an error: the caller
/// asked for a check this validator cannot perform, which is different
/// from "no opinion" (unlike the count validator's unknown-layer case).
pub fn validate_geoid(geoid: &str, state_fips: &str, layer: &str) -> Result<(), GeoidError> {
    if !geoid.chars().all(|c| c.is_ascii_digit()) {
        return Err(GeoidError::NotDigits {
            geoid: geoid.to_string(),
        });
    }
    let expected = expected_length(layer).ok_or_else(|| GeoidError::UnknownLayer(layer.to_string()))?;
    if geoid.len() != expected {
        return Err(GeoidError::WrongLength {
            geoid: geoid.to_string(),
            layer: layer.to_string(),
            actual: geoid.len(),
            expected,
        });
    }
    if !geoid.starts_with(state_fips) {
        return Err(GeoidError::WrongStatePrefix {
            geoid: geoid.to_string(),
            state_fips: state_fips.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_school_district_geoid_is_seven_digits() {
        assert!(validate_geoid("0612345", "06", "unsd").is_ok());
    }

    #[test]
    fn valid_vtd_geoid_is_eleven_digits() {
        assert!(validate_geoid("06001012345", "06", "vtd").is_ok());
    }

    #[test]
    fn rejects_non_digit_characters() {
        assert_eq!(
            validate_geoid("06A2345", "06", "unsd"),
            Err(GeoidError::NotDigits {
                geoid: "06A2345".to_string()
            })
        );
    }

    #[test]
    fn rejects_wrong_length() {
        let err = validate_geoid("061234", "06", "unsd").unwrap_err();
        assert!(matches!(err, GeoidError::WrongLength { expected: 7, actual: 6, .. }));
    }

    #[test]
    fn rejects_mismatched_state_prefix() {
        let err = validate_geoid("3612345", "06", "unsd").unwrap_err();
        assert!(matches!(err, GeoidError::WrongStatePrefix { .. }));
    }

    #[test]
    fn unknown_layer_is_an_error_not_a_silent_pass() {
        assert_eq!(
            validate_geoid("0612345", "06", "nonsense"),
            Err(GeoidError::UnknownLayer("nonsense".to_string()))
        );
    }
}
