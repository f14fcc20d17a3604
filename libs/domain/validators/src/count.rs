// [libs/domain/validators/src/count.rs]
//! Count validator (§4.6): compares an observed feature count to
//! [`atlas_reference_catalog::expected_count`] for a (layer, state)
//! pair and produces a structured result instead of throwing.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountSeverity {
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountIssue {
    pub severity: CountSeverity,
    pub kind: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountValidationResult {
    pub matches: bool,
    pub issues: Vec<CountIssue>,
}

impl CountValidationResult {
    fn ok() -> Self {
        Self {
            matches: true,
            issues: Vec::new(),
        }
    }

    fn with_issue(matches: bool, issue: CountIssue) -> Self {
        Self {
            matches,
            issues: vec![issue],
        }
    }
}

/// `{matches: bool, issues: [...]}` (§4.6). An unknown (layer, state)
/// pair — no reference entry at all — is reported as an `info` issue,
/// not an error: the catalog simply has no opinion on that layer.
pub fn validate_count(
    layer: &str,
    state_fips: Option<&str>,
    observed_count: u64,
) -> CountValidationResult {
    match atlas_reference_catalog::expected_count(layer, state_fips) {
        None => CountValidationResult::with_issue(
            true,
            CountIssue {
                severity: CountSeverity::Info,
                kind: "no_reference_count".to_string(),
                message: format!(
                    "no expected count on file for layer {layer} / state {state_fips:?}; \
                     skipping the count check"
                ),
            },
        ),
        Some(expected) if expected as u64 == observed_count => CountValidationResult::ok(),
        Some(expected) => CountValidationResult::with_issue(
            false,
            CountIssue {
                severity: CountSeverity::Error,
                kind: "count_mismatch".to_string(),
                message: format!(
                    "expected {expected} {layer} features for state {state_fips:?}, found {observed_count}"
                ),
            },
        ),
    }
}

/// §4.6: "Configuration mismatches (e.g., a state having district
/// types its system does not allow) are errors." `allowed_layers` is
/// the state's `DistrictSystemConfig`-equivalent allow-list.
pub fn validate_layer_allowed(
    layer: &str,
    state_fips: &str,
    allowed_layers: &[&str],
) -> CountValidationResult {
    let layer_upper = layer.to_ascii_uppercase();
    if allowed_layers
        .iter()
        .any(|l| l.eq_ignore_ascii_case(&layer_upper))
    {
        return CountValidationResult::ok();
    }
    CountValidationResult::with_issue(
        false,
        CountIssue {
            severity: CountSeverity::Error,
            kind: "layer_not_allowed_for_state".to_string(),
            message: format!("state {state_fips} does not use the {layer} district system"),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn california_cd_count_matches_expected() {
        let result = validate_count("cd", Some("06"), 52);
        assert!(result.matches);
        assert!(result.issues.is_empty());
    }

    #[test]
    fn california_cd_count_mismatch_is_an_error() {
        let result = validate_count("cd", Some("06"), 53);
        assert!(!result.matches);
        assert_eq!(result.issues[0].severity, CountSeverity::Error);
        assert_eq!(result.issues[0].kind, "count_mismatch");
    }

    #[test]
    fn unknown_layer_is_informational_not_an_error() {
        let result = validate_count("unsd", Some("06"), 12);
        assert!(result.matches);
        assert_eq!(result.issues[0].severity, CountSeverity::Info);
    }

    #[test]
    fn disallowed_layer_for_state_is_an_error() {
        let result = validate_layer_allowed("sldl", "31", &["sldu"]);
        assert!(!result.matches);
        assert_eq!(result.issues[0].kind, "layer_not_allowed_for_state");
    }
}
