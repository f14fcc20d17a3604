// [libs/infra/portal-scanner/src/scoring.rs]

/// §4.5 REST enumeration keyword list; also used by the title scorer
/// since a matching layer name is itself decent title-scoring signal.
pub const GOVERNANCE_KEYWORDS: &[&str] = &[
    "council",
    "district",
    "ward",
    "precinct",
    "voting",
    "electoral",
    "boundary",
    "legislative",
    "municipal",
    "city",
    "county",
    "governance",
];

pub const MIN_SURFACE_SCORE: u8 = 30;

/// Authority boost applied to candidates sourced from a known state GIS
/// portal (§4.5: "+15 to +20 authority boost"). Fixed at the midpoint
/// of that range rather than varied per portal.
pub const STATE_AUTHORITY_BOOST: u8 = 18;

/// A small keyword-overlap scorer: each governance keyword present in
/// the title contributes, with diminishing returns past the third hit
/// so a title stuffed with keywords doesn't trivially cap at 100.
pub fn score_title(title: &str) -> u8 {
    let lower = title.to_lowercase();
    let hits: Vec<&&str> = GOVERNANCE_KEYWORDS.iter().filter(|kw| lower.contains(**kw)).collect();
    if hits.is_empty() {
        return 10;
    }
    let mut score: u32 = 20;
    for (i, _) in hits.iter().enumerate() {
        score += match i {
            0 => 30,
            1 => 20,
            2 => 10,
            _ => 3,
        };
    }
    score.min(100) as u8
}

pub fn is_polygonal_geometry_type(geometry_type: &str) -> bool {
    matches!(
        geometry_type.to_lowercase().as_str(),
        "polygon" | "multipolygon" | "esrigeometrypolygon"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_with_no_governance_keyword_scores_low() {
        assert!(score_title("Streetlights") < MIN_SURFACE_SCORE);
    }

    #[test]
    fn title_with_one_keyword_clears_the_surface_threshold() {
        assert!(score_title("City Council Districts") >= MIN_SURFACE_SCORE);
    }

    #[test]
    fn title_with_many_keywords_caps_at_100() {
        assert_eq!(
            score_title("City County Municipal Council Ward Precinct Voting Electoral Boundary Legislative District Governance"),
            100
        );
    }

    #[test]
    fn polygonal_geometry_types_are_recognized() {
        assert!(is_polygonal_geometry_type("esriGeometryPolygon"));
        assert!(is_polygonal_geometry_type("MultiPolygon"));
        assert!(!is_polygonal_geometry_type("esriGeometryPoint"));
    }
}
