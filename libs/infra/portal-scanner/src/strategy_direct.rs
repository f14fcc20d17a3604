// [libs/infra/portal-scanner/src/strategy_direct.rs]
//! Strategy 1 (§4.5): fixed, pre-registered layer IDs for known state
//! GIS portals. No network call is needed to enumerate candidates —
//! only to verify that the registered layer's geometry type is
//! polygonal, which the caller does via [`verify_polygonal`].

use atlas_models::PortalFamily;

use crate::candidate::PortalCandidate;
use crate::scoring::is_polygonal_geometry_type;

/// A pre-registered layer on a known state GIS REST service.
#[derive(Debug, Clone, Copy)]
pub struct DirectLayerEntry {
    pub jurisdiction_id: &'static str,
    pub title: &'static str,
    pub service_url: &'static str,
    pub layer_id: u32,
}

/// §4.5 example: Hawaii Statewide GIS Program's council-district REST
/// layer, pinned by ID rather than discovered, since HI's portal is
/// well known and stable.
pub const DIRECT_LAYER_TABLE: &[DirectLayerEntry] = &[DirectLayerEntry {
    jurisdiction_id: "15",
    title: "Hawaii State House Districts",
    service_url: "https://geodata.hawaii.gov/arcgis/rest/services/Boundaries/MapServer",
    layer_id: 2,
}];

pub fn candidates_for(jurisdiction_id: &str) -> Vec<PortalCandidate> {
    DIRECT_LAYER_TABLE
        .iter()
        .filter(|e| e.jurisdiction_id == jurisdiction_id)
        .map(|e| {
            let url = format!("{}/{}", e.service_url, e.layer_id);
            PortalCandidate {
                id: format!("direct:{}:{}", e.service_url, e.layer_id),
                title: e.title.to_string(),
                description: "pre-registered state GIS layer".to_string(),
                url: url.clone(),
                download_url: format!("{url}/query?f=geojson&where=1=1"),
                score: 100,
                portal_type: PortalFamily::StateGis,
                feature_count: None,
            }
        })
        .collect()
}

/// Direct-layer candidates skip title scoring but still must pass the
/// polygon-geometry check before being surfaced (§4.5 strategy 1:
/// "Verify geometry type is polygonal").
pub fn verify_polygonal(geometry_type: &str) -> bool {
    is_polygonal_geometry_type(geometry_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hawaii_is_registered_for_its_state_fips() {
        let found = candidates_for("15");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].portal_type, PortalFamily::StateGis);
    }

    #[test]
    fn unregistered_jurisdiction_returns_nothing() {
        assert!(candidates_for("06").is_empty());
    }

    #[test]
    fn geometry_verification_rejects_points() {
        assert!(verify_polygonal("esriGeometryPolygon"));
        assert!(!verify_polygonal("esriGeometryPoint"));
    }
}
