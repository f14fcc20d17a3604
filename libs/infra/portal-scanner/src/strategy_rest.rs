// [libs/infra/portal-scanner/src/strategy_rest.rs]
//! Strategy 4 (§4.5, §9): recursive traversal of an ArcGIS REST
//! services tree. The depth cap, folder skip-list, and per-request
//! delay are part of the contract, not incidental (§9) — preserved
//! exactly to avoid throttling and runaway scans.

use std::time::Duration;

use atlas_models::PortalFamily;
use reqwest::Client;
use serde::Deserialize;

use crate::candidate::PortalCandidate;
use crate::errors::ScanError;
use crate::scoring::{is_polygonal_geometry_type, score_title, GOVERNANCE_KEYWORDS};

/// §4.5: folders matching these names are pruned from the traversal.
pub const SKIP_LIST: &[&str] = &[
    "utilities",
    "transportation",
    "basemaps",
    "imagery",
    "elevation",
    "parcels",
    "environment",
    "recreation",
];

/// §4.5: traversal depth cap.
pub const MAX_DEPTH: u32 = 5;

/// §4.5 / §5: politeness floor — at most 10 req/s to any one server.
pub const MIN_REQUEST_DELAY: Duration = Duration::from_millis(100);

pub fn should_prune_folder(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    SKIP_LIST.iter().any(|skip| lower.contains(skip))
}

/// §4.5 strategy 4 keep condition: layer name matches a governance
/// keyword *and* its geometry type is polygonal.
pub fn layer_is_governance_candidate(name: &str, geometry_type: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    let has_keyword = GOVERNANCE_KEYWORDS.iter().any(|kw| lower.contains(kw));
    has_keyword && is_polygonal_geometry_type(geometry_type)
}

#[derive(Debug, Deserialize)]
struct RestFolderResponse {
    #[serde(default)]
    folders: Vec<String>,
    #[serde(default)]
    layers: Vec<RestLayer>,
}

#[derive(Debug, Deserialize)]
struct RestLayer {
    id: u32,
    name: String,
    #[serde(rename = "geometryType", default)]
    geometry_type: String,
}

pub struct RestEnumerator<'a> {
    client: &'a Client,
}

impl<'a> RestEnumerator<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Recursively walks `base_url` (an ArcGIS REST `/services` tree
    /// root), pruning skip-listed folders and capping depth at
    /// [`MAX_DEPTH`], sleeping [`MIN_REQUEST_DELAY`] between requests.
    pub async fn enumerate(&self, base_url: &str) -> Result<Vec<PortalCandidate>, ScanError> {
        let mut found = Vec::new();
        self.walk(base_url, 0, &mut found).await?;
        Ok(found)
    }

    async fn walk(
        &self,
        url: &str,
        depth: u32,
        found: &mut Vec<PortalCandidate>,
    ) -> Result<(), ScanError> {
        if depth >= MAX_DEPTH {
            return Ok(());
        }
        tokio::time::sleep(MIN_REQUEST_DELAY).await;
        let response = self
            .client
            .get(url)
            .query(&[("f", "json")])
            .send()
            .await?
            .error_for_status()?;
        let parsed: RestFolderResponse = response.json().await?;

        for layer in &parsed.layers {
            if layer_is_governance_candidate(&layer.name, &layer.geometry_type) {
                found.push(PortalCandidate {
                    id: format!("rest:{url}:{}", layer.id),
                    score: score_title(&layer.name),
                    title: layer.name.clone(),
                    description: format!("ArcGIS REST layer at depth {depth}"),
                    url: url.to_string(),
                    download_url: format!("{url}/{}/query?f=geojson&where=1=1", layer.id),
                    portal_type: PortalFamily::Arcgis,
                    feature_count: None,
                });
            }
        }

        for folder in &parsed.folders {
            if should_prune_folder(folder) {
                continue;
            }
            let child_url = format!("{}/{}", url.trim_end_matches('/'), folder);
            Box::pin(self.walk(&child_url, depth + 1, found)).await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skip_list_prunes_utilities_and_transportation() {
        assert!(should_prune_folder("Utilities"));
        assert!(should_prune_folder("transportation_network"));
        assert!(!should_prune_folder("Governance"));
    }

    #[test]
    fn governance_layer_requires_keyword_and_polygon_geometry() {
        assert!(layer_is_governance_candidate("City Council Districts", "esriGeometryPolygon"));
        assert!(!layer_is_governance_candidate("City Council Districts", "esriGeometryPoint"));
        assert!(!layer_is_governance_candidate("Fire Hydrants", "esriGeometryPolygon"));
    }

    #[test]
    fn max_depth_cap_is_five() {
        assert_eq!(MAX_DEPTH, 5);
    }
}
