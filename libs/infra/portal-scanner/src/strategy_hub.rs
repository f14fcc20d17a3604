// [libs/infra/portal-scanner/src/strategy_hub.rs]
//! Strategy 2 (§4.5): keyword search against an ArcGIS Hub `/datasets`
//! endpoint.

use atlas_models::PortalFamily;
use reqwest::Client;
use serde::Deserialize;

use crate::candidate::PortalCandidate;
use crate::errors::ScanError;
use crate::scoring::score_title;

#[derive(Debug, Deserialize)]
struct HubSearchResponse {
    #[serde(default)]
    data: Vec<HubDataset>,
}

#[derive(Debug, Deserialize)]
struct HubDataset {
    id: String,
    attributes: HubAttributes,
}

#[derive(Debug, Deserialize)]
struct HubAttributes {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    url: Option<String>,
}

/// Queries `{hub_base}/datasets?q={query}` and maps each result into a
/// scored [`PortalCandidate`]. Candidates below
/// [`crate::scoring::MIN_SURFACE_SCORE`] are dropped by the caller, not
/// here — this strategy only shapes the data.
pub async fn search(client: &Client, hub_base: &str, query: &str) -> Result<Vec<PortalCandidate>, ScanError> {
    let url = format!("{}/datasets", hub_base.trim_end_matches('/'));
    let response = client
        .get(&url)
        .query(&[("q", query), ("f", "json")])
        .send()
        .await?
        .error_for_status()?;
    let parsed: HubSearchResponse = response.json().await?;

    Ok(parsed
        .data
        .into_iter()
        .map(|d| {
            let download_url = d
                .attributes
                .url
                .clone()
                .unwrap_or_else(|| format!("{hub_base}/datasets/{}", d.id));
            PortalCandidate {
                id: format!("hub:{}", d.id),
                score: score_title(&d.attributes.name),
                title: d.attributes.name,
                description: d.attributes.description,
                url: download_url.clone(),
                download_url,
                portal_type: PortalFamily::ArcgisHub,
                feature_count: None,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hub_attributes_deserialize_with_missing_optional_fields() {
        let raw = r#"{"data":[{"id":"abc","attributes":{"name":"City Council Districts"}}]}"#;
        let parsed: HubSearchResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.data.len(), 1);
        assert_eq!(parsed.data[0].attributes.name, "City Council Districts");
    }
}
