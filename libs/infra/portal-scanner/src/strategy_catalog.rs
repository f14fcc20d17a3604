// [libs/infra/portal-scanner/src/strategy_catalog.rs]
//! Strategy 3 (§4.5): CKAN `package_search` or Socrata catalog search.

use atlas_models::PortalFamily;
use reqwest::Client;
use serde::Deserialize;

use crate::candidate::PortalCandidate;
use crate::errors::ScanError;
use crate::scoring::score_title;

#[derive(Debug, Deserialize)]
struct CkanSearchResponse {
    result: CkanSearchResult,
}

#[derive(Debug, Deserialize)]
struct CkanSearchResult {
    #[serde(default)]
    results: Vec<CkanPackage>,
}

#[derive(Debug, Deserialize)]
struct CkanPackage {
    id: String,
    title: String,
    #[serde(default)]
    notes: String,
    #[serde(default)]
    resources: Vec<CkanResource>,
}

#[derive(Debug, Deserialize)]
struct CkanResource {
    url: String,
    #[serde(default)]
    format: String,
}

/// `{ckan_base}/api/3/action/package_search?q={query}`.
pub async fn search_ckan(client: &Client, ckan_base: &str, query: &str) -> Result<Vec<PortalCandidate>, ScanError> {
    let url = format!("{}/api/3/action/package_search", ckan_base.trim_end_matches('/'));
    let response = client
        .get(&url)
        .query(&[("q", query)])
        .send()
        .await?
        .error_for_status()?;
    let parsed: CkanSearchResponse = response.json().await?;

    Ok(parsed
        .result
        .results
        .into_iter()
        .map(|pkg| {
            let download_url = pkg
                .resources
                .iter()
                .find(|r| {
                    let fmt = r.format.to_lowercase();
                    fmt.contains("geojson") || fmt.contains("shp") || fmt.contains("zip")
                })
                .map(|r| r.url.clone())
                .unwrap_or_default();
            PortalCandidate {
                id: format!("ckan:{}", pkg.id),
                score: score_title(&pkg.title),
                title: pkg.title,
                description: pkg.notes,
                url: download_url.clone(),
                download_url,
                portal_type: PortalFamily::Ckan,
                feature_count: None,
            }
        })
        .collect())
}

#[derive(Debug, Deserialize)]
struct SocrataDataset {
    resource: SocrataResource,
}

#[derive(Debug, Deserialize)]
struct SocrataResource {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
}

/// `{socrata_base}/api/catalog/v1?q={query}&only=datasets`.
pub async fn search_socrata(client: &Client, socrata_base: &str, query: &str) -> Result<Vec<PortalCandidate>, ScanError> {
    let url = format!("{}/api/catalog/v1", socrata_base.trim_end_matches('/'));
    let response = client
        .get(&url)
        .query(&[("q", query), ("only", "datasets")])
        .send()
        .await?
        .error_for_status()?;
    let parsed: Vec<SocrataDataset> = response
        .json::<serde_json::Value>()
        .await?
        .get("results")
        .cloned()
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e: serde_json::Error| ScanError::Schema(e.to_string()))?
        .unwrap_or_default();

    Ok(parsed
        .into_iter()
        .map(|d| PortalCandidate {
            id: format!("socrata:{}", d.resource.id),
            score: score_title(&d.resource.name),
            title: d.resource.name,
            description: d.resource.description,
            download_url: format!("{socrata_base}/resource/{}.geojson", d.resource.id),
            url: format!("{socrata_base}/d/{}", d.resource.id),
            portal_type: PortalFamily::Socrata,
            feature_count: None,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ckan_package_picks_the_geojson_resource_when_present() {
        let raw = r#"{
            "id": "pkg1",
            "title": "Council Districts",
            "resources": [
                {"url": "https://x/file.csv", "format": "CSV"},
                {"url": "https://x/file.geojson", "format": "GeoJSON"}
            ]
        }"#;
        let pkg: CkanPackage = serde_json::from_str(raw).unwrap();
        let chosen = pkg
            .resources
            .iter()
            .find(|r| r.format.to_lowercase().contains("geojson"))
            .unwrap();
        assert_eq!(chosen.url, "https://x/file.geojson");
    }
}
