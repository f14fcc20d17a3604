// [libs/infra/boundary-providers/src/ckan.rs]
use async_trait::async_trait;
use atlas_models::NormalizedBoundary;
use reqwest::Client;
use serde_json::Value;
use tracing::{info, instrument};

use crate::arcgis::parse_feature_collection;
use crate::errors::ProviderError;
use crate::options::{DownloadOptions, RawFile};
use crate::provider::BoundaryProvider;

/// CKAN `package_show` lookup followed by a GET of the first GeoJSON
/// resource — the same two-step shape every CKAN open-data portal uses
/// (data.gov, many state/county clearinghouses).
pub struct CkanProvider {
    client: Client,
    portal_base: String,
    package_id: String,
    geoid_field: String,
    name_field: String,
}

impl CkanProvider {
    pub fn new(
        portal_base: impl Into<String>,
        package_id: impl Into<String>,
        geoid_field: impl Into<String>,
        name_field: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::builder()
                .user_agent("shadow-atlas-boundary-providers/1.0")
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("reqwest client builds with a static config"),
            portal_base: portal_base.into(),
            package_id: package_id.into(),
            geoid_field: geoid_field.into(),
            name_field: name_field.into(),
        }
    }

    fn package_show_url(&self) -> String {
        format!(
            "{}/api/3/action/package_show?id={}",
            self.portal_base.trim_end_matches('/'),
            self.package_id
        )
    }
}

#[async_trait]
impl BoundaryProvider for CkanProvider {
    #[instrument(skip(self), fields(package = %self.package_id))]
    async fn download_layer(&self, _opts: &DownloadOptions) -> Result<Vec<RawFile>, ProviderError> {
        let package_json: Value = self
            .client
            .get(self.package_show_url())
            .send()
            .await?
            .json()
            .await?;

        let resources = package_json["result"]["resources"]
            .as_array()
            .ok_or_else(|| ProviderError::Schema("package_show response missing resources array".to_string()))?;

        let resource_url = resources
            .iter()
            .find(|r| {
                r["format"]
                    .as_str()
                    .is_some_and(|f| f.eq_ignore_ascii_case("geojson"))
            })
            .and_then(|r| r["url"].as_str())
            .ok_or_else(|| ProviderError::NotFound(format!("no GeoJSON resource in CKAN package {}", self.package_id)))?;

        info!(%resource_url, "downloading CKAN resource");
        let bytes = self.client.get(resource_url).send().await?.bytes().await?.to_vec();
        Ok(vec![RawFile {
            name: "layer.geojson".to_string(),
            bytes,
        }])
    }

    async fn transform(
        &self,
        raw_files: Vec<RawFile>,
        opts: &DownloadOptions,
    ) -> Result<Vec<NormalizedBoundary>, ProviderError> {
        let body = raw_files
            .first()
            .ok_or_else(|| ProviderError::Schema("no geojson payload to transform".to_string()))?;
        parse_feature_collection(&body.bytes, opts, &self.geoid_field, &self.name_field)
    }
}
