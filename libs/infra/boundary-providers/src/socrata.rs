// [libs/infra/boundary-providers/src/socrata.rs]
use async_trait::async_trait;
use atlas_models::NormalizedBoundary;
use reqwest::{Client, StatusCode};
use tracing::{info, instrument};

use crate::arcgis::parse_feature_collection;
use crate::errors::ProviderError;
use crate::options::{DownloadOptions, RawFile};
use crate::provider::BoundaryProvider;

/// Socrata SODA export: `https://{domain}/resource/{dataset_id}.geojson`.
pub struct SocrataProvider {
    client: Client,
    domain: String,
    dataset_id: String,
    geoid_field: String,
    name_field: String,
}

impl SocrataProvider {
    pub fn new(
        domain: impl Into<String>,
        dataset_id: impl Into<String>,
        geoid_field: impl Into<String>,
        name_field: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::builder()
                .user_agent("shadow-atlas-boundary-providers/1.0")
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("reqwest client builds with a static config"),
            domain: domain.into(),
            dataset_id: dataset_id.into(),
            geoid_field: geoid_field.into(),
            name_field: name_field.into(),
        }
    }

    fn export_url(&self) -> String {
        format!("https://{}/resource/{}.geojson?$limit=50000", self.domain, self.dataset_id)
    }
}

#[async_trait]
impl BoundaryProvider for SocrataProvider {
    #[instrument(skip(self), fields(dataset = %self.dataset_id))]
    async fn download_layer(&self, _opts: &DownloadOptions) -> Result<Vec<RawFile>, ProviderError> {
        let url = self.export_url();
        info!(%url, "downloading Socrata export");
        let response = self.client.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(ProviderError::NotFound(url));
        }
        let bytes = response.bytes().await?.to_vec();
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
