// [libs/infra/boundary-providers/src/curated.rs]
use std::path::PathBuf;

use async_trait::async_trait;
use atlas_models::NormalizedBoundary;
use tracing::instrument;

use crate::arcgis::parse_feature_collection;
use crate::errors::ProviderError;
use crate::options::{DownloadOptions, RawFile};
use crate::provider::BoundaryProvider;

/// Hand-maintained boundary files checked into a local data directory —
/// the `curated`/`geojson` portal families for jurisdictions with no
/// reliable live source. No network I/O at all.
pub struct StaticFileProvider {
    path: PathBuf,
    geoid_field: String,
    name_field: String,
}

impl StaticFileProvider {
    pub fn new(path: impl Into<PathBuf>, geoid_field: impl Into<String>, name_field: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            geoid_field: geoid_field.into(),
            name_field: name_field.into(),
        }
    }
}

#[async_trait]
impl BoundaryProvider for StaticFileProvider {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn download_layer(&self, _opts: &DownloadOptions) -> Result<Vec<RawFile>, ProviderError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| ProviderError::NotFound(format!("{}: {e}", self.path.display())))?;
        Ok(vec![RawFile {
            name: self
                .path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "curated.geojson".to_string()),
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
            .ok_or_else(|| ProviderError::Schema("no payload to transform".to_string()))?;
        parse_feature_collection(&body.bytes, opts, &self.geoid_field, &self.name_field)
    }
}
