// [libs/infra/boundary-providers/src/provider.rs]
use async_trait::async_trait;
use atlas_models::NormalizedBoundary;

use crate::errors::ProviderError;
use crate::options::{DownloadOptions, RawFile};

/// §4.4: `{download_layer(opts) -> raw_files[], transform(raw_files) ->
/// normalized_boundary[]}`, implemented once per portal family.
#[async_trait]
pub trait BoundaryProvider: Send + Sync {
    async fn download_layer(&self, opts: &DownloadOptions) -> Result<Vec<RawFile>, ProviderError>;
    async fn transform(
        &self,
        raw_files: Vec<RawFile>,
        opts: &DownloadOptions,
    ) -> Result<Vec<NormalizedBoundary>, ProviderError>;

    async fn fetch_layer(&self, opts: &DownloadOptions) -> Result<Vec<NormalizedBoundary>, ProviderError> {
        let raw_files = self.download_layer(opts).await?;
        self.transform(raw_files, opts).await
    }
}
