// [libs/infra/portal-scanner/src/errors.rs]
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("[SCAN_NETWORK]: {0}")]
    Network(#[from] reqwest::Error),
    #[error("[SCAN_SCHEMA]: {0}")]
    Schema(String),
}

impl From<ScanError> for atlas_models::AtlasError {
    fn from(e: ScanError) -> Self {
        match e {
            ScanError::Network(inner) => atlas_models::AtlasError::network(inner.to_string()),
            ScanError::Schema(msg) => atlas_models::AtlasError::schema(msg),
        }
    }
}
