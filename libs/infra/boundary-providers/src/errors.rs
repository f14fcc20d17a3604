// [libs/infra/boundary-providers/src/errors.rs]
use thiserror::Error;

/// §4.4 failure taxonomy: network is retryable, the rest are not.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("[PROVIDER_NETWORK]: {0}")]
    Network(#[source] reqwest::Error),
    #[error("[PROVIDER_INTEGRITY]: {0}")]
    Integrity(String),
    #[error("[PROVIDER_NOT_FOUND]: {0}")]
    NotFound(String),
    #[error("[PROVIDER_SCHEMA]: {0}")]
    Schema(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        ProviderError::Network(e)
    }
}

impl From<ProviderError> for atlas_models::AtlasError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::Network(inner) => atlas_models::AtlasError::network(inner.to_string()),
            ProviderError::Integrity(msg) => atlas_models::AtlasError::integrity(msg),
            ProviderError::NotFound(msg) => atlas_models::AtlasError::not_found(msg),
            ProviderError::Schema(msg) => atlas_models::AtlasError::schema(msg),
        }
    }
}
