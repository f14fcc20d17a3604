// [libs/infra/change-detector/src/errors.rs]
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DetectError {
    #[error("[DETECT_NETWORK]: HEAD request to {url} failed after retries: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("[DETECT_UNEXPECTED_STATUS]: {url} returned {status}")]
    UnexpectedStatus { url: String, status: u16 },
}

impl From<DetectError> for atlas_models::AtlasError {
    fn from(e: DetectError) -> Self {
        atlas_models::AtlasError::network(e.to_string())
    }
}
