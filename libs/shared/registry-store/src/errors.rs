// [libs/shared/registry-store/src/errors.rs]
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("[REGISTRY_IO]: {0}")]
    Io(#[from] std::io::Error),
    #[error("[REGISTRY_SERDE]: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("[REGISTRY_DUPLICATE_FIPS]: fips {0} already exists in {1}")]
    DuplicateFips(String, &'static str),
    #[error("[REGISTRY_NOT_FOUND]: fips {0} not found in any registry")]
    NotFound(String),
    #[error("[REGISTRY_IMMUTABLE_FIELD]: field '{0}' cannot be patched")]
    ImmutableField(&'static str),
    #[error("[REGISTRY_HARD_DELETE_REQUIRES_FORCE]: pass force=true to hard-delete fips {0}")]
    HardDeleteRequiresForce(String),
    #[error("[REGISTRY_VALIDATION]: {0}")]
    Validation(String),
}

impl From<RegistryError> for atlas_models::AtlasError {
    fn from(e: RegistryError) -> Self {
        match &e {
            RegistryError::Validation(msg) => atlas_models::AtlasError::validation(msg.clone()),
            RegistryError::NotFound(fips) => atlas_models::AtlasError::not_found(format!("fips {fips}")),
            other => atlas_models::AtlasError::storage(other.to_string()),
        }
    }
}
