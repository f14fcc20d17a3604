// [apps/ingest-orchestrator/src/errors.rs]
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("[ORCH_DB]: {0}")]
    Db(#[from] atlas_db_adapter::DbError),
    #[error("[ORCH_PROVIDER]: {0}")]
    Provider(#[from] atlas_boundary_providers::ProviderError),
    #[error("[ORCH_DLQ]: {0}")]
    Dlq(#[from] atlas_download_dlq::DlqError),
    #[error("[ORCH_DETECT]: {0}")]
    Detect(#[from] atlas_change_detector::DetectError),
    #[error("[ORCH_CHECKPOINT_NOT_FOUND]: no checkpoint with id {0}")]
    CheckpointNotFound(String),
    #[error("[ORCH_NO_PROVIDER]: no boundary provider registered for portal family {0:?}")]
    NoProvider(atlas_models::PortalFamily),
    #[error("[ORCH_CIRCUIT_OPEN]: circuit breaker open after {0} consecutive state failures")]
    CircuitOpen(u32),
    #[error("[ORCH_IO]: {0}")]
    Io(#[from] std::io::Error),
    #[error("[ORCH_SERDE]: {0}")]
    Serde(#[from] serde_json::Error),
}

impl From<OrchestratorError> for atlas_models::AtlasError {
    fn from(e: OrchestratorError) -> Self {
        match &e {
            OrchestratorError::CircuitOpen(_) => atlas_models::AtlasError::circuit_open(e.to_string()),
            OrchestratorError::CheckpointNotFound(_) => atlas_models::AtlasError::not_found(e.to_string()),
            _ => atlas_models::AtlasError::storage(e.to_string()),
        }
    }
}
