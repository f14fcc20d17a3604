// [libs/infra/download-dlq/src/errors.rs]
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DlqError {
    #[error("[DLQ_NOT_FOUND]: no entry with id {0}")]
    NotFound(String),
    #[error("[DLQ_STORAGE]: {0}")]
    Storage(#[from] atlas_db_adapter::DbError),
}

impl From<DlqError> for atlas_models::AtlasError {
    fn from(e: DlqError) -> Self {
        match e {
            DlqError::NotFound(msg) => atlas_models::AtlasError::not_found(msg),
            DlqError::Storage(inner) => atlas_models::AtlasError::storage(inner.to_string()),
        }
    }
}
