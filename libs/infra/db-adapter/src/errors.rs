// [libs/infra/db-adapter/src/errors.rs]
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("[DB_NOT_FOUND]: {0}")]
    NotFound(String),
    #[error("[DB_CONFLICT]: {0}")]
    Conflict(String),
    #[error("[DB_WRITE_FAULT]: {0}")]
    WriteFailed(String),
}

impl From<DbError> for atlas_models::AtlasError {
    fn from(e: DbError) -> Self {
        atlas_models::AtlasError::storage(e.to_string())
    }
}
