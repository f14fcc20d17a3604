// [libs/shared/registry-store/src/lib.rs]
//! Registry & Audit Log (C9): append-only NDJSON storage for the
//! three portal registries plus the audit trail and drift diff
//! against the generated code artifact.

pub mod audit;
pub mod errors;
pub mod ndjson;
pub mod store;

pub use audit::{AuditLog, AuditOp, AuditRecord};
pub use errors::RegistryError;
pub use ndjson::{read_entries, write_entries, NdjsonHeader};
pub use store::{
    AddOptions, DeleteOptions, DriftReport, FieldDiff, ListFilter, RegistryDiff, RegistryStats, RegistryStore,
};
