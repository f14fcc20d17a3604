// [libs/infra/db-adapter/src/lib.rs]
// =================================================================
// APARATO: DATABASE ADAPTER (ESTRATO L3)
// RESPONSABILIDAD: PERSISTENCIA DE SOURCES, ARTIFACTS, HEADS, EVENTS,
//                   DLQ Y CHECKPOINTS
// =================================================================
//!
//! §3: "the `DatabaseAdapter` exclusively owns persisted state
//! (sources, artifacts, heads, events, DLQ, checkpoints)". This crate
//! is that seam plus one reference implementation ([`InMemoryAdapter`])
//! used by tests and by any binary that doesn't need durability across
//! process restarts.
//!
//! A durable implementation is expected to live alongside this one
//! behind the same trait (a `rusqlite`-backed adapter, say) — nothing
//! upstream of this crate should know or care which is wired in.

mod adapter;
mod errors;
mod memory;
mod sqlite;

pub use adapter::DatabaseAdapter;
pub use errors::DbError;
pub use memory::InMemoryAdapter;
pub use sqlite::SqliteAdapter;
