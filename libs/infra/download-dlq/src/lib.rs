// [libs/infra/download-dlq/src/lib.rs]
// =================================================================
// APARATO: DOWNLOAD DEAD-LETTER QUEUE (ESTRATO L3, C3)
// RESPONSABILIDAD: REINTENTOS CON BACKOFF EXPONENCIAL E IDEMPOTENCIA
// =================================================================
//!
//! Persistent record of failed boundary downloads. `persist_failure`
//! upserts on the deterministic `(url, layer, state_fips, year)` key
//! so repeated failures accumulate on one row instead of spawning
//! duplicates; the state machine is `pending → retrying →
//! {exhausted, resolved}`, with `exhausted` and `resolved` terminal.

mod backoff;
mod errors;
mod manager;

pub use backoff::BackoffPolicy;
pub use errors::DlqError;
pub use manager::{DlqManager, PersistFailureOptions};
