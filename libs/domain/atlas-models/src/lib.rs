// [libs/domain/atlas-models/src/lib.rs]
// =================================================================
// APARATO: SHADOW ATLAS DOMAIN MODELS (ESTRATO L2)
// RESPONSABILIDAD: SINGLE SOURCE OF TRUTH PARA ENTIDADES DEL DOMINIO
// =================================================================
//!
//! Shared entities for the boundary-ingestion core: [`Jurisdiction`],
//! [`Source`], [`Artifact`], [`Head`], [`Event`], [`DlqEntry`],
//! [`CheckpointState`], the registry entry variants, and
//! [`NormalizedBoundary`]. Everything here is a plain data type —
//! no I/O, no persistence — so every owning crate (db-adapter,
//! change-detector, download-dlq, boundary-providers, validators,
//! registry-store) depends on this one without a cycle.

pub mod artifact;
pub mod boundary;
pub mod checkpoint;
pub mod dlq;
pub mod errors;
pub mod event;
pub mod jurisdiction;
pub mod registry;
pub mod run;
pub mod source;

pub use artifact::{Artifact, Head};
pub use boundary::NormalizedBoundary;
pub use checkpoint::{BatchIngestOptions, CheckpointState};
pub use dlq::{DlqEntry, DlqStatus};
pub use errors::{AtlasError, ErrorKind};
pub use event::{Event, EventKind};
pub use jurisdiction::{Jurisdiction, JurisdictionType};
pub use registry::{QuarantinePattern, RegistryEntry};
pub use run::{CancelSignal, RunId};
pub use source::{ChecksumFingerprint, PortalFamily, Source, UpdateTrigger};
