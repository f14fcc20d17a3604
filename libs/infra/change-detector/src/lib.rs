// [libs/infra/change-detector/src/lib.rs]
// =================================================================
// APARATO: CHANGE DETECTOR (ESTRATO L3, C2)
// RESPONSABILIDAD: FINGERPRINTING HTTP HEAD + EVALUACIÓN DE SCHEDULE
// =================================================================
//!
//! Given a set of canonical sources, produces the subset that has
//! changed since its last recorded fingerprint and whose schedule
//! admits checking now. See [`ChangeDetector::check_batch`].

mod detector;
mod errors;
mod report;

pub use detector::{is_due, ChangeDetector, ChangeDetectorConfig, RetryPolicy};
pub use errors::DetectError;
pub use report::{ChangeReport, ChangeType, DetectTrigger, DetectionOutcome};
