//! Audit trail for record access and changes.
//!
//! This module provides:
//! - `AuditEvent`: immutable, classified event schema
//! - `AuditTrail`: thread-safe append-only recorder with ordered read-back
//! - `Clock`: injectable time source for event timestamps
//! - `write_delimited`: flat-file export with fixed columns
//!
//! Events hold identifiers and short descriptions only. Patient identity
//! and diagnosis text never enter the trail.

mod clock;
mod event;
mod export;
mod trail;

pub use clock::{Clock, ManualClock, SystemClock};
pub use event::{ActionClass, AuditAction, AuditEvent, AuditOutcome};
pub use export::{write_delimited, ExportOptions, EXPORT_COLUMNS};
pub use trail::AuditTrail;
