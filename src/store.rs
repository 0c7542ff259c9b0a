//! The persistence and identity boundary.
//!
//! The access layer never owns patient data. It calls a [`RecordStore`]
//! and propagates the store's failures without retrying; a mutating call is
//! issued at most once per request served.

mod memory;

pub use memory::MemoryStore;

use thiserror::Error;

use crate::error::FieldErrors;
use crate::record::{DoctorSummary, PatientFields, PatientRecord, StaffAccount, StaffRequest};
use crate::request::Actor;

/// Failures reported by the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No record with this id
    #[error("record {0} not found")]
    NotFound(u64),
    /// The store rejected field values
    #[error("validation failed: {0}")]
    Validation(FieldErrors),
    /// A uniqueness constraint was violated
    #[error("conflict: {0}")]
    Conflict(String),
    /// The store could not be reached or failed internally
    #[error("unavailable: {0}")]
    Unavailable(String),
}

/// External persistence and identity operations consumed by the access layer.
///
/// Implementations own the canonical records and keep their shadow fields
/// populated on every create and update.
pub trait RecordStore: Send + Sync {
    /// The actor bound to the current session, if any.
    fn current_actor(&self) -> Option<Actor>;

    /// Fetches one canonical record.
    fn get_patient(&self, id: u64) -> Result<PatientRecord, StoreError>;

    /// Fetches every canonical record, ordered by id.
    fn list_patients(&self) -> Result<Vec<PatientRecord>, StoreError>;

    /// Creates a record from validated fields.
    fn create_patient(&self, fields: &PatientFields) -> Result<PatientRecord, StoreError>;

    /// Applies validated fields to an existing record.
    fn update_patient(&self, id: u64, fields: &PatientFields) -> Result<PatientRecord, StoreError>;

    /// Lists accounts holding the Doctor role.
    fn list_doctors(&self) -> Result<Vec<DoctorSummary>, StoreError>;

    /// Creates a staff account.
    fn create_staff(&self, request: &StaffRequest) -> Result<StaffAccount, StoreError>;
}
