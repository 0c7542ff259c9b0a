//! Role-aware access layer for clinical patient records.
//!
//! Every role gets a different, policy-correct view of the same record, and
//! every view or change leaves an entry in an append-only audit trail:
//! - **Route guard**: operation-level checks before any record is touched
//! - **Access policy**: a static (role, field) table of visibility and editability
//! - **Redaction**: role-specific projections with shadow values and a sentinel
//! - **Audit trail**: classified, ordered events with flat-file export
//!
//! # Core Types
//!
//! - [`PolicyGate`]: validates the actor and yields a [`Ctx`]
//! - [`decide`]: the field-level policy lookup
//! - [`project`]: builds a [`ProjectedRecord`] for a role
//! - [`AuditTrail`]: thread-safe event recorder
//! - [`AccessService`]: the surface wired over a [`RecordStore`]
//!
//! # Examples
//!
//! ```
//! use patient_access::{AccessService, MemoryStore, Operation, PatientFields, Role};
//!
//! let store = MemoryStore::new();
//! let doctor = store.add_staff("dr_grey", "Meredith", "Grey", Role::Doctor);
//! store.seed_patient(
//!     PatientFields::default()
//!         .with_name("Jane Doe")
//!         .with_age(52)
//!         .with_contact("555-1234")
//!         .with_diagnosis("Type 2 Diabetes")
//!         .with_assigned_doctor(doctor.id),
//! );
//! store.set_session(Some(doctor));
//!
//! let service = AccessService::new(store);
//! let ctx = service.context("req-1", &[Operation::ListPatients]).unwrap();
//! let patients = service.list_patients(&ctx).unwrap();
//!
//! // Doctors see the pseudonym, never the real name.
//! assert!(patients[0].name().unwrap().starts_with("Patient-"));
//! ```

#![forbid(unsafe_code)]

pub mod access;
pub mod audit;
mod config;
mod context;
mod error;
mod gate;
mod policy;
pub mod record;
pub mod redaction;
mod request;
pub mod role;
pub mod route;
mod secret;
mod service;
pub mod store;
pub mod validate;

pub use access::{decide, AccessDecision, Editability, Field, FieldSensitivity, Visibility};
pub use audit::{
    ActionClass, AuditAction, AuditEvent, AuditOutcome, AuditTrail, Clock, ExportOptions,
    ManualClock, SystemClock,
};
pub use config::AccessConfig;
pub use context::Ctx;
pub use error::{Error, FieldErrors, Violation, ViolationKind};
pub use gate::PolicyGate;
pub use policy::{Authenticated, Authorized, PolicyReq};
pub use record::{DoctorSummary, PatientFields, PatientRecord, StaffAccount, StaffRequest};
pub use redaction::{project, project_all, project_for_edit, DiagnosisView, ProjectedRecord, RESTRICTED_SENTINEL};
pub use request::{Actor, RequestMeta};
pub use role::{Role, RoleSet};
pub use route::{is_allowed, navigate, Navigation, Operation};
pub use secret::Secret;
pub use service::AccessService;
pub use store::{MemoryStore, RecordStore, StoreError};
