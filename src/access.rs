//! Field-level access policy.
//!
//! [`decide`] is a pure table lookup from (role, field, mode) to an
//! [`AccessDecision`]. It holds no state and is safe to call from any thread.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::role::Role;

/// A field of a patient record subject to policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    /// Patient full name
    Name,
    /// Patient age in years
    Age,
    /// Phone number or other contact detail
    Contact,
    /// Free-text diagnosis
    Diagnosis,
    /// Account id of the assigned doctor
    AssignedDoctorId,
}

impl Field {
    /// Every policy-controlled field, in record order.
    pub const ALL: [Field; 5] = [
        Field::Name,
        Field::Age,
        Field::Contact,
        Field::Diagnosis,
        Field::AssignedDoctorId,
    ];

    /// The wire name of the field.
    pub fn as_str(self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Age => "age",
            Field::Contact => "contact",
            Field::Diagnosis => "diagnosis",
            Field::AssignedDoctorId => "assigned_doctor_id",
        }
    }

    /// Sensitivity classification of the field.
    pub fn sensitivity(self) -> FieldSensitivity {
        match self {
            Field::Name | Field::Contact => FieldSensitivity::Identifying,
            Field::Diagnosis => FieldSensitivity::Medical,
            Field::Age | Field::AssignedDoctorId => FieldSensitivity::Open,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How sensitive a field's content is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSensitivity {
    /// Identifies the patient directly
    Identifying,
    /// Clinical information
    Medical,
    /// Safe to show to any staff role
    Open,
}

/// What a role sees in a field's position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// The canonical value
    Visible,
    /// The record's precomputed shadow value
    AnonymizedFallback,
    /// A fixed placeholder meaning "withheld"
    RestrictedSentinel,
    /// Nothing; the field is left out
    Hidden,
}

/// Whether a role may change a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Editability {
    /// The role may submit a new value
    Editable,
    /// The role may not change the value
    ReadOnly,
}

/// The policy outcome for one (role, field) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessDecision {
    /// What the role sees
    pub visibility: Visibility,
    /// Whether the role may change it
    pub editability: Editability,
}

impl AccessDecision {
    const fn new(visibility: Visibility, editability: Editability) -> Self {
        Self {
            visibility,
            editability,
        }
    }

    /// Returns true if the role may change the field.
    pub fn is_editable(self) -> bool {
        self.editability == Editability::Editable
    }

    /// Returns true if the canonical value is withheld from the role.
    pub fn is_denied(self) -> bool {
        self.visibility != Visibility::Visible
    }
}

use Editability::{Editable, ReadOnly};
use Visibility::{AnonymizedFallback, Hidden, RestrictedSentinel, Visible};

const ADMIN: [AccessDecision; 5] = [
    AccessDecision::new(Visible, Editable),
    AccessDecision::new(Visible, Editable),
    AccessDecision::new(Visible, Editable),
    AccessDecision::new(Visible, Editable),
    AccessDecision::new(Visible, Editable),
];

const DOCTOR: [AccessDecision; 5] = [
    AccessDecision::new(AnonymizedFallback, ReadOnly),
    AccessDecision::new(Visible, ReadOnly),
    AccessDecision::new(AnonymizedFallback, ReadOnly),
    AccessDecision::new(Visible, ReadOnly),
    AccessDecision::new(Visible, ReadOnly),
];

const RECEPTIONIST: [AccessDecision; 5] = [
    AccessDecision::new(Visible, ReadOnly),
    AccessDecision::new(Visible, ReadOnly),
    AccessDecision::new(Visible, ReadOnly),
    AccessDecision::new(RestrictedSentinel, ReadOnly),
    AccessDecision::new(Visible, Editable),
];

fn column(field: Field) -> usize {
    match field {
        Field::Name => 0,
        Field::Age => 1,
        Field::Contact => 2,
        Field::Diagnosis => 3,
        Field::AssignedDoctorId => 4,
    }
}

/// Decides what `role` may see and change in `field`.
///
/// `is_edit_mode` selects the edit form rather than the read view. The only
/// cell that differs is Receptionist × diagnosis, which is left out of the
/// edit form entirely instead of showing the sentinel.
///
/// # Examples
///
/// ```
/// use patient_access::{decide, Field, Role, Visibility};
///
/// let d = decide(Role::Doctor, Field::Name, false);
/// assert_eq!(d.visibility, Visibility::AnonymizedFallback);
/// assert!(!d.is_editable());
/// ```
pub fn decide(role: Role, field: Field, is_edit_mode: bool) -> AccessDecision {
    let row = match role {
        Role::Admin => &ADMIN,
        Role::Doctor => &DOCTOR,
        Role::Receptionist => &RECEPTIONIST,
    };
    let decision = row[column(field)];

    if is_edit_mode && decision.visibility == RestrictedSentinel {
        AccessDecision::new(Hidden, decision.editability)
    } else {
        decision
    }
}

/// Fields `role` may change, in record order.
pub fn editable_fields(role: Role) -> Vec<Field> {
    Field::ALL
        .into_iter()
        .filter(|f| decide(role, *f, true).is_editable())
        .collect()
}
