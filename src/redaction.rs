//! Role-specific projections of canonical records.
//!
//! A projection is built field by field from [`decide`]. The canonical
//! record is only borrowed, and nothing here reads a clock or a random
//! source, so the same inputs always give the same projection.

use serde::{Serialize, Serializer};

use crate::access::{decide, editable_fields, Field, Visibility};
use crate::record::PatientRecord;
use crate::role::Role;

/// Placeholder shown in place of a withheld value.
pub const RESTRICTED_SENTINEL: &str = "RESTRICTED";

/// What a projection carries in the diagnosis position.
///
/// Keeps "withheld" apart from "not recorded yet": the first serializes as
/// [`RESTRICTED_SENTINEL`], the second as `null`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosisView {
    /// The recorded diagnosis text
    Recorded(String),
    /// No diagnosis has been entered
    NotRecorded,
    /// A diagnosis may exist but is withheld from this role
    Restricted,
}

impl Serialize for DiagnosisView {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DiagnosisView::Recorded(text) => serializer.serialize_str(text),
            DiagnosisView::NotRecorded => serializer.serialize_none(),
            DiagnosisView::Restricted => serializer.serialize_str(RESTRICTED_SENTINEL),
        }
    }
}

/// A role-specific view of one patient record.
///
/// Fields the policy hides are `None` and absent from the serialized form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectedRecord {
    pub id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnosis: Option<DiagnosisView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_doctor_id: Option<Option<u64>>,
    /// Fields the role may submit changes for
    pub editable_fields: Vec<Field>,
}

impl ProjectedRecord {
    /// Name as shown to the role, if present.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Contact as shown to the role, if present.
    pub fn contact(&self) -> Option<&str> {
        self.contact.as_deref()
    }
}

/// Projects `record` into the read view for `role`.
///
/// # Examples
///
/// ```
/// # use chrono::Utc;
/// use patient_access::{project, PatientRecord, Role};
///
/// let record = PatientRecord {
///     id: 1,
///     name: "Jane Doe".into(),
///     age: 52,
///     contact: "555-1234".into(),
///     diagnosis: Some("Type 2 Diabetes".into()),
///     assigned_doctor_id: Some(7),
///     anonymized_name: "PT-88f2".into(),
///     anonymized_contact: "***-1234".into(),
///     date_added: Utc::now(),
/// };
///
/// let view = project(&record, Role::Doctor);
/// assert_eq!(view.name(), Some("PT-88f2"));
/// assert_eq!(view.contact(), Some("***-1234"));
/// ```
pub fn project(record: &PatientRecord, role: Role) -> ProjectedRecord {
    build(record, role, false)
}

/// Projects `record` into the edit form for `role`.
///
/// Same as [`project`] except that sentinel fields are left out entirely.
pub fn project_for_edit(record: &PatientRecord, role: Role) -> ProjectedRecord {
    build(record, role, true)
}

/// Projects each record, preserving order.
pub fn project_all<'a, I>(records: I, role: Role) -> Vec<ProjectedRecord>
where
    I: IntoIterator<Item = &'a PatientRecord>,
{
    records.into_iter().map(|r| project(r, role)).collect()
}

fn build(record: &PatientRecord, role: Role, edit: bool) -> ProjectedRecord {
    let text = |field: Field, canonical: &str, shadow: &str| -> Option<String> {
        match decide(role, field, edit).visibility {
            Visibility::Visible => Some(canonical.to_owned()),
            Visibility::AnonymizedFallback => Some(shadow.to_owned()),
            Visibility::RestrictedSentinel => Some(RESTRICTED_SENTINEL.to_owned()),
            Visibility::Hidden => None,
        }
    };
    // Open fields have no shadow; anything short of Visible withholds them.
    let open = |field: Field| decide(role, field, edit).visibility == Visibility::Visible;

    let diagnosis = match decide(role, Field::Diagnosis, edit).visibility {
        Visibility::Visible => Some(match &record.diagnosis {
            Some(text) => DiagnosisView::Recorded(text.clone()),
            None => DiagnosisView::NotRecorded,
        }),
        Visibility::AnonymizedFallback | Visibility::RestrictedSentinel => {
            Some(DiagnosisView::Restricted)
        }
        Visibility::Hidden => None,
    };

    ProjectedRecord {
        id: record.id,
        name: text(Field::Name, &record.name, &record.anonymized_name),
        age: open(Field::Age).then_some(record.age),
        contact: text(Field::Contact, &record.contact, &record.anonymized_contact),
        diagnosis,
        assigned_doctor_id: open(Field::AssignedDoctorId).then_some(record.assigned_doctor_id),
        editable_fields: editable_fields(role),
    }
}
