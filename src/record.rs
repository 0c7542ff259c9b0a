//! Canonical record types exchanged with the persistence boundary.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::access::Field;
use crate::role::{Role, RoleSet};
use crate::secret::Secret;

/// The full, unredacted patient record held by the store.
///
/// `anonymized_name` and `anonymized_contact` are shadow fields the store
/// keeps populated for every record. They are what roles denied the real
/// identity fields receive in their place.
///
/// `Debug` prints only the id and shadow fields so a canonical record can
/// be logged without exposing identity or diagnosis.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub id: u64,
    pub name: String,
    pub age: u32,
    pub contact: String,
    /// `None` until a clinician records one
    pub diagnosis: Option<String>,
    pub assigned_doctor_id: Option<u64>,
    pub anonymized_name: String,
    pub anonymized_contact: String,
    pub date_added: DateTime<Utc>,
}

impl fmt::Debug for PatientRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatientRecord")
            .field("id", &self.id)
            .field("anonymized_name", &self.anonymized_name)
            .field("anonymized_contact", &self.anonymized_contact)
            .field("assigned_doctor_id", &self.assigned_doctor_id)
            .finish_non_exhaustive()
    }
}

/// A create or update request. `None` means "not part of the request".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatientFields {
    pub name: Option<String>,
    pub age: Option<u32>,
    pub contact: Option<String>,
    pub diagnosis: Option<String>,
    /// `Some(None)` clears the assignment; an explicit JSON `null` maps to it.
    #[serde(
        deserialize_with = "explicit_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub assigned_doctor_id: Option<Option<u64>>,
}

fn explicit_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl PatientFields {
    /// Sets the name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the age.
    pub fn with_age(mut self, age: u32) -> Self {
        self.age = Some(age);
        self
    }

    /// Sets the contact detail.
    pub fn with_contact(mut self, contact: impl Into<String>) -> Self {
        self.contact = Some(contact.into());
        self
    }

    /// Sets the diagnosis.
    pub fn with_diagnosis(mut self, diagnosis: impl Into<String>) -> Self {
        self.diagnosis = Some(diagnosis.into());
        self
    }

    /// Sets the assigned doctor.
    pub fn with_assigned_doctor(mut self, doctor_id: u64) -> Self {
        self.assigned_doctor_id = Some(Some(doctor_id));
        self
    }

    /// Clears the assigned doctor.
    pub fn without_assigned_doctor(mut self) -> Self {
        self.assigned_doctor_id = Some(None);
        self
    }

    /// The fields present in this request, in record order.
    pub fn present(&self) -> Vec<Field> {
        let mut fields = Vec::new();
        if self.name.is_some() {
            fields.push(Field::Name);
        }
        if self.age.is_some() {
            fields.push(Field::Age);
        }
        if self.contact.is_some() {
            fields.push(Field::Contact);
        }
        if self.diagnosis.is_some() {
            fields.push(Field::Diagnosis);
        }
        if self.assigned_doctor_id.is_some() {
            fields.push(Field::AssignedDoctorId);
        }
        fields
    }

    /// Returns true if no field is set.
    pub fn is_empty(&self) -> bool {
        self.present().is_empty()
    }
}

/// A doctor as listed for assignment pickers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoctorSummary {
    pub id: u64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

/// A request to create a staff account.
#[derive(Debug)]
pub struct StaffRequest {
    pub username: String,
    pub password: Secret<String>,
    pub role: Role,
}

impl StaffRequest {
    /// Creates a staff request.
    pub fn new(username: impl Into<String>, password: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            password: Secret::new(password.into()),
            role,
        }
    }
}

/// A staff account returned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffAccount {
    pub id: u64,
    pub username: String,
    pub roles: RoleSet,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record() -> PatientRecord {
        PatientRecord {
            id: 1,
            name: "Jane Doe".into(),
            age: 52,
            contact: "555-1234".into(),
            diagnosis: Some("Type 2 Diabetes".into()),
            assigned_doctor_id: Some(7),
            anonymized_name: "PT-88f2".into(),
            anonymized_contact: "***-1234".into(),
            date_added: Utc.timestamp_opt(0, 0).unwrap(),
        }
    }

    #[test]
    fn debug_does_not_print_identity_or_diagnosis() {
        let debug = format!("{:?}", record());
        assert!(debug.contains("PT-88f2"));
        assert!(!debug.contains("Jane Doe"));
        assert!(!debug.contains("555-1234"));
        assert!(!debug.contains("Diabetes"));
    }

    #[test]
    fn present_lists_set_fields_in_order() {
        let fields = PatientFields::default()
            .with_assigned_doctor(7)
            .with_name("New Name");
        assert_eq!(fields.present(), vec![Field::Name, Field::AssignedDoctorId]);
        assert!(PatientFields::default().is_empty());
    }

    #[test]
    fn fields_deserialize_with_missing_keys() {
        let fields: PatientFields = serde_json::from_str(r#"{"assigned_doctor_id": 7}"#).unwrap();
        assert_eq!(fields.present(), vec![Field::AssignedDoctorId]);
        assert_eq!(fields.assigned_doctor_id, Some(Some(7)));
    }

    #[test]
    fn explicit_null_doctor_is_a_clear() {
        let fields: PatientFields =
            serde_json::from_str(r#"{"assigned_doctor_id": null}"#).unwrap();
        assert_eq!(fields.assigned_doctor_id, Some(None));
        assert_eq!(fields.present(), vec![Field::AssignedDoctorId]);
        assert_eq!(fields, PatientFields::default().without_assigned_doctor());

        let absent: PatientFields = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.assigned_doctor_id, None);
        assert!(absent.is_empty());
    }

    #[test]
    fn staff_request_hides_password() {
        let req = StaffRequest::new("nurse", "hunter2", Role::Receptionist);
        let debug = format!("{:?}", req);
        assert!(debug.contains("nurse"));
        assert!(!debug.contains("hunter2"));
    }
}
