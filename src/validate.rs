//! Value checks for patient mutation requests.
//!
//! These run after the field-level policy has accepted every submitted
//! field and before the store is called, so a rejected request never
//! reaches the persistence boundary.

use crate::access::{decide, Field};
use crate::error::{Error, FieldErrors};
use crate::record::PatientFields;
use crate::role::Role;

/// Longest accepted name, in characters.
pub const MAX_NAME_LEN: usize = 200;
/// Longest accepted contact detail, in characters.
pub const MAX_CONTACT_LEN: usize = 100;
/// Oldest accepted age.
pub const MAX_AGE: u32 = 150;

/// Whether the request creates a record or changes an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    /// A new record
    Create,
    /// An existing record
    Update,
}

/// Validates `fields` submitted by `role`.
///
/// On create, name, age and contact are required. Diagnosis is required
/// only when the creating role may set it; a record created by any other
/// role starts without one and is completed later.
///
/// # Errors
///
/// Returns [`Error::ValidationFailed`] with one entry per offending field.
pub fn validate(fields: &PatientFields, role: Role, kind: MutationKind) -> Result<(), Error> {
    let mut errors = FieldErrors::new();

    if kind == MutationKind::Create {
        if fields.name.is_none() {
            errors.add(Field::Name.as_str(), "This field is required.");
        }
        if fields.age.is_none() {
            errors.add(Field::Age.as_str(), "This field is required.");
        }
        if fields.contact.is_none() {
            errors.add(Field::Contact.as_str(), "This field is required.");
        }
        let may_set_diagnosis = decide(role, Field::Diagnosis, true).is_editable();
        if may_set_diagnosis && is_blank(fields.diagnosis.as_deref()) {
            errors.add(Field::Diagnosis.as_str(), "This field is required.");
        }
    }

    if let Some(name) = &fields.name {
        check_text(&mut errors, Field::Name, name, MAX_NAME_LEN);
    }
    if let Some(contact) = &fields.contact {
        check_text(&mut errors, Field::Contact, contact, MAX_CONTACT_LEN);
    }
    if let Some(age) = fields.age {
        if age > MAX_AGE {
            errors.add(
                Field::Age.as_str(),
                format!("Ensure this value is less than or equal to {}.", MAX_AGE),
            );
        }
    }
    if kind == MutationKind::Update && fields.diagnosis.is_some() && is_blank(fields.diagnosis.as_deref()) {
        errors.add(Field::Diagnosis.as_str(), "This field may not be blank.");
    }

    errors.into_result()
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

fn check_text(errors: &mut FieldErrors, field: Field, value: &str, max_len: usize) {
    if value.trim().is_empty() {
        errors.add(field.as_str(), "This field may not be blank.");
    }
    if value.chars().count() > max_len {
        errors.add(
            field.as_str(),
            format!("Ensure this field has no more than {} characters.", max_len),
        );
    }
    if value.chars().any(char::is_control) {
        errors.add(field.as_str(), "Control characters are not allowed.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full() -> PatientFields {
        PatientFields::default()
            .with_name("Jane Doe")
            .with_age(52)
            .with_contact("555-1234")
            .with_diagnosis("Type 2 Diabetes")
    }

    fn errors_of(result: Result<(), Error>) -> FieldErrors {
        match result {
            Err(Error::ValidationFailed(errors)) => errors,
            other => panic!("expected validation failure, got {:?}", other),
        }
    }

    #[test]
    fn admin_create_requires_diagnosis() {
        let mut fields = full();
        fields.diagnosis = None;
        let errors = errors_of(validate(&fields, Role::Admin, MutationKind::Create));
        assert!(errors.get("diagnosis").is_some());

        fields.diagnosis = Some("   ".into());
        let errors = errors_of(validate(&fields, Role::Admin, MutationKind::Create));
        assert!(errors.get("diagnosis").is_some());
    }

    #[test]
    fn receptionist_create_may_omit_diagnosis() {
        let mut fields = full();
        fields.diagnosis = None;
        assert!(validate(&fields, Role::Receptionist, MutationKind::Create).is_ok());
    }

    #[test]
    fn create_requires_identity_fields() {
        let errors = errors_of(validate(
            &PatientFields::default().with_diagnosis("Flu"),
            Role::Admin,
            MutationKind::Create,
        ));
        assert!(errors.get("name").is_some());
        assert!(errors.get("age").is_some());
        assert!(errors.get("contact").is_some());
    }

    #[test]
    fn update_accepts_partial_fields() {
        let fields = PatientFields::default().with_assigned_doctor(7);
        assert!(validate(&fields, Role::Receptionist, MutationKind::Update).is_ok());
    }

    #[test]
    fn rejects_out_of_range_values() {
        let fields = PatientFields::default()
            .with_age(151)
            .with_name("x".repeat(MAX_NAME_LEN + 1))
            .with_contact("555\n1234");
        let errors = errors_of(validate(&fields, Role::Admin, MutationKind::Update));
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn blank_diagnosis_rejected_on_update() {
        let fields = PatientFields::default().with_diagnosis("");
        let errors = errors_of(validate(&fields, Role::Admin, MutationKind::Update));
        assert!(errors.get("diagnosis").is_some());
    }

    #[test]
    fn complete_admin_create_passes() {
        assert!(validate(&full(), Role::Admin, MutationKind::Create).is_ok());
    }
}
