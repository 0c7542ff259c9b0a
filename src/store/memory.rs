//! In-memory [`RecordStore`] used by tests, demos and local tooling.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;

use super::{RecordStore, StoreError};
use crate::error::FieldErrors;
use crate::record::{DoctorSummary, PatientFields, PatientRecord, StaffAccount, StaffRequest};
use crate::request::Actor;
use crate::role::{Role, RoleSet};

#[derive(Debug)]
struct StaffEntry {
    account: StaffAccount,
    first_name: String,
    last_name: String,
}

#[derive(Debug, Default)]
struct State {
    patients: BTreeMap<u64, PatientRecord>,
    staff: Vec<StaffEntry>,
    next_patient_id: u64,
    next_staff_id: u64,
    session: Option<Actor>,
    unavailable: Option<String>,
    writes: usize,
}

/// A mutex-guarded store holding everything in memory.
///
/// Shadow fields are generated on create: a random `Patient-XXXXXXXX`
/// pseudonym and a contact masked down to its last four characters.
/// The contact mask is refreshed whenever the contact changes.
#[derive(Debug)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    /// Creates an empty store with no session.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                next_patient_id: 1,
                next_staff_id: 1,
                ..State::default()
            }),
        }
    }

    /// Adds a staff account and returns it as an actor.
    pub fn add_staff(
        &self,
        username: &str,
        first_name: &str,
        last_name: &str,
        roles: impl Into<RoleSet>,
    ) -> Actor {
        let mut state = self.lock();
        let id = state.next_staff_id;
        state.next_staff_id += 1;
        let account = StaffAccount {
            id,
            username: username.to_string(),
            roles: roles.into(),
        };
        state.staff.push(StaffEntry {
            account: account.clone(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
        });
        Actor::new(account.id, account.username, account.roles)
    }

    /// Inserts a record directly, bypassing validation.
    ///
    /// Missing fields default to empty values; shadow fields are generated.
    pub fn seed_patient(&self, fields: PatientFields) -> PatientRecord {
        let mut state = self.lock();
        insert(&mut state, &fields)
    }

    /// Binds `actor` to the current session.
    pub fn set_session(&self, actor: Option<Actor>) {
        self.lock().session = actor;
    }

    /// Makes every subsequent call fail with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, reason: Option<&str>) {
        self.lock().unavailable = reason.map(str::to_string);
    }

    /// Number of successful mutating calls served so far.
    pub fn writes(&self) -> usize {
        self.lock().writes
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn available(&self) -> Result<MutexGuard<'_, State>, StoreError> {
        let state = self.lock();
        if let Some(reason) = state.unavailable.clone() {
            return Err(StoreError::Unavailable(reason));
        }
        Ok(state)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore for MemoryStore {
    fn current_actor(&self) -> Option<Actor> {
        self.lock().session.clone()
    }

    fn get_patient(&self, id: u64) -> Result<PatientRecord, StoreError> {
        self.available()?
            .patients
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    fn list_patients(&self) -> Result<Vec<PatientRecord>, StoreError> {
        Ok(self.available()?.patients.values().cloned().collect())
    }

    fn create_patient(&self, fields: &PatientFields) -> Result<PatientRecord, StoreError> {
        let mut state = self.available()?;
        check_doctor(&state, fields.assigned_doctor_id.flatten())?;
        state.writes += 1;
        Ok(insert(&mut state, fields))
    }

    fn update_patient(&self, id: u64, fields: &PatientFields) -> Result<PatientRecord, StoreError> {
        let mut state = self.available()?;
        check_doctor(&state, fields.assigned_doctor_id.flatten())?;
        let record = state.patients.get_mut(&id).ok_or(StoreError::NotFound(id))?;

        if let Some(name) = &fields.name {
            record.name = name.clone();
        }
        if let Some(age) = fields.age {
            record.age = age;
        }
        if let Some(contact) = &fields.contact {
            record.contact = contact.clone();
            record.anonymized_contact = mask_contact(contact);
        }
        if let Some(diagnosis) = &fields.diagnosis {
            record.diagnosis = Some(diagnosis.clone());
        }
        if let Some(doctor) = fields.assigned_doctor_id {
            record.assigned_doctor_id = doctor;
        }

        let updated = record.clone();
        state.writes += 1;
        Ok(updated)
    }

    fn list_doctors(&self) -> Result<Vec<DoctorSummary>, StoreError> {
        let state = self.available()?;
        Ok(state
            .staff
            .iter()
            .filter(|s| s.account.roles.contains(Role::Doctor))
            .map(|s| DoctorSummary {
                id: s.account.id,
                username: s.account.username.clone(),
                first_name: s.first_name.clone(),
                last_name: s.last_name.clone(),
            })
            .collect())
    }

    fn create_staff(&self, request: &StaffRequest) -> Result<StaffAccount, StoreError> {
        let mut state = self.available()?;

        let mut errors = FieldErrors::new();
        if request.username.trim().is_empty() {
            errors.add("username", "This field may not be blank.");
        }
        if request.password.expose_secret().is_empty() {
            errors.add("password", "This field may not be blank.");
        }
        if !errors.is_empty() {
            return Err(StoreError::Validation(errors));
        }
        if state
            .staff
            .iter()
            .any(|s| s.account.username == request.username)
        {
            return Err(StoreError::Conflict(format!(
                "username '{}' is already taken",
                request.username
            )));
        }

        let account = StaffAccount {
            id: state.next_staff_id,
            username: request.username.clone(),
            roles: RoleSet::only(request.role),
        };
        state.next_staff_id += 1;
        state.staff.push(StaffEntry {
            account: account.clone(),
            first_name: String::new(),
            last_name: String::new(),
        });
        state.writes += 1;
        Ok(account)
    }
}

fn check_doctor(state: &State, doctor: Option<u64>) -> Result<(), StoreError> {
    let Some(id) = doctor else {
        return Ok(());
    };
    let known = state
        .staff
        .iter()
        .any(|s| s.account.id == id && s.account.roles.contains(Role::Doctor));
    if known {
        Ok(())
    } else {
        let mut errors = FieldErrors::new();
        errors.add(
            "assigned_doctor_id",
            format!("Invalid pk \"{}\" - object does not exist.", id),
        );
        Err(StoreError::Validation(errors))
    }
}

fn insert(state: &mut State, fields: &PatientFields) -> PatientRecord {
    let id = state.next_patient_id;
    state.next_patient_id += 1;

    let contact = fields.contact.clone().unwrap_or_default();
    let record = PatientRecord {
        id,
        name: fields.name.clone().unwrap_or_default(),
        age: fields.age.unwrap_or_default(),
        anonymized_contact: mask_contact(&contact),
        contact,
        diagnosis: fields.diagnosis.clone().filter(|d| !d.trim().is_empty()),
        assigned_doctor_id: fields.assigned_doctor_id.flatten(),
        anonymized_name: pseudonym(),
        date_added: Utc::now(),
    };
    state.patients.insert(id, record.clone());
    record
}

fn pseudonym() -> String {
    let hex = uuid::Uuid::new_v4().simple().to_string();
    format!("Patient-{}", hex[..8].to_uppercase())
}

fn mask_contact(contact: &str) -> String {
    let chars: Vec<char> = contact.chars().collect();
    if chars.len() > 4 {
        let visible: String = chars[chars.len() - 4..].iter().collect();
        format!("{}{}", "*".repeat(chars.len() - 4), visible)
    } else {
        "******".to_string()
    }
}
