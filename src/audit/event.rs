//! Audit event schema and types.
//!
//! Events carry identifiers and short descriptions only. They never hold
//! patient names, contact details or diagnoses.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The action an audit event records.
///
/// Known actions have dedicated variants; anything else travels as
/// [`AuditAction::Custom`] and is classified by the same verb rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AuditAction {
    /// A single record was materialized for the actor
    ViewPatient,
    /// A list of records was materialized for the actor
    ViewPatientList,
    /// A record was created
    CreatePatient,
    /// A record was changed by a role not covered below
    UpdatePatient,
    /// A receptionist reassigned the doctor
    UpdatePatientDoctor,
    /// An admin edited the record
    UpdatePatientFull,
    /// A staff account was created
    CreateStaff,
    /// A session started
    UserLogin,
    /// A session ended
    UserLogout,
    /// The route guard refused an operation
    AccessDenied,
    /// Any other upper-snake-case action name
    Custom(String),
}

impl AuditAction {
    /// The upper-snake-case action name.
    pub fn as_str(&self) -> &str {
        match self {
            AuditAction::ViewPatient => "VIEW_PATIENT",
            AuditAction::ViewPatientList => "VIEW_PATIENT_LIST",
            AuditAction::CreatePatient => "CREATE_PATIENT",
            AuditAction::UpdatePatient => "UPDATE_PATIENT",
            AuditAction::UpdatePatientDoctor => "UPDATE_PATIENT_DOCTOR",
            AuditAction::UpdatePatientFull => "UPDATE_PATIENT_FULL",
            AuditAction::CreateStaff => "CREATE_STAFF",
            AuditAction::UserLogin => "USER_LOGIN",
            AuditAction::UserLogout => "USER_LOGOUT",
            AuditAction::AccessDenied => "ACCESS_DENIED",
            AuditAction::Custom(name) => name,
        }
    }

    /// Groups the action by its leading verb.
    pub fn class(&self) -> ActionClass {
        ActionClass::of(self.as_str())
    }
}

impl From<&str> for AuditAction {
    fn from(name: &str) -> Self {
        match name {
            "VIEW_PATIENT" => AuditAction::ViewPatient,
            "VIEW_PATIENT_LIST" => AuditAction::ViewPatientList,
            "CREATE_PATIENT" => AuditAction::CreatePatient,
            "UPDATE_PATIENT" => AuditAction::UpdatePatient,
            "UPDATE_PATIENT_DOCTOR" => AuditAction::UpdatePatientDoctor,
            "UPDATE_PATIENT_FULL" => AuditAction::UpdatePatientFull,
            "CREATE_STAFF" => AuditAction::CreateStaff,
            "USER_LOGIN" => AuditAction::UserLogin,
            "USER_LOGOUT" => AuditAction::UserLogout,
            "ACCESS_DENIED" => AuditAction::AccessDenied,
            other => AuditAction::Custom(other.to_string()),
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for AuditAction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AuditAction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(AuditAction::from(name.as_str()))
    }
}

/// Display grouping of actions. Not used for enforcement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionClass {
    /// VIEW actions
    Informational,
    /// CREATE actions
    Creation,
    /// UPDATE actions
    Modification,
    /// Everything else
    Neutral,
}

impl ActionClass {
    /// Classifies an action name by the verb before its first underscore.
    pub fn of(action: &str) -> Self {
        let verb = action.split('_').next().unwrap_or_default();
        match verb {
            "VIEW" => ActionClass::Informational,
            "CREATE" => ActionClass::Creation,
            "UPDATE" => ActionClass::Modification,
            _ => ActionClass::Neutral,
        }
    }
}

impl fmt::Display for ActionClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionClass::Informational => write!(f, "informational"),
            ActionClass::Creation => write!(f, "creation"),
            ActionClass::Modification => write!(f, "modification"),
            ActionClass::Neutral => write!(f, "neutral"),
        }
    }
}

/// Outcome of an audited operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    /// Operation succeeded
    Success,
    /// Operation was refused by policy
    Denied,
    /// Operation failed validation or at the store
    Failed,
}

impl fmt::Display for AuditOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditOutcome::Success => write!(f, "success"),
            AuditOutcome::Denied => write!(f, "denied"),
            AuditOutcome::Failed => write!(f, "failed"),
        }
    }
}

/// An immutable entry in the audit trail.
///
/// Only [`AuditTrail`](super::AuditTrail) creates events, assigning the id
/// and timestamp under its lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    id: u64,
    timestamp: DateTime<Utc>,
    actor_id: Option<u64>,
    actor_name: Option<String>,
    action: AuditAction,
    class: ActionClass,
    outcome: AuditOutcome,
    target_id: Option<u64>,
    details: String,
}

impl AuditEvent {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: u64,
        timestamp: DateTime<Utc>,
        actor_id: Option<u64>,
        actor_name: Option<String>,
        action: AuditAction,
        outcome: AuditOutcome,
        target_id: Option<u64>,
        details: String,
    ) -> Self {
        Self {
            id,
            timestamp,
            actor_id,
            actor_name,
            class: action.class(),
            action,
            outcome,
            target_id,
            details,
        }
    }

    /// Unique, monotonically increasing id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// When the event was appended.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Account id of the actor, if known.
    pub fn actor_id(&self) -> Option<u64> {
        self.actor_id
    }

    /// Username of the actor, if known.
    pub fn actor_name(&self) -> Option<&str> {
        self.actor_name.as_deref()
    }

    /// The recorded action.
    pub fn action(&self) -> &AuditAction {
        &self.action
    }

    /// Grouping derived from the action.
    pub fn class(&self) -> ActionClass {
        self.class
    }

    /// Whether the action succeeded.
    pub fn outcome(&self) -> AuditOutcome {
        self.outcome
    }

    /// Id of the record or account acted on.
    pub fn target_id(&self) -> Option<u64> {
        self.target_id
    }

    /// Free-text description.
    pub fn details(&self) -> &str {
        &self.details
    }
}

impl fmt::Display for AuditEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AuditEvent[id={}, action={}, outcome={}, actor={}",
            self.id,
            self.action,
            self.outcome,
            self.actor_name.as_deref().unwrap_or("<none>")
        )?;
        if let Some(target) = self.target_id {
            write!(f, ", target={}", target)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_follows_leading_verb() {
        assert_eq!(AuditAction::ViewPatient.class(), ActionClass::Informational);
        assert_eq!(AuditAction::ViewPatientList.class(), ActionClass::Informational);
        assert_eq!(AuditAction::CreatePatient.class(), ActionClass::Creation);
        assert_eq!(AuditAction::CreateStaff.class(), ActionClass::Creation);
        assert_eq!(AuditAction::UpdatePatientDoctor.class(), ActionClass::Modification);
        assert_eq!(AuditAction::UserLogin.class(), ActionClass::Neutral);
        assert_eq!(AuditAction::AccessDenied.class(), ActionClass::Neutral);
        assert_eq!(
            AuditAction::Custom("DELETE_PATIENT".into()).class(),
            ActionClass::Neutral
        );
    }

    #[test]
    fn verb_must_be_whole_segment() {
        assert_eq!(ActionClass::of("VIEWED_THING"), ActionClass::Neutral);
        assert_eq!(ActionClass::of("PREVIEW_PATIENT"), ActionClass::Neutral);
        assert_eq!(ActionClass::of("VIEW"), ActionClass::Informational);
        assert_eq!(ActionClass::of(""), ActionClass::Neutral);
    }

    #[test]
    fn action_names_round_trip_through_str() {
        for name in ["VIEW_PATIENT", "UPDATE_PATIENT_FULL", "USER_LOGOUT", "EXPORT_LOGS"] {
            assert_eq!(AuditAction::from(name).as_str(), name);
        }
        assert_eq!(
            AuditAction::from("EXPORT_LOGS"),
            AuditAction::Custom("EXPORT_LOGS".into())
        );
    }

    #[test]
    fn display_is_compact() {
        let event = AuditEvent::new(
            4,
            Utc::now(),
            Some(1),
            Some("admin".into()),
            AuditAction::ViewPatient,
            AuditOutcome::Success,
            Some(9),
            "Viewed patient 9".into(),
        );
        assert_eq!(
            event.to_string(),
            "AuditEvent[id=4, action=VIEW_PATIENT, outcome=success, actor=admin, target=9]"
        );
    }
}
