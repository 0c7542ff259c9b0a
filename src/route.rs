//! Operation-level route guard.
//!
//! The guard answers one question before any record is touched: may an
//! actor holding these roles perform this operation at all? Field-level
//! decisions live in [`crate::access`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::request::Actor;
use crate::role::{Role, RoleSet};

/// A coarse operation exposed to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Land on the role-specific dashboard
    ViewDashboard,
    /// List patient records
    ListPatients,
    /// Open a single patient record
    ViewPatient,
    /// Register a new patient
    CreatePatient,
    /// Edit an existing patient
    EditPatient,
    /// List doctors for assignment pickers
    ListDoctors,
    /// Create a staff account
    CreateStaff,
    /// Read or export the audit log
    ViewAuditLog,
}

impl Operation {
    /// Every operation.
    pub const ALL: [Operation; 8] = [
        Operation::ViewDashboard,
        Operation::ListPatients,
        Operation::ViewPatient,
        Operation::CreatePatient,
        Operation::EditPatient,
        Operation::ListDoctors,
        Operation::CreateStaff,
        Operation::ViewAuditLog,
    ];

    /// Stable snake_case name, used in logs and violation messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::ViewDashboard => "view_dashboard",
            Operation::ListPatients => "list_patients",
            Operation::ViewPatient => "view_patient",
            Operation::CreatePatient => "create_patient",
            Operation::EditPatient => "edit_patient",
            Operation::ListDoctors => "list_doctors",
            Operation::CreateStaff => "create_staff",
            Operation::ViewAuditLog => "view_audit_log",
        }
    }

    /// Roles allowed to perform the operation.
    pub fn allowed_roles(self) -> Allowed {
        match self {
            Operation::ViewDashboard
            | Operation::ListPatients
            | Operation::ViewPatient
            | Operation::ListDoctors => Allowed::AnyAuthenticated,
            Operation::CreatePatient | Operation::CreateStaff | Operation::ViewAuditLog => {
                Allowed::Roles(&[Role::Admin])
            }
            Operation::EditPatient => Allowed::Roles(&[Role::Receptionist, Role::Admin]),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who may perform an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Allowed {
    /// Any authenticated actor, even one holding no roles
    AnyAuthenticated,
    /// Actors holding at least one of these roles
    Roles(&'static [Role]),
}

/// Returns true if an actor holding `roles` may perform `operation`.
///
/// This assumes the actor is authenticated; see [`navigate`] for the
/// unauthenticated case.
pub fn is_allowed(roles: RoleSet, operation: Operation) -> bool {
    match operation.allowed_roles() {
        Allowed::AnyAuthenticated => true,
        Allowed::Roles(allowed) => roles.contains_any(allowed),
    }
}

/// Where the presentation layer should send the actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Navigation {
    /// The operation is permitted
    Proceed,
    /// No session; send to the login view
    RedirectToLogin,
    /// Authenticated but forbidden; send to the safe default view
    RedirectToDashboard,
}

/// Resolves an operation request into a navigation outcome.
///
/// Forbidden operations are soft-denied with a dashboard redirect rather
/// than an error surface.
pub fn navigate(actor: Option<&Actor>, operation: Operation) -> Navigation {
    match actor {
        None => Navigation::RedirectToLogin,
        Some(actor) if is_allowed(actor.roles, operation) => Navigation::Proceed,
        Some(_) => Navigation::RedirectToDashboard,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roles(role: Role) -> RoleSet {
        RoleSet::only(role)
    }

    #[test]
    fn create_patient_is_admin_only() {
        assert!(is_allowed(roles(Role::Admin), Operation::CreatePatient));
        assert!(!is_allowed(roles(Role::Doctor), Operation::CreatePatient));
        assert!(!is_allowed(roles(Role::Receptionist), Operation::CreatePatient));
    }

    #[test]
    fn edit_patient_allows_receptionist_and_admin() {
        assert!(is_allowed(roles(Role::Admin), Operation::EditPatient));
        assert!(is_allowed(roles(Role::Receptionist), Operation::EditPatient));
        assert!(!is_allowed(roles(Role::Doctor), Operation::EditPatient));
    }

    #[test]
    fn list_patients_allows_any_authenticated_role() {
        for role in Role::ALL {
            assert!(is_allowed(roles(role), Operation::ListPatients));
        }
        assert!(is_allowed(RoleSet::empty(), Operation::ListPatients));
    }

    #[test]
    fn admin_only_operations() {
        for op in [Operation::CreateStaff, Operation::ViewAuditLog] {
            assert!(is_allowed(roles(Role::Admin), op));
            assert!(!is_allowed(roles(Role::Doctor), op));
            assert!(!is_allowed(roles(Role::Receptionist), op));
            assert!(!is_allowed(RoleSet::empty(), op));
        }
    }

    #[test]
    fn multi_role_actor_gets_union() {
        let set = RoleSet::only(Role::Doctor).with(Role::Receptionist);
        assert!(is_allowed(set, Operation::EditPatient));
        assert!(!is_allowed(set, Operation::CreatePatient));
    }

    #[test]
    fn navigation_outcomes() {
        let doctor = Actor::new(2, "dr_who", Role::Doctor);
        let admin = Actor::new(1, "root", Role::Admin);

        assert_eq!(
            navigate(None, Operation::ListPatients),
            Navigation::RedirectToLogin
        );
        assert_eq!(
            navigate(Some(&doctor), Operation::CreatePatient),
            Navigation::RedirectToDashboard
        );
        assert_eq!(
            navigate(Some(&admin), Operation::CreatePatient),
            Navigation::Proceed
        );
    }
}
