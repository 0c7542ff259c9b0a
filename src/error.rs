use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use crate::access::Field;
use crate::role::Role;
use crate::route::{Navigation, Operation};
use crate::store::StoreError;

/// Errors returned by the access layer.
///
/// Guard failures are carried as a [`Violation`]; everything else maps to
/// one of the remaining variants. Use [`Error::navigation`] to turn a guard
/// failure into the redirect the presentation layer should perform.
#[derive(Debug, Error)]
pub enum Error {
    /// The route guard rejected the request.
    #[error("Policy violation: {0}")]
    Violation(#[from] Violation),

    /// One or more submitted fields failed validation.
    #[error("Validation failed: {0}")]
    ValidationFailed(FieldErrors),

    /// The requested record does not exist or is outside the actor's scope.
    #[error("Patient {0} not found")]
    NotFound(u64),

    /// The role attempted to change a field it may not edit.
    #[error("Field '{field}' is not editable by {role}")]
    FieldImmutable {
        /// The rejected field
        field: Field,
        /// The role whose policy rejected it
        role: Role,
    },

    /// The persistence boundary rejected a write because of a conflict.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The persistence boundary failed; surfaced verbatim.
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Writing the audit export failed.
    #[error("Audit export failed: {0}")]
    Export(String),
}

impl Error {
    /// Returns true when the error is an authorization soft-deny.
    pub fn is_soft_deny(&self) -> bool {
        matches!(
            self,
            Error::Violation(Violation {
                kind: ViolationKind::Forbidden { .. },
                ..
            })
        )
    }

    /// Returns the redirect a guard failure maps to, if any.
    ///
    /// Unauthenticated requests go to the login view; forbidden ones go to
    /// the dashboard. Every other error is surfaced to the caller as-is.
    pub fn navigation(&self) -> Option<Navigation> {
        match self {
            Error::Violation(v) => Some(v.navigation()),
            _ => None,
        }
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => Error::NotFound(id),
            StoreError::Validation(errors) => Error::ValidationFailed(errors),
            StoreError::Conflict(msg) => Error::Conflict(msg),
            StoreError::Unavailable(msg) => Error::UpstreamUnavailable(msg),
        }
    }
}

/// A guard violation with details about what failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// The kind of violation that occurred
    pub kind: ViolationKind,
    /// Human-readable message explaining the violation
    pub message: String,
}

impl Violation {
    /// Creates a new violation.
    pub fn new(kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Shorthand for an unauthenticated violation.
    pub fn unauthenticated() -> Self {
        Self::new(ViolationKind::Unauthenticated, "Authentication required")
    }

    /// Shorthand for a forbidden violation on `operation`.
    pub fn forbidden(operation: Operation) -> Self {
        Self::new(
            ViolationKind::Forbidden { operation },
            format!("Operation '{}' is not permitted for this actor", operation),
        )
    }

    /// The redirect this violation maps to.
    pub fn navigation(&self) -> Navigation {
        match self.kind {
            ViolationKind::Unauthenticated => Navigation::RedirectToLogin,
            ViolationKind::Forbidden { .. } => Navigation::RedirectToDashboard,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for Violation {}

/// The kind of guard violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    /// No actor is attached to the request
    Unauthenticated,
    /// The actor's roles do not permit the operation
    Forbidden {
        /// The operation that was refused
        operation: Operation,
    },
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationKind::Unauthenticated => write!(f, "AuthenticationRequired"),
            ViolationKind::Forbidden { operation } => {
                write!(f, "AuthorizationDenied for '{}'", operation)
            }
        }
    }
}

/// Per-field validation messages.
///
/// Keys are field names so messages can be attached to form inputs directly.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    /// Creates an empty set of errors.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a message for `field`.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    /// Returns the messages recorded for `field`.
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// Returns true if no messages were recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of fields with at least one message.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Converts into `Err(Error::ValidationFailed)` when non-empty.
    pub fn into_result(self) -> Result<(), Error> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(Error::ValidationFailed(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{}: {}", field, message)?;
                first = false;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forbidden_is_soft_deny_and_redirects_to_dashboard() {
        let err = Error::from(Violation::forbidden(Operation::CreatePatient));
        assert!(err.is_soft_deny());
        assert_eq!(err.navigation(), Some(Navigation::RedirectToDashboard));
    }

    #[test]
    fn unauthenticated_redirects_to_login() {
        let err = Error::from(Violation::unauthenticated());
        assert!(!err.is_soft_deny());
        assert_eq!(err.navigation(), Some(Navigation::RedirectToLogin));
    }

    #[test]
    fn non_guard_errors_have_no_navigation() {
        assert_eq!(Error::NotFound(3).navigation(), None);
        assert!(!Error::UpstreamUnavailable("db down".into()).is_soft_deny());
    }

    #[test]
    fn store_errors_map_onto_taxonomy() {
        assert!(matches!(
            Error::from(StoreError::Unavailable("timeout".into())),
            Error::UpstreamUnavailable(msg) if msg == "timeout"
        ));
        assert!(matches!(
            Error::from(StoreError::NotFound(9)),
            Error::NotFound(9)
        ));
        assert!(matches!(
            Error::from(StoreError::Conflict("taken".into())),
            Error::Conflict(_)
        ));
    }

    #[test]
    fn field_errors_collect_per_field() {
        let mut errors = FieldErrors::new();
        assert!(errors.is_empty());
        errors.add("age", "must be at most 150");
        errors.add("name", "must not be empty");
        errors.add("name", "too long");

        assert_eq!(errors.len(), 2);
        assert_eq!(errors.get("name").map(<[String]>::len), Some(2));
        assert_eq!(
            errors.to_string(),
            "age: must be at most 150; name: must not be empty; name: too long"
        );
        assert!(matches!(
            errors.into_result(),
            Err(Error::ValidationFailed(_))
        ));
    }

    #[test]
    fn violation_display() {
        let v = Violation::forbidden(Operation::ViewAuditLog);
        assert!(v.to_string().starts_with("AuthorizationDenied for 'view_audit_log'"));
    }
}
