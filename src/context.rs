use crate::error::Violation;
use crate::request::Actor;
use crate::role::Role;
use crate::route::{is_allowed, Operation};

/// Validated request context.
///
/// Holds the request id, the authenticated actor and the operations the
/// gate checked up front. `Ctx` cannot be built outside this crate; use
/// [`PolicyGate`](crate::PolicyGate).
#[derive(Debug, Clone)]
pub struct Ctx {
    request_id: String,
    actor: Actor,
    granted: Vec<Operation>,
}

impl Ctx {
    pub(crate) fn new(request_id: String, actor: Actor, granted: Vec<Operation>) -> Self {
        Self {
            request_id,
            actor,
            granted,
        }
    }

    /// Returns the request ID for this context.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Returns the authenticated actor.
    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    /// The role used for field-level decisions, if the actor holds any.
    pub fn role(&self) -> Option<Role> {
        self.actor.effective_role()
    }

    /// Operations validated when the context was built.
    pub fn granted(&self) -> &[Operation] {
        &self.granted
    }

    /// Returns true if the gate validated `operation`.
    pub fn is_granted(&self, operation: Operation) -> bool {
        self.granted.contains(&operation)
    }

    /// Checks `operation` against the route guard.
    ///
    /// Operations validated by the gate pass immediately; anything else is
    /// checked against the actor's roles now.
    ///
    /// # Errors
    ///
    /// Returns a `Forbidden` violation if the actor's roles do not permit it.
    pub fn authorize(&self, operation: Operation) -> Result<(), Violation> {
        if self.is_granted(operation) || is_allowed(self.actor.roles, operation) {
            Ok(())
        } else {
            Err(Violation::forbidden(operation))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ViolationKind;
    use crate::role::RoleSet;

    #[test]
    fn authorize_checks_roles_for_ungranted_operations() {
        let ctx = Ctx::new(
            "req-1".to_string(),
            Actor::new(3, "desk", Role::Receptionist),
            vec![Operation::ListPatients],
        );
        assert!(ctx.authorize(Operation::ListPatients).is_ok());
        assert!(ctx.authorize(Operation::EditPatient).is_ok());
        assert_eq!(
            ctx.authorize(Operation::ViewAuditLog).unwrap_err().kind,
            ViolationKind::Forbidden {
                operation: Operation::ViewAuditLog
            }
        );
    }

    #[test]
    fn role_is_effective_role() {
        let ctx = Ctx::new(
            "req-2".to_string(),
            Actor::new(4, "both", RoleSet::only(Role::Receptionist).with(Role::Doctor)),
            Vec::new(),
        );
        assert_eq!(ctx.role(), Some(Role::Doctor));
        assert_eq!(ctx.request_id(), "req-2");
    }
}
