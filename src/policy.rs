use crate::route::Operation;

/// A requirement checked by [`PolicyGate::build`](crate::PolicyGate::build).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyReq {
    /// Requires an authenticated actor
    Authenticated,
    /// Requires the actor's roles to permit an operation
    Authorized {
        /// The operation to check against the route guard
        operation: Operation,
    },
}

/// Policy requiring an authenticated actor.
pub struct Authenticated;

/// Policy requiring that the actor may perform an operation.
///
/// Checked against the route guard table in [`crate::route`].
pub struct Authorized {
    operation: Operation,
}

impl Authorized {
    /// Creates an authorization requirement for `operation`.
    pub fn for_operation(operation: Operation) -> Self {
        Self { operation }
    }
}

impl From<Authenticated> for PolicyReq {
    fn from(_: Authenticated) -> Self {
        PolicyReq::Authenticated
    }
}

impl From<Authorized> for PolicyReq {
    fn from(auth: Authorized) -> Self {
        PolicyReq::Authorized {
            operation: auth.operation,
        }
    }
}

impl From<Operation> for PolicyReq {
    fn from(operation: Operation) -> Self {
        PolicyReq::Authorized { operation }
    }
}
