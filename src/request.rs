use serde::{Deserialize, Serialize};

use crate::role::{Role, RoleSet};

/// Metadata about an incoming request.
///
/// Contains the request identifier and the actor resolved by the identity
/// boundary, if there is a session.
#[derive(Debug, Clone)]
pub struct RequestMeta {
    /// Unique identifier for this request
    pub request_id: String,
    /// Authenticated actor, if any
    pub actor: Option<Actor>,
}

impl RequestMeta {
    /// Creates request metadata for an authenticated actor.
    pub fn authenticated(request_id: impl Into<String>, actor: Actor) -> Self {
        Self {
            request_id: request_id.into(),
            actor: Some(actor),
        }
    }

    /// Creates request metadata with no actor.
    pub fn anonymous(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            actor: None,
        }
    }
}

/// An authenticated staff member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Account identifier
    pub id: u64,
    /// Login name, recorded as the actor name in audit events
    pub username: String,
    /// Roles held by the account
    pub roles: RoleSet,
}

impl Actor {
    /// Creates an actor.
    pub fn new(id: u64, username: impl Into<String>, roles: impl Into<RoleSet>) -> Self {
        Self {
            id,
            username: username.into(),
            roles: roles.into(),
        }
    }

    /// The role used for field-level policy decisions.
    pub fn effective_role(&self) -> Option<Role> {
        self.roles.effective()
    }

    /// Returns true if the actor holds `role`.
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(role)
    }
}
