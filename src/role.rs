//! Staff roles and role sets.
//!
//! Roles are plain values checked against static tables; there is no
//! per-role type hierarchy. An actor may hold several roles at once.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A staff role.
///
/// Declaration order is precedence order: when one role must be picked
/// from a set, the earliest variant wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Full access to records, staff management and the audit log
    Admin,
    /// Clinical access: sees diagnoses, sees identity only through shadow fields
    Doctor,
    /// Front desk: sees identity, never diagnoses, may only reassign doctors
    Receptionist,
}

impl Role {
    /// Every role, in precedence order.
    pub const ALL: [Role; 3] = [Role::Admin, Role::Doctor, Role::Receptionist];

    /// The group name used by the identity boundary.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Doctor => "Doctor",
            Role::Receptionist => "Receptionist",
        }
    }

    const fn bit(self) -> u8 {
        match self {
            Role::Admin => 0b001,
            Role::Doctor => 0b010,
            Role::Receptionist => 0b100,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a group name does not name a known role.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

/// The set of roles held by an actor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RoleSet(u8);

impl RoleSet {
    /// An empty role set.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// A set holding exactly `role`.
    pub const fn only(role: Role) -> Self {
        Self(role.bit())
    }

    /// Returns a copy of the set with `role` added.
    pub const fn with(self, role: Role) -> Self {
        Self(self.0 | role.bit())
    }

    /// Adds `role` to the set.
    pub fn insert(&mut self, role: Role) {
        self.0 |= role.bit();
    }

    /// Returns true if the set holds `role`.
    pub const fn contains(self, role: Role) -> bool {
        self.0 & role.bit() != 0
    }

    /// Returns true if the set holds any role in `roles`.
    pub fn contains_any(self, roles: &[Role]) -> bool {
        roles.iter().any(|r| self.contains(*r))
    }

    /// Returns true if no roles are held.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// The highest-precedence role held, used for field-level policy.
    pub fn effective(self) -> Option<Role> {
        self.iter().next()
    }

    /// Iterates the held roles in precedence order.
    pub fn iter(self) -> impl Iterator<Item = Role> {
        Role::ALL.into_iter().filter(move |r| self.contains(*r))
    }

    /// Builds a set from group names, skipping names that are not roles.
    pub fn from_group_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .filter_map(|n| n.as_ref().parse::<Role>().ok())
            .collect()
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
        iter.into_iter().fold(RoleSet::empty(), RoleSet::with)
    }
}

impl From<Role> for RoleSet {
    fn from(role: Role) -> Self {
        RoleSet::only(role)
    }
}

impl fmt::Display for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(Role::as_str).collect();
        write!(f, "[{}]", names.join(", "))
    }
}

impl Serialize for RoleSet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de> Deserialize<'de> for RoleSet {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let roles = Vec::<Role>::deserialize(deserializer)?;
        Ok(roles.into_iter().collect())
    }
}
