//! Actor and access requirement types

use crate::role::normalize_role;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Runtime representation of a caller.
///
/// Supplied by the session layer. Roles are normalized to upper case when the
/// actor is built or deserialized; permissions are kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ActorClaims")]
pub struct Actor {
    roles: BTreeSet<String>,
    permissions: BTreeSet<String>,
}

/// Raw shape of actor data as it arrives from a session
#[derive(Debug, Clone, Default, Deserialize)]
struct ActorClaims {
    #[serde(default)]
    roles: Vec<String>,
    #[serde(default)]
    permissions: Vec<String>,
}

impl From<ActorClaims> for Actor {
    fn from(claims: ActorClaims) -> Self {
        Actor::new(claims.roles, claims.permissions)
    }
}

impl Actor {
    pub fn new<R, P>(roles: R, permissions: P) -> Self
    where
        R: IntoIterator,
        R::Item: AsRef<str>,
        P: IntoIterator,
        P::Item: Into<String>,
    {
        Self {
            roles: roles.into_iter().map(|r| normalize_role(r.as_ref())).collect(),
            permissions: permissions.into_iter().map(Into::into).collect(),
        }
    }

    /// Actor holding no roles and no permissions
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Builder: add a role
    pub fn with_role(mut self, role: impl AsRef<str>) -> Self {
        self.roles.insert(normalize_role(role.as_ref()));
        self
    }

    /// Builder: add a permission
    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.permissions.insert(permission.into());
        self
    }

    /// Normalized roles
    pub fn roles(&self) -> &BTreeSet<String> {
        &self.roles
    }

    /// Directly granted permissions
    pub fn permissions(&self) -> &BTreeSet<String> {
        &self.permissions
    }

    /// Exact permission membership, without any override
    pub fn holds_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }

    /// Case-insensitive role membership
    pub fn holds_role(&self, role: &str) -> bool {
        self.roles.contains(&normalize_role(role))
    }
}

/// Permission/role requirement evaluated by `has_access`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessRequirement {
    #[serde(default)]
    pub permissions: Vec<String>,

    #[serde(default)]
    pub roles: Vec<String>,

    /// ALL semantics when true, ANY when false
    #[serde(default = "default_require_all")]
    pub require_all: bool,
}

fn default_require_all() -> bool {
    true
}

impl Default for AccessRequirement {
    fn default() -> Self {
        Self {
            permissions: Vec::new(),
            roles: Vec::new(),
            require_all: true,
        }
    }
}

impl AccessRequirement {
    /// Requirement that only lists permissions
    pub fn permissions<I, S>(permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            permissions: permissions.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Requirement that only lists roles
    pub fn roles<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            roles: roles.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Builder: add roles
    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles.extend(roles.into_iter().map(Into::into));
        self
    }

    /// Builder: switch to ANY semantics
    pub fn any(mut self) -> Self {
        self.require_all = false;
        self
    }

    /// True when neither permissions nor roles are required
    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty() && self.roles.is_empty()
    }
}
