//! Role definitions

use crate::error::UnknownRoleError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of actor classifications.
///
/// Roles are not extensible at runtime. Their string form is the upper-case
/// identifier (`"PHARMACY_MANAGER"`), and parsing is case-insensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    SuperAdmin,
    Admin,
    Manager,
    PharmacyManager,
    Pharmacist,
    Technician,
    Proprietor,
    User,
}

impl Role {
    /// Every role, most privileged first
    pub const ALL: [Role; 8] = [
        Role::SuperAdmin,
        Role::Admin,
        Role::Manager,
        Role::PharmacyManager,
        Role::Pharmacist,
        Role::Technician,
        Role::Proprietor,
        Role::User,
    ];

    /// Canonical upper-case identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "SUPER_ADMIN",
            Role::Admin => "ADMIN",
            Role::Manager => "MANAGER",
            Role::PharmacyManager => "PHARMACY_MANAGER",
            Role::Pharmacist => "PHARMACIST",
            Role::Technician => "TECHNICIAN",
            Role::Proprietor => "PROPRIETOR",
            Role::User => "USER",
        }
    }

    /// Base role every hierarchy bottoms out in
    pub fn base() -> Self {
        Role::User
    }

    /// Parse without producing an error, for fail-closed query paths
    pub fn parse(value: &str) -> Option<Self> {
        value.parse().ok()
    }

    /// Identifiers of every role, for error messages and listings
    pub fn known_roles() -> Vec<String> {
        Role::ALL.iter().map(|r| r.as_str().to_string()).collect()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize_role(s);
        Role::ALL
            .iter()
            .copied()
            .find(|r| r.as_str() == normalized)
            .ok_or_else(|| UnknownRoleError {
                role: s.to_string(),
                known_roles: Role::known_roles(),
            })
    }
}

/// Canonical comparison form of a role string
pub fn normalize_role(role: &str) -> String {
    role.trim().to_uppercase()
}
