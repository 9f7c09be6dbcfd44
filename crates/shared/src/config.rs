//! Configuration types for featgate

use crate::error::{RbacError, Result};
use crate::role::Role;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// What to do when a feature id is defined twice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateFeaturePolicy {
    /// Replace the earlier definition and log a warning
    #[default]
    Overwrite,
    /// Fail with `DuplicateFeature`
    Reject,
}

/// Registry and evaluator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RbacConfig {
    /// Role seeded with the whole permission catalog
    #[serde(default = "default_super_role")]
    pub super_role: Role,

    /// Role whose holders pass every permission check regardless of the
    /// resolved map. `None` disables the override.
    #[serde(default = "default_override_role")]
    pub override_role: Option<Role>,

    #[serde(default)]
    pub duplicate_features: DuplicateFeaturePolicy,

    /// Direct inheritance edges. Falls back to the built-in table when absent.
    #[serde(default)]
    pub hierarchy: Option<BTreeMap<Role, Vec<Role>>>,
}

fn default_super_role() -> Role {
    Role::SuperAdmin
}

fn default_override_role() -> Option<Role> {
    Some(Role::Admin)
}

impl Default for RbacConfig {
    fn default() -> Self {
        Self {
            super_role: default_super_role(),
            override_role: default_override_role(),
            duplicate_features: DuplicateFeaturePolicy::default(),
            hierarchy: None,
        }
    }
}

impl RbacConfig {
    /// Load configuration from a JSON or YAML file (chosen by extension)
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Ok(serde_json::from_str(&content)?),
            Some("yaml") | Some("yml") => Ok(serde_yaml::from_str(&content)?),
            other => Err(RbacError::Config(format!(
                "Unsupported config extension {:?} for {}",
                other,
                path.display()
            ))),
        }
    }

    /// Builder: disable the override role
    pub fn without_override(mut self) -> Self {
        self.override_role = None;
        self
    }

    /// Builder: reject duplicate feature ids
    pub fn rejecting_duplicates(mut self) -> Self {
        self.duplicate_features = DuplicateFeaturePolicy::Reject;
        self
    }

    /// Builder: set custom hierarchy edges
    pub fn with_hierarchy(mut self, edges: BTreeMap<Role, Vec<Role>>) -> Self {
        self.hierarchy = Some(edges);
        self
    }
}
