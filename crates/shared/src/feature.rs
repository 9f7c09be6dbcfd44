//! Feature types

use crate::role::Role;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A named runtime toggle inside a feature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureFlag {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub default_enabled: bool,
}

/// Declared defaults for a feature flag, keyed by flag id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagDefaults {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_enabled")]
    pub default_enabled: bool,
}

impl FlagDefaults {
    pub fn new(name: impl Into<String>, default_enabled: bool) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            default_enabled,
        }
    }

    /// Builder: set description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

fn default_enabled() -> bool {
    true
}

/// A registered feature: its permissions, the roles that receive them, and
/// its runtime flags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    /// Unique feature identifier (e.g., 'exams', 'payments')
    pub id: String,

    /// Human-readable name
    pub name: String,

    /// Feature description
    pub description: String,

    /// Permission key -> permission string (e.g., READ -> 'exams:read')
    #[serde(default)]
    pub permissions: BTreeMap<String, String>,

    /// Roles granted this feature's permissions
    #[serde(default)]
    pub required_roles: BTreeSet<Role>,

    /// Whether the feature starts enabled
    pub default_enabled: bool,

    /// Flag id -> flag
    #[serde(default)]
    pub feature_flags: BTreeMap<String, FeatureFlag>,
}

impl Feature {
    /// Create a feature with no permissions, roles or flags
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        default_enabled: bool,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            permissions: BTreeMap::new(),
            required_roles: BTreeSet::new(),
            default_enabled,
            feature_flags: BTreeMap::new(),
        }
    }

    /// Permission strings declared by this feature
    pub fn permission_values(&self) -> impl Iterator<Item = &str> {
        self.permissions.values().map(|s| s.as_str())
    }

    /// Check if the feature grants its permissions to a role
    pub fn requires_role(&self, role: Role) -> bool {
        self.required_roles.contains(&role)
    }

    /// Check if the feature declares a flag
    pub fn has_flag(&self, flag_id: &str) -> bool {
        self.feature_flags.contains_key(flag_id)
    }
}

/// Declarative description of a feature, as registered by a feature module
/// or loaded from a definition file.
///
/// Roles stay as strings here so that an unknown role is reported by the
/// registry as a configuration error rather than a parse failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureDefinition {
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default = "default_enabled")]
    pub default_enabled: bool,

    /// Permission key -> permission string
    #[serde(default)]
    pub permissions: BTreeMap<String, String>,

    #[serde(default)]
    pub required_roles: Vec<String>,

    /// Flag key -> flag id
    #[serde(default)]
    pub feature_flags: BTreeMap<String, String>,

    /// Flag id -> defaults. Flags without an entry get their key as name and
    /// start enabled.
    #[serde(default)]
    pub flag_defaults: BTreeMap<String, FlagDefaults>,
}

impl FeatureDefinition {
    /// Create a definition with minimal configuration
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            default_enabled: true,
            permissions: BTreeMap::new(),
            required_roles: Vec::new(),
            feature_flags: BTreeMap::new(),
            flag_defaults: BTreeMap::new(),
        }
    }

    /// Builder: set description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Builder: start disabled
    pub fn disabled_by_default(mut self) -> Self {
        self.default_enabled = false;
        self
    }

    /// Builder: add a permission
    pub fn with_permission(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.permissions.insert(key.into(), value.into());
        self
    }

    /// Builder: set required roles
    pub fn with_required_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_roles = roles.into_iter().map(Into::into).collect();
        self
    }

    /// Builder: add a flag
    pub fn with_flag(mut self, key: impl Into<String>, flag_id: impl Into<String>) -> Self {
        self.feature_flags.insert(key.into(), flag_id.into());
        self
    }

    /// Builder: add a flag together with its defaults
    pub fn with_flag_defaults(
        mut self,
        key: impl Into<String>,
        flag_id: impl Into<String>,
        defaults: FlagDefaults,
    ) -> Self {
        let flag_id = flag_id.into();
        self.feature_flags.insert(key.into(), flag_id.clone());
        self.flag_defaults.insert(flag_id, defaults);
        self
    }
}

/// Snapshot of every registered feature definition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureManifest {
    /// Manifest version
    pub version: String,

    /// When the manifest was generated
    pub generated_at: String,

    /// All feature definitions
    pub features: Vec<FeatureDefinition>,
}

#[cfg(test)]
mod tests {
    use super::*;

    // ============== Feature Tests ==============

    #[test]
    fn test_feature_new_is_empty() {
        let feature = Feature::new("exams", "Exams", "Exam taking", true);

        assert_eq!(feature.id, "exams");
        assert!(feature.default_enabled);
        assert!(feature.permissions.is_empty());
        assert!(feature.required_roles.is_empty());
        assert!(feature.feature_flags.is_empty());
    }

    #[test]
    fn test_feature_permission_values() {
        let mut feature = Feature::new("exams", "Exams", "", true);
        feature.permissions.insert("READ".to_string(), "exams:read".to_string());
        feature.permissions.insert("WRITE".to_string(), "exams:write".to_string());

        let values: Vec<&str> = feature.permission_values().collect();
        assert_eq!(values, vec!["exams:read", "exams:write"]);
    }

    #[test]
    fn test_feature_requires_role() {
        let mut feature = Feature::new("payments", "Payments", "", true);
        feature.required_roles.insert(Role::Admin);

        assert!(feature.requires_role(Role::Admin));
        assert!(!feature.requires_role(Role::User));
    }

    // ============== FeatureDefinition Tests ==============

    #[test]
    fn test_definition_builder_chain() {
        let def = FeatureDefinition::new("exams", "Exams")
            .with_description("Exam taking")
            .with_permission("READ", "exams:read")
            .with_required_roles(["PHARMACIST", "MANAGER"])
            .with_flag("TIMER", "exams.timer")
            .disabled_by_default();

        assert_eq!(def.description, "Exam taking");
        assert_eq!(def.permissions.get("READ"), Some(&"exams:read".to_string()));
        assert_eq!(def.required_roles, vec!["PHARMACIST", "MANAGER"]);
        assert_eq!(def.feature_flags.get("TIMER"), Some(&"exams.timer".to_string()));
        assert!(!def.default_enabled);
    }

    #[test]
    fn test_definition_with_flag_defaults() {
        let def = FeatureDefinition::new("exams", "Exams").with_flag_defaults(
            "TIMER",
            "exams.timer",
            FlagDefaults::new("Timer", false).with_description("Countdown"),
        );

        let defaults = def.flag_defaults.get("exams.timer").unwrap();
        assert_eq!(defaults.name, "Timer");
        assert_eq!(defaults.description, "Countdown");
        assert!(!defaults.default_enabled);
    }

    #[test]
    fn test_definition_deserialization_defaults() {
        let json = r#"{ "id": "reports", "name": "Reports" }"#;

        let def: FeatureDefinition = serde_json::from_str(json).unwrap();
        assert!(def.default_enabled);
        assert!(def.description.is_empty());
        assert!(def.permissions.is_empty());
        assert!(def.required_roles.is_empty());
    }

    #[test]
    fn test_definition_deserialization_from_yaml() {
        let yaml = r#"
id: exams
name: Exams
defaultEnabled: false
permissions:
  READ: exams:read
  ATTEMPT: exams:attempt
requiredRoles:
  - PHARMACIST
featureFlags:
  TIMER: exams.timer
flagDefaults:
  exams.timer:
    name: Timer
    defaultEnabled: false
"#;

        let def: FeatureDefinition = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(def.id, "exams");
        assert!(!def.default_enabled);
        assert_eq!(def.permissions.len(), 2);
        assert_eq!(def.required_roles, vec!["PHARMACIST"]);
        assert!(!def.flag_defaults["exams.timer"].default_enabled);
    }

    #[test]
    fn test_flag_defaults_enabled_when_omitted() {
        let json = r#"{ "name": "Timer" }"#;
        let defaults: FlagDefaults = serde_json::from_str(json).unwrap();
        assert!(defaults.default_enabled);
    }

    #[test]
    fn test_feature_serialization_camel_case() {
        let mut feature = Feature::new("exams", "Exams", "", false);
        feature.required_roles.insert(Role::PharmacyManager);

        let json = serde_json::to_string(&feature).unwrap();
        assert!(json.contains("\"defaultEnabled\":false"));
        assert!(json.contains("\"requiredRoles\":[\"PHARMACY_MANAGER\"]"));
    }
}
