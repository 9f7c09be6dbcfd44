//! FeatureRegistry - Feature metadata and per-feature permission sets

use shared::{
    DuplicateFeaturePolicy, Feature, FeatureDefinition, FeatureFlag, FlagDefaults, RbacError,
    Result, Role,
};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Holds every defined feature and the permission map each one declares
#[derive(Debug, Default)]
pub struct FeatureRegistry {
    /// Feature id -> feature
    features: BTreeMap<String, Feature>,
    /// Feature id -> permission key -> permission string
    permissions: BTreeMap<String, BTreeMap<String, String>>,
    /// How a second `define_feature` with the same id is handled
    duplicate_policy: DuplicateFeaturePolicy,
}

impl FeatureRegistry {
    /// Create an empty registry that overwrites duplicate ids
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry with an explicit duplicate policy
    pub fn with_duplicate_policy(policy: DuplicateFeaturePolicy) -> Self {
        Self {
            duplicate_policy: policy,
            ..Self::default()
        }
    }

    /// Define a new feature.
    ///
    /// An existing feature with the same id is replaced (its permissions
    /// included) under `Overwrite`, or left untouched with an error under
    /// `Reject`.
    pub fn define_feature(
        &mut self,
        id: &str,
        name: &str,
        description: &str,
        default_enabled: bool,
    ) -> Result<&Feature> {
        if self.features.contains_key(id) {
            match self.duplicate_policy {
                DuplicateFeaturePolicy::Reject => {
                    return Err(RbacError::DuplicateFeature {
                        feature_id: id.to_string(),
                    });
                }
                DuplicateFeaturePolicy::Overwrite => {
                    warn!(feature_id = id, "feature redefined, replacing earlier definition");
                    self.permissions.remove(id);
                }
            }
        }

        debug!(feature_id = id, default_enabled, "feature defined");
        let feature = Feature::new(id, name, description, default_enabled);
        self.features.insert(id.to_string(), feature);
        Ok(&self.features[id])
    }

    /// Define the permission map of a feature, replacing any earlier one
    pub fn define_permissions(
        &mut self,
        feature_id: &str,
        permissions: BTreeMap<String, String>,
    ) -> Result<()> {
        let feature = self.feature_mut(feature_id)?;
        feature.permissions = permissions.clone();
        self.permissions.insert(feature_id.to_string(), permissions);
        Ok(())
    }

    /// Attach the roles that receive this feature's permissions.
    ///
    /// Every role is validated before anything is stored.
    pub fn define_required_roles<I, S>(&mut self, feature_id: &str, roles: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let roles = roles
            .into_iter()
            .map(|r| r.as_ref().parse::<Role>())
            .collect::<std::result::Result<BTreeSet<_>, _>>()?;

        self.feature_mut(feature_id)?.required_roles = roles;
        Ok(())
    }

    /// Attach named runtime flags.
    ///
    /// `flags` maps an enum key to a flag id; `defaults` is keyed by flag id.
    /// A flag without defaults is named after its key and starts enabled.
    pub fn define_feature_flags(
        &mut self,
        feature_id: &str,
        flags: &BTreeMap<String, String>,
        defaults: &BTreeMap<String, FlagDefaults>,
    ) -> Result<()> {
        let feature = self.feature_mut(feature_id)?;

        for (key, flag_id) in flags {
            let flag = match defaults.get(flag_id) {
                Some(d) => FeatureFlag {
                    id: flag_id.clone(),
                    name: d.name.clone(),
                    description: d.description.clone(),
                    default_enabled: d.default_enabled,
                },
                None => FeatureFlag {
                    id: flag_id.clone(),
                    name: key.clone(),
                    description: String::new(),
                    default_enabled: true,
                },
            };
            feature.feature_flags.insert(flag_id.clone(), flag);
        }

        Ok(())
    }

    /// Apply a whole declarative definition through the `define_*` calls
    pub fn apply_definition(&mut self, def: &FeatureDefinition) -> Result<()> {
        // Validate roles first so a bad definition leaves no partial feature behind
        for role in &def.required_roles {
            role.parse::<Role>()?;
        }

        self.define_feature(&def.id, &def.name, &def.description, def.default_enabled)?;
        self.define_permissions(&def.id, def.permissions.clone())?;
        self.define_required_roles(&def.id, &def.required_roles)?;
        self.define_feature_flags(&def.id, &def.feature_flags, &def.flag_defaults)
    }

    fn feature_mut(&mut self, feature_id: &str) -> Result<&mut Feature> {
        self.features
            .get_mut(feature_id)
            .ok_or_else(|| RbacError::feature_not_registered(feature_id))
    }

    /// Get all registered features
    pub fn get_all_features(&self) -> &BTreeMap<String, Feature> {
        &self.features
    }

    /// Get a feature by id
    pub fn get_feature(&self, feature_id: &str) -> Option<&Feature> {
        self.features.get(feature_id)
    }

    /// Get the permission map of a feature (empty when unknown)
    pub fn get_feature_permissions(&self, feature_id: &str) -> BTreeMap<String, String> {
        self.permissions.get(feature_id).cloned().unwrap_or_default()
    }

    /// Get every feature's permission map
    pub fn get_all_permissions(&self) -> &BTreeMap<String, BTreeMap<String, String>> {
        &self.permissions
    }

    /// Flattened, deduplicated permission catalog
    pub fn get_all_permission_values(&self) -> BTreeSet<String> {
        self.permissions
            .values()
            .flat_map(|perms| perms.values().cloned())
            .collect()
    }

    /// Get the feature a `feature:action` permission belongs to
    pub fn get_feature_by_permission(&self, permission: &str) -> Option<&Feature> {
        let feature_id = permission.split(':').next().unwrap_or(permission);
        self.features.get(feature_id)
    }

    /// Check if a feature is registered
    pub fn is_feature_registered(&self, feature_id: &str) -> bool {
        self.features.contains_key(feature_id)
    }

    /// Get the flags of a feature keyed by flag id (empty when unknown)
    pub fn get_feature_flags(&self, feature_id: &str) -> BTreeMap<String, FeatureFlag> {
        self.features
            .get(feature_id)
            .map(|f| f.feature_flags.clone())
            .unwrap_or_default()
    }

    /// Number of registered features
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Wipe every feature and permission. Test isolation only.
    pub fn clear_registry(&mut self) {
        self.features.clear();
        self.permissions.clear();
    }
}
