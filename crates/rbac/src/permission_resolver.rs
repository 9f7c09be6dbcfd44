//! PermissionResolver - Builds the role -> permission map

use crate::feature_registry::FeatureRegistry;
use crate::role_hierarchy::RoleHierarchy;
use shared::Role;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

static NO_PERMISSIONS: BTreeSet<String> = BTreeSet::new();

/// Resolved permissions of every role. Every role always has an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolePermissionMap {
    permissions: BTreeMap<Role, BTreeSet<String>>,
}

impl RolePermissionMap {
    /// Map where every role has no permissions
    pub fn empty() -> Self {
        Self {
            permissions: Role::ALL.iter().map(|r| (*r, BTreeSet::new())).collect(),
        }
    }

    /// Permissions of a role
    pub fn get_permissions_for_role(&self, role: Role) -> &BTreeSet<String> {
        self.permissions.get(&role).unwrap_or(&NO_PERMISSIONS)
    }

    /// Check if a role holds a permission
    pub fn role_has_permission(&self, role: Role, permission: &str) -> bool {
        self.get_permissions_for_role(role).contains(permission)
    }

    /// Roles holding a permission
    pub fn get_roles_with_permission(&self, permission: &str) -> Vec<Role> {
        self.permissions
            .iter()
            .filter(|(_, perms)| perms.contains(permission))
            .map(|(role, _)| *role)
            .collect()
    }

    /// Iterate over (role, permissions)
    pub fn iter(&self) -> impl Iterator<Item = (&Role, &BTreeSet<String>)> {
        self.permissions.iter()
    }
}

impl Default for RolePermissionMap {
    fn default() -> Self {
        Self::empty()
    }
}

/// Aggregates feature permissions into a `RolePermissionMap`
#[derive(Debug, Clone)]
pub struct PermissionResolver {
    hierarchy: RoleHierarchy,
    super_role: Role,
}

impl PermissionResolver {
    pub fn new(hierarchy: RoleHierarchy, super_role: Role) -> Self {
        Self {
            hierarchy,
            super_role,
        }
    }

    pub fn hierarchy(&self) -> &RoleHierarchy {
        &self.hierarchy
    }

    pub fn super_role(&self) -> Role {
        self.super_role
    }

    /// Resolve the permission map from the current registry.
    ///
    /// 1. start every role empty
    /// 2. seed the super role with the whole catalog
    /// 3. grant each feature's permissions to its required roles
    /// 4. union in the grants of every role in each role's closure
    ///
    /// Pure: the same registry always yields the same map.
    pub fn resolve(&self, registry: &FeatureRegistry) -> RolePermissionMap {
        let mut direct = RolePermissionMap::empty().permissions;

        if let Some(perms) = direct.get_mut(&self.super_role) {
            perms.extend(registry.get_all_permission_values());
        }

        for feature in registry.get_all_features().values() {
            for role in &feature.required_roles {
                direct
                    .entry(*role)
                    .or_default()
                    .extend(feature.permission_values().map(str::to_string));
            }
        }

        // Closure is transitive, so inheriting from the direct grants is enough
        let mut resolved = direct.clone();
        for (role, perms) in resolved.iter_mut() {
            for inherited in self.hierarchy.closure(*role) {
                perms.extend(direct[inherited].iter().cloned());
            }
        }

        debug!(
            features = registry.len(),
            catalog = resolved[&self.super_role].len(),
            "role permission map resolved"
        );

        RolePermissionMap {
            permissions: resolved,
        }
    }
}

impl Default for PermissionResolver {
    fn default() -> Self {
        Self::new(RoleHierarchy::default(), Role::SuperAdmin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::FeatureDefinition;

    fn registry_with(defs: &[FeatureDefinition]) -> FeatureRegistry {
        let mut registry = FeatureRegistry::new();
        for def in defs {
            registry.apply_definition(def).unwrap();
        }
        registry
    }

    fn f1() -> FeatureDefinition {
        FeatureDefinition::new("f1", "F1")
            .with_permission("READ", "f1:read")
            .with_permission("WRITE", "f1:write")
            .with_required_roles(["MANAGER"])
    }

    fn exams() -> FeatureDefinition {
        FeatureDefinition::new("exams", "Exams")
            .with_permission("ATTEMPT", "exams:attempt")
            .with_required_roles(["TECHNICIAN"])
    }

    fn payments() -> FeatureDefinition {
        FeatureDefinition::new("payments", "Payments")
            .with_permission("APPROVE", "payments:approve")
            .with_required_roles(["PROPRIETOR"])
    }

    // ============== Scenario Tests ==============

    #[test]
    fn test_manager_feature_inherited_by_admin() {
        let registry = registry_with(&[f1()]);
        let map = PermissionResolver::default().resolve(&registry);

        let manager = map.get_permissions_for_role(Role::Manager);
        assert!(manager.contains("f1:read"));
        assert!(manager.contains("f1:write"));

        let admin = map.get_permissions_for_role(Role::Admin);
        assert!(admin.contains("f1:read"));
        assert!(admin.contains("f1:write"));

        assert!(!map.role_has_permission(Role::Pharmacist, "f1:read"));
        assert!(!map.role_has_permission(Role::User, "f1:read"));
    }

    #[test]
    fn test_indirect_inheritance() {
        // TECHNICIAN's grant must reach ADMIN through MANAGER -> PHARMACIST -> TECHNICIAN
        let registry = registry_with(&[exams()]);
        let map = PermissionResolver::default().resolve(&registry);

        for role in [Role::Technician, Role::Pharmacist, Role::Manager, Role::PharmacyManager, Role::Admin] {
            assert!(map.role_has_permission(role, "exams:attempt"), "{} lacks exams:attempt", role);
        }
        assert!(!map.role_has_permission(Role::User, "exams:attempt"));
    }

    #[test]
    fn test_super_role_gets_whole_catalog_without_being_listed() {
        let registry = registry_with(&[f1(), exams(), payments()]);
        let map = PermissionResolver::new(RoleHierarchy::flat(), Role::SuperAdmin).resolve(&registry);

        assert_eq!(
            map.get_permissions_for_role(Role::SuperAdmin),
            &registry.get_all_permission_values()
        );
    }

    #[test]
    fn test_feature_without_roles_only_reaches_super_role() {
        let def = FeatureDefinition::new("audit", "Audit").with_permission("VIEW", "audit:view");
        let registry = registry_with(&[def]);
        let map = PermissionResolver::default().resolve(&registry);

        assert_eq!(map.get_roles_with_permission("audit:view"), vec![Role::SuperAdmin]);
    }

    // ============== Invariant Tests ==============

    #[test]
    fn test_closure_subset_invariant() {
        let registry = registry_with(&[f1(), exams(), payments()]);
        let resolver = PermissionResolver::default();
        let map = resolver.resolve(&registry);

        for r1 in Role::ALL {
            for r2 in resolver.hierarchy().closure(r1) {
                assert!(
                    map.get_permissions_for_role(*r2).is_subset(map.get_permissions_for_role(r1)),
                    "permissions({}) not a subset of permissions({})",
                    r2,
                    r1
                );
            }
        }
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let registry = registry_with(&[f1(), exams()]);
        let resolver = PermissionResolver::default();

        assert_eq!(resolver.resolve(&registry), resolver.resolve(&registry));
    }

    #[test]
    fn test_empty_registry_yields_empty_sets() {
        let registry = FeatureRegistry::new();
        let map = PermissionResolver::default().resolve(&registry);

        for role in Role::ALL {
            assert!(map.get_permissions_for_role(role).is_empty());
        }
        assert_eq!(map, RolePermissionMap::empty());
    }

    #[test]
    fn test_shared_permission_is_deduplicated() {
        let a = FeatureDefinition::new("a", "A")
            .with_permission("READ", "shared:read")
            .with_required_roles(["MANAGER", "PHARMACIST"]);
        let registry = registry_with(&[a]);
        let map = PermissionResolver::default().resolve(&registry);

        assert_eq!(map.get_permissions_for_role(Role::Manager).len(), 1);
    }

    #[test]
    fn test_super_role_grows_monotonically() {
        let resolver = PermissionResolver::default();
        let mut registry = registry_with(&[f1()]);
        let before = resolver.resolve(&registry).get_permissions_for_role(Role::SuperAdmin).clone();

        registry.apply_definition(&payments()).unwrap();
        let after = resolver.resolve(&registry).get_permissions_for_role(Role::SuperAdmin).clone();

        assert!(before.is_subset(&after));
        assert!(after.contains("payments:approve"));
    }

    #[test]
    fn test_get_roles_with_permission() {
        let registry = registry_with(&[payments()]);
        let map = PermissionResolver::default().resolve(&registry);

        let roles = map.get_roles_with_permission("payments:approve");
        assert_eq!(roles, vec![Role::SuperAdmin, Role::Admin, Role::Proprietor]);
        assert!(map.get_roles_with_permission("unknown:perm").is_empty());
    }
}
