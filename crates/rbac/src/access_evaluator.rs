//! AccessEvaluator - Permission and role checks against an actor

use crate::feature_flags::FeatureFlagStore;
use crate::feature_registry::FeatureRegistry;
use crate::permission_resolver::PermissionResolver;
use shared::{AccessRequirement, Actor, Role};
use std::collections::BTreeSet;
use tracing::debug;

/// Admin role name some sessions still carry
const LEGACY_ADMIN_ROLE: &str = "PER_ADMIN";

/// Options for a feature-scoped check
#[derive(Debug, Clone, Default)]
pub struct FeatureAccessOptions {
    /// Sub-flag that must also be enabled
    pub flag_id: Option<String>,
    /// Requirement used instead of the feature's required roles
    pub requirement: Option<AccessRequirement>,
    /// Also accept roles inheriting a required role, and the super role
    pub inherited: bool,
}

impl FeatureAccessOptions {
    /// Builder: also require a sub-flag
    pub fn with_flag(mut self, flag_id: impl Into<String>) -> Self {
        self.flag_id = Some(flag_id.into());
        self
    }

    /// Builder: override the feature's required roles
    pub fn with_requirement(mut self, requirement: AccessRequirement) -> Self {
        self.requirement = Some(requirement);
        self
    }

    /// Builder: resolve required roles through the hierarchy
    pub fn with_inherited_roles(mut self) -> Self {
        self.inherited = true;
        self
    }
}

/// Read-only view of the state a feature-scoped check needs
#[derive(Debug, Clone, Copy)]
pub struct FeatureScope<'a> {
    pub registry: &'a FeatureRegistry,
    pub flags: &'a FeatureFlagStore,
    pub resolver: &'a PermissionResolver,
}

/// Decides access for an actor. Never errors: anything unknown is denied.
///
/// Holders of the override role pass every *permission* check regardless of
/// the resolved role map. This is an emergency override layered on top of the
/// map, not part of it; construct with `None` to turn it off.
#[derive(Debug, Clone)]
pub struct AccessEvaluator {
    override_role: Option<Role>,
}

impl AccessEvaluator {
    pub fn new(override_role: Option<Role>) -> Self {
        Self { override_role }
    }

    /// Evaluator without the override role
    pub fn strict() -> Self {
        Self::new(None)
    }

    pub fn override_role(&self) -> Option<Role> {
        self.override_role
    }

    /// Check if the actor holds a permission, or holds the override role
    pub fn has_permission(&self, actor: &Actor, permission: &str) -> bool {
        if actor.holds_permission(permission) {
            return true;
        }

        if let Some(role) = self.override_role {
            if actor.holds_role(role.as_str()) {
                debug!(permission, role = %role, "permission granted by override role");
                return true;
            }
        }

        false
    }

    /// Case-insensitive role check
    pub fn has_role(&self, actor: &Actor, role: &str) -> bool {
        actor.holds_role(role)
    }

    pub fn has_all_permissions<S: AsRef<str>>(&self, actor: &Actor, permissions: &[S]) -> bool {
        permissions.iter().all(|p| self.has_permission(actor, p.as_ref()))
    }

    pub fn has_any_permission<S: AsRef<str>>(&self, actor: &Actor, permissions: &[S]) -> bool {
        permissions.iter().any(|p| self.has_permission(actor, p.as_ref()))
    }

    pub fn has_all_roles<S: AsRef<str>>(&self, actor: &Actor, roles: &[S]) -> bool {
        roles.iter().all(|r| self.has_role(actor, r.as_ref()))
    }

    pub fn has_any_role<S: AsRef<str>>(&self, actor: &Actor, roles: &[S]) -> bool {
        roles.iter().any(|r| self.has_role(actor, r.as_ref()))
    }

    /// ADMIN, or the legacy `PER_ADMIN` session role
    pub fn is_admin(&self, actor: &Actor) -> bool {
        self.has_role(actor, Role::Admin.as_str()) || self.has_role(actor, LEGACY_ADMIN_ROLE)
    }

    /// Admins, MANAGER or PHARMACY_MANAGER
    pub fn is_manager(&self, actor: &Actor) -> bool {
        self.is_admin(actor)
            || self.has_role(actor, Role::Manager.as_str())
            || self.has_role(actor, Role::PharmacyManager.as_str())
    }

    /// Evaluate a permission/role requirement.
    ///
    /// Each list is checked on its own and an empty list is satisfied. With
    /// `require_all` every listed item must be held and both sides must pass;
    /// otherwise one held item per side is enough and either side passing
    /// grants. An empty requirement therefore grants in both modes.
    pub fn has_access(&self, actor: &Actor, requirement: &AccessRequirement) -> bool {
        if requirement.is_empty() {
            return true;
        }

        let perms = &requirement.permissions;
        let roles = &requirement.roles;

        let granted = if requirement.require_all {
            let perms_ok = perms.is_empty() || self.has_all_permissions(actor, perms);
            let roles_ok = roles.is_empty() || self.has_all_roles(actor, roles);
            perms_ok && roles_ok
        } else {
            let perms_ok = perms.is_empty() || self.has_any_permission(actor, perms);
            let roles_ok = roles.is_empty() || self.has_any_role(actor, roles);
            perms_ok || roles_ok
        };

        debug!(
            permissions = ?perms,
            roles = ?roles,
            require_all = requirement.require_all,
            granted,
            "access check"
        );
        granted
    }

    /// Feature-scoped check.
    ///
    /// Denies when the feature is unknown or disabled, or when the requested
    /// sub-flag is disabled. Otherwise evaluates the explicit requirement, or
    /// the feature's required roles under `has_access` (every role held). With
    /// `inherited`, holding one required role, a role inheriting from one of
    /// them, or the super role is enough instead. A feature with no required
    /// roles is open once enabled.
    pub fn can_access(
        &self,
        scope: FeatureScope<'_>,
        feature_id: &str,
        actor: &Actor,
        options: &FeatureAccessOptions,
    ) -> bool {
        let Some(feature) = scope.registry.get_feature(feature_id) else {
            debug!(feature_id, "access denied: feature not registered");
            return false;
        };

        if !scope.flags.is_feature_enabled(feature_id) {
            debug!(feature_id, "access denied: feature disabled");
            return false;
        }

        if let Some(flag_id) = &options.flag_id {
            if !scope.flags.is_feature_flag_enabled(feature_id, flag_id) {
                debug!(feature_id, flag_id = %flag_id, "access denied: flag disabled");
                return false;
            }
        }

        if let Some(requirement) = &options.requirement {
            return self.has_access(actor, requirement);
        }

        if !options.inherited {
            let requirement = AccessRequirement::roles(feature.required_roles.iter().map(Role::as_str));
            return self.has_access(actor, &requirement);
        }

        if feature.required_roles.is_empty() {
            return true;
        }

        let hierarchy = scope.resolver.hierarchy();
        let mut accepted: BTreeSet<Role> = BTreeSet::new();
        for role in &feature.required_roles {
            accepted.insert(*role);
            accepted.extend(hierarchy.roles_inheriting(*role));
        }
        accepted.insert(scope.resolver.super_role());

        let granted = accepted.iter().any(|r| self.has_role(actor, r.as_str()));
        debug!(feature_id, granted, "inherited role check");
        granted
    }
}

impl Default for AccessEvaluator {
    fn default() -> Self {
        Self::new(Some(Role::Admin))
    }
}
