//! RegistryService - Registration pipeline owning every registry
//!
//! Feature modules call `register_feature` in any order. Nothing is applied
//! until `initialize_features`; after that, registrations apply immediately
//! and the role permission map is recomputed before the call returns.

use crate::access_evaluator::{AccessEvaluator, FeatureAccessOptions, FeatureScope};
use crate::feature_flags::FeatureFlagStore;
use crate::feature_registry::FeatureRegistry;
use crate::permission_resolver::{PermissionResolver, RolePermissionMap};
use crate::role_hierarchy::RoleHierarchy;
use shared::{AccessRequirement, Actor, FeatureDefinition, RbacConfig, Result, Role};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Pipeline lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Registrations are buffered
    Uninitialized,
    /// Registrations apply immediately
    Initialized,
}

/// Owns the feature registry, flag store and resolved permission map
#[derive(Debug)]
pub struct RegistryService {
    config: RbacConfig,
    registry: FeatureRegistry,
    resolver: PermissionResolver,
    evaluator: AccessEvaluator,
    flags: FeatureFlagStore,
    role_permissions: RolePermissionMap,
    /// Registered but not applied yet
    pending: Vec<FeatureDefinition>,
    /// Every applied definition, in application order
    applied: Vec<FeatureDefinition>,
    state: PipelineState,
}

impl RegistryService {
    /// Create a service from configuration.
    ///
    /// Fails when the configured hierarchy is invalid.
    pub fn new(config: RbacConfig) -> Result<Self> {
        let hierarchy = match &config.hierarchy {
            Some(edges) => RoleHierarchy::new(edges.clone())?,
            None => RoleHierarchy::default(),
        };
        Ok(Self::with_hierarchy(config, hierarchy))
    }

    fn with_hierarchy(config: RbacConfig, hierarchy: RoleHierarchy) -> Self {
        Self {
            registry: FeatureRegistry::with_duplicate_policy(config.duplicate_features),
            resolver: PermissionResolver::new(hierarchy, config.super_role),
            evaluator: AccessEvaluator::new(config.override_role),
            flags: FeatureFlagStore::new(),
            role_permissions: RolePermissionMap::empty(),
            pending: Vec::new(),
            applied: Vec::new(),
            state: PipelineState::Uninitialized,
            config,
        }
    }

    // ==================== Pipeline ====================

    /// Register a feature definition.
    ///
    /// Roles are validated up front. Before initialization the definition is
    /// only buffered; afterwards it is applied, its flags are seeded and the
    /// permission map is recomputed.
    pub fn register_feature(&mut self, def: FeatureDefinition) -> Result<()> {
        for role in &def.required_roles {
            role.parse::<Role>()?;
        }

        match self.state {
            PipelineState::Uninitialized => {
                debug!(feature_id = %def.id, "feature registration buffered");
                self.pending.push(def);
            }
            PipelineState::Initialized => {
                self.apply(&def)?;
                info!(feature_id = %def.id, "feature registered after initialization");
                self.applied.push(def);
                self.update_rbac_registry();
            }
        }
        Ok(())
    }

    /// Apply buffered registrations and resolve the permission map.
    ///
    /// Calling this again once initialized recomputes the map and logs a
    /// warning. A failing definition aborts the call; definitions applied
    /// before it stay applied and the ones after it stay buffered.
    pub fn initialize_features(&mut self) -> Result<()> {
        match self.state {
            PipelineState::Initialized => {
                warn!("features already initialized, recomputing role permissions");
            }
            PipelineState::Uninitialized => {
                self.flush()?;
                self.state = PipelineState::Initialized;
                info!(features = self.registry.len(), "features initialized");
            }
        }

        self.initialize_rbac_registry();
        Ok(())
    }

    /// Rebuild everything from the definitions registered so far
    pub fn reinitialize_features(&mut self) -> Result<()> {
        let mut replay = std::mem::take(&mut self.applied);
        replay.append(&mut self.pending);

        self.registry.clear_registry();
        self.flags.clear();
        self.role_permissions = RolePermissionMap::empty();
        self.pending = replay;
        self.state = PipelineState::Uninitialized;

        info!(definitions = self.pending.len(), "reinitializing features");
        self.initialize_features()
    }

    /// Resolve the role permission map from the current registry
    pub fn initialize_rbac_registry(&mut self) {
        self.role_permissions = self.resolver.resolve(&self.registry);
    }

    /// Recompute the role permission map. Idempotent.
    pub fn update_rbac_registry(&mut self) {
        debug!("updating role permissions");
        self.initialize_rbac_registry();
    }

    /// Wipe features, flags, permissions and buffered registrations
    pub fn clear_registry(&mut self) {
        self.registry.clear_registry();
        self.flags.clear();
        self.role_permissions = RolePermissionMap::empty();
        self.pending.clear();
        self.applied.clear();
        self.state = PipelineState::Uninitialized;
        info!("registry cleared");
    }

    fn flush(&mut self) -> Result<()> {
        let mut pending = std::mem::take(&mut self.pending).into_iter();

        while let Some(def) = pending.next() {
            if let Err(e) = self.apply(&def) {
                self.pending.extend(pending);
                return Err(e);
            }
            self.applied.push(def);
        }
        Ok(())
    }

    fn apply(&mut self, def: &FeatureDefinition) -> Result<()> {
        self.registry.apply_definition(def)?;

        // A redefinition starts again from its declared defaults
        self.flags.forget(&def.id);
        if let Some(feature) = self.registry.get_feature(&def.id) {
            self.flags.seed(feature);
        }
        Ok(())
    }

    // ==================== Role Queries ====================

    /// Resolved permissions of a role. Unknown roles have none.
    pub fn get_permissions_for_role(&self, role: &str) -> BTreeSet<String> {
        Role::parse(role)
            .map(|r| self.role_permissions.get_permissions_for_role(r).clone())
            .unwrap_or_default()
    }

    pub fn role_has_permission(&self, role: &str, permission: &str) -> bool {
        Role::parse(role)
            .map(|r| self.role_permissions.role_has_permission(r, permission))
            .unwrap_or(false)
    }

    pub fn get_roles_with_permission(&self, permission: &str) -> Vec<Role> {
        self.role_permissions.get_roles_with_permission(permission)
    }

    // ==================== Access Queries ====================

    pub fn has_permission(&self, actor: &Actor, permission: &str) -> bool {
        self.evaluator.has_permission(actor, permission)
    }

    pub fn has_role(&self, actor: &Actor, role: &str) -> bool {
        self.evaluator.has_role(actor, role)
    }

    pub fn has_access(&self, actor: &Actor, requirement: &AccessRequirement) -> bool {
        self.evaluator.has_access(actor, requirement)
    }

    pub fn is_admin(&self, actor: &Actor) -> bool {
        self.evaluator.is_admin(actor)
    }

    pub fn is_manager(&self, actor: &Actor) -> bool {
        self.evaluator.is_manager(actor)
    }

    /// Feature-scoped access check
    pub fn can_access(&self, feature_id: &str, actor: &Actor, options: &FeatureAccessOptions) -> bool {
        self.evaluator.can_access(self.scope(), feature_id, actor, options)
    }

    fn scope(&self) -> FeatureScope<'_> {
        FeatureScope {
            registry: &self.registry,
            flags: &self.flags,
            resolver: &self.resolver,
        }
    }

    // ==================== Flags ====================

    pub fn is_feature_enabled(&self, feature_id: &str) -> bool {
        self.flags.is_feature_enabled(feature_id)
    }

    pub fn is_feature_flag_enabled(&self, feature_id: &str, flag_id: &str) -> bool {
        self.flags.is_feature_flag_enabled(feature_id, flag_id)
    }

    pub fn enable_feature(&mut self, feature_id: &str) -> Result<()> {
        self.flags.enable_feature(feature_id)?;
        info!(feature_id, "feature enabled");
        Ok(())
    }

    pub fn disable_feature(&mut self, feature_id: &str) -> Result<()> {
        self.flags.disable_feature(feature_id)?;
        info!(feature_id, "feature disabled");
        Ok(())
    }

    pub fn enable_feature_flag(&mut self, feature_id: &str, flag_id: &str) -> Result<()> {
        self.flags.enable_feature_flag(feature_id, flag_id)?;
        info!(feature_id, flag_id, "feature flag enabled");
        Ok(())
    }

    pub fn disable_feature_flag(&mut self, feature_id: &str, flag_id: &str) -> Result<()> {
        self.flags.disable_feature_flag(feature_id, flag_id)?;
        info!(feature_id, flag_id, "feature flag disabled");
        Ok(())
    }

    // ==================== Accessors ====================

    pub fn config(&self) -> &RbacConfig {
        &self.config
    }

    pub fn registry(&self) -> &FeatureRegistry {
        &self.registry
    }

    pub fn flags(&self) -> &FeatureFlagStore {
        &self.flags
    }

    pub fn resolver(&self) -> &PermissionResolver {
        &self.resolver
    }

    pub fn role_permissions(&self) -> &RolePermissionMap {
        &self.role_permissions
    }

    /// Every definition registered so far, applied ones first
    pub fn definitions(&self) -> impl Iterator<Item = &FeatureDefinition> {
        self.applied.iter().chain(self.pending.iter())
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn is_initialized(&self) -> bool {
        self.state == PipelineState::Initialized
    }
}

impl Default for RegistryService {
    fn default() -> Self {
        Self::with_hierarchy(RbacConfig::default(), RoleHierarchy::default())
    }
}

/// Shared handle serializing access to one `RegistryService`
#[derive(Debug, Clone, Default)]
pub struct RegistryHandle {
    inner: Arc<Mutex<RegistryService>>,
}

impl RegistryHandle {
    pub fn new(service: RegistryService) -> Self {
        Self {
            inner: Arc::new(Mutex::new(service)),
        }
    }

    /// Lock the service. A panic in another holder does not poison the handle.
    pub fn lock(&self) -> MutexGuard<'_, RegistryService> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run a closure with exclusive access to the service
    pub fn with<T>(&self, f: impl FnOnce(&mut RegistryService) -> T) -> T {
        f(&mut self.lock())
    }
}
