//! # featgate RBAC
//!
//! Feature-scoped role based access control.
//!
//! ## Components
//!
//! - `FeatureRegistry` - Feature metadata and per-feature permissions
//! - `RoleHierarchy` - Direct inheritance edges and their closure
//! - `PermissionResolver` - Role -> permission map
//! - `FeatureFlagStore` - Runtime feature and flag toggles
//! - `AccessEvaluator` - Permission/role checks against an actor
//! - `RegistryService` - Registration pipeline tying the above together
//! - `FeatureLoader` - Feature definitions from YAML/JSON files

pub mod access_evaluator;
pub mod feature_flags;
pub mod feature_loader;
pub mod feature_registry;
pub mod permission_resolver;
pub mod registry_service;
pub mod role_hierarchy;

pub use access_evaluator::{AccessEvaluator, FeatureAccessOptions, FeatureScope};
pub use feature_flags::FeatureFlagStore;
pub use feature_loader::FeatureLoader;
pub use feature_registry::FeatureRegistry;
pub use permission_resolver::{PermissionResolver, RolePermissionMap};
pub use registry_service::{PipelineState, RegistryHandle, RegistryService};
pub use role_hierarchy::RoleHierarchy;
