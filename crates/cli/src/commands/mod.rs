//! CLI Commands

pub mod access;
pub mod check;
pub mod manifest;
pub mod roles;

pub use access::AccessCommand;
pub use check::CheckCommand;
pub use manifest::ManifestCommand;
pub use roles::RolesCommand;

use anyhow::Context;
use clap::Args;
use rbac::{FeatureLoader, RegistryService};
use shared::RbacConfig;
use std::path::PathBuf;
use tracing::debug;

/// Where feature definitions and configuration come from
#[derive(Debug, Clone, Args)]
pub struct FeatureSource {
    /// Directory of feature definition files
    #[arg(short, long, default_value = "features")]
    pub features: PathBuf,

    /// RBAC configuration file (JSON or YAML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl FeatureSource {
    pub fn load_config(&self) -> anyhow::Result<RbacConfig> {
        match &self.config {
            Some(path) => RbacConfig::from_file(path)
                .with_context(|| format!("failed to load config {}", path.display())),
            None => Ok(RbacConfig::default()),
        }
    }

    pub fn load_definitions(&self) -> anyhow::Result<FeatureLoader> {
        debug!(dir = %self.features.display(), "loading feature definitions");
        let mut loader = FeatureLoader::new();
        loader
            .load_from_directory(&self.features)
            .with_context(|| format!("failed to load features from {}", self.features.display()))?;
        Ok(loader)
    }

    /// Load definitions and configuration into an initialized service
    pub fn load_service(&self) -> anyhow::Result<RegistryService> {
        self.initialize(&self.load_definitions()?)
    }

    /// Register already loaded definitions with a configured service
    pub fn initialize(&self, loader: &FeatureLoader) -> anyhow::Result<RegistryService> {
        let mut service = RegistryService::new(self.load_config()?)?;
        loader.register_all(&mut service)?;
        service.initialize_features()?;
        Ok(service)
    }
}
