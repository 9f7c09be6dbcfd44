//! featgate access command

use super::FeatureSource;
use clap::Args;
use console::style;
use rbac::{FeatureAccessOptions, RegistryService};
use serde::Serialize;
use shared::{AccessRequirement, Actor};

#[derive(Debug, Args)]
pub struct AccessCommand {
    #[command(flatten)]
    pub source: FeatureSource,

    /// Feature to check
    pub feature: String,

    /// Sub-flag that must also be enabled
    #[arg(long)]
    pub flag: Option<String>,

    /// Actor role (repeatable)
    #[arg(short, long = "role")]
    pub roles: Vec<String>,

    /// Actor permission (repeatable)
    #[arg(short, long = "permission")]
    pub permissions: Vec<String>,

    /// Required permission, replacing the feature's required roles (repeatable)
    #[arg(long = "require-permission")]
    pub require_permissions: Vec<String>,

    /// Required role, replacing the feature's required roles (repeatable)
    #[arg(long = "require-role")]
    pub require_roles: Vec<String>,

    /// Grant when any one requirement is met
    #[arg(long)]
    pub any: bool,

    /// Also accept roles inheriting one of the feature's required roles
    #[arg(long)]
    pub inherited: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessDecision {
    pub feature: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flag: Option<String>,
    pub feature_enabled: bool,
    pub allowed: bool,
}

impl AccessCommand {
    pub fn run(&self) -> anyhow::Result<()> {
        let service = self.source.load_service()?;
        let decision = self.decide(&service);

        if self.json {
            println!("{}", serde_json::to_string_pretty(&decision)?);
            return Ok(());
        }

        let target = match &decision.flag {
            Some(flag) => format!("{}/{}", decision.feature, flag),
            None => decision.feature.clone(),
        };
        if decision.allowed {
            println!("{} {}", style("ALLOWED").green().bold(), target);
        } else {
            println!("{} {}", style("DENIED").red().bold(), target);
            if !decision.feature_enabled {
                println!("  {}", style("feature is unknown or disabled").dim());
            }
        }
        Ok(())
    }

    fn actor(&self) -> Actor {
        Actor::new(&self.roles, self.permissions.iter().cloned())
    }

    fn requirement(&self) -> Option<AccessRequirement> {
        if self.require_permissions.is_empty() && self.require_roles.is_empty() {
            return None;
        }

        let requirement = AccessRequirement::permissions(self.require_permissions.iter().cloned())
            .with_roles(self.require_roles.iter().cloned());
        Some(if self.any { requirement.any() } else { requirement })
    }

    /// Evaluate the command's actor against the feature
    pub fn decide(&self, service: &RegistryService) -> AccessDecision {
        let options = FeatureAccessOptions {
            flag_id: self.flag.clone(),
            requirement: self.requirement(),
            inherited: self.inherited,
        };

        AccessDecision {
            feature: self.feature.clone(),
            flag: self.flag.clone(),
            feature_enabled: service.is_feature_enabled(&self.feature),
            allowed: service.can_access(&self.feature, &self.actor(), &options),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::sample_source;

    fn command(source: FeatureSource, feature: &str) -> AccessCommand {
        AccessCommand {
            source,
            feature: feature.to_string(),
            flag: None,
            roles: Vec::new(),
            permissions: Vec::new(),
            require_permissions: Vec::new(),
            require_roles: Vec::new(),
            any: false,
            inherited: false,
            json: false,
        }
    }

    #[test]
    fn test_role_based_decision() {
        let (_dir, source) = sample_source();
        let service = source.load_service().unwrap();

        let mut cmd = command(source, "f1");
        cmd.roles = vec!["manager".to_string()];
        assert!(cmd.decide(&service).allowed);

        cmd.roles = vec!["admin".to_string()];
        assert!(!cmd.decide(&service).allowed);

        cmd.inherited = true;
        assert!(cmd.decide(&service).allowed);

        cmd.roles = vec!["pharmacist".to_string()];
        assert!(!cmd.decide(&service).allowed);
    }

    #[test]
    fn test_disabled_flag_denies() {
        let (_dir, source) = sample_source();
        let service = source.load_service().unwrap();

        let mut cmd = command(source, "f1");
        cmd.roles = vec!["MANAGER".to_string()];
        cmd.flag = Some("f1.export".to_string());

        let decision = cmd.decide(&service);
        assert!(!decision.allowed);
        assert!(decision.feature_enabled);
    }

    #[test]
    fn test_explicit_requirement() {
        let (_dir, source) = sample_source();
        let service = source.load_service().unwrap();

        let mut cmd = command(source, "exams");
        cmd.require_permissions = vec!["exams:attempt".to_string()];
        cmd.require_roles = vec!["MANAGER".to_string()];
        cmd.permissions = vec!["exams:attempt".to_string()];
        assert!(!cmd.decide(&service).allowed);

        cmd.any = true;
        assert!(cmd.decide(&service).allowed);
    }

    #[test]
    fn test_unknown_feature_denies() {
        let (_dir, source) = sample_source();
        let service = source.load_service().unwrap();

        let mut cmd = command(source, "ghost");
        cmd.roles = vec!["SUPER_ADMIN".to_string()];

        let decision = cmd.decide(&service);
        assert!(!decision.allowed);
        assert!(!decision.feature_enabled);
    }
}
