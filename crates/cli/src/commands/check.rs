//! featgate check command

use super::FeatureSource;
use anyhow::Context;
use clap::Args;
use console::style;
use rbac::{FeatureAccessOptions, RegistryService};
use shared::{Actor, Role};

#[derive(Debug, Args)]
pub struct CheckCommand {
    #[command(flatten)]
    pub source: FeatureSource,

    /// Role to check
    #[arg(short, long)]
    pub role: String,
}

/// What a single role can reach
#[derive(Debug)]
pub struct RoleReport {
    pub role: Role,
    pub inherited: Vec<Role>,
    pub permissions: Vec<String>,
    /// (feature id, accessible through the hierarchy)
    pub features: Vec<(String, bool)>,
}

impl CheckCommand {
    pub fn run(&self) -> anyhow::Result<()> {
        let service = self.source.load_service()?;
        let report = role_report(&service, &self.role)?;

        println!("Checking permissions for role: {}", style(report.role).bold());
        if !report.inherited.is_empty() {
            let inherited: Vec<&str> = report.inherited.iter().map(|r| r.as_str()).collect();
            println!("Inherits from: {}", inherited.join(", "));
        }

        println!();
        println!("Permissions ({}):", report.permissions.len());
        for permission in &report.permissions {
            println!("  - {}", permission);
        }

        println!();
        println!("Features:");
        for (feature_id, allowed) in &report.features {
            let mark = if *allowed {
                style("✓").green()
            } else {
                style("✗").red()
            };
            println!("  {} {}", mark, feature_id);
        }
        Ok(())
    }
}

/// Build the report for a role name (case-insensitive)
pub fn role_report(service: &RegistryService, role: &str) -> anyhow::Result<RoleReport> {
    let role: Role = role.parse().context("invalid --role")?;
    let actor = Actor::anonymous().with_role(role.as_str());
    let options = FeatureAccessOptions::default().with_inherited_roles();

    let features = service
        .registry()
        .get_all_features()
        .keys()
        .map(|id| (id.clone(), service.can_access(id, &actor, &options)))
        .collect();

    Ok(RoleReport {
        role,
        inherited: service.resolver().hierarchy().closure(role).iter().copied().collect(),
        permissions: service.get_permissions_for_role(role.as_str()).into_iter().collect(),
        features,
    })
}
