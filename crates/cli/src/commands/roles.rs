//! featgate roles command

use super::FeatureSource;
use clap::Args;
use console::style;
use rbac::RegistryService;
use serde::Serialize;
use shared::Role;
use std::collections::BTreeSet;

#[derive(Debug, Args)]
pub struct RolesCommand {
    #[command(flatten)]
    pub source: FeatureSource,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleSummary {
    pub role: Role,
    pub inherits: Vec<Role>,
    pub permissions: BTreeSet<String>,
}

impl RolesCommand {
    pub fn run(&self) -> anyhow::Result<()> {
        let service = self.source.load_service()?;
        let summaries = summarize(&service);

        if self.json {
            println!("{}", serde_json::to_string_pretty(&summaries)?);
            return Ok(());
        }

        for summary in &summaries {
            let inherits: Vec<&str> = summary.inherits.iter().map(|r| r.as_str()).collect();
            if inherits.is_empty() {
                println!("{}", style(summary.role).bold());
            } else {
                println!(
                    "{} {}",
                    style(summary.role).bold(),
                    style(format!("(inherits {})", inherits.join(", "))).dim()
                );
            }

            if summary.permissions.is_empty() {
                println!("  {}", style("no permissions").dim());
            }
            for permission in &summary.permissions {
                println!("  - {}", permission);
            }
        }
        Ok(())
    }
}

/// Every role with its direct parents and resolved permissions
pub fn summarize(service: &RegistryService) -> Vec<RoleSummary> {
    let hierarchy = service.resolver().hierarchy();
    Role::ALL
        .iter()
        .map(|role| RoleSummary {
            role: *role,
            inherits: hierarchy.direct(*role).iter().copied().collect(),
            permissions: service
                .role_permissions()
                .get_permissions_for_role(*role)
                .clone(),
        })
        .collect()
}
