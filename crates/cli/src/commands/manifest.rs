//! featgate manifest command

use super::FeatureSource;
use anyhow::Context;
use clap::Args;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct ManifestCommand {
    #[command(flatten)]
    pub source: FeatureSource,

    /// Manifest version
    #[arg(long = "manifest-version", default_value = "1.0.0")]
    pub manifest_version: String,

    /// Write to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl ManifestCommand {
    pub fn run(&self) -> anyhow::Result<()> {
        let json = self.render()?;

        match &self.output {
            Some(path) => {
                std::fs::write(path, json)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                println!("✓ Manifest written to {}", path.display());
            }
            None => println!("{}", json),
        }
        Ok(())
    }

    /// Validate the definitions and render them as a JSON manifest
    pub fn render(&self) -> anyhow::Result<String> {
        let loader = self.source.load_definitions()?;

        // Run the definitions through the pipeline so bad ones fail here too
        self.source.initialize(&loader)?;

        Ok(serde_json::to_string_pretty(&loader.to_manifest(&self.manifest_version))?)
    }
}
