//! FeatureLoader - Load feature definitions from YAML/JSON files

use crate::registry_service::RegistryService;
use shared::{FeatureDefinition, FeatureManifest, RbacError, Result, Role};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Per-directory definition file names
const FEATURE_FILES: [&str; 3] = ["FEATURE.yaml", "FEATURE.yml", "FEATURE.json"];

/// Feature loader
#[derive(Debug, Default)]
pub struct FeatureLoader {
    definitions: Vec<FeatureDefinition>,
}

impl FeatureLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every definition under a directory.
    ///
    /// Reads `*.yaml`, `*.yml` and `*.json` files directly inside `dir`, and
    /// `FEATURE.{yaml,yml,json}` inside its subdirectories, in path order. A
    /// missing directory loads nothing.
    pub fn load_from_directory(&mut self, dir: &Path) -> Result<usize> {
        if !dir.exists() {
            return Ok(0);
        }

        let mut paths: Vec<PathBuf> = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();

            if path.is_dir() {
                if let Some(file) = FEATURE_FILES.iter().map(|f| path.join(f)).find(|p| p.exists()) {
                    paths.push(file);
                }
            } else if is_definition_file(&path) {
                paths.push(path);
            }
        }
        paths.sort();

        let mut loaded = 0;
        for path in &paths {
            loaded += self.load_file(path)?;
        }

        debug!(dir = %dir.display(), files = paths.len(), loaded, "feature definitions loaded");
        Ok(loaded)
    }

    /// Load one definition file, returning how many features it declared
    pub fn load_file(&mut self, path: &Path) -> Result<usize> {
        let content = std::fs::read_to_string(path)?;

        let defs = match extension(path) {
            Some("json") => parse_json(&content)?,
            Some("yaml") | Some("yml") => parse_yaml(&content)?,
            other => {
                return Err(RbacError::Config(format!(
                    "Unsupported feature file extension {:?} for {}",
                    other,
                    path.display()
                )))
            }
        };

        for def in &defs {
            for role in &def.required_roles {
                role.parse::<Role>()?;
            }
        }

        let count = defs.len();
        self.definitions.extend(defs);
        Ok(count)
    }

    /// Get loaded definitions
    pub fn definitions(&self) -> &[FeatureDefinition] {
        &self.definitions
    }

    /// Generate a feature manifest
    pub fn to_manifest(&self, version: &str) -> FeatureManifest {
        FeatureManifest {
            version: version.to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            features: self.definitions.clone(),
        }
    }

    /// Register every loaded definition with a service
    pub fn register_all(&self, service: &mut RegistryService) -> Result<()> {
        for def in &self.definitions {
            service.register_feature(def.clone())?;
        }
        Ok(())
    }
}

// A definition file holds one feature or a list of them. The shape is
// decided up front so field errors come from the matching type.

fn parse_json(content: &str) -> Result<Vec<FeatureDefinition>> {
    if content.trim_start().starts_with('[') {
        Ok(serde_json::from_str(content)?)
    } else {
        Ok(vec![serde_json::from_str(content)?])
    }
}

fn parse_yaml(content: &str) -> Result<Vec<FeatureDefinition>> {
    let document: serde_yaml::Value = serde_yaml::from_str(content)?;
    if document.is_sequence() {
        Ok(serde_yaml::from_str(content)?)
    } else {
        Ok(vec![serde_yaml::from_str(content)?])
    }
}

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|e| e.to_str())
}

fn is_definition_file(path: &Path) -> bool {
    matches!(extension(path), Some("yaml") | Some("yml") | Some("json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const F1_YAML: &str = r#"
id: f1
name: F1
description: First feature
permissions:
  READ: f1:read
  WRITE: f1:write
requiredRoles:
  - manager
featureFlags:
  EXPORT: f1.export
flagDefaults:
  f1.export:
    name: Export
    defaultEnabled: false
"#;

    const MANY_JSON: &str = r#"[
        { "id": "exams", "name": "Exams", "requiredRoles": ["TECHNICIAN"],
          "permissions": { "ATTEMPT": "exams:attempt" } },
        { "id": "audit", "name": "Audit", "defaultEnabled": false }
    ]"#;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    // ============== File Tests ==============

    #[test]
    fn test_load_single_yaml_file() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "f1.yaml", F1_YAML);

        let mut loader = FeatureLoader::new();
        assert_eq!(loader.load_file(&path).unwrap(), 1);

        let def = &loader.definitions()[0];
        assert_eq!(def.id, "f1");
        assert_eq!(def.permissions.get("WRITE").map(String::as_str), Some("f1:write"));
        assert_eq!(def.required_roles, vec!["manager"]);
        assert!(!def.flag_defaults["f1.export"].default_enabled);
    }

    #[test]
    fn test_load_json_list() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "features.json", MANY_JSON);

        let mut loader = FeatureLoader::new();
        assert_eq!(loader.load_file(&path).unwrap(), 2);
        assert!(!loader.definitions()[1].default_enabled);
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "bad.yaml", "id: bad\nname: Bad\nrequiredRoles: [WIZARD]\n");

        let err = FeatureLoader::new().load_file(&path).unwrap_err();
        assert!(matches!(err, RbacError::UnknownRole(_)));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "broken.json", "{ not json");

        let err = FeatureLoader::new().load_file(&path).unwrap_err();
        assert!(matches!(err, RbacError::Json(_)));
    }

    #[test]
    fn test_yaml_field_error_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "f1.yaml", "id: f1\nname: F1\ndefaultEnabled: maybe\n");

        let err = FeatureLoader::new().load_file(&path).unwrap_err();
        assert!(matches!(err, RbacError::Yaml(_)));
        assert!(err.to_string().contains("boolean"), "{}", err);
    }

    #[test]
    fn test_yaml_list_field_error_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = write(
            dir.path(),
            "many.yaml",
            "- id: f1\n  name: F1\n- id: f2\n  name: F2\n  requiredRoles: MANAGER\n",
        );

        let err = FeatureLoader::new().load_file(&path).unwrap_err();
        assert!(matches!(err, RbacError::Yaml(_)));
        assert!(err.to_string().contains("sequence"), "{}", err);
    }

    #[test]
    fn test_json_field_error_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = write(
            dir.path(),
            "f1.json",
            r#"{ "id": "f1", "name": "F1", "defaultEnabled": "maybe" }"#,
        );

        let err = FeatureLoader::new().load_file(&path).unwrap_err();
        assert!(matches!(err, RbacError::Json(_)));
        assert!(err.to_string().contains("boolean"), "{}", err);
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "f1.toml", "id = 'f1'");

        let err = FeatureLoader::new().load_file(&path).unwrap_err();
        assert!(matches!(err, RbacError::Config(_)));
    }

    // ============== Directory Tests ==============

    #[test]
    fn test_load_from_directory() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "b.json", MANY_JSON);
        write(dir.path(), "a.yaml", F1_YAML);
        write(dir.path(), "README.md", "# ignored");

        let nested = dir.path().join("payments");
        fs::create_dir(&nested).unwrap();
        write(
            &nested,
            "FEATURE.yml",
            "id: payments\nname: Payments\nrequiredRoles: [PROPRIETOR]\n",
        );

        let mut loader = FeatureLoader::new();
        assert_eq!(loader.load_from_directory(dir.path()).unwrap(), 4);

        let ids: Vec<&str> = loader.definitions().iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["f1", "exams", "audit", "payments"]);
    }

    #[test]
    fn test_missing_directory_loads_nothing() {
        let dir = TempDir::new().unwrap();
        let mut loader = FeatureLoader::new();

        assert_eq!(loader.load_from_directory(&dir.path().join("absent")).unwrap(), 0);
        assert!(loader.definitions().is_empty());
    }

    // ============== Manifest / Registration Tests ==============

    #[test]
    fn test_to_manifest() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "f1.yaml", F1_YAML);
        let mut loader = FeatureLoader::new();
        loader.load_from_directory(dir.path()).unwrap();

        let manifest = loader.to_manifest("1.0.0");
        assert_eq!(manifest.version, "1.0.0");
        assert_eq!(manifest.features.len(), 1);
        assert!(chrono::DateTime::parse_from_rfc3339(&manifest.generated_at).is_ok());
    }

    #[test]
    fn test_register_all() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "f1.yaml", F1_YAML);
        write(dir.path(), "more.json", MANY_JSON);
        let mut loader = FeatureLoader::new();
        loader.load_from_directory(dir.path()).unwrap();

        let mut service = RegistryService::default();
        loader.register_all(&mut service).unwrap();
        service.initialize_features().unwrap();

        assert!(service.role_has_permission("ADMIN", "f1:read"));
        assert!(service.role_has_permission("PHARMACIST", "exams:attempt"));
        assert!(!service.is_feature_enabled("audit"));
        assert!(!service.is_feature_flag_enabled("f1", "f1.export"));
    }
}
