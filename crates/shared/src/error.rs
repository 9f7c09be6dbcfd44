//! Error types for featgate

use thiserror::Error;

/// Error thrown when a feature id is used before `define_feature`
#[derive(Debug, Error)]
#[error("Feature '{feature_id}' not registered")]
pub struct FeatureNotRegisteredError {
    pub feature_id: String,
}

/// Error thrown when a role string is outside the closed role set
#[derive(Debug, Error)]
#[error("Role '{role}' is not a known role. Known roles: {}", known_roles.join(", "))]
pub struct UnknownRoleError {
    pub role: String,
    pub known_roles: Vec<String>,
}

/// General featgate error type
#[derive(Debug, Error)]
pub enum RbacError {
    #[error(transparent)]
    FeatureNotRegistered(#[from] FeatureNotRegisteredError),

    #[error(transparent)]
    UnknownRole(#[from] UnknownRoleError),

    #[error("Feature '{feature_id}' is already registered")]
    DuplicateFeature { feature_id: String },

    #[error("Feature '{feature_id}' has no flag '{flag_id}'")]
    UnknownFlag { feature_id: String, flag_id: String },

    #[error("Invalid role hierarchy: {0}")]
    InvalidHierarchy(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl RbacError {
    /// Shorthand for the configuration error raised on unknown feature ids
    pub fn feature_not_registered(feature_id: impl Into<String>) -> Self {
        FeatureNotRegisteredError {
            feature_id: feature_id.into(),
        }
        .into()
    }

    /// True for errors caused by misdeclared features rather than I/O
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            RbacError::FeatureNotRegistered(_)
                | RbacError::UnknownRole(_)
                | RbacError::DuplicateFeature { .. }
                | RbacError::UnknownFlag { .. }
                | RbacError::InvalidHierarchy(_)
                | RbacError::Config(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, RbacError>;
