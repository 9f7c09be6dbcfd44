//! FeatureFlagStore - Runtime enablement of features and their sub-flags

use shared::{Feature, RbacError, Result};
use std::collections::BTreeMap;

/// On/off state of every known feature and flag.
///
/// Independent of permission resolution: a disabled feature stays disabled
/// for every role.
#[derive(Debug, Clone, Default)]
pub struct FeatureFlagStore {
    /// Feature id -> enabled
    features: BTreeMap<String, bool>,
    /// Feature id -> flag id -> enabled
    flags: BTreeMap<String, BTreeMap<String, bool>>,
}

impl FeatureFlagStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a feature and its flags at their declared defaults.
    ///
    /// Toggles that are already tracked keep their current value.
    pub fn seed(&mut self, feature: &Feature) {
        self.features
            .entry(feature.id.clone())
            .or_insert(feature.default_enabled);

        let flags = self.flags.entry(feature.id.clone()).or_default();
        for (flag_id, flag) in &feature.feature_flags {
            flags.entry(flag_id.clone()).or_insert(flag.default_enabled);
        }
    }

    /// Check if a feature is enabled. Unknown features are disabled.
    pub fn is_feature_enabled(&self, feature_id: &str) -> bool {
        self.features.get(feature_id).copied().unwrap_or(false)
    }

    /// Check if a flag is enabled. Requires the feature itself to be enabled;
    /// unknown flags are disabled.
    pub fn is_feature_flag_enabled(&self, feature_id: &str, flag_id: &str) -> bool {
        self.is_feature_enabled(feature_id)
            && self
                .flags
                .get(feature_id)
                .and_then(|flags| flags.get(flag_id))
                .copied()
                .unwrap_or(false)
    }

    pub fn enable_feature(&mut self, feature_id: &str) -> Result<()> {
        self.set_feature(feature_id, true)
    }

    pub fn disable_feature(&mut self, feature_id: &str) -> Result<()> {
        self.set_feature(feature_id, false)
    }

    pub fn enable_feature_flag(&mut self, feature_id: &str, flag_id: &str) -> Result<()> {
        self.set_flag(feature_id, flag_id, true)
    }

    pub fn disable_feature_flag(&mut self, feature_id: &str, flag_id: &str) -> Result<()> {
        self.set_flag(feature_id, flag_id, false)
    }

    fn set_feature(&mut self, feature_id: &str, enabled: bool) -> Result<()> {
        let state = self
            .features
            .get_mut(feature_id)
            .ok_or_else(|| RbacError::feature_not_registered(feature_id))?;
        *state = enabled;
        Ok(())
    }

    fn set_flag(&mut self, feature_id: &str, flag_id: &str, enabled: bool) -> Result<()> {
        let flags = self
            .flags
            .get_mut(feature_id)
            .ok_or_else(|| RbacError::feature_not_registered(feature_id))?;
        let state = flags.get_mut(flag_id).ok_or_else(|| RbacError::UnknownFlag {
            feature_id: feature_id.to_string(),
            flag_id: flag_id.to_string(),
        })?;
        *state = enabled;
        Ok(())
    }

    /// Snapshot of every toggle, keyed `feature` or `feature/flag`
    pub fn get_all_flags(&self) -> BTreeMap<String, bool> {
        let mut all: BTreeMap<String, bool> = self.features.clone();
        for (feature_id, flags) in &self.flags {
            for (flag_id, enabled) in flags {
                all.insert(format!("{}/{}", feature_id, flag_id), *enabled);
            }
        }
        all
    }

    /// Stop tracking one feature and its flags
    pub fn forget(&mut self, feature_id: &str) {
        self.features.remove(feature_id);
        self.flags.remove(feature_id);
    }

    /// Forget every toggle
    pub fn clear(&mut self) {
        self.features.clear();
        self.flags.clear();
    }
}
