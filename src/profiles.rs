//! Where user profiles come from.

use std::collections::HashMap;

use crate::config::{AppConfig, ProfileConfig};
use crate::error::PipelineError;
use crate::model::UserProfile;

/// Read-only lookup of a user's constraints. Storage is up to the implementor.
pub trait ProfileStore: Send + Sync {
    fn profile(&self, user_id: &str) -> Result<UserProfile, PipelineError>;
}

/// Profiles held in memory, usually loaded from the `[profiles.<id>]` tables
/// of the configuration file
#[derive(Debug, Clone, Default)]
pub struct StaticProfileStore {
    profiles: HashMap<String, UserProfile>,
}

impl StaticProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails on the first profile that names an unknown allergy or appliance
    pub fn from_config(config: &AppConfig) -> Result<Self, PipelineError> {
        let mut store = Self::new();
        for (user_id, entry) in &config.profiles {
            let profile = to_profile(entry).map_err(|e| {
                PipelineError::InvalidInput(format!("profile '{}': {}", user_id, e))
            })?;
            store.insert(user_id.clone(), profile);
        }
        Ok(store)
    }

    pub fn insert(&mut self, user_id: impl Into<String>, profile: UserProfile) {
        self.profiles.insert(user_id.into(), profile);
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

fn to_profile(entry: &ProfileConfig) -> Result<UserProfile, String> {
    UserProfile::from_keys(&entry.allergies, &entry.appliances, entry.preferences.clone())
}

impl ProfileStore for StaticProfileStore {
    fn profile(&self, user_id: &str) -> Result<UserProfile, PipelineError> {
        self.profiles
            .get(user_id.trim())
            .cloned()
            .ok_or_else(|| PipelineError::UnknownProfile(user_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AllergyKey, ApplianceKey};
    use config::{Config, File, FileFormat};

    fn config(toml: &str) -> AppConfig {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_profiles_from_config() {
        let store = StaticProfileStore::from_config(&config(
            r#"
            [profiles.sam]
            allergies = ["Tree Nuts", "dairy"]
            appliances = ["oven", "air-fryer"]
            preferences = "vegetarian"
            "#,
        ))
        .unwrap();

        let profile = store.profile("sam").unwrap();
        assert!(profile.allergies.contains(&AllergyKey::TreeNuts));
        assert!(profile.allergies.contains(&AllergyKey::Dairy));
        assert!(profile.appliances.contains(&ApplianceKey::AirFryer));
        assert_eq!(profile.preferences, "vegetarian");
    }

    #[test]
    fn test_unknown_user() {
        let store = StaticProfileStore::new();
        assert!(matches!(
            store.profile("nobody"),
            Err(PipelineError::UnknownProfile(id)) if id == "nobody"
        ));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result = StaticProfileStore::from_config(&config(
            r#"
            [profiles.alex]
            allergies = ["kryptonite"]
            "#,
        ));
        assert!(matches!(result, Err(PipelineError::InvalidInput(_))));
    }
}
