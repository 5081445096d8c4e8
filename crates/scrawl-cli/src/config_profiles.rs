//! Persistent CLI profile configuration.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use scrawl_core::config::{normalize_text_option, ClientConfig};
use serde::{Deserialize, Serialize};

const CONFIG_FILE_NAME: &str = "cli-config.json";
const PROFILE_ENV: &str = "SCRAWL_PROFILE";
const DEFAULT_PROFILE: &str = "default";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CliProfilesConfig {
    #[serde(default = "default_config_version")]
    pub version: u32,
    #[serde(default)]
    pub active_profile: Option<String>,
    #[serde(default)]
    pub profiles: BTreeMap<String, CliProfile>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CliProfile {
    #[serde(default)]
    pub supabase_url: Option<String>,
    #[serde(default)]
    pub supabase_anon_key: Option<String>,
    #[serde(default)]
    pub notes_table: Option<String>,
}

const fn default_config_version() -> u32 {
    1
}

pub fn app_dir(base: Option<PathBuf>) -> Result<PathBuf, String> {
    base.map(|dir| dir.join("scrawl"))
        .ok_or_else(|| "Failed to resolve a per-user directory for scrawl".to_string())
}

pub fn default_config_path() -> Result<PathBuf, String> {
    Ok(app_dir(dirs::config_dir())?.join(CONFIG_FILE_NAME))
}

pub fn normalize_profile_name(value: Option<&str>) -> Option<String> {
    normalize_text_option(value.map(str::to_string))
}

impl CliProfilesConfig {
    pub fn load() -> Result<Self, String> {
        Self::load_from_path(&default_config_path()?)
    }

    pub fn load_from_path(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|error| format!("Failed to read config at {}: {}", path.display(), error))?;
        let mut config = serde_json::from_str::<Self>(&raw)
            .map_err(|error| format!("Failed to parse config at {}: {}", path.display(), error))?;
        config.normalize();
        Ok(config)
    }

    pub fn save(&self) -> Result<PathBuf, String> {
        let path = default_config_path()?;
        self.save_to_path(&path)?;
        Ok(path)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|error| {
                format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    error
                )
            })?;
        }

        let mut normalized = self.clone();
        normalized.normalize();
        let serialized = serde_json::to_string_pretty(&normalized)
            .map_err(|error| format!("Failed to serialize config: {error}"))?;
        std::fs::write(path, serialized)
            .map_err(|error| format!("Failed to write config at {}: {}", path.display(), error))
    }

    /// Explicit flag, then `SCRAWL_PROFILE`, then the active profile, then
    /// `default`.
    pub fn resolve_profile_name(&self, explicit: Option<&str>) -> String {
        normalize_profile_name(explicit)
            .or_else(|| normalize_profile_name(std::env::var(PROFILE_ENV).ok().as_deref()))
            .or_else(|| normalize_profile_name(self.active_profile.as_deref()))
            .unwrap_or_else(|| DEFAULT_PROFILE.to_string())
    }

    pub fn profile(&self, name: &str) -> Option<&CliProfile> {
        self.profiles.get(name)
    }

    pub fn profile_mut_or_default(&mut self, name: &str) -> &mut CliProfile {
        self.profiles.entry(name.to_string()).or_default()
    }

    fn normalize(&mut self) {
        self.active_profile = normalize_profile_name(self.active_profile.as_deref());
        for profile in self.profiles.values_mut() {
            profile.normalize();
        }
    }
}

impl CliProfile {
    /// Backend config for this profile, with environment variables taking
    /// precedence over stored values.
    pub fn client_config(&self) -> scrawl_core::Result<Option<ClientConfig>> {
        self.client_config_with(|key| std::env::var(key).ok())
    }

    pub fn client_config_with(
        &self,
        env: impl Fn(&str) -> Option<String>,
    ) -> scrawl_core::Result<Option<ClientConfig>> {
        ClientConfig::resolve(
            normalize_text_option(env("SUPABASE_URL")).or_else(|| self.supabase_url.clone()),
            normalize_text_option(env("SUPABASE_ANON_KEY"))
                .or_else(|| self.supabase_anon_key.clone()),
            normalize_text_option(env("SCRAWL_NOTES_TABLE")).or_else(|| self.notes_table.clone()),
        )
    }

    fn normalize(&mut self) {
        self.supabase_url = normalize_text_option(self.supabase_url.take());
        self.supabase_anon_key = normalize_text_option(self.supabase_anon_key.take());
        self.notes_table = normalize_text_option(self.notes_table.take());
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn normalize_profile_name_rejects_empty() {
        assert_eq!(normalize_profile_name(None), None);
        assert_eq!(normalize_profile_name(Some(" ")), None);
        assert_eq!(normalize_profile_name(Some(" work ")), Some("work".into()));
    }

    #[test]
    fn config_roundtrip_normalizes_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);

        let mut config = CliProfilesConfig {
            version: 1,
            active_profile: Some(" default ".to_string()),
            profiles: BTreeMap::new(),
        };
        config.profiles.insert(
            "default".to_string(),
            CliProfile {
                supabase_url: Some(" https://project.supabase.co ".to_string()),
                supabase_anon_key: Some(" anon-key ".to_string()),
                notes_table: Some("  ".to_string()),
            },
        );

        config.save_to_path(&path).unwrap();
        let loaded = CliProfilesConfig::load_from_path(&path).unwrap();
        assert_eq!(loaded.active_profile.as_deref(), Some("default"));
        assert_eq!(
            loaded.profile("default"),
            Some(&CliProfile {
                supabase_url: Some("https://project.supabase.co".to_string()),
                supabase_anon_key: Some("anon-key".to_string()),
                notes_table: None,
            })
        );
    }

    #[test]
    fn missing_file_loads_default_config() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = CliProfilesConfig::load_from_path(&dir.path().join("absent.json")).unwrap();
        assert_eq!(loaded, CliProfilesConfig::default());
    }

    #[test]
    fn resolve_profile_name_prefers_explicit_then_active() {
        let config = CliProfilesConfig {
            version: 1,
            active_profile: Some("work".to_string()),
            profiles: BTreeMap::new(),
        };
        assert_eq!(config.resolve_profile_name(Some("mobile")), "mobile");
        if std::env::var(PROFILE_ENV).is_err() {
            assert_eq!(config.resolve_profile_name(None), "work");
        }
    }

    #[test]
    fn environment_overrides_profile_values() {
        let profile = CliProfile {
            supabase_url: Some("https://stored.supabase.co".to_string()),
            supabase_anon_key: Some("stored-key".to_string()),
            notes_table: None,
        };
        let config = profile
            .client_config_with(|key| {
                (key == "SUPABASE_URL").then(|| "https://env.supabase.co".to_string())
            })
            .unwrap()
            .unwrap();
        assert_eq!(config.supabase_url, "https://env.supabase.co");
        assert_eq!(config.supabase_anon_key, "stored-key");
        assert_eq!(config.notes_table, "notes");
    }

    #[test]
    fn empty_profile_has_no_client_config() {
        let config = CliProfile::default().client_config_with(|_| None).unwrap();
        assert!(config.is_none());
    }
}
