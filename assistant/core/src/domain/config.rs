// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Assistant Configuration
//!
//! YAML configuration for the isolation core: managed child profiles, the
//! permission catalog grants, rate-limit ceilings and the AI-surface
//! settings. Everything is validated at startup; a configuration that fails
//! validation never reaches the scope factory.
//!
//! Durations use the humantime notation (`"60s"`, `"5m"`, `"1h"`).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::domain::permissions::{CatalogError, Operation, PermissionCatalog};
use crate::domain::profile::ChildProfile;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("no child profiles configured")]
    NoProfiles,

    #[error("child profile #{index} has an empty name part")]
    EmptyProfileName { index: usize },

    #[error("duplicate child profile '{key}'")]
    DuplicateProfile { key: String },

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("rate limit ceiling for '{operation}' must be positive")]
    ZeroCeiling { operation: String },

    #[error("rate limit window must be positive")]
    ZeroWindow,
}

/// Root configuration document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssistantConfig {
    #[serde(default)]
    pub profiles: Vec<ChildProfile>,

    #[serde(default)]
    pub permissions: PermissionsSettings,

    #[serde(default)]
    pub rate_limit: RateLimitSettings,

    #[serde(default)]
    pub assistant: AssistantSettings,
}

/// Grants for the fail-closed permission catalog, in boundary string form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PermissionsSettings {
    #[serde(default = "default_grants")]
    pub grants: Vec<String>,
}

/// Per-(profile, operation) throttle ceilings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitSettings {
    /// Length of the counting window.
    #[serde(with = "humantime_serde", default = "default_window")]
    pub window: Duration,

    /// Ceiling applied to operations without an explicit override.
    #[serde(default = "default_ceiling")]
    pub default_ceiling: u32,

    /// Per-operation ceiling overrides, keyed by the operation string form.
    #[serde(default)]
    pub per_operation: HashMap<String, u32>,
}

/// AI-surface behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssistantSettings {
    /// Reply returned when an AI operation is refused (permission or unsafe
    /// input). Safe to show to an end user.
    #[serde(default = "default_refusal_reply")]
    pub refusal_reply: String,

    /// Reply returned when the inner model fails. Safe to show to an end
    /// user; raw errors stay in the audit trail.
    #[serde(default = "default_fallback_reply")]
    pub fallback_reply: String,

    /// Maximum prompt/reply length in characters.
    #[serde(default = "default_max_prompt_chars")]
    pub max_prompt_chars: usize,

    /// Maximum age of a context binding accepted by the lifetime validator.
    #[serde(with = "humantime_serde", default = "default_max_context_lifetime")]
    pub max_context_lifetime: Duration,
}

fn default_grants() -> Vec<String> {
    Operation::ALL.iter().map(|op| op.as_str().to_string()).collect()
}

fn default_window() -> Duration {
    Duration::from_secs(60)
}

fn default_ceiling() -> u32 {
    30
}

fn default_refusal_reply() -> String {
    "I can't help with that request.".to_string()
}

fn default_fallback_reply() -> String {
    "Something went wrong while preparing the answer. Please try again later.".to_string()
}

fn default_max_prompt_chars() -> usize {
    8192
}

fn default_max_context_lifetime() -> Duration {
    Duration::from_secs(3600)
}

impl Default for PermissionsSettings {
    fn default() -> Self {
        Self {
            grants: default_grants(),
        }
    }
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            window: default_window(),
            default_ceiling: default_ceiling(),
            per_operation: HashMap::new(),
        }
    }
}

impl Default for AssistantSettings {
    fn default() -> Self {
        Self {
            refusal_reply: default_refusal_reply(),
            fallback_reply: default_fallback_reply(),
            max_prompt_chars: default_max_prompt_chars(),
            max_context_lifetime: default_max_context_lifetime(),
        }
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            profiles: Vec::new(),
            permissions: PermissionsSettings::default(),
            rate_limit: RateLimitSettings::default(),
            assistant: AssistantSettings::default(),
        }
    }
}

impl AssistantConfig {
    /// Load and validate a YAML configuration file.
    pub fn from_yaml_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: AssistantConfig =
            serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate an in-memory YAML document.
    pub fn from_yaml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: AssistantConfig =
            serde_yaml::from_str(raw).map_err(|source| ConfigError::Parse {
                path: "<inline>".to_string(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Startup validation: profiles present and well-formed, grants
    /// recognised (typo check against the closed [`Operation`] set),
    /// ceilings and window positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.profiles.is_empty() {
            return Err(ConfigError::NoProfiles);
        }
        let mut seen = std::collections::HashSet::new();
        for (index, profile) in self.profiles.iter().enumerate() {
            if profile.is_empty() {
                return Err(ConfigError::EmptyProfileName { index });
            }
            if !seen.insert(profile.key()) {
                return Err(ConfigError::DuplicateProfile {
                    key: profile.key(),
                });
            }
        }

        self.catalog().verify_known()?;

        if self.rate_limit.window.is_zero() {
            return Err(ConfigError::ZeroWindow);
        }
        if self.rate_limit.default_ceiling == 0 {
            return Err(ConfigError::ZeroCeiling {
                operation: "<default>".to_string(),
            });
        }
        for (operation, ceiling) in &self.rate_limit.per_operation {
            if Operation::parse(operation).is_none() {
                return Err(CatalogError::UnknownGrant {
                    grant: operation.clone(),
                    known: Operation::ALL
                        .iter()
                        .map(|op| op.as_str())
                        .collect::<Vec<_>>()
                        .join(", "),
                }
                .into());
            }
            if *ceiling == 0 {
                return Err(ConfigError::ZeroCeiling {
                    operation: operation.clone(),
                });
            }
        }
        Ok(())
    }

    /// Build the fail-closed permission catalog from the configured grants.
    pub fn catalog(&self) -> PermissionCatalog {
        PermissionCatalog::from_grants(&self.permissions.grants)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"
profiles:
  - first_name: Alice
    last_name: Example
  - first_name: Bob
    last_name: Example
permissions:
  grants: ["read:letter", "ai:summarize", "auth:login"]
rate_limit:
  window: 30s
  default_ceiling: 10
  per_operation:
    "ai:summarize": 3
assistant:
  refusal_reply: "Not allowed."
  max_prompt_chars: 2000
  max_context_lifetime: 15m
"#;

    #[test]
    fn test_parse_valid_config() {
        let config = AssistantConfig::from_yaml_str(VALID).unwrap();
        assert_eq!(config.profiles.len(), 2);
        assert_eq!(config.rate_limit.window, Duration::from_secs(30));
        assert_eq!(config.rate_limit.per_operation["ai:summarize"], 3);
        assert_eq!(
            config.assistant.max_context_lifetime,
            Duration::from_secs(900)
        );
        assert!(config.catalog().permits("READ:LETTER"));
        assert!(!config.catalog().permits("delete:data"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vesta-config.yaml");
        std::fs::write(&path, VALID).unwrap();
        let config = AssistantConfig::from_yaml_file(&path).unwrap();
        assert_eq!(config.profiles.len(), 2);

        let missing = AssistantConfig::from_yaml_file(&dir.path().join("nope.yaml"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_defaults_fill_missing_sections() {
        let config =
            AssistantConfig::from_yaml_str("profiles:\n  - first_name: A\n    last_name: B\n")
                .unwrap();
        assert_eq!(config.rate_limit.default_ceiling, 30);
        assert_eq!(config.rate_limit.window, Duration::from_secs(60));
        // Default grants cover the whole closed operation set.
        for op in Operation::ALL {
            assert!(config.catalog().permits(op.as_str()));
        }
    }

    #[test]
    fn test_empty_profiles_rejected() {
        assert!(matches!(
            AssistantConfig::from_yaml_str("profiles: []"),
            Err(ConfigError::NoProfiles)
        ));
    }

    #[test]
    fn test_blank_profile_name_rejected() {
        let raw = "profiles:\n  - first_name: \"\"\n    last_name: B\n";
        assert!(matches!(
            AssistantConfig::from_yaml_str(raw),
            Err(ConfigError::EmptyProfileName { index: 0 })
        ));
    }

    #[test]
    fn test_duplicate_profile_rejected() {
        let raw = "profiles:\n  - {first_name: A, last_name: B}\n  - {first_name: A, last_name: B}\n";
        assert!(matches!(
            AssistantConfig::from_yaml_str(raw),
            Err(ConfigError::DuplicateProfile { .. })
        ));
    }

    #[test]
    fn test_grant_typo_rejected() {
        let raw = "profiles:\n  - {first_name: A, last_name: B}\npermissions:\n  grants: [\"read:lettre\"]\n";
        assert!(matches!(
            AssistantConfig::from_yaml_str(raw),
            Err(ConfigError::Catalog(_))
        ));
    }

    #[test]
    fn test_zero_ceiling_rejected() {
        let raw = "profiles:\n  - {first_name: A, last_name: B}\nrate_limit:\n  default_ceiling: 0\n";
        assert!(matches!(
            AssistantConfig::from_yaml_str(raw),
            Err(ConfigError::ZeroCeiling { .. })
        ));
    }

    #[test]
    fn test_unknown_per_operation_override_rejected() {
        let raw = "profiles:\n  - {first_name: A, last_name: B}\nrate_limit:\n  per_operation:\n    \"no:such\": 5\n";
        assert!(matches!(
            AssistantConfig::from_yaml_str(raw),
            Err(ConfigError::Catalog(_))
        ));
    }
}
