//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/semtree/semtree.toml`
//! 3. Local config: `<dir>/.semtree.toml`
//! 4. Environment variables: `SEMTREE_*` prefix, `__` between nested keys

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    #[error("config error: {message}")]
    Config { message: String },
}

/// Snapshot history configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HistorySettings {
    /// Number of tree versions kept per history; unset or 0 keeps all
    pub max_snapshots: Option<usize>,
}

/// Application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub history: HistorySettings,
}

/// Get the XDG config directory for semtree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "semtree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("semtree.toml"))
}

/// Get the path to the local config file in a directory.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(".semtree.toml")
}

fn load_file(path: &Path) -> Result<Settings, SettingsError> {
    let content = std::fs::read_to_string(path).map_err(|e| SettingsError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    Settings::from_toml(&content).map_err(|e| SettingsError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Load settings from all layers.
    ///
    /// A value set in a layer replaces the value of every lower layer.
    pub fn load(dir: Option<&Path>) -> Result<Self, SettingsError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Global config
        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                current = current.merge_with(&load_file(&global_path)?);
                debug!(path = %global_path.display(), "loaded global config");
            }
        }

        // 3. Local config
        if let Some(dir) = dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                current = current.merge_with(&load_file(&local_path)?);
                debug!(path = %local_path.display(), "loaded local config");
            }
        }

        // 4. Environment variables
        Self::apply_env_overrides(current, Self::environment())
    }

    fn environment() -> Environment {
        Environment::with_prefix("SEMTREE")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    /// Apply environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self, source: Environment) -> Result<Self, SettingsError> {
        let config = Config::builder()
            .add_source(source)
            .build()
            .map_err(config_err)?;

        match config.get::<usize>("history.max_snapshots") {
            Ok(max) => settings.history.max_snapshots = Some(max),
            Err(ConfigError::NotFound(_)) => {}
            Err(e) => return Err(config_err(e)),
        }

        Ok(settings)
    }

    fn merge_with(&self, overlay: &Settings) -> Self {
        Self {
            history: HistorySettings {
                max_snapshots: overlay
                    .history
                    .max_snapshots
                    .or(self.history.max_snapshots),
            },
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        toml::from_str(content).map_err(|e| SettingsError::Config {
            message: format!("parse config: {e}"),
        })
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, SettingsError> {
        toml::to_string_pretty(self).map_err(|e| SettingsError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# semtree configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/semtree/semtree.toml
#   Local:  <dir>/.semtree.toml
#   Env:    SEMTREE_* environment variables, e.g. SEMTREE_HISTORY__MAX_SNAPSHOTS=10

[history]
# Tree versions kept per snapshot history, oldest dropped first (0 = keep all)
# max_snapshots = 100
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> SettingsError {
    SettingsError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::environment().source(Some(map))
    }

    #[test]
    fn given_no_overrides_when_merging_then_base_value_is_kept() {
        let base = Settings {
            history: HistorySettings {
                max_snapshots: Some(5),
            },
        };

        let merged = base.merge_with(&Settings::default());

        assert_eq!(merged.history.max_snapshots, Some(5));
    }

    #[test]
    fn given_env_var_when_applying_overrides_then_it_replaces_file_value() {
        let base = Settings {
            history: HistorySettings {
                max_snapshots: Some(5),
            },
        };

        let settings =
            Settings::apply_env_overrides(base, env(&[("SEMTREE_HISTORY__MAX_SNAPSHOTS", "12")]))
                .unwrap();

        assert_eq!(settings.history.max_snapshots, Some(12));
    }

    #[test]
    fn given_unparsable_env_var_when_applying_overrides_then_errors() {
        let result = Settings::apply_env_overrides(
            Settings::default(),
            env(&[("SEMTREE_HISTORY__MAX_SNAPSHOTS", "many")]),
        );

        assert!(matches!(result, Err(SettingsError::Config { .. })));
    }

    #[test]
    fn given_unrelated_env_vars_when_applying_overrides_then_defaults_stay() {
        let settings =
            Settings::apply_env_overrides(Settings::default(), env(&[("OTHER_VAR", "1")]))
                .unwrap();

        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn given_template_when_parsed_then_yields_defaults() {
        let settings = Settings::from_toml(&Settings::template()).unwrap();

        assert_eq!(settings, Settings::default());
    }
}
