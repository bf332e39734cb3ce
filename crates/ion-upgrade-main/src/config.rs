// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of ION Upgrade.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! Application configuration loaded from TOML

use anyhow::{Context, Result, bail};
use ion_upgrade_cgx::DEFAULT_CONTROLLER;
use ion_upgrade_core::{PathTablesConfig, TransitionConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_CONFIG_PATH: &str = "ion-upgrade.toml";
pub const CONTROLLER_ENV: &str = "CGX_CONTROLLER";

fn default_base_url() -> String {
    DEFAULT_CONTROLLER.to_owned()
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub controller: ControllerConfig,

    #[serde(default)]
    pub transition: TransitionConfig,

    /// Upgrade and downgrade path tables
    #[serde(default)]
    pub paths: PathTablesConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Controller API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout (seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ControllerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl AppConfig {
    /// Load from `path`, or from `ion-upgrade.toml` if present, or use defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_PATH);
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    debug!("No {DEFAULT_CONFIG_PATH} found, using defaults");
                    Self::default()
                }
            }
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Apply environment overrides; `lookup` returns the value of a variable
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(CONTROLLER_ENV).filter(|url| !url.trim().is_empty()) {
            debug!("Controller URL overridden by {CONTROLLER_ENV}");
            self.controller.base_url = url.trim().to_owned();
        }
    }

    /// Apply `--max-steps` and `--max-wait`
    pub fn apply_overrides(&mut self, max_steps: Option<u32>, max_wait_secs: Option<u64>) {
        if let Some(max_steps) = max_steps {
            self.transition.max_steps = max_steps;
        }
        if let Some(max_wait_secs) = max_wait_secs {
            self.transition.max_wait_secs = max_wait_secs;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.controller.base_url.trim().is_empty() {
            bail!("controller.base_url must not be empty");
        }
        self.transition.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ion_upgrade_core::PathRule;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.controller.base_url, DEFAULT_CONTROLLER);
        assert_eq!(config.controller.timeout_secs, 30);
        assert_eq!(config.transition.max_steps, 5);
        assert_eq!(config.transition.max_wait_secs, 240);
        assert_eq!(config.transition.poll_interval_secs, 10);
        assert_eq!(config.paths.upgrade.len(), 5);
        assert_eq!(config.paths.downgrade.len(), 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_full_file() {
        let file = write_config(
            r#"
[controller]
base_url = "https://controller.example.com"
timeout_secs = 5

[transition]
max_steps = 2
max_wait_secs = 900

[[paths.upgrade]]
pattern = '6\.0\..*'
target = "6.1.2"
"#,
        );

        let config = AppConfig::load(Some(file.path())).unwrap();

        assert_eq!(config.controller.base_url, "https://controller.example.com");
        assert_eq!(config.controller.timeout(), Duration::from_secs(5));
        assert_eq!(config.transition.max_steps, 2);
        assert_eq!(config.transition.max_wait_secs, 900);
        assert_eq!(config.transition.poll_interval_secs, 10);
        assert_eq!(config.paths.upgrade, vec![PathRule::new(r"6\.0\..*", "6.1.2")]);
        // Missing table keeps the built-in lattice
        assert_eq!(config.paths.downgrade.len(), 5);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let file = write_config("[transition]\nmax_steps = 1\n");
        let config = AppConfig::from_file(file.path()).unwrap();

        assert_eq!(config.transition.max_steps, 1);
        assert_eq!(config.transition.max_wait_secs, 240);
        assert_eq!(config.controller, ControllerConfig::default());
    }

    #[test]
    fn test_missing_explicit_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = AppConfig::load(Some(&dir.path().join("absent.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_malformed_file_fails() {
        let file = write_config("[transition\nmax_steps = ");
        assert!(AppConfig::from_file(file.path()).is_err());
    }

    #[test]
    fn test_env_overrides_controller() {
        let mut config = AppConfig::default();
        config.apply_env(|key| (key == CONTROLLER_ENV).then(|| " https://other ".to_owned()));
        assert_eq!(config.controller.base_url, "https://other");

        let mut config = AppConfig::default();
        config.apply_env(|_| Some(String::new()));
        assert_eq!(config.controller.base_url, DEFAULT_CONTROLLER);
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = AppConfig::default();
        config.apply_overrides(Some(9), None);
        assert_eq!(config.transition.max_steps, 9);
        assert_eq!(config.transition.max_wait_secs, 240);

        config.apply_overrides(None, Some(30));
        assert_eq!(config.transition.max_steps, 9);
        assert_eq!(config.transition.max_wait_secs, 30);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.controller.base_url = "  ".to_owned();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.apply_overrides(Some(0), None);
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.transition.poll_interval_secs = 0;
        assert!(config.validate().is_err());
    }
}
