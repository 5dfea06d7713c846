//! `load_config` module: loads a static YAML bootstrap file and turns it into
//! validated settings changes, injecting the access token from the environment.
//!
//! The YAML holds no secrets:
//!
//! ```yaml
//! api_host: https://school.instructure.com
//! rubric_mode: table
//! courses: |
//!   # physics
//!   id = 1234; folder = School/Physics; tags = physics
//! ```
//!
//! # Errors
//! All errors in this module use `anyhow::Error` for context-rich diagnostics,
//! and are surfaced at the CLI boundary.

use anyhow::Result;
use canvas_notes_core::render::RubricMode;
use canvas_notes_core::settings::{apply_change, Settings, SettingsChange};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{error, info};

use crate::canvas::TOKEN_ENV;

#[derive(Debug, Default, Deserialize)]
pub struct BootstrapConfig {
    #[serde(default)]
    pub api_host: Option<String>,
    #[serde(default)]
    pub rubric_mode: Option<RubricMode>,
    /// Course rules block, one rule per line.
    #[serde(default)]
    pub courses: Option<String>,
}

impl BootstrapConfig {
    /// Settings changes described by this file, plus the access token if
    /// `CANVAS_ACCESS_TOKEN` is set.
    pub fn into_changes(self) -> Vec<SettingsChange> {
        let mut changes = Vec::new();
        if let Some(host) = self.api_host {
            changes.push(SettingsChange::ApiHost(host));
        }
        if let Some(mode) = self.rubric_mode {
            changes.push(SettingsChange::RubricMode(mode));
        }
        if let Some(rules) = self.courses {
            changes.push(SettingsChange::CourseRules(rules));
        }
        match std::env::var(TOKEN_ENV) {
            Ok(token) if !token.trim().is_empty() => {
                info!("{} found in env", TOKEN_ENV);
                changes.push(SettingsChange::AccessToken(token));
            }
            _ => info!("{} not set, keeping stored token", TOKEN_ENV),
        }
        changes
    }
}

/// Reads and parses the YAML bootstrap file at `path`.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<BootstrapConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    match serde_yaml::from_str::<Option<BootstrapConfig>>(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            Ok(conf.unwrap_or_default())
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            Err(anyhow::anyhow!("Failed to parse config YAML: {e}"))
        }
    }
}

/// Applies `changes` in order. Nothing is applied unless every change is valid.
pub fn apply_changes(settings: Settings, changes: Vec<SettingsChange>) -> Result<Settings> {
    changes.into_iter().try_fold(settings, |acc, change| {
        apply_change(acc, change).map_err(|e| {
            error!(error = %e, "Rejected settings change");
            anyhow::Error::new(e).context("Invalid settings")
        })
    })
}
