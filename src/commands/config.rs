use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ArchitectError, Result};
use crate::generation::{DEFAULT_API_BASE, DEFAULT_MODEL};
use crate::model::Dimension;
use crate::util::expand_tilde;

/// One finished build, as remembered in the config file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildEntry {
    pub project_name: String,
    pub dimension: Dimension,
    pub archive_path: String,
    pub files: usize,
    pub model: String,
    pub created_at: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchitectConfig {
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<String>,
    #[serde(default)]
    pub builds: Vec<BuildEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_build: Option<String>,
}

impl Default for ArchitectConfig {
    fn default() -> Self {
        Self {
            version: 1,
            model: None,
            api_base: None,
            output_dir: None,
            builds: vec![],
            last_build: None,
        }
    }
}

impl ArchitectConfig {
    /// Records a build. Entries are keyed by archive path, so rebuilding the
    /// same project into the same place replaces the old entry.
    pub fn upsert_build(&mut self, entry: BuildEntry) {
        let mut entry = entry;
        entry.archive_path = expand_tilde(&entry.archive_path);

        if let Some(existing) = self
            .builds
            .iter_mut()
            .find(|b| b.archive_path == entry.archive_path)
        {
            *existing = entry.clone();
        } else {
            self.builds.push(entry.clone());
        }
        self.last_build = Some(entry.archive_path);
    }
}

pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".godot-architect").join("config.json"))
}

/// Reads the config file. A missing or unreadable file yields the defaults.
pub fn load_config(path: &Path) -> ArchitectConfig {
    let Ok(content) = std::fs::read_to_string(path) else {
        return ArchitectConfig::default();
    };
    match serde_json::from_str(&content) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring malformed config file");
            ArchitectConfig::default()
        }
    }
}

pub fn save_config(path: &Path, config: &ArchitectConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(config)
        .map_err(|e| ArchitectError::Custom(e.to_string()))?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Loads, records `entry` and writes back.
pub fn save_build(path: &Path, entry: BuildEntry) -> Result<ArchitectConfig> {
    let mut config = load_config(path);
    config.upsert_build(entry);
    save_config(path, &config)?;
    Ok(config)
}

/// Values that came from the command line or the environment.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub api_base: Option<String>,
    pub output_dir: Option<PathBuf>,
}

/// Effective settings for one run.
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub api_key: String,
    pub model: String,
    pub api_base: String,
    pub output_dir: PathBuf,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Overrides win over the config file, the config file over built-in defaults.
pub fn resolve_settings(config: &ArchitectConfig, overrides: Overrides) -> Result<Settings> {
    let api_key = non_empty(overrides.api_key).ok_or_else(|| {
        ArchitectError::Config("No API key configured. Set GEMINI_API_KEY.".into())
    })?;

    let model = non_empty(overrides.model)
        .or_else(|| non_empty(config.model.clone()))
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());
    let api_base = non_empty(overrides.api_base)
        .or_else(|| non_empty(config.api_base.clone()))
        .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
    let output_dir = overrides
        .output_dir
        .or_else(|| {
            non_empty(config.output_dir.clone()).map(|d| PathBuf::from(expand_tilde(&d)))
        })
        .unwrap_or_else(|| PathBuf::from("."));

    Ok(Settings {
        api_key,
        model,
        api_base,
        output_dir,
    })
}
