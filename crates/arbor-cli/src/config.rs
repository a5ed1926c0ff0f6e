//! CLI configuration
//!
//! A TOML file with a `[warnings]` table (the warning policy) and a `[build]`
//! table (build options and modifiers). Command-line flags override it.

use std::path::{Path, PathBuf};

use arbor_core::{BuildOptions, Warning, WarningPolicy};
use serde::{Deserialize, Serialize};

/// Default config file location
pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".arbor")
        .join("config.toml")
}

/// The explicit path if given, else the default location
pub fn config_file_path(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(default_config_path)
}

/// Configuration for the CLI
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub warnings: WarningPolicy,
    #[serde(default)]
    pub build: BuildOptions,
}

const KEYS: &[&str] = &[
    "warnings.max_warnings",
    "warnings.raise_warnings",
    "warnings.ignored",
    "build.allow_multiple_trees",
    "build.min_section_points",
    "build.modifiers.soma_sphere",
    "build.modifiers.two_points_sections",
    "build.modifiers.no_duplicates",
    "build.modifiers.nrn_order",
];

impl Config {
    /// Load from `path`; a missing or unreadable file gives the defaults
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(_) => {
                tracing::debug!("No config at {}, using defaults", path.display());
                return Self::default();
            }
        };
        match toml::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Ignoring invalid config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        tracing::debug!("Saved config to {}", path.display());
        Ok(())
    }

    pub fn keys() -> &'static [&'static str] {
        KEYS
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let modifiers = &self.build.modifiers;
        let value = match key {
            "warnings.max_warnings" => self.warnings.max_warnings.to_string(),
            "warnings.raise_warnings" => self.warnings.raise_warnings.to_string(),
            "warnings.ignored" => self
                .warnings
                .ignored
                .iter()
                .map(|w| w.as_str())
                .collect::<Vec<_>>()
                .join(","),
            "build.allow_multiple_trees" => self.build.allow_multiple_trees.to_string(),
            "build.min_section_points" => self.build.min_section_points.to_string(),
            "build.modifiers.soma_sphere" => modifiers.soma_sphere.to_string(),
            "build.modifiers.two_points_sections" => modifiers.two_points_sections.to_string(),
            "build.modifiers.no_duplicates" => modifiers.no_duplicates.to_string(),
            "build.modifiers.nrn_order" => modifiers.nrn_order.to_string(),
            _ => return None,
        };
        Some(value)
    }

    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        let modifiers = &mut self.build.modifiers;
        match key {
            "warnings.max_warnings" => self.warnings.max_warnings = value.parse()?,
            "warnings.raise_warnings" => self.warnings.raise_warnings = value.parse()?,
            "warnings.ignored" => {
                self.warnings.ignored = value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(|s| s.parse::<Warning>().map_err(anyhow::Error::msg))
                    .collect::<anyhow::Result<_>>()?;
            }
            "build.allow_multiple_trees" => self.build.allow_multiple_trees = value.parse()?,
            "build.min_section_points" => self.build.min_section_points = value.parse()?,
            "build.modifiers.soma_sphere" => modifiers.soma_sphere = value.parse()?,
            "build.modifiers.two_points_sections" => modifiers.two_points_sections = value.parse()?,
            "build.modifiers.no_duplicates" => modifiers.no_duplicates = value.parse()?,
            "build.modifiers.nrn_order" => modifiers.nrn_order = value.parse()?,
            _ => anyhow::bail!(
                "Unknown config key: {}. Available keys: {}",
                key,
                KEYS.join(", ")
            ),
        }
        Ok(())
    }
}
