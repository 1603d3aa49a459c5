//! Shell configuration
//!
//! One file describes the whole shell: where selections persist, where apps
//! mount, which app manifests exist, and the navigation catalog. The format
//! follows the file extension (`.toml`, `.json`, `.yaml` / `.yml`).

use crate::error::ShellError;
use portal_apps::{AppId, SourceLocator};
use portal_nav::NavCatalog;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Default mount point for mini-apps
pub const DEFAULT_APPS_BASE_PATH: &str = "/portal/apps";

/// Config file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
    Yaml,
}

impl ConfigFormat {
    /// Format for a file extension
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }
}

/// Persistence settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    /// JSON file for persisted selections; in-memory when absent
    pub path: Option<PathBuf>,
}

/// Mounting and scoping settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellSection {
    /// URL prefix under which `<app_id>` segments address mini-apps
    pub apps_base_path: String,
    /// Refuse to open apps no visible navigation entry links to
    pub enforce_navigation_scope: bool,
    /// Directory manifests are resolved against; the config's own directory
    /// when absent
    pub manifest_dir: Option<PathBuf>,
}

impl Default for ShellSection {
    fn default() -> Self {
        Self {
            apps_base_path: DEFAULT_APPS_BASE_PATH.to_string(),
            enforce_navigation_scope: false,
            manifest_dir: None,
        }
    }
}

/// A loadable mini-app
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppEntry {
    pub app_id: AppId,
    /// Manifest path, relative to the manifest directory
    pub locator: SourceLocator,
}

/// Complete shell configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    pub storage: StorageSection,
    pub shell: ShellSection,
    pub apps: Vec<AppEntry>,
    pub navigation: NavCatalog,
    /// Directory of the file this config came from
    #[serde(skip)]
    pub origin: Option<PathBuf>,
}

impl ShellConfig {
    /// Read and validate a config file
    ///
    /// # Errors
    /// - `ShellError::Io` if the file cannot be read
    /// - `ShellError::UnsupportedFormat` for unknown extensions
    /// - parse and validation errors of the content
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ShellError> {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path)
            .ok_or_else(|| ShellError::UnsupportedFormat(path.to_path_buf()))?;
        let raw = std::fs::read_to_string(path).map_err(|source| ShellError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config = Self::parse(&raw, format)?;
        config.origin = path.parent().map(Path::to_path_buf);
        tracing::debug!(
            path = %path.display(),
            apps = config.apps.len(),
            items = config.navigation.items.len(),
            "loaded shell config"
        );
        Ok(config)
    }

    /// Parse and validate config text
    ///
    /// # Errors
    /// Parse errors of the given format, catalog inconsistencies and
    /// duplicate app entries
    pub fn parse(raw: &str, format: ConfigFormat) -> Result<Self, ShellError> {
        let config: Self = match format {
            ConfigFormat::Toml => toml::from_str(raw)?,
            ConfigFormat::Json => serde_json::from_str(raw)?,
            ConfigFormat::Yaml => serde_yaml::from_str(raw)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the catalog and app entries
    ///
    /// # Errors
    /// The first inconsistency found
    pub fn validate(&self) -> Result<(), ShellError> {
        self.navigation.validate()?;
        let mut seen = HashSet::new();
        for entry in &self.apps {
            if !seen.insert(entry.app_id.as_str()) {
                return Err(ShellError::DuplicateApp(entry.app_id.clone()));
            }
        }
        Ok(())
    }

    /// Directory manifests are read from
    #[must_use]
    pub fn manifest_dir(&self) -> PathBuf {
        match (&self.shell.manifest_dir, &self.origin) {
            (Some(dir), Some(origin)) if dir.is_relative() => origin.join(dir),
            (Some(dir), _) => dir.clone(),
            (None, Some(origin)) => origin.clone(),
            (None, None) => PathBuf::from("."),
        }
    }

    /// Storage file, resolved against the config's directory
    #[must_use]
    pub fn storage_path(&self) -> Option<PathBuf> {
        let path = self.storage.path.as_ref()?;
        Some(match &self.origin {
            Some(origin) if path.is_relative() => origin.join(path),
            _ => path.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const TOML: &str = r#"
        [storage]
        path = "state.json"

        [shell]
        enforce_navigation_scope = true

        [[apps]]
        app_id = "cms"
        locator = "apps/cms.json"

        [[navigation.contexts]]
        id = "cms"
        name = "Content"

        [[navigation.personas]]
        id = "editor"
        name = "Editor"

        [[navigation.items]]
        title = "Pages"
        url = "/portal/apps/cms"
        contextId = "cms"
        appId = "cms"
        priority = 2
    "#;

    #[test]
    fn toml_config_with_defaults() {
        let config = ShellConfig::parse(TOML, ConfigFormat::Toml).unwrap();
        assert_eq!(config.shell.apps_base_path, DEFAULT_APPS_BASE_PATH);
        assert!(config.shell.enforce_navigation_scope);
        assert_eq!(config.apps[0].locator, SourceLocator::from("apps/cms.json"));
        assert_eq!(config.navigation.items[0].app_id.as_deref(), Some("cms"));
        assert_eq!(config.navigation.items[0].priority, 2);
    }

    #[test]
    fn yaml_and_json_configs() {
        let yaml = "apps:\n  - app_id: mixdb\n    locator: mixdb.json\n";
        let config = ShellConfig::parse(yaml, ConfigFormat::Yaml).unwrap();
        assert_eq!(config.apps[0].app_id.as_str(), "mixdb");

        let json = r#"{"shell": {"apps_base_path": "/apps"}}"#;
        let config = ShellConfig::parse(json, ConfigFormat::Json).unwrap();
        assert_eq!(config.shell.apps_base_path, "/apps");
        assert!(config.apps.is_empty());
    }

    #[test]
    fn rejects_duplicate_apps_and_bad_catalogs() {
        let dup = "apps:\n  - {app_id: a, locator: a.json}\n  - {app_id: a, locator: b.json}\n";
        assert!(matches!(
            ShellConfig::parse(dup, ConfigFormat::Yaml),
            Err(ShellError::DuplicateApp(_))
        ));

        let bad = r#"{"navigation": {"items": [{"title": "X", "url": "/x", "contextId": "nope"}]}}"#;
        let err = ShellConfig::parse(bad, ConfigFormat::Json).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(ConfigFormat::from_path(Path::new("a/shell.YML")), Some(ConfigFormat::Yaml));
        assert_eq!(ConfigFormat::from_path(Path::new("shell.ini")), None);
        assert!(matches!(
            ShellConfig::from_file("shell.ini"),
            Err(ShellError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn paths_resolve_against_origin() {
        let mut config = ShellConfig::parse(TOML, ConfigFormat::Toml).unwrap();
        config.origin = Some(PathBuf::from("/etc/portal"));
        assert_eq!(config.storage_path(), Some(PathBuf::from("/etc/portal/state.json")));
        assert_eq!(config.manifest_dir(), PathBuf::from("/etc/portal"));

        config.shell.manifest_dir = Some(PathBuf::from("manifests"));
        assert_eq!(config.manifest_dir(), PathBuf::from("/etc/portal/manifests"));
    }
}
