//! Shell error types

use portal_apps::AppId;
use portal_nav::CatalogError;
use portal_store::StorageError;
use std::path::PathBuf;

/// Shell setup and navigation failures
#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported config format: {0}")]
    UnsupportedFormat(PathBuf),

    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid navigation catalog: {0}")]
    Catalog(#[from] CatalogError),

    #[error("duplicate app entry: {0}")]
    DuplicateApp(AppId),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("path {0} is not under the apps base path")]
    OutsideApps(String),

    #[error("app {0} is not reachable from the current navigation")]
    NotAddressable(AppId),
}

impl ShellError {
    /// Check if the failure comes from the config file itself
    #[must_use]
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::Io { .. }
                | Self::UnsupportedFormat(_)
                | Self::Json(_)
                | Self::Yaml(_)
                | Self::Toml(_)
                | Self::Catalog(_)
                | Self::DuplicateApp(_)
        )
    }

    /// Check if the failure is a navigation refusal rather than a setup error
    #[must_use]
    pub fn is_navigation(&self) -> bool {
        matches!(self, Self::OutsideApps(_) | Self::NotAddressable(_))
    }
}
