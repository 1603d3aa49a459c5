//! Error types for the mini-app runtime
//!
//! None of these are fatal to the host: the resolver turns every
//! [`AppError`] into a contained error view.

use crate::config::{AppId, SourceLocator};

/// Mini-app resolution and load failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AppError {
    /// Requested id is not in the loadable-app table
    #[error("unknown app: {0}")]
    UnknownApp(AppId),

    /// Bundle could not be fetched
    #[error("failed to fetch app '{app_id}': {source}")]
    ModuleFetch {
        app_id: AppId,
        #[source]
        source: BundleError,
    },

    /// Bundle loaded but lacks a required export
    #[error("malformed module for app '{app_id}': missing {missing}")]
    MalformedModule {
        app_id: AppId,
        missing: &'static str,
    },

    /// A newer load of the same app started before this one settled
    #[error("load of app '{0}' was superseded by a newer request")]
    Superseded(AppId),
}

impl AppError {
    /// App the failure belongs to
    #[inline]
    #[must_use]
    pub fn app_id(&self) -> &AppId {
        match self {
            Self::UnknownApp(app_id) | Self::Superseded(app_id) => app_id,
            Self::ModuleFetch { app_id, .. } | Self::MalformedModule { app_id, .. } => app_id,
        }
    }

    /// Message shown in the host's error panel
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::UnknownApp(app_id) => format!("App not found: {app_id}"),
            Self::ModuleFetch { app_id, .. }
            | Self::MalformedModule { app_id, .. }
            | Self::Superseded(app_id) => format!("Failed to load app: {app_id}"),
        }
    }

    /// Check if re-navigating may succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ModuleFetch { .. } | Self::Superseded(_))
    }

    /// Check if the failure is a defect in the mini-app itself
    #[inline]
    #[must_use]
    pub fn is_defect(&self) -> bool {
        matches!(self, Self::MalformedModule { .. })
    }
}

/// Bundle fetch failures reported by a [`ModuleLoader`](crate::ModuleLoader)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BundleError {
    /// No bundle registered at locator
    #[error("no bundle at '{0}'")]
    NotFound(SourceLocator),

    /// Reading the bundle failed
    #[error("io error loading '{locator}': {message}")]
    Io {
        locator: SourceLocator,
        message: String,
    },

    /// Bundle contents could not be decoded
    #[error("cannot decode bundle '{locator}': {message}")]
    Decode {
        locator: SourceLocator,
        message: String,
    },

    /// Loader-specific failure
    #[error("bundle load failed: {0}")]
    Failed(String),
}

/// Manifest parse and validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Not valid manifest JSON
    #[error("invalid manifest json: {0}")]
    Parse(#[from] serde_json::Error),

    /// Field present but unusable
    #[error("invalid manifest field {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_error_display() {
        let err = AppError::UnknownApp(AppId::from("nope"));
        assert!(err.to_string().contains("unknown app"));
        assert_eq!(err.user_message(), "App not found: nope");
    }

    #[test]
    fn app_error_classification() {
        let fetch = AppError::ModuleFetch {
            app_id: AppId::from("cms"),
            source: BundleError::Failed("offline".to_string()),
        };
        assert!(fetch.is_retryable());
        assert!(!fetch.is_defect());
        assert_eq!(fetch.user_message(), "Failed to load app: cms");

        let malformed = AppError::MalformedModule {
            app_id: AppId::from("cms"),
            missing: "default export",
        };
        assert!(malformed.is_defect());
        assert!(!malformed.is_retryable());
        assert_eq!(malformed.app_id().as_str(), "cms");
    }
}
