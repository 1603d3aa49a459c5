//! Error types for the store

use std::path::PathBuf;

/// Storage failures
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Backing file could not be read or written
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Stored value is not valid JSON for the requested type
    #[error("cannot decode value under '{key}': {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Value could not be encoded
    #[error("cannot encode value for '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Backing file exists but is not a JSON object of strings
    #[error("corrupt store file {path}: {message}")]
    Corrupt { path: PathBuf, message: String },
}

impl StorageError {
    /// Create IO error for path
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn decode(key: &str, source: serde_json::Error) -> Self {
        Self::Decode {
            key: key.to_string(),
            source,
        }
    }

    pub(crate) fn encode(key: &str, source: serde_json::Error) -> Self {
        Self::Encode {
            key: key.to_string(),
            source,
        }
    }

    /// Check if the failure came from the backing medium rather than the data
    #[inline]
    #[must_use]
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}
