//! Portal Store
//!
//! Durable string-keyed storage injected into the portal runtime.
//!
//! # Overview
//!
//! - **KeyValueStore**: the capability trait (get / set / remove)
//! - **MemoryStore**: process-local store for tests and ephemeral shells
//! - **FileStore**: JSON file persisted on every write
//! - **KeyValueStoreExt**: typed JSON helpers over any store
//!
//! # Example
//!
//! ```rust
//! use portal_store::{keys, KeyValueStore, MemoryStore};
//!
//! let store = MemoryStore::new();
//! store.set(keys::ACTIVE_APP_ID, "mix-db").unwrap();
//! assert_eq!(store.get(keys::ACTIVE_APP_ID).unwrap().as_deref(), Some("mix-db"));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod error;
pub mod file;
pub mod keys;
pub mod memory;

pub use error::StorageError;
pub use file::FileStore;
pub use memory::MemoryStore;

use serde::de::DeserializeOwned;
use serde::Serialize;

/// String-keyed durable storage
///
/// Implementations must be cheap to call from synchronous code; the runtime
/// calls them inside short state transitions and never across an await.
pub trait KeyValueStore: Send + Sync + std::fmt::Debug {
    /// Read a value
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a key (absent keys are not an error)
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Typed helpers for JSON-encoded values
pub trait KeyValueStoreExt: KeyValueStore {
    /// Read and decode a JSON value
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.get(key)? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| StorageError::decode(key, e)),
            None => Ok(None),
        }
    }

    /// Encode and write a JSON value
    fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value).map_err(|e| StorageError::encode(key, e))?;
        self.set(key, &raw)
    }

    /// Write `Some(value)` or delete the key for `None`
    fn set_optional(&self, key: &str, value: Option<&str>) -> Result<(), StorageError> {
        match value {
            Some(value) => self.set(key, value),
            None => self.remove(key),
        }
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStoreExt for S {}

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for storage consumers
    pub use crate::{keys, FileStore, KeyValueStore, KeyValueStoreExt, MemoryStore, StorageError};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
