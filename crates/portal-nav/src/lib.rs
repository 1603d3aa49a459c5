//! Portal Navigation
//!
//! Decides which navigation entries are visible for the active tenant
//! context, persona, roles and permissions.
//!
//! # Overview
//!
//! - **NavItem**: declarative navigation entry, never mutated
//! - **NavFilter**: ordered predicate pipeline (scope, persona, role, permission)
//! - **NavigationContextProvider**: observable selection state that recomputes
//!   the filtered list on every input change and persists selections
//!
//! # Example
//!
//! ```rust
//! use portal_nav::{NavCatalog, NavItem, NavigationContext, NavigationContextProvider, Persona};
//! use portal_store::MemoryStore;
//! use std::sync::Arc;
//!
//! let catalog = NavCatalog::new()
//!     .with_context(NavigationContext::new("cms", "Content"))
//!     .with_persona(Persona::new("editor", "Editor"))
//!     .with_item(NavItem::new("Home", "/portal"))
//!     .with_item(NavItem::new("Pages", "/portal/apps/cms").in_context("cms"));
//!
//! let provider = NavigationContextProvider::new(catalog, Arc::new(MemoryStore::new()));
//! assert_eq!(provider.filtered_nav_items().len(), 2);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod catalog;
pub mod error;
pub mod filter;
pub mod item;
pub mod provider;

pub use catalog::{NavCatalog, NavigationContext, Persona};
pub use error::CatalogError;
pub use filter::{FilterInput, NavFilter, NavPredicate};
pub use item::{NavItem, ALL};
pub use provider::{NavigationContextProvider, NavigationState};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for navigation consumers
    pub use crate::{
        NavCatalog, NavFilter, NavItem, NavigationContext, NavigationContextProvider,
        NavigationState, Persona,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
