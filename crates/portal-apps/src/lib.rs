//! Portal Apps - mini-app runtime
//!
//! Loads, tracks and tears down independently built mini-apps:
//! - **MiniAppConfig**: the static descriptor every mini-app ships
//! - **ModuleLoader / LoaderTable**: app id to async bundle factory indirection
//! - **AppRegistry**: process-wide catalog with a single active app
//! - **AppResolver**: per-request `Idle -> Loading -> Resolved | Failed` machine
//! - **BreadcrumbBridge**: one-way channel from the active app to the host
//!
//! # Architecture
//!
//! ```text
//! shell ─ resolve(id) ─> AppResolver ─ get_app ─> AppRegistry
//!                             │                      │ miss
//!                             │                      └─ load_app ─> ModuleLoader ─> bundle
//!                             └─ render ─> MiniAppModule ─ breadcrumbs ─> BreadcrumbBridge
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use portal_apps::prelude::*;
//! use portal_store::MemoryStore;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), AppError> {
//! let loader = LoaderTable::new().with_app("cms", "bundles/cms", load_cms_bundle);
//! let registry = Arc::new(AppRegistry::new(Arc::new(loader), Arc::new(MemoryStore::new())));
//! let resolver = AppResolver::new(registry.clone(), BreadcrumbBridge::new().publisher());
//!
//! let resolution = resolver.resolve(Some("cms")).await;
//! assert!(resolution.module().is_some());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod bridge;
pub mod config;
pub mod error;
pub mod loader;
pub mod manifest;
pub mod module;
pub mod registry;
pub mod resolver;

pub use bridge::{
    Breadcrumb, BreadcrumbBridge, BreadcrumbPublisher, BreadcrumbSignal, BreadcrumbSubscription,
    BreadcrumbUpdate,
};
pub use config::{
    AppId, MenuItem, MiniAppConfig, NavigationPlacement, PermissionDescriptor, SourceLocator,
};
pub use error::{AppError, BundleError, ConfigError};
pub use loader::{validate_exports, LoadedExports, LoaderFn, LoaderTable, ModuleLoader};
pub use manifest::{ManifestLoader, ManifestPage};
pub use module::{AppComponent, AppSummary, MiniAppModule, MountContext, NamedExport};
pub use registry::{AppRegistry, RegistryState};
pub use resolver::{AppResolver, AppView, Resolution};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for hosting mini-apps
    pub use crate::{
        AppComponent, AppError, AppId, AppRegistry, AppResolver, AppView, BreadcrumbBridge,
        LoadedExports, LoaderTable, MiniAppConfig, MiniAppModule, ModuleLoader, MountContext,
        Resolution, SourceLocator,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
