//! Portal Shell
//!
//! Host side of the mini-app runtime: reads a [`ShellConfig`], assembles the
//! registry, resolver, navigation provider and breadcrumb trail, and opens
//! app paths of the form `<apps_base_path>/<app_id>/...`.
//!
//! # Example
//!
//! ```rust,no_run
//! use portal_shell::{PortalShell, ShellConfig};
//!
//! # async fn example() -> Result<(), portal_shell::ShellError> {
//! let config = ShellConfig::from_file("portal.toml")?;
//! let shell = PortalShell::from_config(config)?;
//! let view = shell.open("/portal/apps/cms").await?;
//! println!("{:?}", view.app);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod breadcrumbs;
pub mod config;
pub mod error;
pub mod shell;

pub use breadcrumbs::BreadcrumbTrail;
pub use config::{AppEntry, ConfigFormat, ShellConfig, ShellSection, StorageSection};
pub use error::ShellError;
pub use shell::{PortalShell, ShellView};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
