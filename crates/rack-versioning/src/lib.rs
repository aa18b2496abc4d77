//! ---
//! rack_section: "14-versioning"
//! rack_subsection: "module"
//! rack_type: "source"
//! rack_scope: "code"
//! rack_description: "Release catalog and build metadata helpers."
//! rack_version: "v0.0.0-prealpha"
//! rack_owner: "tbd"
//! ---
#![warn(missing_docs)]

//! Release catalog resolution, update planning across required releases,
//! version registries, and build metadata for the client itself.

pub mod catalog;
pub mod error;
pub mod info;
pub mod registry;

pub use catalog::{Release, UpdatePlan, VersionCatalog, LATEST};
pub use error::{CatalogError, Result};
pub use info::VersionInfo;
pub use registry::{FileVersionRegistry, HttpVersionRegistry, ReleaseFeed, VersionRegistry};
