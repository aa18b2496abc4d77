//! ---
//! rack_section: "14-versioning"
//! rack_subsection: "module"
//! rack_type: "source"
//! rack_scope: "code"
//! rack_description: "Release catalog and build metadata helpers."
//! rack_version: "v0.0.0-prealpha"
//! rack_owner: "tbd"
//! ---
use thiserror::Error;

/// Result alias for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Failures raised while fetching or resolving the release catalog.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// The registry could not be reached or returned malformed data.
    #[error("release catalog unavailable: {0}")]
    CatalogUnavailable(String),
    /// The registry returned no releases.
    #[error("release catalog is empty")]
    EmptyCatalog,
    /// No release carries the requested id.
    #[error("version {0} not found")]
    NotFound(String),
    /// The given release is already the newest known release.
    #[error("version {0} is latest")]
    IsLatest(String),
}
