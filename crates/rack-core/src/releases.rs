//! ---
//! rack_section: "01-core-functionality"
//! rack_subsection: "module"
//! rack_type: "source"
//! rack_scope: "code"
//! rack_description: "Rollout, convergence, and local lifecycle engine."
//! rack_version: "v0.0.0-prealpha"
//! rack_owner: "tbd"
//! ---
use chrono::{DateTime, Utc};
use rack_versioning::{CatalogError, Release, VersionCatalog};

use crate::api::RackApi;
use crate::error::Result;
use crate::system::{SystemRelease, SystemState, SystemStatus};

/// Status column of a release row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseMarker {
    /// The rack runs this release.
    Active,
    /// The rack is moving to this release.
    Updating,
}

impl ReleaseMarker {
    /// Display text.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReleaseMarker::Active => "active",
            ReleaseMarker::Updating => "updating",
        }
    }
}

/// One release the rack has run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseRow {
    /// Release id.
    pub id: String,
    /// When the rack moved to it.
    pub created: Option<DateTime<Utc>>,
    /// Active or updating, if either.
    pub marker: Option<ReleaseMarker>,
}

/// A rack's version history annotated with what it is running now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseHistory {
    /// Rows, newest first.
    pub rows: Vec<ReleaseRow>,
    /// Successor of the running version when it is newer than anything pending.
    pub newer_available: Option<String>,
}

impl ReleaseHistory {
    /// `releases` must be newest first. While the rack is `updating`, the
    /// newest entry is the pending version.
    pub fn build(
        system: &SystemState,
        releases: &[SystemRelease],
        next: Option<&Release>,
    ) -> Self {
        let mut pending = system.version.as_str();
        let rows = releases
            .iter()
            .enumerate()
            .map(|(idx, release)| {
                let mut marker = None;
                if idx == 0 && system.status == SystemStatus::Updating {
                    pending = release.id.as_str();
                    marker = Some(ReleaseMarker::Updating);
                }
                if release.id == system.version {
                    marker = Some(ReleaseMarker::Active);
                }
                ReleaseRow {
                    id: release.id.clone(),
                    created: release.created,
                    marker,
                }
            })
            .collect();

        let newer_available = next
            .filter(|next| next.id.as_str() > pending)
            .map(|next| next.id.clone());

        Self {
            rows,
            newer_available,
        }
    }
}

/// Fetch state and history from the rack and annotate it against `catalog`.
pub async fn release_history(api: &dyn RackApi, catalog: &VersionCatalog) -> Result<ReleaseHistory> {
    let system = api.get_system().await?;
    let releases = api.list_releases().await?;
    let next = match catalog.next(&system.version) {
        Ok(next) => Some(next),
        Err(CatalogError::IsLatest(_)) | Err(CatalogError::NotFound(_)) => None,
        Err(err) => return Err(err.into()),
    };
    Ok(ReleaseHistory::build(&system, &releases, next))
}
