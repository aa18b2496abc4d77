//! ---
//! rack_section: "14-versioning"
//! rack_subsection: "module"
//! rack_type: "source"
//! rack_scope: "code"
//! rack_description: "Release catalog and build metadata helpers."
//! rack_version: "v0.0.0-prealpha"
//! rack_owner: "tbd"
//! ---
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CatalogError, Result};
use crate::registry::VersionRegistry;

/// Token accepted by [`VersionCatalog::resolve`] for the newest release.
pub const LATEST: &str = "latest";

/// One published version of the rack software.
///
/// Ids are opaque, timestamp-like tokens ordered by plain string comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    /// Unique, orderable release id.
    pub id: String,
    /// Publication time, for display only.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Every upgrade path crossing this release must stop here first.
    #[serde(default)]
    pub required: bool,
}

impl Release {
    /// Build an optional (non-required) release without a timestamp.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            created_at: None,
            required: false,
        }
    }

    /// Mark the release as a mandatory stop.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Attach a publication timestamp.
    #[must_use]
    pub fn created(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }
}

/// Snapshot of the full release history for one rack kind.
///
/// The catalog never caches across invocations: callers build a fresh one via
/// [`VersionCatalog::fetch`] each time they need to resolve something.
#[derive(Debug, Clone, Default)]
pub struct VersionCatalog {
    // ascending by id, unique
    history: Vec<Release>,
}

impl VersionCatalog {
    /// Build a catalog from releases in any order. Duplicate ids keep their first occurrence.
    pub fn new(releases: impl IntoIterator<Item = Release>) -> Self {
        let mut history: Vec<Release> = releases.into_iter().collect();
        history.sort_by(|a, b| a.id.cmp(&b.id));
        history.dedup_by(|later, earlier| later.id == earlier.id);
        Self { history }
    }

    /// Fetch the full history from a registry.
    pub async fn fetch(registry: &dyn VersionRegistry) -> Result<Self> {
        let releases = registry.fetch().await?;
        let catalog = Self::new(releases);
        debug!(releases = catalog.len(), "release catalog fetched");
        Ok(catalog)
    }

    /// All releases, newest first.
    pub fn all(&self) -> impl Iterator<Item = &Release> {
        self.history.iter().rev()
    }

    /// Number of known releases.
    pub fn len(&self) -> usize {
        self.history.len()
    }

    /// Whether the catalog holds no releases.
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// The newest release.
    pub fn latest(&self) -> Result<&Release> {
        self.history.last().ok_or(CatalogError::EmptyCatalog)
    }

    /// Exact lookup by id.
    pub fn find(&self, id: &str) -> Result<&Release> {
        self.position(id).map(|idx| &self.history[idx])
    }

    /// Resolve `"latest"` or a release id.
    pub fn resolve(&self, token: &str) -> Result<&Release> {
        if token == LATEST {
            self.latest()
        } else {
            self.find(token)
        }
    }

    /// The release immediately after `current` in full history order.
    pub fn next(&self, current: &str) -> Result<&Release> {
        let idx = self.position(current)?;
        self.history
            .get(idx + 1)
            .ok_or_else(|| CatalogError::IsLatest(current.to_owned()))
    }

    /// Compute this cycle's update target from `current` toward `requested`
    /// (defaults to the newest release).
    ///
    /// The first required release after `current` that is older than the
    /// requested one becomes the target, so no mandatory migration is ever
    /// skipped. Such a plan is marked `gated` and the caller has to run another
    /// update once it completes.
    pub fn plan_update(&self, current: &str, requested: Option<&str>) -> Result<UpdatePlan> {
        let requested = self.resolve(requested.unwrap_or(LATEST))?.clone();

        let next = match self.next(current) {
            Ok(next) => next,
            Err(CatalogError::IsLatest(_)) => {
                return Ok(UpdatePlan {
                    current: current.to_owned(),
                    target: requested.clone(),
                    requested,
                    gated: false,
                });
            }
            Err(err) => return Err(err),
        };

        let start = self.position(&next.id)?;
        let gate = self.history[start..]
            .iter()
            .take_while(|release| release.id < requested.id)
            .find(|release| release.required);

        let plan = match gate {
            Some(gate) => UpdatePlan {
                current: current.to_owned(),
                target: gate.clone(),
                requested,
                gated: true,
            },
            None => UpdatePlan {
                current: current.to_owned(),
                target: requested.clone(),
                requested,
                gated: false,
            },
        };
        debug!(
            current = %plan.current,
            target = %plan.target.id,
            requested = %plan.requested.id,
            gated = plan.gated,
            "update planned"
        );
        Ok(plan)
    }

    fn position(&self, id: &str) -> Result<usize> {
        self.history
            .binary_search_by(|release| release.id.as_str().cmp(id))
            .map_err(|_| CatalogError::NotFound(id.to_owned()))
    }
}

/// Outcome of [`VersionCatalog::plan_update`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatePlan {
    /// Version the rack runs now.
    pub current: String,
    /// Release to roll out in this cycle.
    pub target: Release,
    /// Release the caller ultimately asked for.
    pub requested: Release,
    /// A required release stopped the jump short of `requested`.
    pub gated: bool,
}

impl UpdatePlan {
    /// Whether the target is already the running version.
    pub fn is_current(&self) -> bool {
        self.target.id == self.current
    }
}
