//! ---
//! rack_section: "14-versioning"
//! rack_subsection: "module"
//! rack_type: "source"
//! rack_scope: "code"
//! rack_description: "Release catalog and build metadata helpers."
//! rack_version: "v0.0.0-prealpha"
//! rack_owner: "tbd"
//! ---
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::catalog::Release;
use crate::error::{CatalogError, Result};

/// Wire format shared by the HTTP registry and local feed files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReleaseFeed {
    /// Published releases in any order.
    #[serde(default)]
    pub releases: Vec<Release>,
}

/// External source of the full release history. Queried fresh on every call.
#[async_trait]
pub trait VersionRegistry: Send + Sync {
    /// Fetch every known release.
    async fn fetch(&self) -> Result<Vec<Release>>;
}

/// Registry served over HTTP as a [`ReleaseFeed`] JSON document.
#[derive(Debug, Clone)]
pub struct HttpVersionRegistry {
    client: reqwest::Client,
    url: String,
}

impl HttpVersionRegistry {
    /// Default timeout for registry requests.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Build a registry for the given feed URL.
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Self::DEFAULT_TIMEOUT)
            .build()
            .map_err(|err| CatalogError::CatalogUnavailable(err.to_string()))?;
        Ok(Self::with_client(client, url))
    }

    /// Build a registry sharing an existing HTTP client.
    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    /// Feed URL this registry reads.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl VersionRegistry for HttpVersionRegistry {
    async fn fetch(&self) -> Result<Vec<Release>> {
        debug!(url = %self.url, "fetching release feed");
        let response = self.client.get(&self.url).send().await.map_err(|err| {
            warn!(url = %self.url, error = %err, "release registry unreachable");
            CatalogError::CatalogUnavailable(format!("{}: {err}", self.url))
        })?;
        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::CatalogUnavailable(format!(
                "{} returned {status}",
                self.url
            )));
        }
        let feed: ReleaseFeed = response.json().await.map_err(|err| {
            CatalogError::CatalogUnavailable(format!("malformed release feed from {}: {err}", self.url))
        })?;
        Ok(feed.releases)
    }
}

/// Registry backed by a local feed file, for offline or pinned installs.
#[derive(Debug, Clone)]
pub struct FileVersionRegistry {
    path: PathBuf,
}

impl FileVersionRegistry {
    /// Read releases from the given feed file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl VersionRegistry for FileVersionRegistry {
    async fn fetch(&self) -> Result<Vec<Release>> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|err| {
            CatalogError::CatalogUnavailable(format!(
                "failed reading release feed {}: {err}",
                self.path.display()
            ))
        })?;
        let feed: ReleaseFeed = serde_json::from_str(&raw).map_err(|err| {
            CatalogError::CatalogUnavailable(format!(
                "invalid release feed {}: {err}",
                self.path.display()
            ))
        })?;
        Ok(feed.releases)
    }
}
