//! ---
//! rack_section: "01-core-functionality"
//! rack_subsection: "module"
//! rack_type: "source"
//! rack_scope: "code"
//! rack_description: "Rollout, convergence, and local lifecycle engine."
//! rack_version: "v0.0.0-prealpha"
//! rack_owner: "tbd"
//! ---
use std::time::Duration;

use rack_versioning::CatalogError;
use thiserror::Error;

use crate::system::SystemStatus;

/// Result alias for rack operations.
pub type Result<T> = std::result::Result<T, RackError>;

/// Message fragment the rack API uses when a change would not alter anything.
pub(crate) const NOOP_MARKER: &str = "no updates are to be performed";

/// Failures of rack operations.
#[derive(Debug, Error)]
pub enum RackError {
    /// Release catalog lookup or fetch failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    /// The rack refused to start a version transition.
    #[error("update to {version} rejected: {message}")]
    TriggerRejected {
        /// Requested version.
        version: String,
        /// Reason given by the rack.
        message: String,
    },
    /// The requested values already match the rack's configuration.
    #[error("No updates are to be performed")]
    NoopUpdate,
    /// Polling the rack failed; supervision stopped.
    #[error("status poll failed: {0}")]
    Polling(#[source] Box<RackError>),
    /// No terminal status within the deadline.
    #[error("{}", timeout_message(.waited, .rolling_back))]
    Timeout {
        /// Deadline that elapsed.
        waited: Duration,
        /// Last status observed, if any poll succeeded.
        last_status: Option<SystemStatus>,
        /// A rollback was seen and had not finished.
        rolling_back: bool,
    },
    /// The rack reverted the change and is running again.
    #[error("Update rolled back; rack is running {version}")]
    RollbackDetected {
        /// Version the rack is back on.
        version: String,
    },
    /// Starting or stopping a local rack failed.
    #[error("local rack {name}: {message}")]
    LocalLifecycle {
        /// Container name.
        name: String,
        /// What went wrong.
        message: String,
    },
    /// HTTP transport failure.
    #[error("rack api request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// Non-success reply from the rack API.
    #[error("rack api returned {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error text from the reply body.
        message: String,
    },
    /// Writing streamed output failed.
    #[error("writing output failed: {0}")]
    Output(#[from] std::io::Error),
    /// Malformed caller input.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Client configuration is unusable.
    #[error("configuration error: {0}")]
    Config(String),
}

impl RackError {
    /// Whether this error is the non-fatal "nothing to change" notice.
    pub fn is_noop(&self) -> bool {
        matches!(self, RackError::NoopUpdate)
    }

    pub(crate) fn local(name: &str, message: impl Into<String>) -> Self {
        RackError::LocalLifecycle {
            name: name.to_owned(),
            message: message.into(),
        }
    }
}

fn timeout_message(waited: &Duration, rolling_back: &bool) -> String {
    if *rolling_back {
        format!(
            "timeout: rollback still in progress after {}s",
            waited.as_secs()
        )
    } else {
        format!(
            "timeout: rack did not converge within {}s",
            waited.as_secs()
        )
    }
}

/// Whether a remote failure message reports that nothing would change.
pub(crate) fn is_noop_message(message: &str) -> bool {
    message.to_ascii_lowercase().contains(NOOP_MARKER)
}
