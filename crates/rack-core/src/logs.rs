//! ---
//! rack_section: "01-core-functionality"
//! rack_subsection: "module"
//! rack_type: "source"
//! rack_scope: "code"
//! rack_description: "Rollout, convergence, and local lifecycle engine."
//! rack_version: "v0.0.0-prealpha"
//! rack_owner: "tbd"
//! ---
//! Rack log streaming options.

use std::time::Duration;

/// How far back a log stream starts when no `since` is given.
pub const DEFAULT_SINCE: Duration = Duration::from_secs(120);

/// Parameters of a rack log stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogOptions {
    /// Only lines matching this pattern.
    pub filter: Option<String>,
    /// Keep the stream open for new lines.
    pub follow: bool,
    /// Start this far in the past.
    pub since: Duration,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            filter: None,
            follow: true,
            since: DEFAULT_SINCE,
        }
    }
}

impl LogOptions {
    /// Request headers understood by the rack's log endpoint.
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        let mut headers = vec![
            ("Follow", self.follow.to_string()),
            ("Since", self.since.as_secs().to_string()),
        ];
        if let Some(filter) = self.filter.as_deref().filter(|f| !f.trim().is_empty()) {
            headers.push(("Filter", filter.to_owned()));
        }
        headers
    }
}
