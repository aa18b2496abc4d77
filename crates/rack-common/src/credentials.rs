//! ---
//! rack_section: "01-core-functionality"
//! rack_subsection: "module"
//! rack_type: "source"
//! rack_scope: "code"
//! rack_description: "Shared primitives for the rack control-plane client."
//! rack_version: "v0.0.0-prealpha"
//! rack_owner: "tbd"
//! ---
use std::fmt;

use anyhow::{anyhow, Context, Result};
use url::Url;

/// Connection details for one rack's management API.
///
/// Built once by the caller and handed to the remote accessor's constructor;
/// nothing in the workspace reads credentials from or writes them to the
/// process environment after that point.
#[derive(Clone, PartialEq, Eq)]
pub struct RackCredentials {
    pub host: String,
    pub password: Option<String>,
    /// Rack name sent with each request when the host fronts several racks.
    pub rack: Option<String>,
}

impl RackCredentials {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            password: None,
            rack: None,
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_rack(mut self, rack: impl Into<String>) -> Self {
        self.rack = Some(rack.into());
        self
    }

    /// Base URL of the management API. Bare hosts default to `https`.
    pub fn base_url(&self) -> Result<Url> {
        let host = self.host.trim().trim_end_matches('/');
        if host.is_empty() {
            return Err(anyhow!("no rack host configured"));
        }
        let raw = if host.contains("://") {
            host.to_owned()
        } else {
            format!("https://{host}")
        };
        Url::parse(&raw).with_context(|| format!("invalid rack host {}", self.host))
    }
}

impl fmt::Debug for RackCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RackCredentials")
            .field("host", &self.host)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("rack", &self.rack)
            .finish()
    }
}
