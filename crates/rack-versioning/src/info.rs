//! ---
//! rack_section: "14-versioning"
//! rack_subsection: "module"
//! rack_type: "source"
//! rack_scope: "code"
//! rack_description: "Release catalog and build metadata helpers."
//! rack_version: "v0.0.0-prealpha"
//! rack_owner: "tbd"
//! ---
use serde::Serialize;

/// Compile-time version metadata of the client, captured via `vergen`.
#[derive(Debug, Clone, Serialize)]
pub struct VersionInfo {
    /// Client package version.
    pub semver: String,
    /// Git commit hash captured at build time.
    pub git_sha: String,
    /// Build timestamp from the compilation environment.
    pub build_timestamp: String,
    /// Target triple used for the build.
    pub target: String,
}

impl VersionInfo {
    /// Construct a new [`VersionInfo`] instance using environment metadata.
    #[must_use]
    pub fn current() -> Self {
        Self {
            semver: env!("CARGO_PKG_VERSION").to_owned(),
            git_sha: option_env!("VERGEN_GIT_SHA")
                .unwrap_or("UNKNOWN")
                .to_owned(),
            build_timestamp: option_env!("VERGEN_BUILD_TIMESTAMP")
                .unwrap_or("UNKNOWN")
                .to_owned(),
            target: option_env!("VERGEN_CARGO_TARGET_TRIPLE")
                .unwrap_or("UNKNOWN")
                .to_owned(),
        }
    }

    /// Concise string combining package version and git hash.
    #[must_use]
    pub fn cli_string(&self) -> String {
        format!("{} ({})", self.semver, self.git_sha)
    }

    /// Extended string suitable for `--version` output.
    #[must_use]
    pub fn extended(&self) -> String {
        format!(
            "rackctl {semver} (git {sha})\nBuilt: {built}\nTarget: {target}",
            semver = self.semver,
            sha = self.git_sha,
            built = self.build_timestamp,
            target = self.target
        )
    }
}
