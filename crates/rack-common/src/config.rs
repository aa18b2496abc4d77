//! ---
//! rack_section: "01-core-functionality"
//! rack_subsection: "module"
//! rack_type: "source"
//! rack_scope: "code"
//! rack_description: "Shared primitives for the rack control-plane client."
//! rack_version: "v0.0.0-prealpha"
//! rack_owner: "tbd"
//! ---
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationSeconds};
use tracing::debug;
use url::Url;

use crate::logging::LogFormat;

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_registry_url() -> String {
    "https://releases.rack.invalid/versions.json".to_owned()
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(2)
}

fn default_grace() -> Duration {
    Duration::from_secs(5)
}

fn default_deadline() -> Duration {
    Duration::from_secs(30 * 60)
}

fn default_image() -> String {
    "rack/rack".to_owned()
}

fn default_memory() -> String {
    "256m".to_owned()
}

fn default_api_port() -> u16 {
    5443
}

fn default_docker_binary() -> PathBuf {
    PathBuf::from("docker")
}

fn default_local_name() -> String {
    "rack".to_owned()
}

fn default_router() -> String {
    "10.42.0.0".to_owned()
}

fn default_log_format() -> LogFormat {
    LogFormat::Pretty
}

/// Primary configuration object for `rackctl`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RackConfig {
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub rollout: RolloutConfig,
    #[serde(default)]
    pub local: LocalConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Metadata describing where a [`RackConfig`] was loaded from.
#[derive(Debug, Clone)]
pub struct LoadedRackConfig {
    pub config: RackConfig,
    /// `None` when no file was found and defaults are in effect.
    pub source: Option<PathBuf>,
}

impl RackConfig {
    pub const ENV_CONFIG_PATH: &'static str = "RACK_CONFIG";

    /// Default lookup locations, most specific first.
    pub fn default_candidates() -> Vec<PathBuf> {
        let mut candidates = Vec::new();
        if let Some(home) = std::env::var_os("HOME") {
            candidates.push(PathBuf::from(home).join(".config/rack/config.toml"));
        }
        candidates.push(PathBuf::from("rack.toml"));
        candidates
    }

    /// Load configuration from disk, respecting the `RACK_CONFIG` override.
    pub fn load<P: AsRef<Path>>(candidates: &[P]) -> Result<Self> {
        Ok(Self::load_with_source(candidates)?.config)
    }

    /// Load configuration together with the effective source path.
    ///
    /// An explicit `RACK_CONFIG` path must exist. Otherwise the first existing
    /// candidate wins, and built-in defaults apply when none exists.
    pub fn load_with_source<P: AsRef<Path>>(candidates: &[P]) -> Result<LoadedRackConfig> {
        if let Ok(env_path) = std::env::var(Self::ENV_CONFIG_PATH) {
            if !env_path.trim().is_empty() {
                let path = PathBuf::from(env_path);
                let config = Self::from_path(&path)?;
                return Ok(LoadedRackConfig {
                    config,
                    source: Some(path),
                });
            }
        }

        for candidate in candidates {
            let path = candidate.as_ref();
            if path.exists() {
                let config = Self::from_path(path)?;
                return Ok(LoadedRackConfig {
                    config,
                    source: Some(path.to_path_buf()),
                });
            }
        }

        debug!("no configuration file found; using defaults");
        Ok(LoadedRackConfig {
            config: Self::default(),
            source: None,
        })
    }

    fn from_path(path: &Path) -> Result<Self> {
        debug!(config_path = %path.display(), "loading configuration");
        let contents = fs::read_to_string(path)
            .with_context(|| format!("unable to read config file {}", path.display()))?;
        contents
            .parse::<RackConfig>()
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    /// Validate structural invariants.
    pub fn validate(&self) -> Result<()> {
        self.registry.validate()?;
        self.rollout.validate()?;
        self.local.validate()?;
        Ok(())
    }
}

impl std::str::FromStr for RackConfig {
    type Err = anyhow::Error;

    fn from_str(content: &str) -> std::result::Result<Self, Self::Err> {
        let config: RackConfig =
            toml::from_str(content).with_context(|| "failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }
}

/// Where the rack management API lives. Secrets never come from this section.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub rack: Option<String>,
    #[serde(default = "default_request_timeout")]
    #[serde_as(as = "DurationSeconds<u64>")]
    pub request_timeout: Duration,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            host: None,
            rack: None,
            request_timeout: default_request_timeout(),
        }
    }
}

/// Source of the published release history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default = "default_registry_url")]
    pub url: String,
    /// Local feed file; takes precedence over `url` when set.
    #[serde(default)]
    pub feed_path: Option<PathBuf>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            url: default_registry_url(),
            feed_path: None,
        }
    }
}

impl RegistryConfig {
    pub fn validate(&self) -> Result<()> {
        if self.feed_path.is_none() {
            Url::parse(&self.url)
                .with_context(|| format!("registry url {} is not a valid URL", self.url))?;
        }
        Ok(())
    }
}

/// Timing of rollout supervision.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RolloutConfig {
    #[serde(default = "default_poll_interval")]
    #[serde_as(as = "DurationSeconds<u64>")]
    pub poll_interval: Duration,
    /// Delay between triggering a change and the first status poll.
    #[serde(default = "default_grace")]
    #[serde_as(as = "DurationSeconds<u64>")]
    pub grace: Duration,
    #[serde(default = "default_deadline")]
    #[serde_as(as = "DurationSeconds<u64>")]
    pub deadline: Duration,
}

impl Default for RolloutConfig {
    fn default() -> Self {
        Self {
            poll_interval: default_poll_interval(),
            grace: default_grace(),
            deadline: default_deadline(),
        }
    }
}

impl RolloutConfig {
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            return Err(anyhow!("rollout poll_interval must be greater than zero"));
        }
        if self.deadline < self.poll_interval {
            return Err(anyhow!(
                "rollout deadline ({}s) must not be shorter than poll_interval ({}s)",
                self.deadline.as_secs(),
                self.poll_interval.as_secs()
            ));
        }
        Ok(())
    }
}

/// Settings for the locally hosted rack container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalConfig {
    #[serde(default = "default_image")]
    pub image: String,
    #[serde(default = "default_memory")]
    pub memory: String,
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    #[serde(default = "default_docker_binary")]
    pub docker_binary: PathBuf,
    /// Overrides the platform storage root.
    #[serde(default)]
    pub volume: Option<PathBuf>,
    #[serde(default = "default_local_name")]
    pub name: String,
    #[serde(default = "default_router")]
    pub router: String,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            image: default_image(),
            memory: default_memory(),
            api_port: default_api_port(),
            docker_binary: default_docker_binary(),
            volume: None,
            name: default_local_name(),
            router: default_router(),
        }
    }
}

impl LocalConfig {
    pub fn validate(&self) -> Result<()> {
        if self.image.trim().is_empty() {
            return Err(anyhow!("local image must not be empty"));
        }
        if self.memory.trim().is_empty() {
            return Err(anyhow!("local memory ceiling must not be empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    /// Enables a daily rolling JSON log file in this directory.
    #[serde(default)]
    pub directory: Option<PathBuf>,
    #[serde(default)]
    pub file_prefix: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: default_log_format(),
            directory: None,
            file_prefix: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_rollout_contract() {
        let config = RackConfig::default();
        assert_eq!(config.rollout.poll_interval, Duration::from_secs(2));
        assert_eq!(config.rollout.grace, Duration::from_secs(5));
        assert_eq!(config.rollout.deadline, Duration::from_secs(1800));
        assert_eq!(config.local.memory, "256m");
        assert_eq!(config.local.router, "10.42.0.0");
        config.validate().unwrap();
    }

    #[test]
    fn parses_partial_toml() {
        let config: RackConfig = r#"
            [remote]
            host = "rack.example.org"
            rack = "production"

            [rollout]
            deadline = 600

            [logging]
            format = "structured-json"
        "#
        .parse()
        .unwrap();
        assert_eq!(config.remote.host.as_deref(), Some("rack.example.org"));
        assert_eq!(config.rollout.deadline, Duration::from_secs(600));
        assert_eq!(config.rollout.poll_interval, Duration::from_secs(2));
        assert_eq!(config.logging.format, LogFormat::StructuredJson);
    }

    #[test]
    fn rejects_zero_poll_interval() {
        let err = "[rollout]\npoll_interval = 0\n"
            .parse::<RackConfig>()
            .unwrap_err();
        assert!(format!("{err:#}").contains("poll_interval"));
    }

    #[test]
    fn rejects_deadline_shorter_than_interval() {
        let err = "[rollout]\npoll_interval = 10\ndeadline = 5\n"
            .parse::<RackConfig>()
            .unwrap_err();
        assert!(format!("{err:#}").contains("deadline"));
    }

    #[test]
    fn rejects_invalid_registry_url() {
        let err = "[registry]\nurl = \"not a url\"\n"
            .parse::<RackConfig>()
            .unwrap_err();
        assert!(format!("{err:#}").contains("registry url"));
    }

    #[test]
    fn feed_path_skips_url_validation() {
        let config: RackConfig = "[registry]\nurl = \"\"\nfeed_path = \"feed.json\"\n"
            .parse()
            .unwrap();
        assert_eq!(config.registry.feed_path, Some(PathBuf::from("feed.json")));
    }

    #[test]
    fn first_existing_candidate_wins() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        let present = dir.path().join("present.toml");
        fs::write(&present, "[local]\nname = \"devbox\"\n").unwrap();

        let loaded = RackConfig::load_with_source(&[missing, present.clone()]).unwrap();
        assert_eq!(loaded.source, Some(present));
        assert_eq!(loaded.config.local.name, "devbox");
    }

    #[test]
    fn no_candidates_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = RackConfig::load_with_source(&[dir.path().join("absent.toml")]).unwrap();
        assert!(loaded.source.is_none());
        assert_eq!(loaded.config.local.image, "rack/rack");
    }
}
