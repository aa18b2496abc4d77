//! ---
//! rack_section: "01-core-functionality"
//! rack_subsection: "module"
//! rack_type: "source"
//! rack_scope: "code"
//! rack_description: "Rollout, convergence, and local lifecycle engine."
//! rack_version: "v0.0.0-prealpha"
//! rack_owner: "tbd"
//! ---
//! Local control plane: one containerized rack per name, torn down on Ctrl-C.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use rack_common::LocalConfig;
use rack_logging::{log_system_event, rack_info, rack_warn, LogContext, SystemEventOutcome};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{RackError, Result};

/// Label key carrying the rack name.
pub const RACK_LABEL: &str = "rack";
/// Label key carrying the workload kind.
pub const TYPE_LABEL: &str = "type";
/// Workload kind of local racks.
pub const TYPE_RACK: &str = "rack";

const CONTAINER_STORAGE: &str = "/var/rack";
const DOCKER_SOCKET: &str = "/var/run/docker.sock";

/// Host directory backing the local rack's persistent storage.
pub fn default_storage_root() -> PathBuf {
    if cfg!(target_os = "macos") {
        PathBuf::from("/Users/Shared/rack")
    } else {
        PathBuf::from(CONTAINER_STORAGE)
    }
}

/// Everything needed to launch one local rack container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalRackSpec {
    /// Container and rack name.
    pub name: String,
    /// Image tag to run.
    pub version: String,
    /// Router network address.
    pub router: String,
    /// Image repository.
    pub image: String,
    /// Memory ceiling in docker notation.
    pub memory: String,
    /// Container port of the management API.
    pub api_port: u16,
    /// Host directory for persistent storage.
    pub storage_root: PathBuf,
}

impl LocalRackSpec {
    /// Spec from built-in defaults.
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        router: impl Into<String>,
    ) -> Self {
        Self::from_config(&LocalConfig::default(), version)
            .with_name(name)
            .with_router(router)
    }

    /// Spec from `[local]` settings.
    pub fn from_config(config: &LocalConfig, version: impl Into<String>) -> Self {
        Self {
            name: config.name.clone(),
            version: version.into(),
            router: config.router.clone(),
            image: config.image.clone(),
            memory: config.memory.clone(),
            api_port: config.api_port,
            storage_root: config.volume.clone().unwrap_or_else(default_storage_root),
        }
    }

    /// Override the container name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Override the router address.
    pub fn with_router(mut self, router: impl Into<String>) -> Self {
        self.router = router.into();
        self
    }

    /// `<image>:<version>`.
    pub fn image_ref(&self) -> String {
        format!("{}:{}", self.image, self.version)
    }

    /// Arguments for `docker run`, attached and removed on exit.
    pub fn docker_args(&self) -> Vec<String> {
        let storage = self.storage_root.display().to_string();
        let mut args: Vec<String> = vec!["run".into(), "--rm".into()];
        for env in [
            "COMBINED=true".to_owned(),
            "PROVIDER=local".to_owned(),
            format!("PROVIDER_ROUTER={}", self.router),
            format!("PROVIDER_VOLUME={storage}"),
            format!("RACK={}", self.name),
            format!("VERSION={}", self.version),
        ] {
            args.push("-e".into());
            args.push(env);
        }
        args.push("-i".into());
        args.extend([
            "--label".into(),
            format!("{RACK_LABEL}={}", self.name),
            "--label".into(),
            format!("{TYPE_LABEL}={TYPE_RACK}"),
            "-m".into(),
            self.memory.clone(),
            "--name".into(),
            self.name.clone(),
            "-p".into(),
            self.api_port.to_string(),
            "-v".into(),
            format!("{storage}:{CONTAINER_STORAGE}"),
            "-v".into(),
            format!("{DOCKER_SOCKET}:{DOCKER_SOCKET}"),
            self.image_ref(),
        ]);
        args
    }
}

/// Exit status of an attached container run. `code` is `None` when the
/// runtime process itself was killed by a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerExit {
    /// Process exit code.
    pub code: Option<i32>,
}

impl ContainerExit {
    /// Exited with status 0.
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Process-execution boundary for sandboxed workloads.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Remove the named container if present. Absence is not an error.
    async fn remove_force(&self, name: &str) -> Result<()>;

    /// Run in the foreground with stdio attached to ours.
    async fn run_attached(&self, args: &[String]) -> Result<ContainerExit>;

    /// Ask the named container to stop.
    async fn stop(&self, name: &str) -> Result<()>;

    /// Names of running containers carrying `label` (`key=value`).
    async fn list_by_label(&self, label: &str) -> Result<Vec<String>>;
}

/// [`ContainerRuntime`] backed by the `docker` command line.
#[derive(Debug, Clone)]
pub struct DockerCli {
    binary: PathBuf,
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new("docker")
    }
}

impl DockerCli {
    /// Runtime invoking `binary`.
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Docker executable in use.
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.binary);
        command.kill_on_drop(true);
        command
    }
}

#[async_trait]
impl ContainerRuntime for DockerCli {
    async fn remove_force(&self, name: &str) -> Result<()> {
        self.command()
            .args(["rm", "-f", name])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|err| RackError::local(name, format!("docker rm failed to start: {err}")))?;
        Ok(())
    }

    async fn run_attached(&self, args: &[String]) -> Result<ContainerExit> {
        let name = args
            .iter()
            .position(|arg| arg == "--name")
            .and_then(|idx| args.get(idx + 1))
            .map(String::as_str)
            .unwrap_or("rack");
        let status = self
            .command()
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|err| RackError::local(name, format!("docker run failed to start: {err}")))?;
        Ok(ContainerExit {
            code: status.code(),
        })
    }

    async fn stop(&self, name: &str) -> Result<()> {
        let output = self
            .command()
            .args(["stop", name])
            .output()
            .await
            .map_err(|err| RackError::local(name, format!("docker stop failed to start: {err}")))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RackError::local(name, format!("docker stop: {}", stderr.trim())));
        }
        Ok(())
    }

    async fn list_by_label(&self, label: &str) -> Result<Vec<String>> {
        let filter = format!("label={label}");
        let output = self
            .command()
            .args(["ps", "--filter", filter.as_str(), "--format", "{{.Names}}"])
            .output()
            .await
            .map_err(|err| RackError::local(label, format!("docker ps failed to start: {err}")))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RackError::local(label, format!("docker ps: {}", stderr.trim())));
        }
        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_owned)
            .collect())
    }
}

/// How a foreground local rack run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalRackExit {
    /// Container name.
    pub name: String,
    /// Exit code of the foreground run.
    pub code: Option<i32>,
    /// A shutdown signal stopped the rack.
    pub stopped_by_signal: bool,
}

impl LocalRackExit {
    /// A run interrupted by the operator counts as a clean shutdown.
    pub fn success(&self) -> bool {
        self.stopped_by_signal || self.code == Some(0)
    }
}

/// Starts, stops, and discovers local racks through a [`ContainerRuntime`].
#[derive(Clone)]
pub struct LocalRackManager {
    runtime: Arc<dyn ContainerRuntime>,
}

impl LocalRackManager {
    /// Manager over the given runtime.
    pub fn new(runtime: Arc<dyn ContainerRuntime>) -> Self {
        Self { runtime }
    }

    /// Run the rack in the foreground, stopping it on SIGINT/SIGTERM.
    pub async fn start(&self, spec: &LocalRackSpec) -> Result<LocalRackExit> {
        let (tx, rx) = mpsc::unbounded_channel();
        let forwarder = tokio::spawn(forward_os_signals(tx));
        let result = self.start_with_signals(spec, rx).await;
        forwarder.abort();
        result
    }

    /// Same as [`start`](Self::start) with shutdown requests read from `signals`.
    pub async fn start_with_signals(
        &self,
        spec: &LocalRackSpec,
        signals: mpsc::UnboundedReceiver<()>,
    ) -> Result<LocalRackExit> {
        let ctx = LogContext::new()
            .with_rack(&spec.name)
            .with_version(&spec.version)
            .with_operation("start");

        self.runtime.remove_force(&spec.name).await?;
        rack_info!(context = ctx, "starting local rack from {}", spec.image_ref());

        let stopped = Arc::new(AtomicBool::new(false));
        let listener = self.spawn_shutdown_listener(spec.name.clone(), signals, stopped.clone());
        let run = self.runtime.run_attached(&spec.docker_args()).await;
        listener.abort();

        let exit = match run {
            Ok(exit) => exit,
            Err(err) => {
                log_system_event(
                    Some(&ctx),
                    "local.start",
                    &err.to_string(),
                    SystemEventOutcome::Fault,
                );
                return Err(err);
            }
        };
        let exit = LocalRackExit {
            name: spec.name.clone(),
            code: exit.code,
            stopped_by_signal: stopped.load(Ordering::SeqCst),
        };
        let outcome = if exit.success() {
            SystemEventOutcome::Success
        } else {
            SystemEventOutcome::Fault
        };
        log_system_event(Some(&ctx), "local.exit", "local rack exited", outcome);
        Ok(exit)
    }

    /// Stop the named local rack.
    pub async fn stop(&self, name: &str) -> Result<()> {
        self.runtime.stop(name).await
    }

    /// Number of running local racks of any name.
    pub async fn discover(&self) -> Result<usize> {
        let label = format!("{TYPE_LABEL}={TYPE_RACK}");
        Ok(self.runtime.list_by_label(&label).await?.len())
    }

    /// Any local rack is running. Discovery errors count as no.
    pub async fn is_running(&self) -> bool {
        matches!(self.discover().await, Ok(count) if count > 0)
    }

    fn spawn_shutdown_listener(
        &self,
        name: String,
        mut signals: mpsc::UnboundedReceiver<()>,
        stopped: Arc<AtomicBool>,
    ) -> JoinHandle<()> {
        let runtime = self.runtime.clone();
        tokio::spawn(async move {
            while signals.recv().await.is_some() {
                if stopped.swap(true, Ordering::SeqCst) {
                    continue;
                }
                eprintln!("\nstopping: {name}");
                if let Err(err) = runtime.stop(&name).await {
                    rack_warn!(
                        context = LogContext::new().with_rack(&name),
                        "failed to stop local rack: {err}"
                    );
                }
            }
        })
    }
}

async fn forward_os_signals(tx: mpsc::UnboundedSender<()>) {
    loop {
        if !wait_for_signal().await {
            break;
        }
        if tx.send(()).is_err() {
            break;
        }
    }
}

#[cfg(unix)]
async fn wait_for_signal() -> bool {
    use tokio::signal::unix::{signal, SignalKind};

    let (Ok(mut interrupt), Ok(mut terminate)) = (
        signal(SignalKind::interrupt()),
        signal(SignalKind::terminate()),
    ) else {
        return false;
    };
    tokio::select! {
        received = interrupt.recv() => received.is_some(),
        received = terminate.recv() => received.is_some(),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> bool {
    tokio::signal::ctrl_c().await.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn docker_args_follow_launch_contract() {
        let mut spec = LocalRackSpec::new("devbox", "20200301000000", "10.42.0.0");
        spec.storage_root = PathBuf::from("/var/rack");
        let args = spec.docker_args();
        assert_eq!(&args[..2], ["run", "--rm"]);
        for expected in [
            "COMBINED=true",
            "PROVIDER=local",
            "PROVIDER_ROUTER=10.42.0.0",
            "PROVIDER_VOLUME=/var/rack",
            "RACK=devbox",
            "VERSION=20200301000000",
            "rack=devbox",
            "type=rack",
            "256m",
            "5443",
            "/var/rack:/var/rack",
            "/var/run/docker.sock:/var/run/docker.sock",
        ] {
            assert!(args.iter().any(|arg| arg == expected), "missing {expected}");
        }
        assert!(args.contains(&"-i".to_owned()));
        assert_eq!(args.last().map(String::as_str), Some("rack/rack:20200301000000"));
    }

    #[test]
    fn volume_override_wins() {
        let config = LocalConfig {
            volume: Some(PathBuf::from("/srv/rack")),
            ..LocalConfig::default()
        };
        let spec = LocalRackSpec::from_config(&config, "20200101000000");
        assert!(spec.docker_args().contains(&"/srv/rack:/var/rack".to_owned()));
    }
}
