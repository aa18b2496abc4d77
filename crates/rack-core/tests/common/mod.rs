//! Scripted in-memory rack used by the rack-core integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use parking_lot::Mutex;
use rack_core::{
    ContainerExit, ContainerRuntime, LogOptions, ParameterSet, RackApi, RackError, Result,
    ScaleRequest, SystemProcess, SystemRelease, SystemState,
};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Notify;

pub const SYSTEM: &str = "production";

/// Replays a status script on `get_system`; the final entry repeats forever.
#[derive(Default)]
pub struct ScriptedRack {
    script: Mutex<VecDeque<std::result::Result<SystemState, String>>>,
    last: Mutex<Option<SystemState>>,
    pub polls: AtomicUsize,
    pub updates: Mutex<Vec<String>>,
    pub update_error: Mutex<Option<String>>,
    pub params: Mutex<IndexMap<String, String>>,
    pub params_error: Mutex<Option<String>>,
    pub scales: Mutex<Vec<ScaleRequest>>,
    pub processes: Mutex<Vec<SystemProcess>>,
    pub process_queries: Mutex<Vec<bool>>,
    pub log_lines: Mutex<Vec<String>>,
    pub log_requests: Mutex<Vec<LogOptions>>,
}

impl ScriptedRack {
    pub fn with_statuses(version: &str, statuses: &[&str]) -> Arc<Self> {
        rack_logging::init();
        let rack = Self::default();
        {
            let mut script = rack.script.lock();
            for status in statuses {
                script.push_back(Ok(SystemState::new(SYSTEM, *status, version)));
            }
        }
        Arc::new(rack)
    }

    pub fn push_state(&self, state: SystemState) {
        self.script.lock().push_back(Ok(state));
    }

    pub fn push_poll_error(&self, message: &str) {
        self.script.lock().push_back(Err(message.to_owned()));
    }

    pub fn reject_updates(&self, message: &str) {
        *self.update_error.lock() = Some(message.to_owned());
    }

    pub fn reject_params(&self, message: &str) {
        *self.params_error.lock() = Some(message.to_owned());
    }

    pub fn poll_count(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }
}

fn api_error(message: &str) -> RackError {
    RackError::Api {
        status: 403,
        message: message.to_owned(),
    }
}

#[async_trait]
impl RackApi for ScriptedRack {
    async fn get_system(&self) -> Result<SystemState> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().pop_front();
        match next {
            Some(Ok(state)) => {
                *self.last.lock() = Some(state.clone());
                Ok(state)
            }
            Some(Err(message)) => Err(api_error(&message)),
            None => self
                .last
                .lock()
                .clone()
                .ok_or_else(|| api_error("no scripted state")),
        }
    }

    async fn update_system(&self, version: &str) -> Result<SystemState> {
        if let Some(message) = self.update_error.lock().clone() {
            return Err(api_error(&message));
        }
        self.updates.lock().push(version.to_owned());
        Ok(SystemState::new(SYSTEM, "updating", version))
    }

    async fn list_parameters(&self, _system: &str) -> Result<IndexMap<String, String>> {
        Ok(self.params.lock().clone())
    }

    async fn set_parameters(&self, _system: &str, params: &ParameterSet) -> Result<()> {
        if let Some(message) = self.params_error.lock().clone() {
            return Err(api_error(&message));
        }
        let mut stored = self.params.lock();
        for (name, value) in params.iter() {
            stored.insert(name.to_owned(), value.to_owned());
        }
        Ok(())
    }

    async fn scale_system(&self, request: &ScaleRequest) -> Result<SystemState> {
        self.scales.lock().push(request.clone());
        let mut state = SystemState::new(SYSTEM, "updating", "20200201000000");
        state.count = request.count;
        state.instance_type = request.instance_type.clone();
        Ok(state)
    }

    async fn list_releases(&self) -> Result<Vec<SystemRelease>> {
        Ok(Vec::new())
    }

    async fn list_processes(&self, all: bool) -> Result<Vec<SystemProcess>> {
        self.process_queries.lock().push(all);
        Ok(self.processes.lock().clone())
    }

    async fn stream_logs(
        &self,
        options: &LogOptions,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<u64> {
        self.log_requests.lock().push(options.clone());
        let lines = self.log_lines.lock().clone();
        let mut written = 0u64;
        for line in lines {
            let line = format!("{line}\n");
            sink.write_all(line.as_bytes()).await?;
            written += line.len() as u64;
        }
        Ok(written)
    }
}

/// Container runtime that records calls and blocks `run_attached` until `stop`.
#[derive(Default)]
pub struct FakeRuntime {
    pub calls: Mutex<Vec<String>>,
    pub running: Mutex<Vec<String>>,
    stopped: Notify,
}

impl FakeRuntime {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
    async fn remove_force(&self, name: &str) -> Result<()> {
        self.calls.lock().push(format!("rm {name}"));
        self.running.lock().retain(|running| running != name);
        Ok(())
    }

    async fn run_attached(&self, args: &[String]) -> Result<ContainerExit> {
        let name = args
            .iter()
            .position(|arg| arg == "--name")
            .and_then(|idx| args.get(idx + 1))
            .cloned()
            .unwrap_or_default();
        {
            let mut running = self.running.lock();
            assert!(
                !running.contains(&name),
                "container {name} started while another instance exists"
            );
            running.push(name.clone());
        }
        self.calls.lock().push(format!("run {name}"));
        self.stopped.notified().await;
        self.running.lock().retain(|running| running != &name);
        Ok(ContainerExit { code: Some(137) })
    }

    async fn stop(&self, name: &str) -> Result<()> {
        self.calls.lock().push(format!("stop {name}"));
        self.stopped.notify_one();
        Ok(())
    }

    async fn list_by_label(&self, _label: &str) -> Result<Vec<String>> {
        Ok(self.running.lock().clone())
    }
}
