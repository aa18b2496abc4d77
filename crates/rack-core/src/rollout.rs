//! ---
//! rack_section: "01-core-functionality"
//! rack_subsection: "module"
//! rack_type: "source"
//! rack_scope: "code"
//! rack_description: "Rollout, convergence, and local lifecycle engine."
//! rack_version: "v0.0.0-prealpha"
//! rack_owner: "tbd"
//! ---
//! Triggering version transitions and supervising them until the rack settles.
//!
//! The rack never pushes state changes, so convergence is observed by polling
//! `status`. [`RolloutTracker`] remembers the worst status seen: a rack that
//! passed through `rollback` and then reports `running` again has reverted the
//! change, which is a different outcome from a clean convergence even though
//! both end in `running`.

use std::sync::Arc;
use std::time::Duration;

use rack_common::RolloutConfig;
use rack_logging::{rack_error, rack_info, rack_warn, LogContext};
use tokio::time::{interval, sleep, MissedTickBehavior};
use tracing::debug;

use crate::api::RackApi;
use crate::error::{RackError, Result};
use crate::metrics::{record_rollout, RolloutMetric};
use crate::system::{SystemState, SystemStatus};

/// Timing used while supervising.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisorSettings {
    /// Time between status polls.
    pub poll_interval: Duration,
    /// Pause after a trigger so the rack can flip to `updating` first.
    pub grace: Duration,
    /// Give up once this much time has passed without settling.
    pub deadline: Duration,
}

impl Default for SupervisorSettings {
    fn default() -> Self {
        Self::from(&RolloutConfig::default())
    }
}

impl From<&RolloutConfig> for SupervisorSettings {
    fn from(config: &RolloutConfig) -> Self {
        Self {
            poll_interval: config.poll_interval,
            grace: config.grace,
            deadline: config.deadline,
        }
    }
}

/// The rack accepted a transition; `state` is its answer to the trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolloutAck {
    /// Requested version.
    pub version: String,
    /// Rack state returned with the acceptance.
    pub state: SystemState,
}

/// Terminal, non-timeout result of supervision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RolloutOutcome {
    /// Back to `running` without any `rollback` observed.
    Converged { version: String },
    /// Back to `running` after a `rollback` was observed; the change was reverted.
    RolledBack { version: String },
}

impl RolloutOutcome {
    /// Version the rack settled at.
    pub fn version(&self) -> &str {
        match self {
            RolloutOutcome::Converged { version } | RolloutOutcome::RolledBack { version } => {
                version
            }
        }
    }

    /// Map a rollback to [`RackError::RollbackDetected`].
    pub fn ensure_converged(self) -> Result<String> {
        match self {
            RolloutOutcome::Converged { version } => Ok(version),
            RolloutOutcome::RolledBack { version } => {
                Err(RackError::RollbackDetected { version })
            }
        }
    }
}

/// Status-sequence state machine with memory across polls.
///
/// `running` only counts as terminal once the rack has been seen leaving it
/// (any non-`running` status), or, when an expected version is set, once the
/// rack reports that version.
#[derive(Debug, Clone, Default)]
pub struct RolloutTracker {
    expected_version: Option<String>,
    saw_transition: bool,
    saw_rollback: bool,
    polls: u32,
    last_status: Option<SystemStatus>,
}

impl RolloutTracker {
    /// Tracker that needs to see the rack leave `running`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Also accept `running` at `version` as convergence, for transitions that
    /// finish before the first poll.
    pub fn expecting(version: impl Into<String>) -> Self {
        Self {
            expected_version: Some(version.into()),
            ..Self::default()
        }
    }

    /// Track a transition from `previous` to `target`.
    ///
    /// When the two match, the version says nothing about progress and the
    /// tracker behaves like [`new`](Self::new).
    pub fn expecting_change(previous: &str, target: impl Into<String>) -> Self {
        let target = target.into();
        if target == previous {
            Self::new()
        } else {
            Self::expecting(target)
        }
    }

    /// Feed one observation; returns the outcome once the sequence is terminal.
    pub fn observe(&mut self, state: &SystemState) -> Option<RolloutOutcome> {
        self.polls += 1;
        self.last_status = Some(state.status.clone());
        match &state.status {
            SystemStatus::Running => {
                let reached_expected = self
                    .expected_version
                    .as_deref()
                    .is_some_and(|expected| expected == state.version);
                if !self.saw_transition && !reached_expected {
                    return None;
                }
                let version = state.version.clone();
                Some(if self.saw_rollback {
                    RolloutOutcome::RolledBack { version }
                } else {
                    RolloutOutcome::Converged { version }
                })
            }
            SystemStatus::Rollback => {
                self.saw_transition = true;
                self.saw_rollback = true;
                None
            }
            SystemStatus::Updating | SystemStatus::Other(_) => {
                self.saw_transition = true;
                None
            }
        }
    }

    /// A `rollback` status was observed.
    pub fn saw_rollback(&self) -> bool {
        self.saw_rollback
    }

    /// Observations fed so far.
    pub fn polls(&self) -> u32 {
        self.polls
    }

    /// Most recent status observed.
    pub fn last_status(&self) -> Option<&SystemStatus> {
        self.last_status.as_ref()
    }
}

/// Drives a version transition on the remote rack and waits for it to settle.
#[derive(Clone)]
pub struct RolloutSupervisor {
    api: Arc<dyn RackApi>,
    settings: SupervisorSettings,
}

impl RolloutSupervisor {
    /// Supervisor polling `api` with `settings`.
    pub fn new(api: Arc<dyn RackApi>, settings: SupervisorSettings) -> Self {
        Self { api, settings }
    }

    /// Timing in use.
    pub fn settings(&self) -> &SupervisorSettings {
        &self.settings
    }

    /// Ask the rack to move to `version`. Does not wait for completion.
    ///
    /// A refusal from the rack (already at that version, unknown version, ...)
    /// comes back verbatim as [`RackError::TriggerRejected`].
    pub async fn trigger(&self, version: &str) -> Result<RolloutAck> {
        let ctx = LogContext::new()
            .with_version(version)
            .with_operation("update");
        rack_info!(context = ctx, "triggering rack update");
        match self.api.update_system(version).await {
            Ok(state) => Ok(RolloutAck {
                version: version.to_owned(),
                state,
            }),
            Err(RackError::Api { message, .. }) => Err(RackError::TriggerRejected {
                version: version.to_owned(),
                message,
            }),
            Err(err) => Err(err),
        }
    }

    /// Poll until the rack is back to `running` or `deadline` elapses.
    pub async fn supervise(&self, deadline: Duration) -> Result<RolloutOutcome> {
        self.supervise_with(RolloutTracker::new(), deadline).await
    }

    /// Like [`supervise`](Self::supervise), also accepting `running` at `version`
    /// as converged when the transition was already over before the first poll.
    pub async fn supervise_version(
        &self,
        version: &str,
        deadline: Duration,
    ) -> Result<RolloutOutcome> {
        self.supervise_with(RolloutTracker::expecting(version), deadline)
            .await
    }

    /// Sleep for the grace period, then supervise with the configured deadline.
    pub async fn wait(&self, expected_version: Option<&str>) -> Result<RolloutOutcome> {
        sleep(self.settings.grace).await;
        let tracker = match expected_version {
            Some(version) => RolloutTracker::expecting(version),
            None => RolloutTracker::new(),
        };
        self.supervise_with(tracker, self.settings.deadline).await
    }

    /// Wait after a trigger that moves the rack from `previous` to `target`.
    ///
    /// Parameter changes keep the release, so `previous == target` there and a
    /// transition out of `running` is required before `running` counts.
    pub async fn wait_for_change(&self, previous: &str, target: &str) -> Result<RolloutOutcome> {
        sleep(self.settings.grace).await;
        self.supervise_with(
            RolloutTracker::expecting_change(previous, target),
            self.settings.deadline,
        )
        .await
    }

    async fn supervise_with(
        &self,
        mut tracker: RolloutTracker,
        deadline: Duration,
    ) -> Result<RolloutOutcome> {
        let polled = tokio::time::timeout(deadline, self.poll(&mut tracker)).await;
        match polled {
            Ok(Ok(outcome)) => {
                let metric = match &outcome {
                    RolloutOutcome::Converged { .. } => RolloutMetric::Converged,
                    RolloutOutcome::RolledBack { .. } => RolloutMetric::RolledBack,
                };
                record_rollout(metric);
                rack_info!(
                    context = LogContext::new().with_version(outcome.version()),
                    "rollout settled after {} poll(s): {:?}",
                    tracker.polls(),
                    metric
                );
                Ok(outcome)
            }
            Ok(Err(err)) => {
                record_rollout(RolloutMetric::PollError);
                rack_error!(
                    "rollout supervision aborted after {} poll(s): {}",
                    tracker.polls(),
                    err
                );
                Err(err)
            }
            Err(_) => {
                record_rollout(RolloutMetric::Timeout);
                rack_warn!(
                    "rollout not settled after {}s ({} poll(s), rollback seen: {})",
                    deadline.as_secs(),
                    tracker.polls(),
                    tracker.saw_rollback()
                );
                Err(RackError::Timeout {
                    waited: deadline,
                    last_status: tracker.last_status().cloned(),
                    rolling_back: tracker.saw_rollback(),
                })
            }
        }
    }

    async fn poll(&self, tracker: &mut RolloutTracker) -> Result<RolloutOutcome> {
        let mut ticker = interval(self.settings.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let state = self
                .api
                .get_system()
                .await
                .map_err(|err| RackError::Polling(Box::new(err)))?;
            let rolling_back_before = tracker.saw_rollback();
            let outcome = tracker.observe(&state);
            if tracker.saw_rollback() && !rolling_back_before {
                rack_warn!(
                    context = LogContext::new().with_rack(&state.name),
                    "update failed; rack is rolling back"
                );
            }
            debug!(status = %state.status, version = %state.version, "rack status polled");
            if let Some(outcome) = outcome {
                return Ok(outcome);
            }
        }
    }
}
