//! Async-completion poller
//!
//! Waiting on an asynchronous backend operation is split in three parts:
//!
//! - [`Observation`]: what one poll saw (a status string, a 404, or a 409).
//! - [`WaitSpec::next`]: a pure transition from an observation to
//!   [`WaitState::Pending`] or [`WaitState::Done`], driven by the call site's
//!   explicit pending, target, and failed sets.
//! - [`wait_for`]: the timing loop (initial delay, interval, deadline).
//!
//! Every call site declares its own sets. An empty status string is only
//! meaningful at call sites that list it.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;

use crate::provider::{ErrorKind, ProviderError, ProviderResult};

/// Status reported once a 404 satisfies a "deleted" wait
pub const DELETED: &str = "deleted";

/// Status reported for a pending 409
pub const CONFLICT: &str = "conflict";

/// Result of one poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    /// The backend reported this lifecycle status
    Status(String),
    /// The backend answered 404
    NotFound,
    /// The backend answered 409 with this message
    Conflict(String),
}

impl Observation {
    pub fn status(s: impl Into<String>) -> Self {
        Observation::Status(s.into())
    }
}

/// What a 404 means for a wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnNotFound {
    /// The awaited condition is "gone"
    Done,
    /// Eventual consistency: keep polling
    Pending,
    /// The resource vanished while we waited for it
    Error,
}

/// Outcome of one transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitState {
    Pending(String),
    Done(String),
}

#[derive(Debug, Error)]
pub enum WaitError {
    #[error("timeout while waiting for {name} after {timeout:?} (last state: '{last_state}')")]
    Timeout {
        name: String,
        timeout: Duration,
        last_state: String,
    },

    #[error("{name} reached failed state '{state}'")]
    Failed { name: String, state: String },

    #[error("unexpected state '{state}' while waiting for {name}, wanted one of: {}", target.join(", "))]
    UnexpectedState {
        name: String,
        state: String,
        target: Vec<String>,
    },

    #[error("{name}: resource not found")]
    NotFound { name: String },

    #[error("{name}: conflict: {message}")]
    Conflict { name: String, message: String },

    #[error("{name}: {source}")]
    Refresh {
        name: String,
        #[source]
        source: ProviderError,
    },
}

impl From<WaitError> for ProviderError {
    fn from(err: WaitError) -> Self {
        let err = match err {
            WaitError::Refresh { source, .. } => return source,
            other => other,
        };
        let kind = match &err {
            WaitError::Timeout { .. } => ErrorKind::Timeout,
            WaitError::NotFound { .. } => ErrorKind::NotFound,
            WaitError::Conflict { .. } => ErrorKind::Conflict,
            _ => ErrorKind::Api,
        };
        ProviderError::new(err.to_string())
            .with_kind(kind)
            .with_cause(err)
    }
}

/// Terminal-state sets for one wait call site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitSpec {
    pub name: &'static str,
    pub pending: &'static [&'static str],
    pub target: &'static [&'static str],
    pub failed: &'static [&'static str],
    pub on_not_found: OnNotFound,
    /// Treat 409 as pending instead of an error
    pub conflict_pending: bool,
}

impl WaitSpec {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            pending: &[],
            target: &[],
            failed: &[],
            on_not_found: OnNotFound::Error,
            conflict_pending: false,
        }
    }

    pub const fn pending(mut self, pending: &'static [&'static str]) -> Self {
        self.pending = pending;
        self
    }

    pub const fn target(mut self, target: &'static [&'static str]) -> Self {
        self.target = target;
        self
    }

    pub const fn failed(mut self, failed: &'static [&'static str]) -> Self {
        self.failed = failed;
        self
    }

    pub const fn on_not_found(mut self, on_not_found: OnNotFound) -> Self {
        self.on_not_found = on_not_found;
        self
    }

    pub const fn conflict_pending(mut self) -> Self {
        self.conflict_pending = true;
        self
    }

    /// Pure transition from one observation to the next state
    pub fn next(&self, observation: &Observation) -> Result<WaitState, WaitError> {
        match observation {
            Observation::NotFound => match self.on_not_found {
                OnNotFound::Done => Ok(WaitState::Done(DELETED.to_string())),
                OnNotFound::Pending => Ok(WaitState::Pending("not_found".to_string())),
                OnNotFound::Error => Err(WaitError::NotFound {
                    name: self.name.to_string(),
                }),
            },
            Observation::Conflict(message) => {
                if self.conflict_pending {
                    Ok(WaitState::Pending(CONFLICT.to_string()))
                } else {
                    Err(WaitError::Conflict {
                        name: self.name.to_string(),
                        message: message.clone(),
                    })
                }
            }
            Observation::Status(status) => {
                let status = status.as_str();
                let listed = |set: &[&str]| set.iter().any(|s| *s == status);
                if listed(self.failed) {
                    Err(WaitError::Failed {
                        name: self.name.to_string(),
                        state: status.to_string(),
                    })
                } else if listed(self.target) {
                    Ok(WaitState::Done(status.to_string()))
                } else if listed(self.pending) {
                    Ok(WaitState::Pending(status.to_string()))
                } else {
                    Err(WaitError::UnexpectedState {
                        name: self.name.to_string(),
                        state: status.to_string(),
                        target: self.target.iter().map(|s| s.to_string()).collect(),
                    })
                }
            }
        }
    }
}

/// Timing of a wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Sleep before the first poll
    pub delay: Duration,
    /// Sleep between polls
    pub interval: Duration,
    /// Give up after this long
    pub timeout: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(10),
            interval: Duration::from_secs(10),
            timeout: Duration::from_secs(10 * 60),
        }
    }
}

impl PollConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Poll `refresh` until `spec` reaches a target state or the timeout expires.
///
/// Returns the terminal status. Refresh errors end the wait immediately.
pub async fn wait_for<F, Fut>(
    spec: &WaitSpec,
    config: &PollConfig,
    mut refresh: F,
) -> Result<String, WaitError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ProviderResult<Observation>>,
{
    let started = Instant::now();
    let deadline = started + config.timeout;
    let mut last_state = String::new();

    if !config.delay.is_zero() {
        tokio::time::sleep(config.delay.min(config.timeout)).await;
    }

    loop {
        let observation = refresh().await.map_err(|source| WaitError::Refresh {
            name: spec.name.to_string(),
            source,
        })?;

        match spec.next(&observation)? {
            WaitState::Done(status) => {
                log::info!(
                    "{}: reached '{}' after {:?}",
                    spec.name,
                    status,
                    started.elapsed()
                );
                return Ok(status);
            }
            WaitState::Pending(status) => {
                log::debug!("{}: still '{}'", spec.name, status);
                last_state = status;
            }
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(WaitError::Timeout {
                name: spec.name.to_string(),
                timeout: config.timeout,
                last_state,
            });
        }
        tokio::time::sleep(config.interval.min(deadline - now)).await;
    }
}
