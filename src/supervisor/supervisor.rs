//! Runs one candidate end to end.
//!
//! The elector runs as its own task so lease renewal never waits on work.
//! The calling task blocks on the gate and then drives the scheduler. Any
//! loss of leadership cancels the shared token, which tears everything
//! down: the process is expected to exit and be restarted rather than fall
//! back to standby.

use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::metrics;
use crate::LeaderElector;
use crate::LeaderEventListener;
use crate::LeadershipGate;
use crate::LeaseStore;
use crate::Result;
use crate::Settings;
use crate::StopCause;
use crate::WorkScheduler;
use crate::WorkUnit;

/// Why [`Supervisor::run`] returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// Shutdown was requested, whether or not this process ever led
    Shutdown,
    /// Leadership ended without a shutdown request
    LeadershipLost(StopCause),
}

impl ExitReason {
    /// Both outcomes are clean exits; the platform restarts the process
    pub fn exit_code(&self) -> i32 {
        0
    }
}

impl fmt::Display for ExitReason {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            ExitReason::Shutdown => f.write_str("shutdown requested"),
            ExitReason::LeadershipLost(cause) => write!(f, "leadership lost: {}", cause),
        }
    }
}

pub struct Supervisor {
    pub(super) settings: Settings,
    pub(super) store: Arc<dyn LeaseStore>,
    pub(super) work: Arc<dyn WorkUnit>,
    pub(super) listeners: Vec<Arc<dyn LeaderEventListener>>,
}

impl Supervisor {
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Runs until `shutdown` fires or leadership is lost.
    ///
    /// Returns only after the election loop has finished, so the lease has
    /// been released (when configured) and `StoppedLeading` delivered.
    pub async fn run(
        self,
        shutdown: CancellationToken,
    ) -> Result<ExitReason> {
        let identity = self.settings.identity.clone();

        // 1. Election loop and the gate listening to it
        let gate = Arc::new(LeadershipGate::new(&identity));
        let mut elector = LeaderElector::new(
            &identity,
            self.settings.lease_key(),
            self.settings.election.clone(),
            self.store.clone(),
        )?;
        elector.register_listener(gate.clone());
        for listener in self.listeners {
            elector.register_listener(listener);
        }

        // 2. Optional metrics endpoint
        if self.settings.monitoring.prometheus_enabled {
            let port = self.settings.monitoring.prometheus_port;
            tokio::spawn(metrics::start_server(port, shutdown.clone()));
        }

        // 3. Election runs independently of the work below. However the task
        // ends, panics included, the shared token is cancelled with it.
        let election = {
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                let _drop_guard = shutdown.clone().drop_guard();
                elector.run(shutdown).await
            })
        };

        // 4. Leadership loss ends the process
        let watcher = {
            let gate = gate.clone();
            let shutdown = shutdown.clone();
            let identity = identity.clone();
            tokio::spawn(async move {
                tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => {}
                    cause = gate.wait_for_stop() => {
                        if let Some(cause) = cause {
                            warn!(identity = %identity, %cause, "leadership lost, shutting down");
                        }
                        shutdown.cancel();
                    }
                }
            })
        };

        // 5. Work only once leading
        info!(identity = %identity, "waiting for leadership");
        if gate.wait_for_leadership(&shutdown).await {
            let scheduler = WorkScheduler::new(&identity, &self.settings.work, self.work.clone());
            let ticks = scheduler.run(&gate, shutdown.clone()).await;
            info!(identity = %identity, ticks, "work scheduler stopped");
        }

        // 6. Wind down and wait for release
        shutdown.cancel();
        let outcome = match election.await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(identity = %identity, "leader elector task aborted: {}", e);
                return Err(e.into());
            }
        };
        if let Err(e) = outcome {
            error!(identity = %identity, "leader elector failed: {}", e);
            return Err(e);
        }
        watcher.await?;

        let reason = match gate.stop_cause() {
            Some(StopCause::Cancelled) | None => ExitReason::Shutdown,
            Some(cause) => ExitReason::LeadershipLost(cause),
        };
        info!(identity = %identity, %reason, "supervisor exiting");
        Ok(reason)
    }
}
