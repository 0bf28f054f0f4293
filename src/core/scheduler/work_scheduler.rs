use std::sync::Arc;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use tokio::time::interval_at;
use tokio::time::Duration;
use tokio::time::Instant;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::metrics;
use crate::LeadershipGate;
use crate::Result;
use crate::WorkConfig;

/// One unit of leader-only work.
///
/// The scheduler never aborts a running unit. Long units should check
/// `cancel` themselves.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait WorkUnit: Send + Sync + 'static {
    async fn run(
        &self,
        cancel: &CancellationToken,
    ) -> Result<()>;
}

/// Logs a line per tick
pub struct LogWorkUnit {
    identity: String,
}

impl LogWorkUnit {
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
        }
    }
}

#[async_trait]
impl WorkUnit for LogWorkUnit {
    async fn run(
        &self,
        _cancel: &CancellationToken,
    ) -> Result<()> {
        info!(identity = %self.identity, "doing work...");
        Ok(())
    }
}

/// Runs a [`WorkUnit`] at a fixed interval while the gate reports
/// leadership.
///
/// Ticks that come due while a unit is still running are dropped, not
/// queued or run late. The next unit starts on the next tick of the
/// original cadence, so at most one unit is ever in flight.
pub struct WorkScheduler<W>
where
    W: WorkUnit + ?Sized,
{
    identity: String,
    interval: Duration,
    work: Arc<W>,
}

impl<W> WorkScheduler<W>
where
    W: WorkUnit + ?Sized,
{
    pub fn new(
        identity: impl Into<String>,
        config: &WorkConfig,
        work: Arc<W>,
    ) -> Self {
        Self {
            identity: identity.into(),
            interval: config.work_interval(),
            work,
        }
    }

    /// Ticks until `cancel` fires or the gate stops reporting leadership.
    /// Returns the number of units run.
    pub async fn run(
        &self,
        gate: &LeadershipGate,
        cancel: CancellationToken,
    ) -> u64 {
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut ticks = 0;
        let mut busy_until = Instant::now();
        loop {
            let scheduled = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!(identity = %self.identity, "context cancelled, stopping work scheduler");
                    break;
                }
                scheduled = ticker.tick() => scheduled,
            };

            // Skip only realigns the deadline; the missed tick itself still fires late
            if scheduled < busy_until {
                debug!(identity = %self.identity, "tick came due during previous unit, skipped");
                continue;
            }

            if !gate.is_leading() {
                info!(identity = %self.identity, "not leading, stopping work scheduler");
                break;
            }

            ticks += 1;
            info!(identity = %self.identity, tick = ticks, "work tick started");
            match self.work.run(&cancel).await {
                Ok(()) => {
                    metrics::record_work_tick(&self.identity, true);
                    info!(identity = %self.identity, tick = ticks, "work tick completed");
                }
                Err(e) => {
                    metrics::record_work_tick(&self.identity, false);
                    warn!(identity = %self.identity, tick = ticks, "work tick failed: {}", e);
                }
            }
            busy_until = Instant::now();
        }

        ticks
    }
}
