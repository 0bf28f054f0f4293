//! Lease election loop.
//!
//! One candidate per process runs [`LeaderElector::run`]. Every
//! `retry_period` it reads the lease record and, when the record is free,
//! expired or already ours, tries to write itself in as holder with
//! compare-and-swap. A lost race is just a failed attempt; the store's
//! version check is what keeps two candidates from both succeeding.
//!
//! Somebody else's lease expires `lease_duration_seconds` after its
//! `renew_time`. Comparing wall clocks across candidates is safe as long as
//! their skew stays below `lease_duration - renew_deadline`, the margin by
//! which a stalled leader steps down before its lease runs out. A record
//! without `renew_time` is timed from the moment this candidate first saw
//! its current version.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::time::sleep_until;
use tokio::time::timeout;
use tokio::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::info;
use tracing::trace;
use tracing::warn;

use crate::metrics;
use crate::utils::time;
use crate::ElectionConfig;
use crate::Error;
use crate::LeaderEvent;
use crate::LeaderEventListener;
use crate::LeadershipState;
use crate::LeaseKey;
use crate::LeaseRecord;
use crate::LeaseStore;
use crate::LeaseVersion;
use crate::RenewTimer;
use crate::Result;
use crate::StopCause;
use crate::StoreError;
use crate::StoreResult;

/// Last record version this candidate has seen, and when it first saw it
#[derive(Debug, Clone)]
struct ObservedLease {
    record: LeaseRecord,
    /// `None` while the record does not exist in the store
    version: Option<LeaseVersion>,
    observed_at: Instant,
}

pub struct LeaderElector<S>
where
    S: LeaseStore + ?Sized,
{
    identity: String,
    key: LeaseKey,
    config: ElectionConfig,
    store: Arc<S>,

    state: LeadershipState,
    state_tx: watch::Sender<LeadershipState>,
    observed: Option<ObservedLease>,
    reported_leader: Option<String>,
    renew_timer: RenewTimer,

    listeners: Vec<Arc<dyn LeaderEventListener>>,
}

impl<S> LeaderElector<S>
where
    S: LeaseStore + ?Sized,
{
    pub fn new(
        identity: impl Into<String>,
        key: LeaseKey,
        config: ElectionConfig,
        store: Arc<S>,
    ) -> Result<Self> {
        let identity = identity.into();
        if identity.is_empty() {
            return Err(Error::invalid_config("leader elector identity cannot be empty"));
        }
        config.validate()?;

        let (state_tx, _) = watch::channel(LeadershipState::Standby);
        let renew_timer = RenewTimer::new(config.renew_deadline());

        Ok(Self {
            identity,
            key,
            config,
            store,
            state: LeadershipState::Standby,
            state_tx,
            observed: None,
            reported_leader: None,
            renew_timer,
            listeners: Vec::new(),
        })
    }

    pub fn register_listener(
        &mut self,
        listener: Arc<dyn LeaderEventListener>,
    ) {
        self.listeners.push(listener);
    }

    /// Read-only view of the leadership state
    pub fn subscribe_state(&self) -> watch::Receiver<LeadershipState> {
        self.state_tx.subscribe()
    }

    pub fn state(&self) -> LeadershipState {
        self.state
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Runs until `cancel` fires, then releases (when configured) and
    /// enters [`LeadershipState::Stopped`].
    pub async fn run(
        mut self,
        cancel: CancellationToken,
    ) -> Result<()> {
        info!(identity = %self.identity, lease = %self.key, "running leader elector");

        let mut next_attempt = Instant::now();
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(identity = %self.identity, "leader elector cancelled");
                    break;
                }
                _ = sleep_until(next_attempt) => {}
            }

            self.tick().await;
            next_attempt = self.next_attempt_at();
        }

        self.shutdown().await;
        Ok(())
    }

    /// One acquire-or-renew round, including the state transitions it
    /// causes
    pub(crate) async fn tick(&mut self) {
        if self.state == LeadershipState::Leading && self.renew_timer.is_expired() {
            self.step_down_on_deadline();
            return;
        }

        match self.try_acquire_or_renew().await {
            Ok(true) => self.on_acquired(),
            Ok(false) => self.on_attempt_failed(),
            Err(StoreError::Conflict) => {
                debug!(identity = %self.identity, lease = %self.key, "lost lease write race");
                metrics::record_conflict(&self.identity);
                self.on_attempt_failed();
            }
            Err(e) => {
                warn!(identity = %self.identity, lease = %self.key, "lease attempt failed: {}", e);
                metrics::record_store_error(&self.identity, "unavailable");
                self.on_attempt_failed();
            }
        }
    }

    /// While leading, never sleep past the renew deadline
    fn next_attempt_at(&self) -> Instant {
        let next = Instant::now() + self.config.retry_period();
        if self.state == LeadershipState::Leading {
            next.min(self.renew_timer.next_deadline())
        } else {
            next
        }
    }

    /// Store calls made while leading must finish before the renew
    /// deadline; otherwise they get one renew window.
    fn attempt_budget(&self) -> Duration {
        if self.state == LeadershipState::Leading {
            self.renew_timer.remaining()
        } else {
            self.config.renew_deadline()
        }
    }

    /// Returns `Ok(true)` when this candidate holds the lease after the
    /// call, `Ok(false)` when someone else validly holds it.
    async fn try_acquire_or_renew(&mut self) -> StoreResult<bool> {
        let budget = self.attempt_budget();
        let deadline = Instant::now() + budget;
        let remaining = || deadline.saturating_duration_since(Instant::now());

        // 1. Fetch current record
        let current = match with_budget(budget, self.store.get(&self.key)).await {
            Ok((record, version)) => Some((record, version)),
            Err(StoreError::NotFound) => None,
            Err(e) => return Err(e),
        };

        let (record, version) = match current {
            Some((record, version)) => (record, Some(version)),
            None => (LeaseRecord::default(), None),
        };
        self.observe(record.clone(), version.clone());

        // 2. Held by another candidate and not expired
        if let Some(holder) = record.holder() {
            if holder != self.identity && !self.observed_expired() {
                trace!(identity = %self.identity, holder, "lease is held by another candidate");
                return Ok(false);
            }
        }

        // 3. Free, expired or ours: claim it
        let now = time::now_utc();
        let lease_seconds = self.config.lease_duration_seconds();
        let (desired, written) = match version {
            None => {
                let desired = LeaseRecord::initial(&self.identity, lease_seconds, now);
                let written = with_budget(remaining(), self.store.create(&self.key, &desired)).await;
                (desired, written)
            }
            Some(expected) => {
                let desired = record.claimed_by(&self.identity, lease_seconds, now);
                let written = with_budget(
                    remaining(),
                    self.store.compare_and_swap(&self.key, &desired, &expected),
                )
                .await;
                (desired, written)
            }
        };

        let new_version = written?;
        self.observe(desired, Some(new_version));
        Ok(true)
    }

    /// Remembers the record and restarts the expiry clock when its version
    /// moved since the last look
    fn observe(
        &mut self,
        record: LeaseRecord,
        version: Option<LeaseVersion>,
    ) {
        let changed = match &self.observed {
            Some(prev) => prev.version != version || prev.record != record,
            None => true,
        };
        if changed {
            self.observed = Some(ObservedLease {
                record,
                version,
                observed_at: Instant::now(),
            });
        }

        let holder = self
            .observed
            .as_ref()
            .and_then(|o| o.record.holder().map(str::to_string));
        self.report_leader(holder);
    }

    fn observed_expired(&self) -> bool {
        let Some(observed) = &self.observed else {
            return true;
        };

        let advertised = observed.record.lease_duration_seconds;
        let validity = if advertised > 0 {
            Duration::from_secs(u64::from(advertised))
        } else {
            self.config.lease_duration()
        };

        match observed.record.renew_time {
            Some(renewed) => match renewed.checked_add_signed(time::delta(validity)) {
                Some(expires) => expires <= time::now_utc(),
                None => false,
            },
            None => observed.observed_at + validity <= Instant::now(),
        }
    }

    fn report_leader(
        &mut self,
        holder: Option<String>,
    ) {
        if holder == self.reported_leader {
            return;
        }
        self.reported_leader = holder.clone();
        if let Some(leader) = holder {
            info!(identity = %self.identity, leader = %leader, "new leader");
            self.emit(LeaderEvent::NewLeader(leader));
        }
    }

    fn on_acquired(&mut self) {
        self.renew_timer.reset();
        match self.state {
            LeadershipState::Standby => {
                info!(identity = %self.identity, lease = %self.key, "started leading");
                self.set_state(LeadershipState::Leading);
                metrics::record_leading(&self.identity, true);
                self.emit(LeaderEvent::StartedLeading);
            }
            LeadershipState::Leading => {
                trace!(identity = %self.identity, "lease renewed");
            }
            LeadershipState::Stopped => {}
        }
    }

    fn on_attempt_failed(&mut self) {
        if self.state == LeadershipState::Leading && self.renew_timer.is_expired() {
            self.step_down_on_deadline();
        }
    }

    fn step_down_on_deadline(&mut self) {
        warn!(
            identity = %self.identity,
            lease = %self.key,
            "failed to renew lease within {:?}",
            self.renew_timer.window()
        );
        self.stop_leading(LeadershipState::Standby, StopCause::RenewDeadlineExceeded);
    }

    fn stop_leading(
        &mut self,
        next: LeadershipState,
        cause: StopCause,
    ) {
        info!(identity = %self.identity, lease = %self.key, %cause, "stopped leading");
        self.set_state(next);
        metrics::record_leading(&self.identity, false);
        self.emit(LeaderEvent::StoppedLeading(cause));
    }

    async fn shutdown(&mut self) {
        if self.state == LeadershipState::Leading {
            if self.config.release_on_cancel {
                self.release().await;
            }
            self.stop_leading(LeadershipState::Stopped, StopCause::Cancelled);
        } else {
            self.set_state(LeadershipState::Stopped);
        }
    }

    /// Best-effort voluntary release so the next candidate does not have to
    /// wait for expiry
    async fn release(&mut self) {
        let Some(observed) = self.observed.clone() else {
            return;
        };
        let Some(expected) = observed.version else {
            return;
        };
        if !observed.record.is_held_by(&self.identity) {
            return;
        }

        let released = observed.record.released(time::now_utc());
        let budget = self.config.retry_period();
        match with_budget(
            budget,
            self.store.compare_and_swap(&self.key, &released, &expected),
        )
        .await
        {
            Ok(version) => {
                info!(identity = %self.identity, lease = %self.key, "released lease");
                self.observe(released, Some(version));
            }
            Err(e) => {
                warn!(identity = %self.identity, lease = %self.key, "failed to release lease: {}", e);
            }
        }
    }

    fn set_state(
        &mut self,
        state: LeadershipState,
    ) {
        self.state = state;
        self.state_tx.send_replace(state);
    }

    fn emit(
        &self,
        event: LeaderEvent,
    ) {
        for listener in &self.listeners {
            listener.on_event(&event);
        }
    }
}

/// Bounds a store call; running out of time counts as unavailability
async fn with_budget<T, F>(
    budget: Duration,
    call: F,
) -> StoreResult<T>
where
    F: std::future::Future<Output = StoreResult<T>>,
{
    match timeout(budget, call).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Unavailable(format!(
            "lease store call timed out after {:?}",
            budget
        ))),
    }
}
