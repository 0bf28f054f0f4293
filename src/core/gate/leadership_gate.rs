//! Turns election events into signals the rest of the process can wait on.
//!
//! A process is expected to exit after losing leadership rather than go
//! back to standby, so "became leader" is latched: it fires once and is
//! never reset, even if the election loop were to win the lease again.

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::info;

use crate::LeaderEvent;
use crate::LeaderEventListener;
use crate::StopCause;

pub struct LeadershipGate {
    identity: String,
    became_leader: watch::Sender<bool>,
    leading: watch::Sender<bool>,
    leader: watch::Sender<Option<String>>,
    stopped: watch::Sender<Option<StopCause>>,
}

impl LeadershipGate {
    pub fn new(identity: impl Into<String>) -> Self {
        let (became_leader, _) = watch::channel(false);
        let (leading, _) = watch::channel(false);
        let (leader, _) = watch::channel(None);
        let (stopped, _) = watch::channel(None);
        Self {
            identity: identity.into(),
            became_leader,
            leading,
            leader,
            stopped,
        }
    }

    /// Resolves once leadership has been acquired for the first time.
    /// Returns `false` if `cancel` fires first.
    pub async fn wait_for_leadership(
        &self,
        cancel: &CancellationToken,
    ) -> bool {
        let mut rx = self.became_leader.subscribe();
        tokio::select! {
            biased;
            _ = cancel.cancelled() => false,
            led = async { rx.wait_for(|led| *led).await.is_ok() } => led,
        }
    }

    /// Whether this process is leading right now
    pub fn is_leading(&self) -> bool {
        *self.leading.borrow()
    }

    /// Whether this process has ever led
    pub fn has_led(&self) -> bool {
        *self.became_leader.borrow()
    }

    /// Latest observed leader identity, updated on every change
    pub fn subscribe_leader(&self) -> watch::Receiver<Option<String>> {
        self.leader.subscribe()
    }

    pub fn current_leader(&self) -> Option<String> {
        self.leader.borrow().clone()
    }

    /// Resolves with the cause of the first leadership loss
    pub async fn wait_for_stop(&self) -> Option<StopCause> {
        let mut rx = self.stopped.subscribe();
        let cause = match rx.wait_for(Option::is_some).await {
            Ok(cause) => *cause,
            Err(_) => None,
        };
        cause
    }

    pub fn stop_cause(&self) -> Option<StopCause> {
        *self.stopped.borrow()
    }
}

impl LeaderEventListener for LeadershipGate {
    fn on_event(
        &self,
        event: &LeaderEvent,
    ) {
        match event {
            LeaderEvent::StartedLeading => {
                self.leading.send_replace(true);
                let first = self.became_leader.send_if_modified(|led| {
                    if *led {
                        false
                    } else {
                        *led = true;
                        true
                    }
                });
                if first {
                    info!(identity = %self.identity, "leadership gate opened");
                } else {
                    debug!(identity = %self.identity, "leadership re-acquired; gate stays latched");
                }
            }
            LeaderEvent::StoppedLeading(cause) => {
                self.leading.send_replace(false);
                // first loss wins; the process is on its way out
                self.stopped.send_if_modified(|stopped| {
                    if stopped.is_some() {
                        false
                    } else {
                        *stopped = Some(*cause);
                        true
                    }
                });
            }
            LeaderEvent::NewLeader(identity) => {
                self.leader.send_replace(Some(identity.clone()));
            }
        }
    }
}
