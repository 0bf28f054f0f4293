use std::fmt;

use tokio::sync::mpsc;
use tracing::debug;

/// Leadership state, owned exclusively by the election loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadershipState {
    Standby,
    Leading,
    /// Terminal, entered on cancellation
    Stopped,
}

impl fmt::Display for LeadershipState {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let s = match self {
            LeadershipState::Standby => "standby",
            LeadershipState::Leading => "leading",
            LeadershipState::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// Why leadership ended.
///
/// Both causes lead to the same process exit today; they stay distinct so
/// consumers can alert on an unexpected loss without treating a clean
/// shutdown as one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopCause {
    /// No renewal succeeded within `renew_deadline` of the last one
    RenewDeadlineExceeded,
    /// The shared cancellation token fired while leading
    Cancelled,
}

impl fmt::Display for StopCause {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let s = match self {
            StopCause::RenewDeadlineExceeded => "renew deadline exceeded",
            StopCause::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Transition events, emitted synchronously on state edges only
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaderEvent {
    StartedLeading,
    StoppedLeading(StopCause),
    /// A holder different from the last reported one was observed
    NewLeader(String),
}

/// Handler registered with the election loop.
///
/// Called inline from the loop, so implementations must not block.
pub trait LeaderEventListener: Send + Sync + 'static {
    fn on_event(
        &self,
        event: &LeaderEvent,
    );
}

impl LeaderEventListener for mpsc::UnboundedSender<LeaderEvent> {
    fn on_event(
        &self,
        event: &LeaderEvent,
    ) {
        if let Err(e) = self.send(event.clone()) {
            debug!("leader event listener dropped: {:?}", e);
        }
    }
}
