use tokio::time::Duration;
use tokio::time::Instant;

/// Tracks the point by which the leader must have renewed again.
///
/// Reset on every successful renewal; once expired the leader can no
/// longer prove it is the only one holding the lease.
#[derive(Clone, Debug)]
pub struct RenewTimer {
    next_deadline: Instant,
    window: Duration,
}

impl RenewTimer {
    pub fn new(window: Duration) -> Self {
        Self {
            next_deadline: Instant::now() + window,
            window,
        }
    }

    pub fn reset(&mut self) {
        self.next_deadline = Instant::now() + self.window;
    }

    pub fn remaining(&self) -> Duration {
        self.next_deadline.saturating_duration_since(Instant::now())
    }

    pub fn next_deadline(&self) -> Instant {
        self.next_deadline
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn is_expired(&self) -> bool {
        self.next_deadline <= Instant::now()
    }
}
