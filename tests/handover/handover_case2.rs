//! Case 2: with release disabled, a standby has to wait for the departed
//! leader's lease to expire.
//!
//! Scenario:
//!
//! 1. A acquires the lease at 0s with `release_on_cancel = false`.
//! 2. B starts at 1s.
//! 3. A shuts down at 6.5s; its last renewal was at 6s.
//!
//! Expected Result:
//!
//! - The record still names A after A exits.
//! - B starts leading only after a full lease duration without renewals.

use tokio::time::sleep;
use tokio::time::sleep_until;
use tokio::time::Duration;
use tokio::time::Instant;

use crate::common::lease_key;
use crate::common::settings;
use crate::common::Candidate;
use crate::enable_logger;
use lease_elector::ExitReason;
use lease_elector::LeaderEvent;
use lease_elector::MemLeaseStore;

#[tokio::test(start_paused = true)]
async fn test_handover_without_release_waits_for_expiry() {
    enable_logger();
    let store = MemLeaseStore::new();
    let start = Instant::now();

    let mut a_settings = settings("a");
    a_settings.election.release_on_cancel = false;
    let mut a = Candidate::start_with(a_settings, &store).await;
    assert!(a.wait_for(&LeaderEvent::StartedLeading, Duration::from_secs(1)).await);

    sleep(Duration::from_secs(1)).await;
    let mut b = Candidate::start("b", &store).await;

    sleep_until(start + Duration::from_millis(6_500)).await;
    assert_eq!(a.stop().await, ExitReason::Shutdown);
    assert_eq!(store.peek(&lease_key()).unwrap().0.holder(), Some("a"));

    assert!(b.wait_for(&LeaderEvent::StartedLeading, Duration::from_secs(30)).await);
    let took_over = start.elapsed();
    assert!(took_over >= Duration::from_secs(21));
    assert!(took_over <= Duration::from_secs(24));

    assert_eq!(b.stop().await, ExitReason::Shutdown);
}
