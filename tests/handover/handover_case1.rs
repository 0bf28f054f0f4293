//! Case 1: a leader shutting down releases the lease so a standby takes
//! over within one retry period instead of waiting for expiry.
//!
//! Scenario:
//!
//! 1. A acquires the lease at 0s, B starts at 1s.
//! 2. A is asked to shut down at 6s.
//!
//! Expected Result:
//!
//! - A exits with `Shutdown` after releasing the lease.
//! - B starts leading within 2s of A's shutdown.

use tokio::time::sleep;
use tokio::time::sleep_until;
use tokio::time::Duration;
use tokio::time::Instant;

use crate::common::lease_key;
use crate::common::Candidate;
use crate::enable_logger;
use lease_elector::ExitReason;
use lease_elector::LeaderEvent;
use lease_elector::MemLeaseStore;

#[tokio::test(start_paused = true)]
async fn test_graceful_handover_releases_lease() {
    enable_logger();
    let store = MemLeaseStore::new();
    let start = Instant::now();

    let mut a = Candidate::start("a", &store).await;
    assert!(a.wait_for(&LeaderEvent::StartedLeading, Duration::from_secs(1)).await);

    sleep(Duration::from_secs(1)).await;
    let mut b = Candidate::start("b", &store).await;
    assert!(b.wait_for(&LeaderEvent::NewLeader("a".into()), Duration::from_secs(1)).await);

    sleep_until(start + Duration::from_secs(6)).await;
    let a_work = a.work.clone();
    assert_eq!(a.stop().await, ExitReason::Shutdown);
    assert_eq!(a_work.runs(), 1);

    let stopped_at = start.elapsed();
    assert!(b.wait_for(&LeaderEvent::StartedLeading, Duration::from_secs(2)).await);
    assert!(start.elapsed() - stopped_at <= Duration::from_secs(2));

    let (record, _) = store.peek(&lease_key()).unwrap();
    assert_eq!(record.holder(), Some("b"));
    assert_eq!(record.leader_transitions, 1);

    assert_eq!(b.stop().await, ExitReason::Shutdown);
}
