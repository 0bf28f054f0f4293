//! Case 1: a leader cut off from the store steps down before anyone else
//! can take over, and exactly one standby replaces it.
//!
//! Scenario (15s lease, 10s renew deadline, 2s retry, 5s work interval):
//!
//! 1. A starts alone and acquires the lease at 0s.
//! 2. B and C start at 1s and observe A as leader.
//! 3. A loses its store connection at 3s; its last renewal was at 2s.
//!
//! Expected Result:
//!
//! - A steps down at 12s and its supervisor returns `LeadershipLost`.
//! - Exactly one of B and C acquires the lease, no earlier than 17s.
//! - The new leader runs work; the other never does.

use tokio::time::sleep;
use tokio::time::sleep_until;
use tokio::time::timeout;
use tokio::time::Duration;
use tokio::time::Instant;

use crate::common::lease_key;
use crate::common::Candidate;
use crate::enable_logger;
use lease_elector::ExitReason;
use lease_elector::LeaderEvent;
use lease_elector::MemLeaseStore;
use lease_elector::StopCause;

#[tokio::test(start_paused = true)]
async fn test_failover_after_leader_loses_store() {
    enable_logger();
    let store = MemLeaseStore::new();
    let start = Instant::now();

    let mut a = Candidate::start("a", &store).await;
    assert!(a.wait_for(&LeaderEvent::StartedLeading, Duration::from_secs(1)).await);

    sleep(Duration::from_secs(1)).await;
    let mut b = Candidate::start("b", &store).await;
    let mut c = Candidate::start("c", &store).await;

    sleep_until(start + Duration::from_secs(3)).await;
    a.connection.set_available(false);

    let a_reason = timeout(Duration::from_secs(20), &mut a.handle)
        .await
        .expect("a should exit")
        .unwrap()
        .unwrap();
    let a_exit = start.elapsed();
    assert_eq!(a_reason, ExitReason::LeadershipLost(StopCause::RenewDeadlineExceeded));
    assert!(a_exit >= Duration::from_secs(12));
    assert!(a_exit < Duration::from_secs(13));
    assert_eq!(a.work.runs(), 2);

    sleep_until(start + Duration::from_secs(30)).await;

    let mut leaders = Vec::new();
    for candidate in [&mut b, &mut c] {
        while let Ok(event) = candidate.events.try_recv() {
            if event == LeaderEvent::StartedLeading {
                leaders.push(candidate.identity.clone());
            }
        }
    }
    assert_eq!(leaders.len(), 1);
    let leader = leaders[0].clone();

    let (record, _) = store.peek(&lease_key()).unwrap();
    assert_eq!(record.holder(), Some(leader.as_str()));
    assert_eq!(record.leader_transitions, 1);

    let (new_leader, standby) = if leader == "b" { (b, c) } else { (c, b) };
    assert!(new_leader.work.runs() >= 1);
    assert_eq!(standby.work.runs(), 0);

    assert_eq!(standby.stop().await, ExitReason::Shutdown);
    assert_eq!(new_leader.stop().await, ExitReason::Shutdown);
}
