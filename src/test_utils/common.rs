use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio::time::Duration;

use crate::ElectionConfig;
use crate::LeaderEvent;
use crate::LeaseKey;
use crate::Settings;
use crate::StoreBackend;

pub(crate) fn test_key() -> LeaseKey {
    LeaseKey::new("default", "test-lock")
}

/// 15s lease, 10s renew deadline, 2s retry period
pub(crate) fn election_config() -> ElectionConfig {
    ElectionConfig::default()
}

pub(crate) fn test_settings(identity: &str) -> Settings {
    let mut settings = Settings {
        identity: identity.to_string(),
        lock_name: "test-lock".to_string(),
        namespace: "default".to_string(),
        ..Default::default()
    };
    settings.store.backend = StoreBackend::Memory;
    settings
}

pub(crate) fn event_channel() -> (mpsc::UnboundedSender<LeaderEvent>, mpsc::UnboundedReceiver<LeaderEvent>) {
    mpsc::unbounded_channel()
}

/// Drains whatever has been emitted so far
pub(crate) fn drain_events(rx: &mut mpsc::UnboundedReceiver<LeaderEvent>) -> Vec<LeaderEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Waits until `expected` shows up, skipping anything else. Returns `false`
/// if it does not arrive within `within`.
pub(crate) async fn wait_for_event(
    rx: &mut mpsc::UnboundedReceiver<LeaderEvent>,
    expected: &LeaderEvent,
    within: Duration,
) -> bool {
    let found = timeout(within, async {
        while let Some(event) = rx.recv().await {
            if &event == expected {
                return true;
            }
        }
        false
    })
    .await;
    matches!(found, Ok(true))
}
