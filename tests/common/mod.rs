use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use lease_elector::ExitReason;
use lease_elector::LeaderEvent;
use lease_elector::LeaseKey;
use lease_elector::MemLeaseStore;
use lease_elector::Result;
use lease_elector::Settings;
use lease_elector::StoreBackend;
use lease_elector::SupervisorBuilder;
use lease_elector::WorkUnit;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

pub const LOCK_NAME: &str = "integration-lock";
pub const NAMESPACE: &str = "default";

pub fn lease_key() -> LeaseKey {
    LeaseKey::new(NAMESPACE, LOCK_NAME)
}

pub fn settings(identity: &str) -> Settings {
    let mut settings = Settings {
        identity: identity.to_string(),
        lock_name: LOCK_NAME.to_string(),
        namespace: NAMESPACE.to_string(),
        ..Default::default()
    };
    settings.store.backend = StoreBackend::Memory;
    settings
}

/// Counts the units it has run
#[derive(Default)]
pub struct CountingWork {
    runs: AtomicU64,
}

impl CountingWork {
    pub fn runs(&self) -> u64 {
        self.runs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WorkUnit for CountingWork {
    async fn run(
        &self,
        _cancel: &CancellationToken,
    ) -> Result<()> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// One supervised process attached to the shared store
pub struct Candidate {
    pub identity: String,
    pub connection: MemLeaseStore,
    pub shutdown: CancellationToken,
    pub events: mpsc::UnboundedReceiver<LeaderEvent>,
    pub work: Arc<CountingWork>,
    pub handle: JoinHandle<Result<ExitReason>>,
}

impl Candidate {
    pub async fn start(
        identity: &str,
        store: &MemLeaseStore,
    ) -> Self {
        Self::start_with(settings(identity), store).await
    }

    pub async fn start_with(
        settings: Settings,
        store: &MemLeaseStore,
    ) -> Self {
        let identity = settings.identity.clone();
        let connection = store.connect();
        let work = Arc::new(CountingWork::default());
        let (tx, events) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();

        let supervisor = SupervisorBuilder::new(settings)
            .store(Arc::new(connection.clone()))
            .work(work.clone())
            .listener(Arc::new(tx))
            .build()
            .await
            .expect("build supervisor");
        let handle = tokio::spawn(supervisor.run(shutdown.clone()));

        Self {
            identity,
            connection,
            shutdown,
            events,
            work,
            handle,
        }
    }

    /// Waits for `expected`, skipping other events
    pub async fn wait_for(
        &mut self,
        expected: &LeaderEvent,
        within: Duration,
    ) -> bool {
        let found = timeout(within, async {
            while let Some(event) = self.events.recv().await {
                if &event == expected {
                    return true;
                }
            }
            false
        })
        .await;
        matches!(found, Ok(true))
    }

    pub async fn stop(self) -> ExitReason {
        self.shutdown.cancel();
        self.handle
            .await
            .expect("supervisor task panicked")
            .expect("supervisor failed")
    }
}
