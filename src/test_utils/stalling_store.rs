use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use async_trait::async_trait;

use crate::LeaseKey;
use crate::LeaseRecord;
use crate::LeaseStore;
use crate::LeaseVersion;
use crate::MemLeaseStore;
use crate::StoreResult;

/// Memory store whose calls can be made to hang forever, for exercising the
/// per-call time bound
#[derive(Clone)]
pub(crate) struct StallingLeaseStore {
    inner: MemLeaseStore,
    stalled: Arc<AtomicBool>,
}

impl StallingLeaseStore {
    pub(crate) fn new(inner: MemLeaseStore) -> Self {
        Self {
            inner,
            stalled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub(crate) fn stall(&self) {
        self.stalled.store(true, Ordering::SeqCst);
    }

    async fn wait_if_stalled(&self) {
        if self.stalled.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
    }
}

#[async_trait]
impl LeaseStore for StallingLeaseStore {
    async fn get(
        &self,
        key: &LeaseKey,
    ) -> StoreResult<(LeaseRecord, LeaseVersion)> {
        self.wait_if_stalled().await;
        self.inner.get(key).await
    }

    async fn create(
        &self,
        key: &LeaseKey,
        record: &LeaseRecord,
    ) -> StoreResult<LeaseVersion> {
        self.wait_if_stalled().await;
        self.inner.create(key, record).await
    }

    async fn compare_and_swap(
        &self,
        key: &LeaseKey,
        record: &LeaseRecord,
        expected: &LeaseVersion,
    ) -> StoreResult<LeaseVersion> {
        self.wait_if_stalled().await;
        self.inner.compare_and_swap(key, record, expected).await
    }
}
