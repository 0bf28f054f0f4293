use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::trace;

use crate::LeaseKey;
use crate::LeaseRecord;
use crate::LeaseStore;
use crate::LeaseVersion;
use crate::StoreError;
use crate::StoreResult;

#[derive(Debug, Default)]
struct MemoryLeaseTable {
    records: Mutex<HashMap<LeaseKey, (LeaseRecord, u64)>>,
    next_version: AtomicU64,
}

impl MemoryLeaseTable {
    fn bump(&self) -> u64 {
        self.next_version.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// In-memory linearizable lease store.
///
/// Each value is one client connection onto a shared table: clones made with
/// [`MemLeaseStore::connect`] see the same records but carry their own
/// availability switch, so a test can cut one candidate off from the store
/// while the others keep working.
#[derive(Debug, Clone)]
pub struct MemLeaseStore {
    table: Arc<MemoryLeaseTable>,
    available: Arc<AtomicBool>,
}

impl Default for MemLeaseStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemLeaseStore {
    pub fn new() -> Self {
        Self {
            table: Arc::new(MemoryLeaseTable::default()),
            available: Arc::new(AtomicBool::new(true)),
        }
    }

    /// New connection onto the same table, initially available
    pub fn connect(&self) -> Self {
        Self {
            table: self.table.clone(),
            available: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Simulates losing or regaining access to the store on this connection
    pub fn set_available(
        &self,
        available: bool,
    ) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    /// Reads a record regardless of this connection's availability
    pub fn peek(
        &self,
        key: &LeaseKey,
    ) -> Option<(LeaseRecord, LeaseVersion)> {
        let records = self.table.records.lock();
        records
            .get(key)
            .map(|(record, version)| (record.clone(), LeaseVersion::new(version.to_string())))
    }

    fn ensure_available(&self) -> StoreResult<()> {
        if self.is_available() {
            Ok(())
        } else {
            Err(StoreError::Unavailable("memory store connection is down".into()))
        }
    }
}

#[async_trait]
impl LeaseStore for MemLeaseStore {
    async fn get(
        &self,
        key: &LeaseKey,
    ) -> StoreResult<(LeaseRecord, LeaseVersion)> {
        self.ensure_available()?;
        self.peek(key).ok_or(StoreError::NotFound)
    }

    async fn create(
        &self,
        key: &LeaseKey,
        record: &LeaseRecord,
    ) -> StoreResult<LeaseVersion> {
        self.ensure_available()?;

        let mut records = self.table.records.lock();
        if records.contains_key(key) {
            trace!("create {} conflicts with existing record", key);
            return Err(StoreError::Conflict);
        }

        let version = self.table.bump();
        records.insert(key.clone(), (record.clone(), version));
        Ok(LeaseVersion::new(version.to_string()))
    }

    async fn compare_and_swap(
        &self,
        key: &LeaseKey,
        record: &LeaseRecord,
        expected: &LeaseVersion,
    ) -> StoreResult<LeaseVersion> {
        self.ensure_available()?;

        let mut records = self.table.records.lock();
        let entry = records.get_mut(key).ok_or(StoreError::NotFound)?;
        if entry.1.to_string() != expected.as_str() {
            trace!(
                "compare_and_swap {} expected version {} but found {}",
                key,
                expected,
                entry.1
            );
            return Err(StoreError::Conflict);
        }

        let version = self.table.bump();
        *entry = (record.clone(), version);
        Ok(LeaseVersion::new(version.to_string()))
    }
}
