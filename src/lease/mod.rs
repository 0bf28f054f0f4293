//! Lease record model and the conditional-write store it lives in.
//!
//! The store's compare-and-swap is the only mutual-exclusion mechanism in
//! the system. Candidates are separate processes, so nothing on the client
//! side can stand in for it.

mod adaptors;
mod record;
pub use adaptors::*;
pub use record::*;


//--------------------------------------
// Trait Definition
#[cfg(test)]
use mockall::automock;

use crate::StoreError;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Linearizable conditional-write record store keyed by namespace and name.
///
/// Every call may fail with [`StoreError::Unavailable`], which callers treat
/// as a failed attempt rather than an answer.
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait LeaseStore: Send + Sync + 'static {
    /// Returns [`StoreError::NotFound`] when the record was never created
    async fn get(
        &self,
        key: &LeaseKey,
    ) -> StoreResult<(LeaseRecord, LeaseVersion)>;

    /// Atomic create. [`StoreError::Conflict`] if the record already exists.
    async fn create(
        &self,
        key: &LeaseKey,
        record: &LeaseRecord,
    ) -> StoreResult<LeaseVersion>;

    /// Atomic replace, applied only if the stored version equals `expected`
    async fn compare_and_swap(
        &self,
        key: &LeaseKey,
        record: &LeaseRecord,
        expected: &LeaseVersion,
    ) -> StoreResult<LeaseVersion>;
}
