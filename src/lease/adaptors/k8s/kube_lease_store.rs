//! Kubernetes `coordination.k8s.io/v1` Lease backend.
//!
//! `metadata.resourceVersion` is the lease version: `replace` with a
//! resource version set is rejected by the API server with 409 when the
//! object changed in between, which gives compare-and-swap. Releasing
//! clears `holderIdentity` rather than deleting the object, so a release
//! can never remove a lease someone else acquired in the meantime.

use async_trait::async_trait;
use k8s_openapi::api::coordination::v1::Lease;
use k8s_openapi::api::coordination::v1::LeaseSpec;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::MicroTime;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::Api;
use kube::api::PostParams;
use kube::Client;
use tracing::debug;

use crate::Error;
use crate::LeaseKey;
use crate::LeaseRecord;
use crate::LeaseStore;
use crate::LeaseVersion;
use crate::Result;
use crate::StoreError;
use crate::StoreResult;

#[derive(Clone)]
pub struct KubeLeaseStore {
    client: Client,
}

impl KubeLeaseStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Client from the in-cluster service account, falling back to the
    /// local kubeconfig
    pub async fn try_default() -> Result<Self> {
        let client = Client::try_default()
            .await
            .map_err(|e| Error::Fatal(format!("couldn't create kubernetes client: {}", e)))?;
        Ok(Self::new(client))
    }

    fn api(
        &self,
        key: &LeaseKey,
    ) -> Api<Lease> {
        Api::namespaced(self.client.clone(), &key.namespace)
    }
}

#[async_trait]
impl LeaseStore for KubeLeaseStore {
    async fn get(
        &self,
        key: &LeaseKey,
    ) -> StoreResult<(LeaseRecord, LeaseVersion)> {
        let lease = self.api(key).get(&key.name).await.map_err(map_kube_error)?;
        let version = version_of(&lease)?;
        Ok((record_from_lease(&lease), version))
    }

    async fn create(
        &self,
        key: &LeaseKey,
        record: &LeaseRecord,
    ) -> StoreResult<LeaseVersion> {
        let lease = lease_from_record(key, record, None);
        let created = self
            .api(key)
            .create(&PostParams::default(), &lease)
            .await
            .map_err(map_kube_error)?;
        debug!("created lease {}", key);
        version_of(&created)
    }

    async fn compare_and_swap(
        &self,
        key: &LeaseKey,
        record: &LeaseRecord,
        expected: &LeaseVersion,
    ) -> StoreResult<LeaseVersion> {
        let lease = lease_from_record(key, record, Some(expected));
        let replaced = self
            .api(key)
            .replace(&key.name, &PostParams::default(), &lease)
            .await
            .map_err(map_kube_error)?;
        version_of(&replaced)
    }
}

/// 409 covers both "already exists" on create and a stale resourceVersion
/// on replace
pub(crate) fn map_kube_error(e: kube::Error) -> StoreError {
    match e {
        kube::Error::Api(resp) if resp.code == 409 => StoreError::Conflict,
        kube::Error::Api(resp) if resp.code == 404 => StoreError::NotFound,
        other => StoreError::Unavailable(other.to_string()),
    }
}

fn version_of(lease: &Lease) -> StoreResult<LeaseVersion> {
    lease
        .metadata
        .resource_version
        .as_ref()
        .map(LeaseVersion::new)
        .ok_or_else(|| StoreError::Unavailable("lease has no resourceVersion".into()))
}

pub(crate) fn record_from_lease(lease: &Lease) -> LeaseRecord {
    let spec = lease.spec.clone().unwrap_or_default();
    LeaseRecord {
        holder_identity: spec.holder_identity.filter(|h| !h.is_empty()),
        lease_duration_seconds: spec.lease_duration_seconds.unwrap_or_default().max(0) as u32,
        acquire_time: spec.acquire_time.map(|t| t.0),
        renew_time: spec.renew_time.map(|t| t.0),
        leader_transitions: spec.lease_transitions.unwrap_or_default().max(0) as u32,
    }
}

pub(crate) fn lease_from_record(
    key: &LeaseKey,
    record: &LeaseRecord,
    expected: Option<&LeaseVersion>,
) -> Lease {
    Lease {
        metadata: ObjectMeta {
            name: Some(key.name.clone()),
            namespace: Some(key.namespace.clone()),
            resource_version: expected.map(|v| v.as_str().to_string()),
            ..Default::default()
        },
        spec: Some(LeaseSpec {
            holder_identity: record.holder_identity.clone(),
            lease_duration_seconds: Some(record.lease_duration_seconds.min(i32::MAX as u32) as i32),
            acquire_time: record.acquire_time.map(MicroTime),
            renew_time: record.renew_time.map(MicroTime),
            lease_transitions: Some(record.leader_transitions.min(i32::MAX as u32) as i32),
            ..Default::default()
        }),
    }
}
