use std::fmt;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// Address of a lease record in the store
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeaseKey {
    pub namespace: String,
    pub name: String,
}

impl LeaseKey {
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for LeaseKey {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Opaque write token handed out by the store. Changes on every successful
/// write and is the only input to compare-and-swap.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeaseVersion(String);

impl LeaseVersion {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LeaseVersion {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Current lease ownership as stored externally
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaseRecord {
    /// Current or most recent leader. `None` when never held or released.
    pub holder_identity: Option<String>,
    pub lease_duration_seconds: u32,
    pub acquire_time: Option<DateTime<Utc>>,
    pub renew_time: Option<DateTime<Utc>>,
    /// Incremented whenever `holder_identity` changes
    pub leader_transitions: u32,
}

impl LeaseRecord {
    /// Holder identity with the empty string folded into `None`
    pub fn holder(&self) -> Option<&str> {
        self.holder_identity.as_deref().filter(|h| !h.is_empty())
    }

    pub fn is_held(&self) -> bool {
        self.holder().is_some()
    }

    pub fn is_held_by(
        &self,
        identity: &str,
    ) -> bool {
        self.holder() == Some(identity)
    }

    /// Record a candidate writes to take or keep the lease.
    ///
    /// Renewing our own lease keeps `acquire_time` and the transition count.
    /// Taking it from anyone else (including nobody) stamps a new
    /// `acquire_time` and bumps `leader_transitions`.
    pub fn claimed_by(
        &self,
        identity: &str,
        lease_duration_seconds: u32,
        now: DateTime<Utc>,
    ) -> Self {
        if self.is_held_by(identity) {
            Self {
                holder_identity: Some(identity.to_string()),
                lease_duration_seconds,
                acquire_time: self.acquire_time.or(Some(now)),
                renew_time: Some(now),
                leader_transitions: self.leader_transitions,
            }
        } else {
            Self {
                holder_identity: Some(identity.to_string()),
                lease_duration_seconds,
                acquire_time: Some(now),
                renew_time: Some(now),
                leader_transitions: self.leader_transitions.saturating_add(1),
            }
        }
    }

    /// First record ever written for a key
    pub fn initial(
        identity: &str,
        lease_duration_seconds: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            holder_identity: Some(identity.to_string()),
            lease_duration_seconds,
            acquire_time: Some(now),
            renew_time: Some(now),
            leader_transitions: 0,
        }
    }

    /// Voluntary release: clears the holder, keeps the history fields
    pub fn released(
        &self,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            holder_identity: None,
            lease_duration_seconds: self.lease_duration_seconds,
            acquire_time: self.acquire_time,
            renew_time: Some(now),
            leader_transitions: self.leader_transitions,
        }
    }
}
