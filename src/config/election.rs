use std::fmt::Debug;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Retry jitter headroom the renew deadline must leave over the retry period.
/// A renew deadline below `JITTER_FACTOR * retry_period` would allow a
/// single slow attempt to consume the whole window.
pub const JITTER_FACTOR: f64 = 1.2;

/// Timing parameters of the lease election protocol
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ElectionConfig {
    /// How long a (re)newed lease stays valid for other candidates
    #[serde(default = "default_lease_duration")]
    pub lease_duration_ms: u64,

    /// Latest point after the last successful renewal by which the next
    /// renewal must succeed. Past it the leader steps down.
    #[serde(default = "default_renew_deadline")]
    pub renew_deadline_ms: u64,

    /// Cadence of acquisition and renewal attempts
    #[serde(default = "default_retry_period")]
    pub retry_period_ms: u64,

    /// Clear `holderIdentity` on shutdown instead of letting the lease
    /// expire
    #[serde(default = "default_release_on_cancel")]
    pub release_on_cancel: bool,
}

impl Default for ElectionConfig {
    fn default() -> Self {
        Self {
            lease_duration_ms: default_lease_duration(),
            renew_deadline_ms: default_renew_deadline(),
            retry_period_ms: default_retry_period(),
            release_on_cancel: default_release_on_cancel(),
        }
    }
}

impl ElectionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.lease_duration_ms == 0 {
            return Err(Error::invalid_config("lease_duration_ms cannot be 0"));
        }
        if self.renew_deadline_ms == 0 {
            return Err(Error::invalid_config("renew_deadline_ms cannot be 0"));
        }
        if self.retry_period_ms == 0 {
            return Err(Error::invalid_config("retry_period_ms cannot be 0"));
        }

        if self.lease_duration_ms <= self.renew_deadline_ms {
            return Err(Error::invalid_config(format!(
                "lease_duration_ms {}ms must be greater than renew_deadline_ms {}ms",
                self.lease_duration_ms, self.renew_deadline_ms
            )));
        }

        if (self.renew_deadline_ms as f64) <= JITTER_FACTOR * self.retry_period_ms as f64 {
            return Err(Error::invalid_config(format!(
                "renew_deadline_ms {}ms must be greater than {} * retry_period_ms {}ms",
                self.renew_deadline_ms, JITTER_FACTOR, self.retry_period_ms
            )));
        }

        Ok(())
    }

    pub fn lease_duration(&self) -> Duration {
        Duration::from_millis(self.lease_duration_ms)
    }

    pub fn renew_deadline(&self) -> Duration {
        Duration::from_millis(self.renew_deadline_ms)
    }

    pub fn retry_period(&self) -> Duration {
        Duration::from_millis(self.retry_period_ms)
    }

    /// Lease duration as written into the record. Rounded up so a record
    /// never advertises less validity than the holder assumes.
    pub fn lease_duration_seconds(&self) -> u32 {
        self.lease_duration_ms.div_ceil(1000).min(u32::MAX as u64) as u32
    }
}

// in ms
fn default_lease_duration() -> u64 {
    15_000
}
fn default_renew_deadline() -> u64 {
    10_000
}
fn default_retry_period() -> u64 {
    2_000
}
fn default_release_on_cancel() -> bool {
    true
}
