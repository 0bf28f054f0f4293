use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WorkConfig {
    /// Tick interval of the work scheduler, independent of election timing
    #[serde(default = "default_work_interval")]
    pub work_interval_ms: u64,
}

impl Default for WorkConfig {
    fn default() -> Self {
        Self {
            work_interval_ms: default_work_interval(),
        }
    }
}

impl WorkConfig {
    pub fn validate(&self) -> Result<()> {
        if self.work_interval_ms == 0 {
            return Err(Error::invalid_config("work_interval_ms cannot be 0"));
        }
        Ok(())
    }

    pub fn work_interval(&self) -> Duration {
        Duration::from_millis(self.work_interval_ms)
    }
}

fn default_work_interval() -> u64 {
    5_000
}
