use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Which lease backend the binary talks to
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// In-process store. Only meaningful for a single local process.
    Memory,
    /// `coordination.k8s.io/v1` Lease objects
    Kubernetes,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StoreConfig {
    #[serde(default = "default_backend")]
    pub backend: StoreBackend,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
        }
    }
}

impl StoreConfig {
    pub fn validate(&self) -> Result<()> {
        if self.backend == StoreBackend::Kubernetes && !cfg!(feature = "kubernetes") {
            return Err(Error::invalid_config(
                "store.backend = kubernetes requires the `kubernetes` feature",
            ));
        }
        Ok(())
    }
}

fn default_backend() -> StoreBackend {
    if cfg!(feature = "kubernetes") {
        StoreBackend::Kubernetes
    } else {
        StoreBackend::Memory
    }
}
