//! Assembles a [`Supervisor`] from [`Settings`].
//!
//! Components not set explicitly fall back to what the settings ask for:
//! the configured store backend and the logging work unit.
//!
//! ## Example
//! ```ignore
//! let supervisor = SupervisorBuilder::new(settings)
//!     .store(Arc::new(MemLeaseStore::new()))
//!     .work(Arc::new(MyWork))
//!     .build()
//!     .await?;
//! let reason = supervisor.run(shutdown).await?;
//! ```

use std::sync::Arc;

use tracing::debug;

use super::Supervisor;
use crate::LeaderEventListener;
use crate::LeaseStore;
use crate::LogWorkUnit;
use crate::MemLeaseStore;
use crate::Result;
use crate::Settings;
use crate::StoreBackend;
use crate::StoreConfig;
use crate::WorkUnit;

pub struct SupervisorBuilder {
    settings: Settings,
    store: Option<Arc<dyn LeaseStore>>,
    work: Option<Arc<dyn WorkUnit>>,
    listeners: Vec<Arc<dyn LeaderEventListener>>,
}

impl SupervisorBuilder {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            store: None,
            work: None,
            listeners: Vec::new(),
        }
    }

    /// Overrides the backend selected by `store.backend`
    pub fn store(
        mut self,
        store: Arc<dyn LeaseStore>,
    ) -> Self {
        self.store = Some(store);
        self
    }

    pub fn work(
        mut self,
        work: Arc<dyn WorkUnit>,
    ) -> Self {
        self.work = Some(work);
        self
    }

    /// Extra election event handler, called after the leadership gate
    pub fn listener(
        mut self,
        listener: Arc<dyn LeaderEventListener>,
    ) -> Self {
        self.listeners.push(listener);
        self
    }

    pub async fn build(self) -> Result<Supervisor> {
        self.settings.validate()?;

        let store = match self.store {
            Some(store) => store,
            None => connect_store(&self.settings.store).await?,
        };
        let work = self
            .work
            .unwrap_or_else(|| Arc::new(LogWorkUnit::new(&self.settings.identity)));

        Ok(Supervisor {
            settings: self.settings,
            store,
            work,
            listeners: self.listeners,
        })
    }
}

/// Opens the lease backend named by the settings
pub async fn connect_store(config: &StoreConfig) -> Result<Arc<dyn LeaseStore>> {
    config.validate()?;
    debug!("connecting {:?} lease store", config.backend);

    match config.backend {
        StoreBackend::Memory => Ok(Arc::new(MemLeaseStore::new())),
        #[cfg(feature = "kubernetes")]
        StoreBackend::Kubernetes => Ok(Arc::new(crate::KubeLeaseStore::try_default().await?)),
        #[cfg(not(feature = "kubernetes"))]
        StoreBackend::Kubernetes => Err(crate::Error::invalid_config(
            "store.backend = kubernetes requires the `kubernetes` feature",
        )),
    }
}
