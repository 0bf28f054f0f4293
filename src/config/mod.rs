//! Configuration management for a lease election candidate.
//!
//! Sources, in ascending priority:
//! 1. Default values (hardcoded)
//! 2. `config/elector` file (optional)
//! 3. Explicit file passed to [`Settings::load`], or the one named by `CONFIG_PATH`
//! 4. Deployment bootstrap variables: `HOSTNAME`, `LOCK_NAME`, `NAMESPACE`
//! 5. `ELECTOR__*` environment variables (highest priority)

mod election;
mod monitoring;
mod store;
mod work;
pub use election::*;
pub use monitoring::*;
pub use store::*;
pub use work::*;


//---
use std::env;

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::LeaseKey;
use crate::Result;

/// Bootstrap variables populated by the deployment platform
pub const HOSTNAME_ENV: &str = "HOSTNAME";
pub const LOCK_NAME_ENV: &str = "LOCK_NAME";
pub const NAMESPACE_ENV: &str = "NAMESPACE";
pub const CONFIG_PATH_ENV: &str = "CONFIG_PATH";

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Settings {
    /// Candidate identity, written as `holderIdentity` while leading
    #[serde(default)]
    pub identity: String,
    /// Lease record name
    #[serde(default)]
    pub lock_name: String,
    /// Lease record namespace
    #[serde(default)]
    pub namespace: String,
    /// Lease timing
    #[serde(default)]
    pub election: ElectionConfig,
    /// Work scheduler
    #[serde(default)]
    pub work: WorkConfig,
    /// Lease backend selection
    #[serde(default)]
    pub store: StoreConfig,
    /// Metrics and monitoring settings
    #[serde(default)]
    pub monitoring: MonitoringConfig,
}

impl Settings {
    /// Load and validate configuration from every source.
    ///
    /// # Arguments
    /// * `config_path` - Optional file overriding the `CONFIG_PATH` lookup
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut config = Config::builder();

        // 1. Optional base file
        config = config.add_source(File::with_name("config/elector").required(false));

        // 2. Explicit file
        if let Some(path) = config_path {
            config = config.add_source(File::with_name(path).required(true));
        } else if let Ok(path) = env::var(CONFIG_PATH_ENV) {
            config = config.add_source(File::with_name(&path).required(true));
        }

        // 3. Bootstrap variables
        config = config.add_source(Self::bootstrap_source()?);

        // 4. Environment variables (highest priority)
        config = config.add_source(
            Environment::with_prefix("ELECTOR")
                .separator("__")
                .ignore_empty(true)
                .try_parsing(true),
        );

        let settings: Settings = config.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Maps the platform's bootstrap variables onto settings keys. Empty
    /// values count as unset.
    fn bootstrap_source() -> Result<Config> {
        let lookup = |name: &str| env::var(name).ok().filter(|v| !v.is_empty());

        Ok(Config::builder()
            .set_override_option("identity", lookup(HOSTNAME_ENV))?
            .set_override_option("lock_name", lookup(LOCK_NAME_ENV))?
            .set_override_option("namespace", lookup(NAMESPACE_ENV))?
            .build()?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.identity.is_empty() {
            return Err(Error::invalid_config(format!(
                "identity is not set ({} env or ELECTOR__IDENTITY)",
                HOSTNAME_ENV
            )));
        }
        if self.lock_name.is_empty() {
            return Err(Error::invalid_config(format!(
                "lock_name is not set ({} env or ELECTOR__LOCK_NAME)",
                LOCK_NAME_ENV
            )));
        }
        if self.namespace.is_empty() {
            return Err(Error::invalid_config(format!(
                "namespace is not set ({} env or ELECTOR__NAMESPACE)",
                NAMESPACE_ENV
            )));
        }

        self.election.validate()?;
        self.work.validate()?;
        self.store.validate()?;
        self.monitoring.validate()?;

        Ok(())
    }

    pub fn lease_key(&self) -> LeaseKey {
        LeaseKey::new(&self.namespace, &self.lock_name)
    }
}
