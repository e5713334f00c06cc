//! Configuration management for the agent sync subsystem.
//!
//! Provides hierarchical configuration loading and validation with:
//! - Default values as code base
//! - Environment variable overrides
//! - Configuration file support
//! - Component-wise validation
mod holder;
mod publisher;
mod secrets;
pub use holder::*;
pub use publisher::*;
pub use secrets::*;

#[cfg(test)]
mod config_test;

use std::env;

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

const ENV_PREFIX: &str = "AGENT_SYNC";

/// Main configuration container for the holders and the command publisher
///
/// Combines all subsystem configurations with hierarchical override support:
/// 1. Default values from code implementation
/// 2. Configuration file specified by `CONFIG_PATH`
/// 3. Environment variables (highest priority)
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct AgentSyncConfig {
    /// Topology broadcast settings
    #[serde(default)]
    pub topology: TopologyConfig,
    /// Per-host configuration event settings
    #[serde(default)]
    pub configs: ConfigsConfig,
    /// Command dispatch settings
    #[serde(default)]
    pub publisher: PublisherConfig,
    /// Keytab secret store settings
    #[serde(default)]
    pub secrets: SecretsConfig,
}

impl AgentSyncConfig {
    /// Loads configuration from hierarchical sources without validation.
    ///
    /// Configuration sources are merged in the following order (later sources override earlier):
    /// 1. Type defaults (lowest priority)
    /// 2. Configuration file from `CONFIG_PATH` environment variable (if set)
    /// 3. Environment variables with `AGENT_SYNC__` prefix (highest priority)
    ///
    /// # Note
    /// Validation is deferred so that further overrides can be applied via
    /// `with_override_config()`. Callers MUST call `validate()` before use.
    ///
    /// # Examples
    /// ```ignore
    /// std::env::set_var("AGENT_SYNC__PUBLISHER__UNASSIGNED_CLUSTER_ID", "0");
    /// let cfg = AgentSyncConfig::new()?.validate()?;
    /// ```
    pub fn new() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Ok(config_path) = env::var("CONFIG_PATH") {
            builder = builder.add_source(File::with_name(&config_path).required(true));
        }

        builder = builder.add_source(environment());

        let config: Self = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Applies additional configuration overrides from file without validation.
    ///
    /// Merging order (later sources override earlier):
    /// 1. Current configuration values
    /// 2. New configuration file
    /// 3. Latest environment variables (highest priority)
    pub fn with_override_config(
        &self,
        path: &str,
    ) -> Result<Self> {
        let config: Self = Config::builder()
            .add_source(Config::try_from(self)?)
            .add_source(File::with_name(path))
            .add_source(environment())
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Validates every section and returns the validated instance.
    ///
    /// # Errors
    /// Returns [`Error::InvalidConfig`] describing the first violated rule.
    pub fn validate(self) -> Result<Self> {
        self.topology.validate()?;
        self.configs.validate()?;
        self.publisher.validate()?;
        self.secrets.validate()?;
        Ok(self)
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .ignore_empty(true)
        .try_parsing(true)
}

/// Destinations are topic paths such as `/events/topologies`
pub(crate) fn validate_destination(
    field: &str,
    value: &str,
) -> Result<()> {
    if value.is_empty() || !value.starts_with('/') {
        return Err(Error::InvalidConfig(format!(
            "{field} must be an absolute topic path, got {value:?}"
        )));
    }
    Ok(())
}

pub(crate) fn validate_not_empty(
    field: &str,
    value: &str,
) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidConfig(format!("{field} cannot be empty")));
    }
    Ok(())
}
