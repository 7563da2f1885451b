//! Configuration management for ephemeral clusters.
//!
//! Provides hierarchical configuration loading and validation with:
//! - Default values as code base
//! - Configuration file support
//! - Environment variable overrides
//! - Caller-supplied overrides via struct update syntax
mod readiness;
mod server;
pub use readiness::*;
pub use server::*;

use std::env;
use std::path::PathBuf;

use config::Config;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::constants::CONFIG_ENV_PREFIX;
use crate::Error;
use crate::Result;

/// Immutable description of the cluster to provision
///
/// Every field has a default, so callers override only what they need:
/// ```ignore
/// let config = ClusterConfig {
///     num_instances: 3,
///     start_port: 28000,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ClusterConfig {
    /// Number of server processes to launch
    #[serde(default = "default_num_instances")]
    pub num_instances: usize,

    /// Port of node 0; node `i` listens on `start_port + i`
    #[serde(default = "default_start_port")]
    pub start_port: u16,

    /// Root of all node data; defaults to `<temp dir>/<cluster name>`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_folder: Option<PathBuf>,

    /// Stream node and client output to the console instead of capture files
    #[serde(default, alias = "log_to_console")]
    pub verbose: bool,

    /// Colorize console log output
    #[serde(default)]
    pub use_colors: bool,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub client: ClientConfig,

    #[serde(default)]
    pub readiness: ReadinessConfig,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            num_instances: default_num_instances(),
            start_port: default_start_port(),
            base_folder: None,
            verbose: false,
            use_colors: false,
            server: ServerConfig::default(),
            client: ClientConfig::default(),
            readiness: ReadinessConfig::default(),
        }
    }
}

impl ClusterConfig {
    /// Loads configuration from hierarchical sources without validation.
    ///
    /// Sources are merged in the following order (later sources override earlier):
    /// 1. Type defaults (lowest priority)
    /// 2. Configuration file from `CONFIG_PATH` environment variable (if set)
    /// 3. Environment variables with `REPLSET__` prefix (highest priority)
    ///
    /// # Example
    /// ```ignore
    /// std::env::set_var("REPLSET__NUM_INSTANCES", "5");
    /// let cfg = ClusterConfig::new()?.validate()?;
    /// ```
    pub fn new() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Ok(config_path) = env::var("CONFIG_PATH") {
            builder = builder.add_source(File::with_name(&config_path).required(true));
        }

        builder = builder.add_source(env_source());

        let config: Self = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Applies additional overrides from file without validation.
    ///
    /// Environment variables are re-applied on top so they keep the highest priority.
    pub fn with_override_config(
        &self,
        path: &str,
    ) -> Result<Self> {
        let config: Self = Config::builder()
            .add_source(Config::try_from(self)?)
            .add_source(File::with_name(path))
            .add_source(env_source())
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Validates configuration and returns the validated instance.
    ///
    /// # Errors
    /// - `num_instances` is 0
    /// - `start_port` is 0 or the port range overflows 65535
    /// - empty program names or inconsistent readiness timings
    pub fn validate(self) -> Result<Self> {
        if self.num_instances == 0 {
            return Err(Error::Config(ConfigError::Message(
                "num_instances must be at least 1".into(),
            )));
        }

        if self.start_port == 0 {
            return Err(Error::Config(ConfigError::Message(
                "start_port must be a non-zero port".into(),
            )));
        }

        let last_port = self.start_port as usize + self.num_instances - 1;
        if last_port > u16::MAX as usize {
            return Err(Error::Config(ConfigError::Message(format!(
                "port range {}..={} exceeds {}",
                self.start_port,
                last_port,
                u16::MAX
            ))));
        }

        if let Some(base) = &self.base_folder {
            if base.as_os_str().is_empty() {
                return Err(Error::Config(ConfigError::Message(
                    "base_folder path cannot be empty".into(),
                )));
            }
        }

        self.server.validate()?;
        self.client.validate()?;
        self.readiness.validate()?;
        Ok(self)
    }

    /// Whether the cluster is a replica set (more than one node)
    pub fn is_replica_set(&self) -> bool {
        self.num_instances > 1
    }
}

fn env_source() -> Environment {
    Environment::with_prefix(CONFIG_ENV_PREFIX)
        .separator("__")
        .ignore_empty(true)
        .try_parsing(true)
}

fn default_num_instances() -> usize {
    3
}
fn default_start_port() -> u16 {
    27117
}
