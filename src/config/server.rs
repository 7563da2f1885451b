use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// How the database server binary is invoked for each node
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    #[serde(default = "default_server_program")]
    pub program: String,

    /// Arguments placed before the generated port/dbpath/replica arguments
    #[serde(default)]
    pub extra_args: Vec<String>,

    /// Storage-engine compatibility flags
    #[serde(default = "default_storage_args")]
    pub storage_args: Vec<String>,

    #[serde(default = "default_oplog_size_mb")]
    pub oplog_size_mb: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            program: default_server_program(),
            extra_args: vec![],
            storage_args: default_storage_args(),
            oplog_size_mb: default_oplog_size_mb(),
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.program.trim().is_empty() {
            return Err(Error::Config(ConfigError::Message(
                "server.program cannot be empty".into(),
            )));
        }
        if self.oplog_size_mb == 0 {
            return Err(Error::Config(ConfigError::Message(
                "server.oplog_size_mb must be greater than 0".into(),
            )));
        }
        Ok(())
    }
}

/// Delivery mechanism for the replica bootstrap commands
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BootstrapMode {
    /// Write every command into one script and execute it once
    #[default]
    Script,
    /// Evaluate each command separately, in order; one client process per command
    Eval,
}

/// How the administrative client tool is invoked
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    #[serde(default = "default_client_program")]
    pub program: String,

    /// Arguments placed before the generated `--port ...` arguments
    #[serde(default)]
    pub extra_args: Vec<String>,

    #[serde(default)]
    pub bootstrap: BootstrapMode,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            program: default_client_program(),
            extra_args: vec![],
            bootstrap: BootstrapMode::default(),
        }
    }
}

impl ClientConfig {
    pub fn validate(&self) -> Result<()> {
        if self.program.trim().is_empty() {
            return Err(Error::Config(ConfigError::Message(
                "client.program cannot be empty".into(),
            )));
        }
        Ok(())
    }
}

fn default_server_program() -> String {
    "mongod".to_string()
}
fn default_storage_args() -> Vec<String> {
    vec!["--smallfiles".to_string()]
}
fn default_oplog_size_mb() -> u32 {
    128
}
fn default_client_program() -> String {
    "mongo".to_string()
}
