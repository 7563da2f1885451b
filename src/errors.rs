//! Cluster Harness Error Hierarchy
//!
//! Groups failures by the lifecycle stage that produced them: launching node
//! processes, bootstrapping the replica topology, and touching the filesystem.

use std::path::PathBuf;
use std::time::Duration;

use config::ConfigError;

use crate::ExitRecord;
use crate::Phase;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Node processes failed to start or settle
    #[error(transparent)]
    Launch(#[from] LaunchFailure),

    /// Replica topology bootstrap or status query failures
    #[error(transparent)]
    Initiation(#[from] InitiationFailure),

    /// Data directory creation or removal failures
    #[error(transparent)]
    Filesystem(#[from] FilesystemError),

    /// Configuration loading and validation failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Lifecycle operation invoked from a phase that does not allow it
    #[error("Operation requires {expected} phase but cluster is {current}")]
    InvalidPhase {
        current: Phase,
        expected: &'static str,
    },

    /// Unrecoverable failures requiring process termination
    #[error("Fatal error: {0}")]
    Fatal(String),
}

#[derive(Debug, thiserror::Error)]
pub enum LaunchFailure {
    /// The server binary could not be spawned at all
    #[error("Failed to spawn instance {index} ({program}): {source}")]
    Spawn {
        index: usize,
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// One or more nodes exited before the cluster settled
    #[error("Some instances failed to launch: {}", format_exit_records(.0))]
    Exited(Vec<ExitRecord>),

    /// Readiness poll exhausted while nodes were still alive but unreachable
    #[error("Instances {pending:?} not accepting connections after {timeout:?}")]
    NotReady {
        pending: Vec<String>,
        timeout: Duration,
    },
}

impl LaunchFailure {
    /// Exit records of the nodes that died, empty for non-exit failures
    pub fn exit_records(&self) -> &[ExitRecord] {
        match self {
            LaunchFailure::Exited(records) => records,
            _ => &[],
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InitiationFailure {
    /// The admin client binary could not be spawned
    #[error("Failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The admin client ran but reported failure
    #[error("Command `{command}` failed: {output}")]
    CommandFailed { command: String, output: String },
}

impl InitiationFailure {
    /// Command line that failed
    pub fn command(&self) -> &str {
        match self {
            InitiationFailure::Spawn { command, .. }
            | InitiationFailure::CommandFailed { command, .. } => command,
        }
    }

    /// Captured output of the failed command, if the command ran
    pub fn output(&self) -> Option<&str> {
        match self {
            InitiationFailure::CommandFailed { output, .. } => Some(output),
            InitiationFailure::Spawn { .. } => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FilesystemError {
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to remove {path}: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn format_exit_records(records: &[ExitRecord]) -> String {
    records.iter().map(|r| r.to_string()).collect::<Vec<_>>().join("; ")
}
