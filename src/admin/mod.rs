//! Administrative client seam.
//!
//! The harness never speaks the database wire protocol itself; bootstrap and
//! status commands go through the vendor's shell tool, invoked one-shot per
//! command or per script.
mod sink;

pub use sink::*;

use std::fmt;
use std::path::Path;
use std::process::Output;
use std::process::Stdio;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use tokio::process::Command;
use tracing::debug;

use crate::ClientConfig;
use crate::InitiationFailure;
use crate::Result;

/// Captured result of one successful admin command
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    /// Command line as executed, for diagnostics
    pub command: String,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// stdout followed by stderr, skipping empty streams
    pub fn combined(&self) -> String {
        match (self.stdout.is_empty(), self.stderr.is_empty()) {
            (_, true) => self.stdout.clone(),
            (true, false) => self.stderr.clone(),
            (false, false) => format!("{}\n{}", self.stdout.trim_end(), self.stderr),
        }
    }
}

impl fmt::Display for CommandOutput {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}", self.combined())
    }
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait AdminClient: Send + Sync + 'static {
    /// Evaluates a single expression against the node on `port`.
    async fn eval(
        &self,
        port: u16,
        expression: &str,
    ) -> Result<CommandOutput>;

    /// Executes a script file against the node on `port`.
    async fn run_script(
        &self,
        port: u16,
        script: &Path,
    ) -> Result<CommandOutput>;
}

/// [`AdminClient`] backed by the `mongo`-compatible shell binary
#[derive(Debug, Clone)]
pub struct ShellClient {
    program: String,
    extra_args: Vec<String>,
}

impl ShellClient {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            extra_args: vec![],
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            program: config.program.clone(),
            extra_args: config.extra_args.clone(),
        }
    }

    async fn run(
        &self,
        command_args: Vec<String>,
    ) -> Result<CommandOutput> {
        let mut args = self.extra_args.clone();
        args.extend(command_args);
        let command = format!("{} {}", self.program, args.join(" "));
        debug!("{}", command);

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| InitiationFailure::Spawn {
                command: command.clone(),
                source,
            })?;

        capture(command, output)
    }
}

#[async_trait]
impl AdminClient for ShellClient {
    async fn eval(
        &self,
        port: u16,
        expression: &str,
    ) -> Result<CommandOutput> {
        self.run(vec![
            "--port".to_string(),
            port.to_string(),
            "--eval".to_string(),
            expression.to_string(),
        ])
        .await
    }

    async fn run_script(
        &self,
        port: u16,
        script: &Path,
    ) -> Result<CommandOutput> {
        self.run(vec![
            "--port".to_string(),
            port.to_string(),
            script.display().to_string(),
        ])
        .await
    }
}

/// Non-zero exit becomes [`InitiationFailure::CommandFailed`] carrying everything captured.
fn capture(
    command: String,
    output: Output,
) -> Result<CommandOutput> {
    let captured = CommandOutput {
        command,
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    };

    if output.status.success() {
        return Ok(captured);
    }

    let status = match output.status.code() {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    };
    Err(InitiationFailure::CommandFailed {
        output: format!("{status}\n{}", captured.combined()),
        command: captured.command,
    }
    .into())
}
