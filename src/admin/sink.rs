use std::path::PathBuf;

use async_trait::async_trait;
use tracing::info;

use crate::CommandOutput;
use crate::Error;
use crate::FilesystemProvisioner;
use crate::Result;

const SEPARATOR: &str = "---------------------";

/// Destination for captured admin command output
#[async_trait]
pub trait OutputSink: Send + Sync + 'static {
    /// `target` names the capture, e.g. `setup-output.txt`
    async fn record(
        &self,
        target: &str,
        output: &CommandOutput,
    ) -> Result<()>;
}

/// Appends output to `<base_folder>/<target>`
#[derive(Debug, Clone)]
pub struct FileSink {
    base_folder: PathBuf,
    provisioner: FilesystemProvisioner,
}

impl FileSink {
    pub fn new(base_folder: impl Into<PathBuf>) -> Self {
        Self {
            base_folder: base_folder.into(),
            provisioner: FilesystemProvisioner::new(),
        }
    }

    pub fn path_of(
        &self,
        target: &str,
    ) -> PathBuf {
        self.base_folder.join(target)
    }
}

#[async_trait]
impl OutputSink for FileSink {
    async fn record(
        &self,
        target: &str,
        output: &CommandOutput,
    ) -> Result<()> {
        let mut text = format!("$ {}\n{}", output.command, output.combined());
        if !text.ends_with('\n') {
            text.push('\n');
        }
        self.provisioner.append_file(&self.path_of(target), text.as_bytes()).await
    }
}

/// Streams output to the log instead of capture files
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleSink;

#[async_trait]
impl OutputSink for ConsoleSink {
    async fn record(
        &self,
        target: &str,
        output: &CommandOutput,
    ) -> Result<()> {
        info!(
            "{} ({})\n{}\n{}{}",
            output.command,
            target,
            SEPARATOR,
            output.combined(),
            SEPARATOR
        );
        Ok(())
    }
}

/// Sends successful or failed command output to `sink`, passing the result through.
pub(crate) async fn record_output(
    sink: &dyn OutputSink,
    target: &str,
    result: Result<CommandOutput>,
) -> Result<CommandOutput> {
    match result {
        Ok(output) => {
            sink.record(target, &output).await?;
            Ok(output)
        }
        Err(Error::Initiation(failure)) => {
            if let Some(text) = failure.output() {
                let failed = CommandOutput {
                    command: failure.command().to_string(),
                    stdout: text.to_string(),
                    stderr: String::new(),
                };
                // keep the original failure even if capturing it fails
                let _ = sink.record(target, &failed).await;
            }
            Err(Error::Initiation(failure))
        }
        Err(e) => Err(e),
    }
}
