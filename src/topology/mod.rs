//! Replica set bootstrap.
//!
//! Node 0 is initiated as the sole member, then every other node is added
//! against node 0 in ascending index order. Adds are only issued after the
//! initiate command returned successfully; membership then needs a few seconds
//! to propagate, which is covered by a fixed settle delay.

use std::path::PathBuf;
use std::time::Duration;

use tokio::time::sleep;
use tracing::info;

use crate::admin::record_output;
use crate::constants::INITIAL_MEMBER_ID;
use crate::constants::LOOPBACK_IP;
use crate::constants::SETUP_OUTPUT_FILE;
use crate::constants::SETUP_SCRIPT_FILE;
use crate::AdminClient;
use crate::BootstrapMode;
use crate::CommandOutput;
use crate::FilesystemProvisioner;
use crate::OutputSink;
use crate::Result;

/// `rs.initiate(...)` declaring node 0 as the only member
pub fn initiate_command(
    cluster_name: &str,
    start_port: u16,
) -> String {
    format!(
        "rs.initiate({{ _id: \"{cluster_name}\", members: [ {{ \"_id\": {INITIAL_MEMBER_ID}, \"host\": \"{LOOPBACK_IP}:{start_port}\"}} ] }});"
    )
}

pub fn add_member_command(port: u16) -> String {
    format!("rs.add(\"{LOOPBACK_IP}:{port}\");")
}

/// Makes the shell exit non-zero when `command` replies with `ok: 0`.
///
/// The shell itself exits 0 on a rejected `rs.initiate`/`rs.add`, which would
/// let a script carry on adding members to a set that never formed.
pub fn checked_command(command: &str) -> String {
    format!("var res = {command} if (!res.ok) {{ printjson(res); quit(1); }}")
}

/// The full ordered bootstrap sequence: initiate, then one add per remaining node,
/// each guarded by [`checked_command`]
pub fn bootstrap_commands(
    cluster_name: &str,
    start_port: u16,
    num_instances: usize,
) -> Vec<String> {
    let mut commands = vec![initiate_command(cluster_name, start_port)];
    commands.extend((1..num_instances).map(|i| add_member_command(start_port + i as u16)));
    commands.iter().map(|c| checked_command(c)).collect()
}

pub struct TopologyInitializer {
    mode: BootstrapMode,
    settle: Duration,
    base_folder: PathBuf,
}

impl TopologyInitializer {
    pub fn new(
        mode: BootstrapMode,
        settle: Duration,
        base_folder: impl Into<PathBuf>,
    ) -> Self {
        Self {
            mode,
            settle,
            base_folder: base_folder.into(),
        }
    }

    pub fn script_path(&self) -> PathBuf {
        self.base_folder.join(SETUP_SCRIPT_FILE)
    }

    /// Runs the bootstrap sequence against node 0 on `start_port`.
    ///
    /// Any failing step aborts the sequence with the captured output; there is no retry.
    pub async fn initialize(
        &self,
        cluster_name: &str,
        start_port: u16,
        num_instances: usize,
        admin: &dyn AdminClient,
        sink: &dyn OutputSink,
    ) -> Result<()> {
        let commands = bootstrap_commands(cluster_name, start_port, num_instances);

        match self.mode {
            BootstrapMode::Script => {
                let script = self.script_path();
                info!("Creating shell script: {}", script.display());
                FilesystemProvisioner::new()
                    .write_file(&script, commands.join("\n").as_bytes())
                    .await?;

                info!("Executing shell script");
                let result = admin.run_script(start_port, &script).await;
                record(sink, result).await?;
            }
            BootstrapMode::Eval => {
                for command in &commands {
                    let result = admin.eval(start_port, command).await;
                    record(sink, result).await?;
                }
            }
        }

        if !self.settle.is_zero() {
            info!("Waiting {:?} for replica set membership to propagate", self.settle);
            sleep(self.settle).await;
        }
        Ok(())
    }
}

async fn record(
    sink: &dyn OutputSink,
    result: Result<CommandOutput>,
) -> Result<CommandOutput> {
    record_output(sink, SETUP_OUTPUT_FILE, result).await
}
