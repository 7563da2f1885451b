use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use replset_harness::AdminClient;
use replset_harness::BackoffPolicy;
use replset_harness::ClientConfig;
use replset_harness::ClusterConfig;
use replset_harness::CommandOutput;
use replset_harness::InitiationFailure;
use replset_harness::LivenessProbe;
use replset_harness::ReadinessConfig;
use replset_harness::Result;
use replset_harness::ServerConfig;

pub const CLUSTER_PORT_BASE: u16 = 30100;

/// Stand-in server that stays up until signalled
pub const SLEEPING_SERVER: &str = "exec sleep 30";

/// Runs `script` through `sh -c`, ignoring the generated arguments.
pub fn stand_in_server(script: &str) -> ServerConfig {
    ServerConfig {
        program: "sh".to_string(),
        extra_args: vec!["-c".to_string(), script.to_string(), "fake-mongod".to_string()],
        storage_args: vec![],
        oplog_size_mb: 8,
    }
}

/// Admin client that echoes its arguments, so every command "succeeds".
pub fn echo_client() -> ClientConfig {
    ClientConfig {
        program: "sh".to_string(),
        extra_args: vec!["-c".to_string(), "echo \"$*\"".to_string(), "fake-mongo".to_string()],
        ..Default::default()
    }
}

pub fn cluster_config(
    num_instances: usize,
    start_port: u16,
    base_folder: &Path,
) -> ClusterConfig {
    ClusterConfig {
        num_instances,
        start_port,
        base_folder: Some(base_folder.to_path_buf()),
        server: stand_in_server(SLEEPING_SERVER),
        client: echo_client(),
        readiness: ReadinessConfig {
            settle_delay_ms: 200,
            timeout_ms: 2000,
            probe: BackoffPolicy {
                timeout_ms: 100,
                base_delay_ms: 10,
                max_delay_ms: 50,
            },
            topology_settle_ms: 0,
            kill_grace_ms: 2000,
        },
        ..Default::default()
    }
}

pub struct AlwaysLive;

#[async_trait]
impl LivenessProbe for AlwaysLive {
    async fn is_live(
        &self,
        _addr: &str,
        _probe_timeout: Duration,
    ) -> bool {
        true
    }
}

/// Records every admin invocation; fails any eval containing `fail_on`.
#[derive(Default)]
pub struct RecordingAdmin {
    pub calls: Mutex<Vec<String>>,
    pub fail_on: Option<String>,
}

impl RecordingAdmin {
    pub fn failing_on(pattern: &str) -> Self {
        Self {
            calls: Mutex::new(vec![]),
            fail_on: Some(pattern.to_string()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AdminClient for RecordingAdmin {
    async fn eval(
        &self,
        port: u16,
        expression: &str,
    ) -> Result<CommandOutput> {
        let command = format!("--port {port} --eval {expression}");
        self.calls.lock().unwrap().push(command.clone());
        if let Some(pattern) = &self.fail_on {
            if expression.contains(pattern.as_str()) {
                return Err(InitiationFailure::CommandFailed {
                    command,
                    output: "exit code 1\nnot reachable/healthy".to_string(),
                }
                .into());
            }
        }
        Ok(CommandOutput {
            command,
            stdout: "{ \"ok\" : 1 }".to_string(),
            stderr: String::new(),
        })
    }

    async fn run_script(
        &self,
        port: u16,
        script: &Path,
    ) -> Result<CommandOutput> {
        let command = format!("--port {port} {}", script.display());
        self.calls.lock().unwrap().push(command.clone());
        Ok(CommandOutput {
            command,
            stdout: String::new(),
            stderr: String::new(),
        })
    }
}

pub fn base_folder_in(dir: &tempfile::TempDir) -> PathBuf {
    dir.path().join("cluster")
}
