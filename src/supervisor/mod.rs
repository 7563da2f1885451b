//! Node process lifecycle: spawn, settle/readiness detection, termination.
//!
//! Every spawned server gets an exit observer that records `{pid, exit code,
//! signal}` the moment the process terminates. Launch failure detection and
//! shutdown are both driven by those records rather than by polling the OS.
mod node;

pub use node::*;

use std::collections::BTreeSet;
use std::process::Stdio;
use std::time::Duration;

use futures::future::join_all;
use nix::sys::signal::Signal;
use tokio::process::Command;
use tokio::time::sleep;
use tokio::time::timeout;
use tokio::time::Instant;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::BackoffPolicy;
use crate::LaunchFailure;
use crate::LivenessProbe;
use crate::ReadinessConfig;
use crate::Result;
use crate::ServerConfig;

pub struct ProcessSupervisor {
    server: ServerConfig,
    /// Inherit node stdout/stderr instead of discarding them
    verbose: bool,
}

impl ProcessSupervisor {
    pub fn new(
        server: ServerConfig,
        verbose: bool,
    ) -> Self {
        Self { server, verbose }
    }

    /// Full argument list for one node, excluding the program itself
    pub fn command_args(
        &self,
        spec: &NodeSpec,
        cluster_name: Option<&str>,
    ) -> Vec<String> {
        let mut args = self.server.extra_args.clone();
        args.extend([
            "--port".to_string(),
            spec.port.to_string(),
            "--dbpath".to_string(),
            spec.data_dir.display().to_string(),
        ]);
        args.extend(self.server.storage_args.iter().cloned());
        args.extend(["--oplogSize".to_string(), self.server.oplog_size_mb.to_string()]);
        if let Some(name) = cluster_name {
            args.extend(["--replSet".to_string(), name.to_string()]);
        }
        args
    }

    /// Starts the server for `spec`; passing `cluster_name` makes it a replica set member.
    ///
    /// The data directory must already exist. An immediate exit (bad arguments,
    /// port in use) is not an error here: it is recorded by the exit observer and
    /// reported by [`Self::await_settled`] / [`Self::await_ready`].
    pub fn launch(
        &self,
        spec: &NodeSpec,
        cluster_name: Option<&str>,
    ) -> Result<NodeProcess> {
        info!("Launch instance {}", spec.index);

        let args = self.command_args(spec, cluster_name);
        debug!("{} {}", self.server.program, args.join(" "));

        let (stdout, stderr) = if self.verbose {
            (Stdio::inherit(), Stdio::inherit())
        } else {
            (Stdio::null(), Stdio::null())
        };

        let child = Command::new(&self.server.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| LaunchFailure::Spawn {
                index: spec.index,
                program: self.server.program.clone(),
                source,
            })?;

        let node = NodeProcess::observe(spec.clone(), child)?;

        info!(
            "Launched instance (pid {}) listening on port {}, folder: {}",
            node.pid(),
            spec.port,
            spec.data_dir.display()
        );
        Ok(node)
    }

    /// Waits a fixed `delay`, then fails if any node has already exited.
    ///
    /// This is a heuristic: nodes still starting up count as settled, and exits
    /// after the delay are not detected by this call.
    pub async fn await_settled(
        &self,
        nodes: &[NodeProcess],
        delay: Duration,
    ) -> std::result::Result<(), LaunchFailure> {
        sleep(delay).await;
        check_exits(nodes)
    }

    /// Settles for `readiness.settle_delay_ms`, then polls every node with `probe`
    /// under exponential backoff until all are live.
    ///
    /// Each round checks exit records before probing, so a node dying at any
    /// point fails fast with [`LaunchFailure::Exited`]. Exceeding
    /// `readiness.timeout_ms` yields [`LaunchFailure::NotReady`].
    pub async fn await_ready(
        &self,
        nodes: &[NodeProcess],
        probe: &dyn LivenessProbe,
        readiness: &ReadinessConfig,
    ) -> std::result::Result<(), LaunchFailure> {
        self.await_settled(nodes, readiness.settle_delay()).await?;

        let deadline = Instant::now() + readiness.timeout();
        let policy: BackoffPolicy = readiness.probe;
        let mut pending: BTreeSet<usize> = (0..nodes.len()).collect();
        let mut attempt = 0u32;

        loop {
            check_exits(nodes)?;

            let round: Vec<usize> = pending.iter().copied().collect();
            let probes = round.into_iter().map(|i| {
                let host = nodes[i].host();
                async move { (i, probe.is_live(&host, policy.probe_timeout()).await) }
            });
            for (i, live) in join_all(probes).await {
                if live {
                    debug!("instance {} accepting connections", i);
                    pending.remove(&i);
                }
            }

            if pending.is_empty() {
                // a foreign listener on our port would pass the probe while our node died
                return check_exits(nodes);
            }

            let now = Instant::now();
            if now >= deadline {
                let pending: Vec<String> = pending.iter().map(|&i| nodes[i].host()).collect();
                warn!("instances {:?} still not live", pending);
                return Err(LaunchFailure::NotReady {
                    pending,
                    timeout: readiness.timeout(),
                });
            }

            let delay = policy.delay_for(attempt).min(deadline - now);
            attempt = attempt.saturating_add(1);
            sleep(delay).await;
        }
    }

    /// Terminates every running node and waits for each exit to be observed.
    ///
    /// Nodes get SIGTERM and `grace` to exit before SIGKILL. Already-exited
    /// nodes resolve immediately, so calling this twice is harmless.
    pub async fn kill_all(
        &self,
        nodes: &[NodeProcess],
        grace: Duration,
    ) {
        join_all(nodes.iter().map(|node| terminate(node, grace))).await;
    }
}

/// One record per node that has already exited
fn check_exits(nodes: &[NodeProcess]) -> std::result::Result<(), LaunchFailure> {
    let exited: Vec<ExitRecord> = nodes.iter().filter_map(NodeProcess::exit_record).collect();
    if exited.is_empty() {
        return Ok(());
    }
    for record in &exited {
        error!("{}", record);
    }
    Err(LaunchFailure::Exited(exited))
}

async fn terminate(
    node: &NodeProcess,
    grace: Duration,
) -> ExitRecord {
    if let Some(record) = node.exit_record() {
        return record;
    }

    debug!("Stopping instance {} (pid {})", node.spec().index, node.pid());
    node.signal(Signal::SIGTERM);
    match timeout(grace, node.wait_for_exit()).await {
        Ok(record) => record,
        Err(_) => {
            warn!(
                "pid {} still running {:?} after SIGTERM, sending SIGKILL",
                node.pid(),
                grace
            );
            node.signal(Signal::SIGKILL);
            node.wait_for_exit().await
        }
    }
}
