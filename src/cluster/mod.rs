//! Cluster lifecycle façade.
//!
//! [`ClusterManager`] owns every node process and the base folder of one
//! cluster. `start()` launches the nodes, waits until they are live,
//! bootstraps the replica topology for multi-node clusters and confirms with
//! a status query. `stop()` terminates the nodes, waits for every exit and
//! only then purges the data.
//!
//! Both take `&mut self`, so calls on one manager are serialized by the
//! borrow checker. Distinct managers are independent but must be given
//! non-overlapping port ranges.
mod notifier;
mod phase;

pub use notifier::*;
pub use phase::*;

use std::env;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use nix::sys::signal::Signal;
use tokio::sync::broadcast;
use tokio::sync::watch;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::AdminClient;
use crate::ClusterConfig;
use crate::ClusterNamer;
use crate::ConsoleSink;
use crate::Error;
use crate::FileSink;
use crate::FilesystemProvisioner;
use crate::LivenessProbe;
use crate::NodeProcess;
use crate::NodeSpec;
use crate::OutputSink;
use crate::ProcessSupervisor;
use crate::Result;
use crate::ShellClient;
use crate::StatusChecker;
use crate::StatusReport;
use crate::TcpProbe;
use crate::TopologyInitializer;

pub struct ClusterManager {
    config: ClusterConfig,
    name: String,
    base_folder: PathBuf,
    /// `ip:port` per launched node, in launch order
    hosts: Vec<String>,
    nodes: Vec<NodeProcess>,
    last_status: Option<StatusReport>,

    supervisor: ProcessSupervisor,
    provisioner: FilesystemProvisioner,
    admin: Arc<dyn AdminClient>,
    probe: Arc<dyn LivenessProbe>,
    sink: Arc<dyn OutputSink>,
    notifier: ClusterNotifier,
}

impl ClusterManager {
    /// Validates `config` and names the cluster. Nothing is launched or
    /// written to disk until [`Self::start`].
    pub fn new(config: ClusterConfig) -> Result<Self> {
        let config = config.validate()?;
        let name = ClusterNamer::generate();
        let base_folder = config
            .base_folder
            .clone()
            .unwrap_or_else(|| env::temp_dir().join(&name));

        let sink: Arc<dyn OutputSink> = if config.verbose {
            Arc::new(ConsoleSink)
        } else {
            Arc::new(FileSink::new(base_folder.clone()))
        };

        Ok(Self {
            supervisor: ProcessSupervisor::new(config.server.clone(), config.verbose),
            provisioner: FilesystemProvisioner::new(),
            admin: Arc::new(ShellClient::from_config(&config.client)),
            probe: Arc::new(TcpProbe),
            sink,
            notifier: ClusterNotifier::new(),
            hosts: Vec::with_capacity(config.num_instances),
            nodes: Vec::with_capacity(config.num_instances),
            last_status: None,
            config,
            name,
            base_folder,
        })
    }

    pub fn with_admin_client(
        mut self,
        admin: Arc<dyn AdminClient>,
    ) -> Self {
        self.admin = admin;
        self
    }

    pub fn with_liveness_probe(
        mut self,
        probe: Arc<dyn LivenessProbe>,
    ) -> Self {
        self.probe = probe;
        self
    }

    pub fn with_output_sink(
        mut self,
        sink: Arc<dyn OutputSink>,
    ) -> Self {
        self.sink = sink;
        self
    }

    /// Replica set name; also the default base folder name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base_folder(&self) -> &Path {
        &self.base_folder
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.notifier.phase()
    }

    /// `ip:port` of every node in launch order; complete once `start()` has launched all nodes.
    pub fn get_hosts(&self) -> &[String] {
        &self.hosts
    }

    pub fn nodes(&self) -> &[NodeProcess] {
        &self.nodes
    }

    /// Raw payload of the last successful status query
    pub fn last_status(&self) -> Option<&StatusReport> {
        self.last_status.as_ref()
    }

    /// Lifecycle events: `InstancesLaunched`, `Ready`, `Stopped`
    pub fn subscribe(&self) -> broadcast::Receiver<ClusterEvent> {
        self.notifier.subscribe()
    }

    pub fn watch_phase(&self) -> watch::Receiver<Phase> {
        self.notifier.watch_phase()
    }

    /// Launches, settles, bootstraps and verifies the cluster.
    ///
    /// On a launch failure every node that did start is terminated before
    /// the error is returned; the base folder is kept for diagnostics until
    /// [`Self::stop`]. On an initiation failure nodes stay up for inspection.
    /// Either way the phase becomes [`Phase::Failed`] and `Ready` never fires.
    pub async fn start(&mut self) -> Result<()> {
        let phase = self.phase();
        if phase != Phase::Created {
            return Err(Error::InvalidPhase {
                current: phase,
                expected: "created",
            });
        }

        self.transition(Phase::Launching);
        if let Err(e) = self.launch_all().await {
            error!("{}", e);
            info!("Stopping already launched instances");
            self.supervisor
                .kill_all(&self.nodes, self.config.readiness.kill_grace())
                .await;
            self.transition(Phase::Failed);
            return Err(e);
        }
        self.notifier.emit(ClusterEvent::InstancesLaunched);

        if let Err(e) = self.initialize().await {
            error!("{}", e);
            self.transition(Phase::Failed);
            return Err(e);
        }

        info!(
            "{}",
            if self.config.is_replica_set() {
                "Replica set ready"
            } else {
                "Host ready"
            }
        );
        self.transition(Phase::Ready);
        self.notifier.emit(ClusterEvent::Ready);
        Ok(())
    }

    /// Terminates every node, waits for each exit, then purges the base folder.
    ///
    /// Never fails: exited nodes and a missing folder already satisfy the goal,
    /// and a purge error is only logged. Calling it again once stopped is a
    /// no-op, so `Stopped` fires once. A `stop()` cancelled part way can be
    /// called again and finishes the teardown.
    pub async fn stop(&mut self) {
        if self.phase() == Phase::Stopped {
            debug!("cluster {} already stopped", self.name);
            return;
        }

        info!(
            "{}",
            if self.config.is_replica_set() {
                "Stopping replica set"
            } else {
                "Stopping host"
            }
        );
        // a cancelled stop() leaves the phase at Stopping; resume from there
        if self.phase() != Phase::Stopping {
            self.transition(Phase::Stopping);
        }

        self.supervisor
            .kill_all(&self.nodes, self.config.readiness.kill_grace())
            .await;

        if let Err(e) = self.provisioner.purge(&self.base_folder).await {
            warn!("failed to purge {}: {}", self.base_folder.display(), e);
        }

        self.transition(Phase::Stopped);
        self.notifier.emit(ClusterEvent::Stopped);
    }

    async fn launch_all(&mut self) -> Result<()> {
        let replica_name = if self.config.is_replica_set() {
            info!("Initialise replica set {}", self.name);
            Some(self.name.clone())
        } else {
            info!("Initialise single host");
            None
        };

        let plan = NodeSpec::plan(
            self.config.num_instances,
            self.config.start_port,
            &self.base_folder,
        );
        for spec in &plan {
            self.provisioner.ensure_dir(&spec.data_dir).await?;
            let node = self.supervisor.launch(spec, replica_name.as_deref())?;
            self.hosts.push(spec.host());
            self.nodes.push(node);
        }

        self.supervisor
            .await_ready(&self.nodes, self.probe.as_ref(), &self.config.readiness)
            .await?;
        Ok(())
    }

    async fn initialize(&mut self) -> Result<()> {
        if self.config.is_replica_set() {
            self.transition(Phase::Initializing);
            TopologyInitializer::new(
                self.config.client.bootstrap,
                self.config.readiness.topology_settle(),
                &self.base_folder,
            )
            .initialize(
                &self.name,
                self.config.start_port,
                self.config.num_instances,
                self.admin.as_ref(),
                self.sink.as_ref(),
            )
            .await?;
        }

        let report = StatusChecker::new(self.config.is_replica_set())
            .check(self.config.start_port, self.admin.as_ref(), self.sink.as_ref())
            .await?;
        debug!("status: {}", report.raw.trim_end());
        self.last_status = Some(report);
        Ok(())
    }

    fn transition(
        &self,
        next: Phase,
    ) {
        let current = self.phase();
        debug_assert!(
            current.can_transition_to(next),
            "illegal phase transition {current} -> {next}"
        );
        debug!("cluster {}: {} -> {}", self.name, current, next);
        self.notifier.set_phase(next);
    }
}

impl Drop for ClusterManager {
    fn drop(&mut self) {
        let running: Vec<&NodeProcess> = self.nodes.iter().filter(|n| !n.has_exited()).collect();
        if running.is_empty() {
            return;
        }
        warn!(
            "cluster {} dropped without stop(), killing {} instances; {} is left behind",
            self.name,
            running.len(),
            self.base_folder.display()
        );
        for node in running {
            node.signal(Signal::SIGKILL);
        }
    }
}
