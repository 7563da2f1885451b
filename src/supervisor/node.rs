use std::fmt;
use std::os::unix::process::ExitStatusExt;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitStatus;

use nix::errno::Errno;
use nix::sys::signal::kill;
use nix::sys::signal::Signal;
use nix::unistd::Pid;
use tokio::process::Child;
use tokio::sync::watch;
use tracing::error;
use tracing::warn;

use crate::constants::DATA_DIR_PREFIX;
use crate::constants::LOOPBACK_IP;
use crate::Error;
use crate::Result;

/// Where one node lives: its position, port and data directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSpec {
    pub index: usize,
    pub port: u16,
    pub data_dir: PathBuf,
}

impl NodeSpec {
    /// Node `index` of a cluster starting at `start_port`, stored under `base_folder/data<index>`.
    ///
    /// Port range overflow is rejected by config validation.
    pub fn new(
        index: usize,
        start_port: u16,
        base_folder: &Path,
    ) -> Self {
        Self {
            index,
            port: start_port + index as u16,
            data_dir: base_folder.join(format!("{DATA_DIR_PREFIX}{index}")),
        }
    }

    /// All node specs of a cluster, in launch order
    pub fn plan(
        num_instances: usize,
        start_port: u16,
        base_folder: &Path,
    ) -> Vec<Self> {
        (0..num_instances)
            .map(|i| Self::new(i, start_port, base_folder))
            .collect()
    }

    /// `ip:port` endpoint clients connect to
    pub fn host(&self) -> String {
        format!("{}:{}", LOOPBACK_IP, self.port)
    }
}

/// How a node process terminated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitRecord {
    pub pid: u32,
    /// `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
    pub signal: Option<i32>,
}

impl ExitRecord {
    pub(crate) fn from_status(
        pid: u32,
        status: ExitStatus,
    ) -> Self {
        Self {
            pid,
            exit_code: status.code(),
            signal: status.signal(),
        }
    }

    /// Exit observed but its status could not be collected
    pub(crate) fn unknown(pid: u32) -> Self {
        Self {
            pid,
            exit_code: None,
            signal: None,
        }
    }
}

impl fmt::Display for ExitRecord {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{} exited with code ", self.pid)?;
        match self.exit_code {
            Some(code) => write!(f, "{code}")?,
            None => f.write_str("null")?,
        }
        f.write_str(", signal: ")?;
        match self.signal.and_then(|s| Signal::try_from(s).ok()) {
            Some(signal) => write!(f, "{signal}"),
            None => match self.signal {
                Some(raw) => write!(f, "{raw}"),
                None => f.write_str("null"),
            },
        }
    }
}

/// A spawned node process and its exit observer.
///
/// The child handle itself is owned by the observer task; `NodeProcess` only
/// keeps the pid for signalling and a watch on the recorded exit.
#[derive(Debug)]
pub struct NodeProcess {
    spec: NodeSpec,
    pid: u32,
    exit_rx: watch::Receiver<Option<ExitRecord>>,
}

impl NodeProcess {
    /// Takes ownership of `child` and records its exit whenever it happens,
    /// including immediately after spawn.
    pub(crate) fn observe(
        spec: NodeSpec,
        mut child: Child,
    ) -> Result<Self> {
        let pid = child.id().ok_or_else(|| {
            Error::Fatal(format!("instance {} exited before its pid was read", spec.index))
        })?;
        let (exit_tx, exit_rx) = watch::channel(None);

        tokio::spawn(async move {
            let record = match child.wait().await {
                Ok(status) => ExitRecord::from_status(pid, status),
                Err(e) => {
                    warn!("failed to collect exit status of pid {}: {:?}", pid, e);
                    ExitRecord::unknown(pid)
                }
            };
            exit_tx.send_replace(Some(record));
        });

        Ok(Self { spec, pid, exit_rx })
    }

    pub fn spec(&self) -> &NodeSpec {
        &self.spec
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn host(&self) -> String {
        self.spec.host()
    }

    /// Exit record, absent while the process is running
    pub fn exit_record(&self) -> Option<ExitRecord> {
        *self.exit_rx.borrow()
    }

    pub fn has_exited(&self) -> bool {
        self.exit_rx.borrow().is_some()
    }

    /// Resolves once the exit observer has fired.
    pub async fn wait_for_exit(&self) -> ExitRecord {
        let mut rx = self.exit_rx.clone();
        let observed = rx.wait_for(Option::is_some).await.map(|record| *record);
        match observed {
            Ok(Some(record)) => record,
            // observer task dropped (runtime shutting down)
            _ => ExitRecord::unknown(self.pid),
        }
    }

    /// Sends `signal` unless the exit was already observed.
    pub(crate) fn signal(
        &self,
        signal: Signal,
    ) {
        if self.has_exited() {
            return;
        }
        match kill(Pid::from_raw(self.pid as i32), signal) {
            Ok(()) | Err(Errno::ESRCH) => {}
            Err(e) => error!("failed to send {} to pid {}: {}", signal, self.pid, e),
        }
    }
}
