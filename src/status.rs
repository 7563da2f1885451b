//! One-shot status query used as the final readiness signal.
//!
//! The payload is returned raw and never interpreted: a status command that
//! runs without error is what "ready" means here. Member health inside the
//! payload is not checked.

use tracing::info;

use crate::admin::record_output;
use crate::constants::HOST_STATUS_EXPR;
use crate::constants::REPLICA_STATUS_EXPR;
use crate::constants::STATUS_OUTPUT_FILE;
use crate::AdminClient;
use crate::OutputSink;
use crate::Result;

/// Whatever the server answered to the status query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub raw: String,
}

pub struct StatusChecker {
    replica_set: bool,
}

impl StatusChecker {
    pub fn new(replica_set: bool) -> Self {
        Self { replica_set }
    }

    /// Replica status for replica sets, a ping for single hosts
    pub fn expression(&self) -> &'static str {
        if self.replica_set {
            REPLICA_STATUS_EXPR
        } else {
            HOST_STATUS_EXPR
        }
    }

    /// Queries node 0 on `port` once.
    pub async fn check(
        &self,
        port: u16,
        admin: &dyn AdminClient,
        sink: &dyn OutputSink,
    ) -> Result<StatusReport> {
        info!(
            "{}",
            if self.replica_set {
                "Checking replica status"
            } else {
                "Checking host status"
            }
        );

        let result = admin.eval(port, self.expression()).await;
        let output = record_output(sink, STATUS_OUTPUT_FILE, result).await?;
        Ok(StatusReport { raw: output.stdout })
    }
}
