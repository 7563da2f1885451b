//! Shared fixtures for unit tests: a `/bin/sh` stand-in for the database
//! server and readiness timings short enough for tests.
use std::time::Duration;

use crate::BackoffPolicy;
use crate::ReadinessConfig;
use crate::ServerConfig;

/// Long-running stand-in that ignores the generated server arguments
pub(crate) const SLEEPING_SERVER: &str = "exec sleep 30";

/// Stand-in that dies as soon as it starts, like a server given bad arguments
pub(crate) const CRASHING_SERVER: &str = "exit 3";

/// Stand-in that ignores SIGTERM and needs SIGKILL
pub(crate) const STUBBORN_SERVER: &str = "trap '' TERM; while :; do sleep 0.1; done";

/// Runs `script` through `sh -c`; generated arguments become `$1..` and are ignored.
pub(crate) fn fake_server(script: &str) -> ServerConfig {
    ServerConfig {
        program: "sh".to_string(),
        extra_args: vec!["-c".to_string(), script.to_string(), "fake-mongod".to_string()],
        storage_args: vec![],
        oplog_size_mb: 8,
    }
}

pub(crate) fn fast_readiness() -> ReadinessConfig {
    ReadinessConfig {
        settle_delay_ms: 200,
        timeout_ms: 2000,
        probe: BackoffPolicy {
            timeout_ms: 100,
            base_delay_ms: 10,
            max_delay_ms: 50,
        },
        topology_settle_ms: 0,
        kill_grace_ms: 2000,
    }
}

pub(crate) const SHORT_GRACE: Duration = Duration::from_millis(300);
