use std::time::Duration;

use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Exponential backoff template for the liveness poll
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Single probe timeout (unit: milliseconds)
    #[serde(default = "default_probe_timeout_ms")]
    pub timeout_ms: u64,

    /// Backoff base (unit: milliseconds)
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Maximum backoff time (unit: milliseconds)
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            timeout_ms: default_probe_timeout_ms(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl BackoffPolicy {
    /// Delay to wait after `attempt` failed rounds (0-based), capped at `max_delay_ms`
    pub fn delay_for(
        &self,
        attempt: u32,
    ) -> Duration {
        let factor = 1u64.checked_shl(attempt.min(32)).unwrap_or(u64::MAX);
        let delay = self.base_delay_ms.saturating_mul(factor).min(self.max_delay_ms);
        Duration::from_millis(delay)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Timing knobs for settling, readiness, topology propagation and shutdown
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ReadinessConfig {
    /// Fixed window after launch during which an early exit counts as a launch failure
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Upper bound for the whole readiness poll
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default)]
    pub probe: BackoffPolicy,

    /// Wait after the add-member sequence for membership to propagate
    #[serde(default = "default_topology_settle_ms")]
    pub topology_settle_ms: u64,

    /// Time a node gets to exit after SIGTERM before it is sent SIGKILL
    #[serde(default = "default_kill_grace_ms")]
    pub kill_grace_ms: u64,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_delay_ms(),
            timeout_ms: default_timeout_ms(),
            probe: BackoffPolicy::default(),
            topology_settle_ms: default_topology_settle_ms(),
            kill_grace_ms: default_kill_grace_ms(),
        }
    }
}

impl ReadinessConfig {
    pub fn validate(&self) -> Result<()> {
        if self.timeout_ms == 0 {
            return Err(Error::Config(ConfigError::Message(
                "readiness.timeout_ms must be greater than 0".into(),
            )));
        }

        if self.probe.timeout_ms == 0 {
            return Err(Error::Config(ConfigError::Message(
                "readiness.probe.timeout_ms must be greater than 0".into(),
            )));
        }

        if self.probe.base_delay_ms > self.probe.max_delay_ms {
            return Err(Error::Config(ConfigError::Message(format!(
                "readiness.probe.base_delay_ms ({}) exceeds max_delay_ms ({})",
                self.probe.base_delay_ms, self.probe.max_delay_ms
            ))));
        }

        Ok(())
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn topology_settle(&self) -> Duration {
        Duration::from_millis(self.topology_settle_ms)
    }

    pub fn kill_grace(&self) -> Duration {
        Duration::from_millis(self.kill_grace_ms)
    }
}

fn default_probe_timeout_ms() -> u64 {
    500
}
fn default_base_delay_ms() -> u64 {
    100
}
fn default_max_delay_ms() -> u64 {
    1000
}
fn default_settle_delay_ms() -> u64 {
    500
}
fn default_timeout_ms() -> u64 {
    30_000
}
fn default_topology_settle_ms() -> u64 {
    3000
}
fn default_kill_grace_ms() -> u64 {
    10_000
}
