use std::fmt;

/// Cluster lifecycle phase
///
/// ```text
/// Created -> Launching -> [Initializing] -> Ready
///                 \              \
///                  +-> Failed <---+
/// any non-Stopped phase -> Stopping -> Stopped
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Created,
    Launching,
    /// Replica topology bootstrap, multi-node clusters only
    Initializing,
    Ready,
    Failed,
    Stopping,
    Stopped,
}

impl Phase {
    pub fn can_transition_to(
        self,
        next: Phase,
    ) -> bool {
        use Phase::*;
        match (self, next) {
            (Created, Launching) => true,
            (Launching, Initializing | Ready | Failed) => true,
            (Initializing, Ready | Failed) => true,
            (Stopping, Stopped) => true,
            (Stopping | Stopped, _) => false,
            (_, Stopping) => true,
            _ => false,
        }
    }

    /// No further progress is possible without `stop()`
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Failed | Phase::Stopped)
    }
}

impl fmt::Display for Phase {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let name = match self {
            Phase::Created => "created",
            Phase::Launching => "launching",
            Phase::Initializing => "initializing",
            Phase::Ready => "ready",
            Phase::Failed => "failed",
            Phase::Stopping => "stopping",
            Phase::Stopped => "stopped",
        };
        f.write_str(name)
    }
}
