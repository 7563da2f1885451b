//! Lifecycle notification channels.
//!
//! [`ClusterNotifier`] pairs a `broadcast` channel for discrete lifecycle
//! events with a `watch` channel holding the current [`Phase`]. It keeps an
//! internal phase receiver so the watch sender stays usable after every
//! subscriber is gone.

use tokio::sync::broadcast;
use tokio::sync::watch;
use tracing::trace;

use crate::Phase;

/// Discrete lifecycle events a caller can wait on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterEvent {
    /// Every node process survived the settle/readiness window
    InstancesLaunched,
    /// Topology bootstrapped (if any) and status confirmed
    Ready,
    /// Processes terminated and data purged
    Stopped,
}

const EVENT_CAPACITY: usize = 16;

pub struct ClusterNotifier {
    events: broadcast::Sender<ClusterEvent>,
    phase_tx: watch::Sender<Phase>,
    _phase_rx: watch::Receiver<Phase>,
}

impl ClusterNotifier {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let (phase_tx, phase_rx) = watch::channel(Phase::Created);
        Self {
            events,
            phase_tx,
            _phase_rx: phase_rx,
        }
    }

    /// Receives every event emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<ClusterEvent> {
        self.events.subscribe()
    }

    /// Observes phase changes; the current phase is readable immediately.
    pub fn watch_phase(&self) -> watch::Receiver<Phase> {
        self.phase_tx.subscribe()
    }

    pub fn phase(&self) -> Phase {
        *self.phase_tx.borrow()
    }

    pub(crate) fn emit(
        &self,
        event: ClusterEvent,
    ) {
        // no subscribers is fine
        if self.events.send(event).is_err() {
            trace!("no subscriber for {:?}", event);
        }
    }

    pub(crate) fn set_phase(
        &self,
        phase: Phase,
    ) {
        self.phase_tx.send_replace(phase);
    }
}

impl Default for ClusterNotifier {
    fn default() -> Self {
        Self::new()
    }
}
