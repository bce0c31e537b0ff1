//! Probe: an observable sink.
//!
//! A probe records what arrives on its inputs every tick into a shared
//! [`ProbeHandle`]. Presentation code (or a test) keeps the handle and reads
//! the latest values from any thread.

use std::sync::Arc;

use parking_lot::Mutex;
use smallvec::SmallVec;

use crate::engine::{ExecContext, Module};
use crate::error::Result;
use crate::signal::Signal;

/// What a probe has observed.
#[derive(Debug, Clone, Default)]
pub struct ProbeState {
    /// Inputs of the most recent execution.
    pub last: SmallVec<[Signal; 4]>,
    /// Number of executions since creation.
    pub samples: u64,
    /// Whether the probe is part of the installed plan.
    pub live: bool,
}

/// Read side of a [`Probe`].
#[derive(Debug, Clone, Default)]
pub struct ProbeHandle(Arc<Mutex<ProbeState>>);

impl ProbeHandle {
    /// Copy of the current state.
    pub fn snapshot(&self) -> ProbeState {
        self.0.lock().clone()
    }

    /// Latest value on input `index`.
    pub fn last(&self, index: usize) -> Option<Signal> {
        self.0.lock().last.get(index).copied()
    }

    /// Executions so far.
    pub fn samples(&self) -> u64 {
        self.0.lock().samples
    }

    /// Whether the probe is scheduled.
    pub fn is_live(&self) -> bool {
        self.0.lock().live
    }
}

/// Sink that records its inputs.
#[derive(Debug)]
pub struct Probe {
    state: ProbeHandle,
}

impl Probe {
    /// Create a probe and the handle that observes it.
    pub fn new() -> (Self, ProbeHandle) {
        let handle = ProbeHandle::default();
        (
            Self {
                state: handle.clone(),
            },
            handle,
        )
    }
}

impl Module for Probe {
    fn kind(&self) -> &'static str {
        "probe"
    }

    fn execute(&mut self, ctx: &mut ExecContext<'_>) -> Result<()> {
        let mut state = self.state.0.lock();
        state.last = ctx.input().iter().copied().collect();
        state.samples += 1;
        drop(state);

        // Inline probes pass input 0 through.
        let forward = ctx.input().first().copied().unwrap_or(Signal::LOW);
        ctx.push_all(forward)
    }

    fn on_graph_rebuild_requested(&mut self) {
        let mut state = self.state.0.lock();
        state.live = false;
        state.last.clear();
    }

    fn on_graph_built(&mut self) {
        self.state.0.lock().live = true;
    }
}
