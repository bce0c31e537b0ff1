//! Module Execution Contract
//!
//! [`Module`] is the whole surface the builder and scheduler depend on: two
//! execution entry points and two lifecycle hooks, plus the source flag used
//! for root discovery. Node types implement it; the engine never looks inside.
//!
//! # Pushing Outputs
//!
//! A module publishes its results through [`ExecContext::push`] before
//! returning. The values land directly in the input buffers of the wired
//! successors, so a successor later in the same tick's order already sees
//! them. The push boundary is checked: the slice must hold exactly one value
//! per declared output port.

use std::collections::HashMap;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::Rng;
use smallvec::SmallVec;

use crate::error::{EngineError, Result};
use crate::graph::{ModuleId, PortRole, Topology};
use crate::signal::Signal;

/// Per-tick input buffer. One entry per incoming push, in push order.
pub type InputBuffer = SmallVec<[Signal; 4]>;

/// Capability every executable node implements.
pub trait Module: Send {
    /// Short type name used in logs.
    fn kind(&self) -> &'static str;

    /// Normal behavior. Must push one value per declared output port.
    fn execute(&mut self, ctx: &mut ExecContext<'_>) -> Result<()>;

    /// Degraded behavior for modules flagged broken.
    ///
    /// Must still push a value on every declared output port so downstream
    /// modules are never starved. The default pushes pseudo-random filler.
    fn garbage_execute(&mut self, ctx: &mut ExecContext<'_>) -> Result<()> {
        ctx.push_garbage()
    }

    /// The graph is about to be rebuilt and this module was part of the old
    /// order. Reset latched state here.
    fn on_graph_rebuild_requested(&mut self) {}

    /// The module is part of a freshly installed order.
    fn on_graph_built(&mut self) {}

    /// Whether the module can run without upstream input. Sources are the
    /// roots of sink discovery; a module that no source reaches never runs.
    fn is_execution_source(&self) -> bool {
        false
    }
}

/// Which tick is running and the simulated time at its start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickInfo {
    /// Zero-based tick number.
    pub tick: u64,

    /// `tick * period`.
    pub time: Duration,
}

/// Everything a module may touch while it executes.
pub struct ExecContext<'a> {
    id: ModuleId,
    topology: &'a Topology,
    input: InputBuffer,
    buffers: &'a mut HashMap<ModuleId, InputBuffer>,
    rng: &'a mut StdRng,
    tick: TickInfo,
    pushed: bool,
}

impl<'a> ExecContext<'a> {
    pub(crate) fn new(
        id: ModuleId,
        topology: &'a Topology,
        buffers: &'a mut HashMap<ModuleId, InputBuffer>,
        rng: &'a mut StdRng,
        tick: TickInfo,
    ) -> Self {
        let input = buffers.get(&id).cloned().unwrap_or_default();
        Self {
            id,
            topology,
            input,
            buffers,
            rng,
            tick,
            pushed: false,
        }
    }

    /// Handle of the executing module.
    pub fn id(&self) -> ModuleId {
        self.id
    }

    /// Ports and neighbors of the executing module.
    pub fn topology(&self) -> &Topology {
        self.topology
    }

    /// Current tick.
    pub fn tick(&self) -> TickInfo {
        self.tick
    }

    /// Simulated time at the start of this tick.
    pub fn time(&self) -> Duration {
        self.tick.time
    }

    /// Inputs pushed to this module so far this tick.
    pub fn input(&self) -> &[Signal] {
        &self.input
    }

    /// Input at `index`, or [`EngineError::MissingInput`] if it never arrived.
    pub fn input_at(&self, index: usize) -> Result<Signal> {
        self.input
            .get(index)
            .copied()
            .ok_or(EngineError::MissingInput {
                module: self.id,
                index,
                available: self.input.len(),
            })
    }

    /// Number of declared input ports.
    pub fn expected_inputs(&self) -> usize {
        self.topology.input_count()
    }

    /// Number of declared output ports.
    pub fn output_count(&self) -> usize {
        self.topology.output_count()
    }

    /// Pads the local input copy with random values until it holds `count`.
    pub fn fill_missing_inputs(&mut self, count: usize) {
        while self.input.len() < count {
            let filler = self.rng.gen::<f32>();
            self.input.push(Signal::new(filler));
        }
    }

    /// The degraded-execution RNG.
    pub fn rng(&mut self) -> &mut StdRng {
        &mut *self.rng
    }

    /// Publish one value per declared output port, in port order.
    ///
    /// The k-th value goes to the neighbor of the k-th output port. Values
    /// for unwired ports are dropped.
    pub fn push(&mut self, outputs: &[Signal]) -> Result<()> {
        let expected = self.topology.output_count();
        if outputs.len() != expected {
            return Err(EngineError::OutputCountMismatch {
                module: self.id,
                expected,
                got: outputs.len(),
            });
        }

        for (value, port) in outputs.iter().zip(self.topology.layout().ports(PortRole::Output)) {
            let Some(target) = self.topology.neighbor(port)? else {
                continue;
            };
            match self.buffers.get_mut(&target) {
                Some(buffer) => buffer.push(*value),
                None => tracing::warn!(module = %self.id, port, %target, "output wired to a missing module"),
            }
        }

        self.pushed = true;
        Ok(())
    }

    /// Publish the same value on every output port.
    pub fn push_all(&mut self, value: Signal) -> Result<()> {
        let outputs: SmallVec<[Signal; 4]> = (0..self.output_count()).map(|_| value).collect();
        self.push(&outputs)
    }

    /// Publish one random value in `[0, 1)` per output port.
    pub fn push_garbage(&mut self) -> Result<()> {
        let outputs: SmallVec<[Signal; 4]> = (0..self.output_count())
            .map(|_| Signal::new(self.rng.gen::<f32>()))
            .collect();
        self.push(&outputs)
    }

    /// Whether anything was pushed during this call.
    pub(crate) fn has_pushed(&self) -> bool {
        self.pushed
    }
}
