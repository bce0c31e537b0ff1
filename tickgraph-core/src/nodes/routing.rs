//! Routing modules: fan-out, pass-through and delay lines.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::engine::{ExecContext, Module};
use crate::error::Result;
use crate::signal::Signal;

/// Broadcasts input 0, clamped to `limit`, on every output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Splitter {
    pub limit: Signal,
}

impl Splitter {
    pub fn new(limit: f32) -> Self {
        Self {
            limit: Signal::new(limit),
        }
    }
}

impl Default for Splitter {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Module for Splitter {
    fn kind(&self) -> &'static str {
        "splitter"
    }

    fn execute(&mut self, ctx: &mut ExecContext<'_>) -> Result<()> {
        let input = ctx.input_at(0)?;
        let out = if input < self.limit { input } else { self.limit };
        ctx.push_all(out)
    }
}

/// Forwards input 0 unchanged. Used for transmitter/receiver pairs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relay;

impl Module for Relay {
    fn kind(&self) -> &'static str {
        "relay"
    }

    fn execute(&mut self, ctx: &mut ExecContext<'_>) -> Result<()> {
        let input = ctx.input_at(0)?;
        ctx.push_all(input)
    }
}

/// Emits the input it received `ticks` ticks earlier.
///
/// Starts out low. The history is dropped whenever the graph is rebuilt.
#[derive(Debug, Clone)]
pub struct Delay {
    ticks: usize,
    history: VecDeque<Signal>,
}

impl Delay {
    pub fn new(ticks: usize) -> Self {
        Self {
            ticks,
            history: Self::primed(ticks),
        }
    }

    pub fn ticks(&self) -> usize {
        self.ticks
    }

    fn primed(ticks: usize) -> VecDeque<Signal> {
        std::iter::repeat(Signal::LOW).take(ticks).collect()
    }
}

impl Module for Delay {
    fn kind(&self) -> &'static str {
        "delay"
    }

    fn execute(&mut self, ctx: &mut ExecContext<'_>) -> Result<()> {
        let input = ctx.input_at(0)?;
        self.history.push_back(input);
        let out = self.history.pop_front().unwrap_or(input);
        ctx.push_all(out)
    }

    fn on_graph_rebuild_requested(&mut self) {
        self.history = Self::primed(self.ticks);
    }
}
