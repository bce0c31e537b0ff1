//! Logic modules.
//!
//! Gates read the boolean interpretation of their inputs and emit canonical
//! high/low signals. `Compare` works on raw values.

use serde::{Deserialize, Serialize};

use crate::engine::{ExecContext, Module};
use crate::error::Result;
use crate::signal::Signal;

/// Two-input boolean operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GateKind {
    #[default]
    And,
    Or,
    Xor,
}

/// Two-input logic gate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicGate {
    pub op: GateKind,
}

impl LogicGate {
    pub fn new(op: GateKind) -> Self {
        Self { op }
    }

    pub fn apply(&self, a: Signal, b: Signal) -> Signal {
        match self.op {
            GateKind::And => a & b,
            GateKind::Or => a | b,
            GateKind::Xor => a ^ b,
        }
    }
}

impl Module for LogicGate {
    fn kind(&self) -> &'static str {
        "logic-gate"
    }

    fn execute(&mut self, ctx: &mut ExecContext<'_>) -> Result<()> {
        let out = self.apply(ctx.input_at(0)?, ctx.input_at(1)?);
        ctx.push_all(out)
    }
}

/// Inverter with an adjustable switching point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Not {
    /// Inputs at or above this read as on.
    pub threshold: Signal,
}

impl Not {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold: Signal::new(threshold),
        }
    }
}

impl Default for Not {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl Module for Not {
    fn kind(&self) -> &'static str {
        "not"
    }

    fn execute(&mut self, ctx: &mut ExecContext<'_>) -> Result<()> {
        let input = ctx.input_at(0)?;
        ctx.push_all(Signal::from_bool(input < self.threshold))
    }
}

/// Comparison performed by [`Compare`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Comparison {
    #[default]
    Less,
    Equal,
    Greater,
}

/// Compares input 0 against input 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Compare {
    pub comparison: Comparison,
}

impl Compare {
    /// Absolute tolerance for [`Comparison::Equal`].
    pub const TOLERANCE: f32 = 0.05;

    pub fn new(comparison: Comparison) -> Self {
        Self { comparison }
    }

    pub fn apply(&self, a: Signal, b: Signal) -> Signal {
        let result = match self.comparison {
            Comparison::Less => a < b,
            Comparison::Equal => (a.value() - b.value()).abs() <= Self::TOLERANCE,
            Comparison::Greater => a > b,
        };
        Signal::from_bool(result)
    }
}

impl Module for Compare {
    fn kind(&self) -> &'static str {
        "compare"
    }

    fn execute(&mut self, ctx: &mut ExecContext<'_>) -> Result<()> {
        let out = self.apply(ctx.input_at(0)?, ctx.input_at(1)?);
        ctx.push_all(out)
    }

    /// Pads whatever inputs are missing with noise and compares normally.
    fn garbage_execute(&mut self, ctx: &mut ExecContext<'_>) -> Result<()> {
        ctx.fill_missing_inputs(2);
        self.execute(ctx)
    }
}
