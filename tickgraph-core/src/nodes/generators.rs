//! Execution sources: modules that run without upstream input.

use serde::{Deserialize, Serialize};

use crate::engine::{ExecContext, Module};
use crate::error::Result;
use crate::signal::Signal;

/// Pushes a fixed value on every output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Constant {
    pub value: Signal,
}

impl Constant {
    pub fn new(value: f32) -> Self {
        Self {
            value: Signal::new(value),
        }
    }
}

impl Default for Constant {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Module for Constant {
    fn kind(&self) -> &'static str {
        "constant"
    }

    fn execute(&mut self, ctx: &mut ExecContext<'_>) -> Result<()> {
        ctx.push_all(self.value)
    }

    fn is_execution_source(&self) -> bool {
        true
    }
}

/// Sine oscillator whose amplitude comes from input 0.
///
/// Output is `a/2 + sin(t * f^2 * MAX_FREQUENCY) * a/2` for amplitude `a`
/// and normalised frequency `f`, or low when either is not positive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Oscillator {
    /// Normalised frequency in `[0, 1]`.
    pub frequency: f32,
}

impl Oscillator {
    /// Angular-speed scale for `frequency == 1`.
    pub const MAX_FREQUENCY: f32 = 10.0;

    pub fn new(frequency: f32) -> Self {
        Self { frequency }
    }

    /// Output for amplitude `amplitude` at `seconds`.
    pub fn sample(&self, amplitude: f32, seconds: f32) -> Signal {
        if amplitude <= 0.0 || self.frequency <= 0.0 {
            return Signal::LOW;
        }
        let half = amplitude / 2.0;
        let phase = seconds * self.frequency * self.frequency * Self::MAX_FREQUENCY;
        Signal::new(half + phase.sin() * half)
    }
}

impl Default for Oscillator {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Module for Oscillator {
    fn kind(&self) -> &'static str {
        "oscillator"
    }

    fn execute(&mut self, ctx: &mut ExecContext<'_>) -> Result<()> {
        let amplitude = ctx.input_at(0)?.value();
        let out = self.sample(amplitude, ctx.time().as_secs_f32());
        ctx.push_all(out)
    }

    fn is_execution_source(&self) -> bool {
        true
    }
}
