//! Standard Modules
//!
//! Ready-made node types built on the [`Module`](crate::engine::Module)
//! contract.
//!
//! - Sources: [`Constant`], [`Oscillator`]
//! - Logic: [`LogicGate`], [`Not`], [`Compare`]
//! - Routing: [`Splitter`], [`Relay`], [`Delay`]
//! - Observation: [`Probe`]
//!
//! Apart from [`Probe`], which records whatever arrived, they read inputs with
//! `input_at`, so a starved input shows up as a `MissingInput` failure in the
//! tick report rather than a silent default.
//! Only [`Compare`] overrides degraded execution; the rest push random filler.

mod generators;
mod logic;
mod probe;
mod routing;

pub use generators::{Constant, Oscillator};
pub use logic::{Compare, Comparison, GateKind, LogicGate, Not};
pub use probe::{Probe, ProbeHandle, ProbeState};
pub use routing::{Delay, Relay, Splitter};
