//! Execution Engine
//!
//! The engine runs a built plan. It is single-threaded and cooperative: one
//! module executes at a time, ticks never overlap, and the plan only changes
//! between ticks.
//!
//! # Components
//!
//! - [`Module`] and [`ExecContext`]: the contract node types implement and
//!   the handle they use to read inputs and push outputs.
//! - [`TickClock`]: fixed-period accumulator fed with measured elapsed time.
//! - [`Scheduler`]: applies coalesced rebuilds and runs ticks.
//! - [`run_until`]: async driver that idles between ticks.

mod clock;
mod module;
mod runner;
mod scheduler;

pub use clock::TickClock;
pub use module::{ExecContext, InputBuffer, Module, TickInfo};
pub use runner::run_until;
pub use scheduler::{ModuleFailure, Scheduler, SchedulerPhase, TickReport};
