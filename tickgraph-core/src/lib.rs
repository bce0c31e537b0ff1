//! Tickgraph Core
//!
//! This crate provides a tick-driven signal-flow engine. Modules with four
//! ports are wired into a network that may contain cycles, shared branches
//! and dead ends. The engine:
//!
//! - Derives a deterministic execution order from the wiring, even when it
//!   is not a DAG
//! - Isolates cyclic or under-connected modules so the rest keeps running
//! - Runs the network at a fixed tick rate, pushing scalar signals from
//!   producers to consumers within the same tick
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `signal`: The scalar value type and its boolean interpretation
//! - `graph`: Module handles, port topology, the module arena and the plan builder
//! - `engine`: The execution contract, tick clock, scheduler and async driver
//! - `nodes`: Standard module library (gates, comparators, splitters, probes)
//! - `config`, `telemetry`: Runtime settings and tracing setup
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use tickgraph_core::{EngineConfig, Network, PortLayout, Scheduler, Signal};
//! use tickgraph_core::nodes::{Constant, Not, Probe};
//!
//! let mut network = Network::new();
//! let source = network.add(Constant::new(1.0), PortLayout::parse(".O..").unwrap());
//! let not = network.add(Not::default(), PortLayout::parse("I.O.").unwrap());
//! let (probe, readings) = Probe::new();
//! let sink = network.add(probe, PortLayout::parse("I...").unwrap());
//! network.connect(source, 1, not, 0).unwrap();
//! network.connect(not, 2, sink, 0).unwrap();
//!
//! let mut scheduler = Scheduler::new(EngineConfig::default()).unwrap();
//! scheduler.advance(&mut network, Duration::from_millis(100));
//! assert_eq!(readings.last(0), Some(Signal::LOW));
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod graph;
pub mod nodes;
pub mod signal;
pub mod telemetry;

pub use config::EngineConfig;
pub use engine::{ExecContext, Module, Scheduler, TickReport};
pub use error::{EngineError, Result};
pub use graph::{ExecutionPlan, ModuleId, Network, PortLayout, PortRole};
pub use signal::Signal;
