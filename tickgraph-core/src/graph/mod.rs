//! Signal Graph
//!
//! This module holds the topology side of the engine: module handles, port
//! descriptors, the arena that owns modules, and the builder that turns the
//! wiring into an execution plan.
//!
//! # Overview
//!
//! Every module has exactly four ports. A port is `None`, `Input` or
//! `Output` and holds at most one neighbor handle. Wires are pairs of
//! neighbor references: an `Output` port on one module pointing at the
//! other, and an `Input` port on the other pointing back.
//!
//! Unlike a dependency DAG, the wiring may contain cycles. The builder does
//! not reject them; it isolates the modules that close a cycle in the plan's
//! broken set so the rest of the network keeps running.
//!
//! # Design Decisions
//!
//! 1. Modules are owned by one arena ([`Network`]) and referenced by
//!    [`ModuleId`] everywhere else, so a cycle is just data.
//!
//! 2. The arena is insertion-ordered. Source discovery, and therefore the
//!    derived order, is deterministic for a given edit history.
//!
//! 3. A plan is rebuilt from scratch on every structural change and swapped
//!    in whole; nothing patches a plan in place.

mod builder;
mod network;
mod node;
mod plan;

pub use builder::GraphBuilder;
pub use network::{Network, TopologyView};
pub use node::{check_port, ModuleId, PortLayout, PortRole, Topology, PORT_COUNT};
pub use plan::{ExecutionPlan, PlanHandle};
