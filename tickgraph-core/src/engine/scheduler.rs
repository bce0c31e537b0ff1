//! Tick Scheduler
//!
//! The scheduler owns the current [`ExecutionPlan`] and drives it at a fixed
//! rate.
//!
//! # Tick Anatomy
//!
//! 1. **Boundary.** If the network changed or a rebuild was requested, the
//!    old order is notified, a new plan is built and swapped in whole.
//! 2. **Clear.** Every scheduled module's input buffer is emptied.
//! 3. **Execute.** Modules run in order. Broken modules get
//!    `garbage_execute`, the rest `execute`. Each pushes its outputs straight
//!    into its successors' buffers, so the whole network settles in one pass
//!    outside of flagged cycles.
//!
//! A failing module is logged and recorded in the [`TickReport`]; the tick
//! goes on with the next module. Its successors see the missing input as a
//! [`MissingInput`](crate::EngineError::MissingInput) error when they read it.

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;

use super::clock::TickClock;
use super::module::{ExecContext, TickInfo};
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::graph::{ExecutionPlan, GraphBuilder, ModuleId, Network, PlanHandle, PortRole};

/// What the scheduler is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerPhase {
    /// Waiting for the next period to elapse.
    Idle,
    /// Inside a tick.
    Ticking,
}

/// A module call that returned an error.
#[derive(Debug)]
pub struct ModuleFailure {
    /// The failing module.
    pub module: ModuleId,
    /// What it returned.
    pub error: EngineError,
}

/// Outcome of one tick.
#[derive(Debug, Default)]
pub struct TickReport {
    /// Zero-based tick number.
    pub tick: u64,
    /// Modules called, normal and degraded.
    pub executed: usize,
    /// Modules called through `garbage_execute`.
    pub degraded: usize,
    /// Modules with wired outputs that returned without pushing.
    pub silent: Vec<ModuleId>,
    /// Modules whose call returned an error.
    pub failures: Vec<ModuleFailure>,
}

impl TickReport {
    /// No failures and no silent modules.
    pub fn is_clean(&self) -> bool {
        self.silent.is_empty() && self.failures.is_empty()
    }
}

/// Fixed-rate driver of an execution plan.
#[derive(Debug)]
pub struct Scheduler {
    config: EngineConfig,
    clock: TickClock,
    plan: PlanHandle,
    current: Arc<ExecutionPlan>,
    rng: StdRng,
    ticks: u64,
    sim_time: Duration,
    rebuild_requested: bool,
    phase: SchedulerPhase,
}

impl Scheduler {
    /// Create a scheduler with an empty plan.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let rng = match config.garbage_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            clock: TickClock::new(config.tick_period()),
            config,
            plan: PlanHandle::new(),
            current: Arc::new(ExecutionPlan::default()),
            rng,
            ticks: 0,
            sim_time: Duration::ZERO,
            rebuild_requested: false,
            phase: SchedulerPhase::Idle,
        })
    }

    /// The settings this scheduler runs with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current phase.
    pub fn phase(&self) -> SchedulerPhase {
        self.phase
    }

    /// Ticks run so far.
    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    /// The tick clock.
    pub fn clock(&self) -> &TickClock {
        &self.clock
    }

    /// The plan in effect.
    pub fn plan(&self) -> Arc<ExecutionPlan> {
        Arc::clone(&self.current)
    }

    /// A shareable view that follows every swap.
    pub fn plan_handle(&self) -> PlanHandle {
        self.plan.clone()
    }

    /// Topology-changed notification. Coalesced into one rebuild at the next
    /// boundary.
    pub fn request_rebuild(&mut self) {
        self.rebuild_requested = true;
    }

    /// Whether the next boundary will rebuild.
    pub fn rebuild_pending(&self, network: &Network) -> bool {
        self.rebuild_requested || network.is_dirty()
    }

    /// Apply a pending rebuild. Returns whether one happened.
    pub fn sync(&mut self, network: &mut Network) -> bool {
        let dirty = network.take_dirty();
        if !(dirty || self.rebuild_requested) {
            return false;
        }
        self.rebuild(network);
        true
    }

    /// Rebuild the plan now.
    pub fn rebuild(&mut self, network: &mut Network) {
        debug_assert_eq!(self.phase, SchedulerPhase::Idle, "rebuild inside a tick");

        let old = Arc::clone(&self.current);
        for &id in &old.order {
            if let Some(module) = network.module_mut(id) {
                module.on_graph_rebuild_requested();
            }
        }

        let sources = network.execution_sources();
        let plan = Arc::new(GraphBuilder::build(&*network, &sources));
        self.plan.swap(Arc::clone(&plan));
        self.current = Arc::clone(&plan);

        for &id in &plan.order {
            if let Some(module) = network.module_mut(id) {
                module.on_graph_built();
            }
        }

        network.take_dirty();
        self.rebuild_requested = false;
    }

    /// Feed elapsed wall-clock time and run every tick that became due.
    pub fn advance(&mut self, network: &mut Network, elapsed: Duration) -> Vec<TickReport> {
        self.sync(network);
        let due = self.clock.advance(elapsed);
        (0..due).map(|_| self.tick(network)).collect()
    }

    /// Run one tick immediately, ignoring the clock.
    pub fn tick(&mut self, network: &mut Network) -> TickReport {
        self.sync(network);
        self.run_tick(network)
    }

    fn run_tick(&mut self, network: &mut Network) -> TickReport {
        self.phase = SchedulerPhase::Ticking;
        let plan = Arc::clone(&self.current);
        let info = TickInfo {
            tick: self.ticks,
            time: self.sim_time,
        };
        let mut report = TickReport {
            tick: self.ticks,
            ..TickReport::default()
        };

        for &id in &plan.order {
            network.clear_input(id);
        }

        for &id in &plan.order {
            let degraded = plan.is_broken(id);
            let Some((module, topology, buffers)) = network.execution_parts(id) else {
                tracing::warn!(module = %id, "scheduled module no longer exists");
                continue;
            };

            let mut ctx = ExecContext::new(id, topology, buffers, &mut self.rng, info);
            let result = if degraded {
                module.garbage_execute(&mut ctx)
            } else {
                module.execute(&mut ctx)
            };

            report.executed += 1;
            if degraded {
                report.degraded += 1;
            }

            match result {
                Ok(()) => {
                    let has_outputs = ctx.topology().wired(PortRole::Output).next().is_some();
                    if has_outputs && !ctx.has_pushed() {
                        tracing::warn!(module = %id, kind = module.kind(), "module returned without pushing its outputs");
                        report.silent.push(id);
                    }
                }
                Err(error) => {
                    tracing::warn!(module = %id, kind = module.kind(), %error, "module execution failed");
                    report.failures.push(ModuleFailure { module: id, error });
                }
            }
        }

        tracing::trace!(
            tick = report.tick,
            executed = report.executed,
            degraded = report.degraded,
            "tick complete"
        );

        self.ticks += 1;
        self.sim_time += self.clock.period();
        self.phase = SchedulerPhase::Idle;
        report
    }
}
