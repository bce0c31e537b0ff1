//! Execution Plan
//!
//! The result of one rebuild: sinks, order and broken set. A plan is
//! immutable once built; rebuilding produces a new plan that replaces the old
//! one wholesale.

use std::sync::Arc;

use indexmap::IndexSet;
use parking_lot::RwLock;
use serde::Serialize;

use super::node::ModuleId;

/// Sinks, execution order and broken modules of one build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionPlan {
    /// Leaves of the forward walk, in discovery order.
    pub sinks: IndexSet<ModuleId>,

    /// Per-tick execution sequence.
    pub order: Vec<ModuleId>,

    /// Modules that run in degraded mode.
    pub broken: IndexSet<ModuleId>,
}

impl ExecutionPlan {
    /// Whether the module is scheduled.
    pub fn contains(&self, id: ModuleId) -> bool {
        self.order.contains(&id)
    }

    /// Position of the module in the order.
    pub fn position(&self, id: ModuleId) -> Option<usize> {
        self.order.iter().position(|&m| m == id)
    }

    /// Whether the module is flagged broken.
    pub fn is_broken(&self, id: ModuleId) -> bool {
        self.broken.contains(&id)
    }

    /// Whether nothing is scheduled.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// JSON dump for diagnostics.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Shared, swappable view of the current plan.
///
/// Readers on other threads get a consistent snapshot: the scheduler only
/// ever replaces the whole `Arc`, and only between ticks.
#[derive(Debug, Clone, Default)]
pub struct PlanHandle {
    inner: Arc<RwLock<Arc<ExecutionPlan>>>,
}

impl PlanHandle {
    /// Create a handle holding an empty plan.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current plan snapshot.
    pub fn load(&self) -> Arc<ExecutionPlan> {
        Arc::clone(&self.inner.read())
    }

    /// Replace the plan, returning the previous one.
    pub(crate) fn swap(&self, plan: Arc<ExecutionPlan>) -> Arc<ExecutionPlan> {
        std::mem::replace(&mut *self.inner.write(), plan)
    }
}
