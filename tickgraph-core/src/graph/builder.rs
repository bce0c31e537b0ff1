//! Graph Builder
//!
//! Derives an [`ExecutionPlan`] from a set of source modules. The network may
//! contain cycles, shared branches and dead ends; the builder never fails.
//!
//! # Algorithm
//!
//! Two depth-first walks, both with explicit stacks:
//!
//! 1. **Sink discovery.** From every source, follow `Output` ports forward.
//!    A successor already on the current walk path is a back edge and is
//!    ignored. A successor visited by an earlier walk still counts as a
//!    successor but is not descended into again; the sinks that walk found
//!    cover it. A module with no successor is a sink.
//!
//! 2. **Order construction.** From every sink, follow `Input` ports backward
//!    and append modules in post-order, so producers come before consumers.
//!    A module met again on the current path closes a cycle: it is flagged
//!    broken and appended on the spot, and the frame that entered it will
//!    not append it a second time. A module whose wired input count differs
//!    from its declared input count is flagged broken as well.
//!
//! The "visited by an earlier walk" shortcut is global across sources and
//! sinks for the whole build, so the first walk to reach a shared module owns
//! its placement.

use std::collections::HashSet;

use smallvec::SmallVec;

use super::network::TopologyView;
use super::node::{ModuleId, PortRole};
use super::plan::ExecutionPlan;

type Edges = SmallVec<[ModuleId; 4]>;

struct SinkFrame {
    id: ModuleId,
    successors: Edges,
    cursor: usize,
    has_successor: bool,
}

struct OrderFrame {
    id: ModuleId,
    predecessors: Edges,
    cursor: usize,
}

/// Builds execution plans from a topology view.
pub struct GraphBuilder<'a, V: TopologyView + ?Sized> {
    view: &'a V,
    plan: ExecutionPlan,
}

impl<'a, V: TopologyView + ?Sized> GraphBuilder<'a, V> {
    /// Run both phases and return the finished plan.
    pub fn build(view: &'a V, sources: &[ModuleId]) -> ExecutionPlan {
        let mut builder = Self {
            view,
            plan: ExecutionPlan::default(),
        };

        let mut visited = HashSet::new();
        for &source in sources {
            builder.find_sinks(source, &mut visited);
        }

        let sinks: Vec<ModuleId> = builder.plan.sinks.iter().copied().collect();
        let mut visited = HashSet::new();
        for sink in sinks {
            builder.build_order(sink, &mut visited);
        }

        tracing::debug!(
            sources = sources.len(),
            sinks = builder.plan.sinks.len(),
            order = builder.plan.order.len(),
            broken = builder.plan.broken.len(),
            "execution plan built"
        );
        builder.plan
    }

    /// Neighbors on ports with the given role that resolve to live modules.
    ///
    /// Dangling handles and non-reciprocal wires are logged.
    fn neighbors(&self, id: ModuleId, role: PortRole) -> Edges {
        let Some(topology) = self.view.topology(id) else {
            return Edges::new();
        };

        let mut edges = Edges::new();
        for (port, neighbor) in topology.wired(role) {
            let Some(other) = self.view.topology(neighbor) else {
                tracing::warn!(module = %id, port, %neighbor, "port wired to a module that does not exist");
                continue;
            };
            let reciprocal = other
                .wired(role.opposite())
                .any(|(_, back)| back == id);
            if !reciprocal {
                tracing::warn!(module = %id, port, %neighbor, "neighbor has no matching port wired back");
            }
            edges.push(neighbor);
        }
        edges
    }

    fn find_sinks(&mut self, source: ModuleId, visited: &mut HashSet<ModuleId>) {
        if self.view.topology(source).is_none() {
            tracing::warn!(module = %source, "execution source is not in the network");
            return;
        }
        if !visited.insert(source) {
            return;
        }

        let mut path = HashSet::from([source]);
        let mut stack = vec![SinkFrame {
            id: source,
            successors: self.neighbors(source, PortRole::Output),
            cursor: 0,
            has_successor: false,
        }];

        while let Some(frame) = stack.last_mut() {
            if let Some(&next) = frame.successors.get(frame.cursor) {
                frame.cursor += 1;
                if path.contains(&next) {
                    tracing::trace!(module = %frame.id, %next, "back edge during sink discovery");
                    continue;
                }
                frame.has_successor = true;
                if !visited.insert(next) {
                    continue;
                }
                path.insert(next);
                let successors = self.neighbors(next, PortRole::Output);
                stack.push(SinkFrame {
                    id: next,
                    successors,
                    cursor: 0,
                    has_successor: false,
                });
                continue;
            }

            let id = frame.id;
            let is_sink = !frame.has_successor;
            stack.pop();
            path.remove(&id);
            if is_sink {
                self.plan.sinks.insert(id);
            }
        }
    }

    fn build_order(&mut self, sink: ModuleId, visited: &mut HashSet<ModuleId>) {
        let mut path = HashSet::new();
        let mut stack = Vec::new();
        let mut cycle_entries = HashSet::new();

        if !self.enter(sink, &mut path, visited, &mut stack, &mut cycle_entries) {
            return;
        }

        while let Some(frame) = stack.last_mut() {
            if let Some(&next) = frame.predecessors.get(frame.cursor) {
                frame.cursor += 1;
                self.enter(next, &mut path, visited, &mut stack, &mut cycle_entries);
                continue;
            }

            let Some(frame) = stack.pop() else { break };
            path.remove(&frame.id);

            let declared = self
                .view
                .topology(frame.id)
                .map_or(0, |topology| topology.input_count());
            if declared != frame.predecessors.len() {
                tracing::warn!(
                    module = %frame.id,
                    declared,
                    wired = frame.predecessors.len(),
                    "input ports not fully wired, running degraded"
                );
                self.plan.broken.insert(frame.id);
            }

            // Cycle entries were placed when the cycle was closed.
            if !cycle_entries.contains(&frame.id) {
                self.plan.order.push(frame.id);
            }
        }
    }

    /// Returns whether a frame was pushed for `id`.
    fn enter(
        &mut self,
        id: ModuleId,
        path: &mut HashSet<ModuleId>,
        visited: &mut HashSet<ModuleId>,
        stack: &mut Vec<OrderFrame>,
        cycle_entries: &mut HashSet<ModuleId>,
    ) -> bool {
        if path.contains(&id) {
            tracing::debug!(module = %id, "cycle detected, flagging module broken");
            self.plan.broken.insert(id);
            if cycle_entries.insert(id) {
                self.plan.order.push(id);
            }
            return false;
        }
        if !visited.insert(id) {
            return false;
        }

        path.insert(id);
        stack.push(OrderFrame {
            id,
            predecessors: self.neighbors(id, PortRole::Input),
            cursor: 0,
        });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{PortLayout, Topology};
    use std::collections::HashMap;

    /// Topology-only fixture; the builder never needs behaviors.
    #[derive(Default)]
    struct Fixture {
        topologies: HashMap<ModuleId, Topology>,
    }

    impl Fixture {
        fn add(&mut self, id: u64, layout: &str) -> ModuleId {
            let id = ModuleId::from(id);
            self.topologies
                .insert(id, Topology::new(PortLayout::parse(layout).unwrap()));
            id
        }

        fn wire(&mut self, from: ModuleId, from_port: usize, to: ModuleId, to_port: usize) {
            self.topologies
                .get_mut(&from)
                .unwrap()
                .set_neighbor(from, from_port, Some(to))
                .unwrap();
            self.topologies
                .get_mut(&to)
                .unwrap()
                .set_neighbor(to, to_port, Some(from))
                .unwrap();
        }
    }

    impl TopologyView for Fixture {
        fn topology(&self, id: ModuleId) -> Option<&Topology> {
            self.topologies.get(&id)
        }
    }

    fn count(plan: &ExecutionPlan, id: ModuleId) -> usize {
        plan.order.iter().filter(|&&m| m == id).count()
    }

    #[test]
    fn linear_chain() {
        let mut g = Fixture::default();
        let a = g.add(0, ".O..");
        let b = g.add(1, "IO..");
        let c = g.add(2, "I...");
        g.wire(a, 1, b, 0);
        g.wire(b, 1, c, 0);

        let plan = GraphBuilder::build(&g, &[a]);
        assert_eq!(plan.order, vec![a, b, c]);
        assert!(plan.broken.is_empty());
        assert_eq!(plan.sinks.iter().copied().collect::<Vec<_>>(), vec![c]);
    }

    #[test]
    fn diamond_from_two_sources() {
        let mut g = Fixture::default();
        let a = g.add(0, ".O..");
        let b = g.add(1, ".O..");
        let c = g.add(2, "I..I");
        g.wire(a, 1, c, 0);
        g.wire(b, 1, c, 3);

        let plan = GraphBuilder::build(&g, &[a, b]);
        assert_eq!(count(&plan, c), 1);
        let pc = plan.position(c).unwrap();
        assert!(plan.position(a).unwrap() < pc);
        assert!(plan.position(b).unwrap() < pc);
        assert!(plan.broken.is_empty());
    }

    #[test]
    fn shared_branch_reconverges() {
        // a -> s, s fans out to x and y, both feed z.
        let mut g = Fixture::default();
        let a = g.add(0, ".O..");
        let s = g.add(1, "IOO.");
        let x = g.add(2, "IO..");
        let y = g.add(3, "IO..");
        let z = g.add(4, "II..");
        g.wire(a, 1, s, 0);
        g.wire(s, 1, x, 0);
        g.wire(s, 2, y, 0);
        g.wire(x, 1, z, 0);
        g.wire(y, 1, z, 1);

        let plan = GraphBuilder::build(&g, &[a]);
        assert_eq!(plan.sinks.len(), 1);
        assert_eq!(plan.order.len(), 5);
        for id in [a, s, x, y] {
            assert_eq!(count(&plan, id), 1);
            assert!(plan.position(id) < plan.position(z));
        }
        assert!(plan.position(s) < plan.position(x));
        assert!(plan.position(s) < plan.position(y));
    }

    #[test]
    fn self_cycle_is_broken_once() {
        let mut g = Fixture::default();
        let x = g.add(0, "IO..");
        g.wire(x, 1, x, 0);

        let plan = GraphBuilder::build(&g, &[x]);
        assert!(plan.is_broken(x));
        assert_eq!(plan.order, vec![x]);
    }

    #[test]
    fn repeated_back_edges_place_the_module_once() {
        // Both outputs loop straight back into both inputs.
        let mut g = Fixture::default();
        let d = g.add(0, "IIOO");
        g.wire(d, 2, d, 0);
        g.wire(d, 3, d, 1);

        let plan = GraphBuilder::build(&g, &[d]);
        assert_eq!(plan.order, vec![d]);
        assert!(plan.is_broken(d));
    }

    #[test]
    fn two_module_cycle_feeding_a_sink() {
        // s -> a -> b -> a (loop), a -> out
        let mut g = Fixture::default();
        let s = g.add(0, ".O..");
        let a = g.add(1, "IIOO");
        let b = g.add(2, "IO..");
        let out = g.add(3, "I...");
        g.wire(s, 1, a, 0);
        g.wire(a, 2, b, 0);
        g.wire(b, 1, a, 1);
        g.wire(a, 3, out, 0);

        let plan = GraphBuilder::build(&g, &[s]);
        for id in [s, a, b, out] {
            assert_eq!(count(&plan, id), 1, "{id} scheduled once");
        }
        // b only feeds back into the loop, so the walk treats it as a sink
        // and closes the cycle on b itself.
        assert!(plan.sinks.contains(&b));
        assert_eq!(plan.broken.iter().copied().collect::<Vec<_>>(), vec![b]);
        assert!(!plan.is_broken(s));
        assert!(!plan.is_broken(out));
        assert!(plan.position(s) < plan.position(a));
        assert!(plan.position(a) < plan.position(out));
    }

    #[test]
    fn nested_cycles_schedule_each_module_once() {
        // x <-> d, and d also feeds itself.
        let mut g = Fixture::default();
        let x = g.add(0, "IO..");
        let d = g.add(1, "IIOO");
        g.wire(x, 1, d, 0);
        g.wire(d, 2, x, 0);
        g.wire(d, 3, d, 1);

        let plan = GraphBuilder::build(&g, &[x]);
        assert_eq!(count(&plan, x), 1);
        assert_eq!(count(&plan, d), 1);
        assert!(plan.is_broken(x) || plan.is_broken(d));
    }

    #[test]
    fn unwired_input_is_broken_but_scheduled() {
        let mut g = Fixture::default();
        let a = g.add(0, ".O..");
        let gate = g.add(1, "IIO.");
        let out = g.add(2, "I...");
        g.wire(a, 1, gate, 0);
        g.wire(gate, 2, out, 0);

        let plan = GraphBuilder::build(&g, &[a]);
        assert!(plan.is_broken(gate));
        assert!(!plan.is_broken(out));
        assert_eq!(plan.order, vec![a, gate, out]);
    }

    #[test]
    fn dangling_neighbor_is_skipped() {
        let mut g = Fixture::default();
        let a = g.add(0, ".O..");
        let b = g.add(1, "I...");
        g.wire(a, 1, b, 0);
        g.topologies.remove(&b);

        let plan = GraphBuilder::build(&g, &[a]);
        assert_eq!(plan.order, vec![a]);
        assert!(plan.sinks.contains(&a));
    }

    #[test]
    fn unreached_modules_are_not_scheduled() {
        let mut g = Fixture::default();
        let a = g.add(0, ".O..");
        let b = g.add(1, "I...");
        let lonely = g.add(2, "IO..");
        g.wire(a, 1, b, 0);

        let plan = GraphBuilder::build(&g, &[a]);
        assert!(!plan.contains(lonely));
        assert!(GraphBuilder::build(&g, &[]).is_empty());
    }

    #[test]
    fn long_chain_does_not_overflow() {
        let mut g = Fixture::default();
        let first = g.add(0, ".O..");
        let mut prev = first;
        for i in 1..50_000 {
            let next = g.add(i, "IO..");
            g.wire(prev, 1, next, 0);
            prev = next;
        }

        let plan = GraphBuilder::build(&g, &[first]);
        assert_eq!(plan.order.len(), 50_000);
        assert_eq!(plan.order.first(), Some(&first));
        assert_eq!(plan.order.last(), Some(&prev));
    }
}
