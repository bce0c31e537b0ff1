//! Module Network
//!
//! The network is the arena that owns every module and its topology. All
//! other parts of the engine refer to modules by [`ModuleId`] only.
//!
//! Structural edits (add, remove, connect, disconnect, raw neighbor writes)
//! raise a single dirty flag. The scheduler consumes it at the next tick
//! boundary, so any number of edits between two ticks cost one rebuild.

use std::collections::HashMap;
use std::fmt;

use indexmap::IndexMap;

use super::node::{ModuleId, PortRole, Topology};
use super::PortLayout;
use crate::engine::{InputBuffer, Module};
use crate::error::{EngineError, Result};
use crate::signal::Signal;

/// Read access to module topologies. The builder only needs this.
pub trait TopologyView {
    /// Topology of the given module, or `None` if the handle is dangling.
    fn topology(&self, id: ModuleId) -> Option<&Topology>;
}

struct Slot {
    topology: Topology,
    module: Box<dyn Module>,
}

/// Arena of modules, indexed by handle in insertion order.
pub struct Network {
    next_id: u64,
    slots: IndexMap<ModuleId, Slot>,
    inputs: HashMap<ModuleId, InputBuffer>,
    dirty: bool,
}

impl Network {
    /// Create an empty network.
    pub fn new() -> Self {
        Self {
            next_id: 0,
            slots: IndexMap::new(),
            inputs: HashMap::new(),
            dirty: false,
        }
    }

    /// Add a module with the given port layout. Its ports start unwired.
    pub fn add<M: Module + 'static>(&mut self, module: M, layout: PortLayout) -> ModuleId {
        self.add_boxed(Box::new(module), layout)
    }

    /// Add an already boxed module.
    pub fn add_boxed(&mut self, module: Box<dyn Module>, layout: PortLayout) -> ModuleId {
        let id = ModuleId::from(self.next_id);
        self.next_id += 1;

        tracing::trace!(module = %id, kind = module.kind(), "module added");
        self.slots.insert(
            id,
            Slot {
                topology: Topology::new(layout),
                module,
            },
        );
        self.inputs.insert(id, InputBuffer::new());
        self.dirty = true;
        id
    }

    /// Remove a module.
    ///
    /// Also clears every port elsewhere that still points at it.
    pub fn remove(&mut self, id: ModuleId) -> Option<Box<dyn Module>> {
        let slot = self.slots.shift_remove(&id)?;
        for other in self.slots.values_mut() {
            other.topology.detach(id);
        }
        self.inputs.remove(&id);
        self.dirty = true;
        tracing::trace!(module = %id, "module removed");
        Some(slot.module)
    }

    /// Wire `from`'s output port to `to`'s input port.
    pub fn connect(&mut self, from: ModuleId, from_port: usize, to: ModuleId, to_port: usize) -> Result<()> {
        self.check_free(from, from_port, PortRole::Output)?;
        self.check_free(to, to_port, PortRole::Input)?;

        self.slot_mut(from)?.topology.link(from, from_port, to, to_port)?;
        self.slot_mut(to)?.topology.link(to, to_port, from, from_port)?;
        self.dirty = true;
        Ok(())
    }

    /// Clear the wire on `port`, on both ends.
    pub fn disconnect(&mut self, id: ModuleId, port: usize) -> Result<()> {
        let slot = self.slot_mut(id)?;
        let role = slot.topology.port_role(port)?;
        let Some(neighbor) = slot.topology.neighbor(port)? else {
            return Ok(());
        };
        let peer = slot.topology.peer_port(port)?;
        slot.topology.set_neighbor(id, port, None)?;

        if let Some(other) = self.slots.get_mut(&neighbor) {
            // Raw writes carry no far-end port; fall back to the first match.
            let back = peer.or_else(|| {
                other
                    .topology
                    .layout()
                    .ports(role.opposite())
                    .find(|&p| matches!(other.topology.neighbor(p), Ok(Some(n)) if n == id))
            });
            if let Some(back) = back {
                if other.topology.neighbor(back)? == Some(id) {
                    other.topology.set_neighbor(neighbor, back, None)?;
                }
            }
        }
        self.dirty = true;
        Ok(())
    }

    /// Raw neighbor write on one side only. No reciprocity is enforced.
    pub fn set_neighbor(&mut self, id: ModuleId, port: usize, neighbor: Option<ModuleId>) -> Result<()> {
        self.slot_mut(id)?.topology.set_neighbor(id, port, neighbor)?;
        self.dirty = true;
        Ok(())
    }

    /// Role of a module's port.
    pub fn port_role(&self, id: ModuleId, port: usize) -> Result<PortRole> {
        self.slot(id)?.topology.port_role(port)
    }

    /// Neighbor on a module's port.
    pub fn neighbor(&self, id: ModuleId, port: usize) -> Result<Option<ModuleId>> {
        self.slot(id)?.topology.neighbor(port)
    }

    /// Current input buffer of a module.
    pub fn input(&self, id: ModuleId) -> Option<&[Signal]> {
        self.inputs.get(&id).map(|buffer| buffer.as_slice())
    }

    /// Modules that declare themselves execution sources, in insertion order.
    pub fn execution_sources(&self) -> Vec<ModuleId> {
        self.slots
            .iter()
            .filter(|(_, slot)| slot.module.is_execution_source())
            .map(|(&id, _)| id)
            .collect()
    }

    /// Shared access to a module's behavior.
    pub fn module(&self, id: ModuleId) -> Option<&dyn Module> {
        self.slots.get(&id).map(|slot| slot.module.as_ref())
    }

    /// Mutable access to a module's behavior.
    ///
    /// Parameter changes through this handle are not structural and do not
    /// mark the network dirty.
    pub fn module_mut(&mut self, id: ModuleId) -> Option<&mut (dyn Module + 'static)> {
        self.slots.get_mut(&id).map(|slot| slot.module.as_mut())
    }

    /// Whether the handle refers to a live module.
    pub fn contains(&self, id: ModuleId) -> bool {
        self.slots.contains_key(&id)
    }

    /// All module handles, in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = ModuleId> + '_ {
        self.slots.keys().copied()
    }

    /// Number of modules.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the network has no modules.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Whether a structural change happened since the last [`take_dirty`](Self::take_dirty).
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Consume the dirty flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Raise the dirty flag without an edit.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn clear_input(&mut self, id: ModuleId) {
        if let Some(buffer) = self.inputs.get_mut(&id) {
            buffer.clear();
        }
    }

    /// Splits the arena so one module can run while pushing into the others.
    pub(crate) fn execution_parts(
        &mut self,
        id: ModuleId,
    ) -> Option<(&mut (dyn Module + 'static), &Topology, &mut HashMap<ModuleId, InputBuffer>)> {
        let slot = self.slots.get_mut(&id)?;
        Some((slot.module.as_mut(), &slot.topology, &mut self.inputs))
    }

    fn slot(&self, id: ModuleId) -> Result<&Slot> {
        self.slots.get(&id).ok_or(EngineError::UnknownModule(id))
    }

    fn slot_mut(&mut self, id: ModuleId) -> Result<&mut Slot> {
        self.slots.get_mut(&id).ok_or(EngineError::UnknownModule(id))
    }

    fn check_free(&self, id: ModuleId, port: usize, role: PortRole) -> Result<()> {
        let topology = &self.slot(id)?.topology;
        let actual = topology.port_role(port)?;
        if actual != role {
            return Err(EngineError::PortNotConnectable {
                module: id,
                port,
                role: actual,
            });
        }
        if topology.neighbor(port)?.is_some() {
            return Err(EngineError::PortOccupied { module: id, port });
        }
        Ok(())
    }
}

impl TopologyView for Network {
    fn topology(&self, id: ModuleId) -> Option<&Topology> {
        self.slots.get(&id).map(|slot| &slot.topology)
    }
}

impl Default for Network {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.slots.iter().map(|(id, slot)| (id, slot.module.kind())))
            .finish()
    }
}
