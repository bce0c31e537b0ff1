//! Module Topology
//!
//! This module defines the per-module port descriptor: four fixed ports, each
//! with a role and at most one neighbor handle. It is pure data; the builder
//! and the network arena give it meaning.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Number of ports every module has.
pub const PORT_COUNT: usize = 4;

/// Stable handle of a module inside a [`Network`](super::Network).
///
/// Handles are plain indices; holding one never keeps a module alive, so
/// cycles in the signal graph are just edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleId(u64);

impl ModuleId {
    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl From<u64> for ModuleId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m{}", self.0)
    }
}

/// The role a port plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PortRole {
    /// Not a port. Must never hold a neighbor.
    #[default]
    None,

    /// Receives a signal from the neighbor's output port.
    Input,

    /// Sends a signal to the neighbor's input port.
    Output,
}

impl PortRole {
    /// The role a neighbor's port must have to pair with this one.
    pub fn opposite(self) -> PortRole {
        match self {
            PortRole::None => PortRole::None,
            PortRole::Input => PortRole::Output,
            PortRole::Output => PortRole::Input,
        }
    }
}

/// Checks a port index against [`PORT_COUNT`].
pub fn check_port(port: usize) -> Result<usize> {
    if port < PORT_COUNT {
        Ok(port)
    } else {
        Err(EngineError::PortOutOfRange { port })
    }
}

/// The fixed role assignment of a module's four ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PortLayout([PortRole; PORT_COUNT]);

impl PortLayout {
    /// Create a layout from explicit roles, indexed by port.
    pub const fn new(roles: [PortRole; PORT_COUNT]) -> Self {
        Self(roles)
    }

    /// Parse a compact four-character layout: `I` input, `O` output,
    /// anything else none. `"I.O."` is input on 0, output on 2.
    ///
    /// Returns `None` if the string is not exactly four characters.
    pub fn parse(compact: &str) -> Option<Self> {
        let mut roles = [PortRole::None; PORT_COUNT];
        let mut chars = compact.chars();
        for role in &mut roles {
            *role = match chars.next()? {
                'I' | 'i' => PortRole::Input,
                'O' | 'o' => PortRole::Output,
                _ => PortRole::None,
            };
        }
        if chars.next().is_some() {
            return None;
        }
        Some(Self(roles))
    }

    /// Role of the given port.
    pub fn role(&self, port: usize) -> Result<PortRole> {
        Ok(self.0[check_port(port)?])
    }

    /// Ports with the given role, in index order.
    pub fn ports(&self, role: PortRole) -> impl Iterator<Item = usize> + '_ {
        (0..PORT_COUNT).filter(move |&port| self.0[port] == role)
    }

    /// Number of ports declared with the given role.
    pub fn count(&self, role: PortRole) -> usize {
        self.0.iter().filter(|&&r| r == role).count()
    }
}

/// A module's ports and the neighbors wired to them.
///
/// Wires made through [`Network::connect`](super::Network::connect) also
/// remember the port they land on at the far end, so two parallel wires
/// between the same pair of modules stay distinguishable.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Topology {
    layout: PortLayout,
    neighbors: [Option<ModuleId>; PORT_COUNT],
    #[serde(skip)]
    peer_ports: [Option<usize>; PORT_COUNT],
}

impl Topology {
    /// Create an unwired topology with the given layout.
    pub fn new(layout: PortLayout) -> Self {
        Self {
            layout,
            neighbors: [None; PORT_COUNT],
            peer_ports: [None; PORT_COUNT],
        }
    }

    /// The port layout.
    pub fn layout(&self) -> &PortLayout {
        &self.layout
    }

    /// Role of the given port.
    pub fn port_role(&self, port: usize) -> Result<PortRole> {
        self.layout.role(port)
    }

    /// Neighbor wired to the given port, if any.
    pub fn neighbor(&self, port: usize) -> Result<Option<ModuleId>> {
        Ok(self.neighbors[check_port(port)?])
    }

    /// Port on the neighbor that this port's wire lands on, when known.
    pub fn peer_port(&self, port: usize) -> Result<Option<usize>> {
        Ok(self.peer_ports[check_port(port)?])
    }

    /// Set or clear the neighbor on a port. The far-end port is forgotten.
    ///
    /// A `None`-role port can only be cleared.
    pub fn set_neighbor(&mut self, owner: ModuleId, port: usize, neighbor: Option<ModuleId>) -> Result<()> {
        let role = self.port_role(port)?;
        if role == PortRole::None && neighbor.is_some() {
            return Err(EngineError::PortNotConnectable {
                module: owner,
                port,
                role,
            });
        }
        self.neighbors[port] = neighbor;
        self.peer_ports[port] = None;
        Ok(())
    }

    /// Wire `port` to `peer_port` on `neighbor`.
    pub fn link(
        &mut self,
        owner: ModuleId,
        port: usize,
        neighbor: ModuleId,
        peer_port: usize,
    ) -> Result<()> {
        let peer_port = check_port(peer_port)?;
        self.set_neighbor(owner, port, Some(neighbor))?;
        self.peer_ports[port] = Some(peer_port);
        Ok(())
    }

    /// `(port, neighbor)` pairs for every wired port with the given role.
    pub fn wired(&self, role: PortRole) -> impl Iterator<Item = (usize, ModuleId)> + '_ {
        self.layout
            .ports(role)
            .filter_map(move |port| self.neighbors[port].map(|id| (port, id)))
    }

    /// Clears every port that points at `target`. Returns how many were cleared.
    pub fn detach(&mut self, target: ModuleId) -> usize {
        let mut cleared = 0;
        for (slot, peer) in self.neighbors.iter_mut().zip(&mut self.peer_ports) {
            if *slot == Some(target) {
                *slot = None;
                *peer = None;
                cleared += 1;
            }
        }
        cleared
    }

    /// Number of declared input ports.
    pub fn input_count(&self) -> usize {
        self.layout.count(PortRole::Input)
    }

    /// Number of declared output ports.
    pub fn output_count(&self) -> usize {
        self.layout.count(PortRole::Output)
    }
}
