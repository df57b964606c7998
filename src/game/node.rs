//! Territory nodes and ownership.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier of a node for the lifetime of a game.
pub type NodeId = String;

/// One of the two playing factions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FactionId {
    /// The first faction to act in every phase.
    FactionA,
    /// The second faction to act in every phase.
    FactionB,
}

impl FactionId {
    /// Both factions in acting order.
    pub const ALL: [FactionId; 2] = [FactionId::FactionA, FactionId::FactionB];

    /// The other faction.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            FactionId::FactionA => FactionId::FactionB,
            FactionId::FactionB => FactionId::FactionA,
        }
    }

    /// Position in acting order (0 or 1).
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            FactionId::FactionA => 0,
            FactionId::FactionB => 1,
        }
    }
}

impl fmt::Display for FactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FactionId::FactionA => write!(f, "FactionA"),
            FactionId::FactionB => write!(f, "FactionB"),
        }
    }
}

/// Who holds a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Owner {
    /// Held by faction A.
    FactionA,
    /// Held by faction B.
    FactionB,
    /// Unclaimed.
    Neutral,
    /// Hidden by fog of war. Only appears in a faction's filtered view.
    Unknown,
}

impl Owner {
    /// The owning faction, if any.
    #[must_use]
    pub const fn faction(self) -> Option<FactionId> {
        match self {
            Owner::FactionA => Some(FactionId::FactionA),
            Owner::FactionB => Some(FactionId::FactionB),
            Owner::Neutral | Owner::Unknown => None,
        }
    }

    /// Whether the node belongs to `faction`.
    #[must_use]
    pub fn is(self, faction: FactionId) -> bool {
        self.faction() == Some(faction)
    }
}

impl From<FactionId> for Owner {
    fn from(faction: FactionId) -> Self {
        match faction {
            FactionId::FactionA => Owner::FactionA,
            FactionId::FactionB => Owner::FactionB,
        }
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Owner::FactionA => write!(f, "FactionA"),
            Owner::FactionB => write!(f, "FactionB"),
            Owner::Neutral => write!(f, "Neutral"),
            Owner::Unknown => write!(f, "Unknown"),
        }
    }
}

/// A standard/evolved unit split.
///
/// Units always leave a node standard-first, then evolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stack {
    /// Standard units.
    pub standard: u32,
    /// Evolved units.
    pub evolved: u32,
}

impl Stack {
    /// Create a stack.
    #[must_use]
    pub const fn new(standard: u32, evolved: u32) -> Self {
        Self { standard, evolved }
    }

    /// Total unit count.
    #[must_use]
    pub const fn total(self) -> u32 {
        self.standard + self.evolved
    }

    /// Whether the stack carries the evolved combat bonus.
    #[must_use]
    pub const fn has_evolved(self) -> bool {
        self.evolved > 0
    }

    /// Remove up to `count` units, standard first, returning what was removed.
    pub fn take(&mut self, count: u32) -> Stack {
        let standard = count.min(self.standard);
        let evolved = (count - standard).min(self.evolved);
        self.standard -= standard;
        self.evolved -= evolved;
        Stack { standard, evolved }
    }
}

/// A territory on the map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Unique id.
    pub id: NodeId,
    /// Display name.
    pub region_name: String,
    /// Current holder.
    pub owner: Owner,
    /// Standard units in garrison.
    pub standard_units: u32,
    /// Evolved units in garrison.
    pub evolved_units: u32,
    /// QR credited to a connected owner each resource phase.
    pub qr_output: u32,
    /// Knowledge junction flag.
    pub is_knowledge_junction: bool,
    /// Command node flag.
    pub is_command_node: bool,
    /// Adjacent node ids (symmetric).
    pub connections: BTreeSet<NodeId>,
    /// Garrison capacity.
    pub max_units: u32,
    /// Whether a fabrication hub exists here (static).
    pub has_fabrication_hub: bool,
    /// Whether the hub is running.
    pub is_hub_active: bool,
    /// Turn on which the active hub lost its supply line.
    pub hub_disconnected_turn: Option<u32>,
}

impl Node {
    /// Create an empty neutral node with the given capacity.
    #[must_use]
    pub fn new(id: impl Into<NodeId>, region_name: impl Into<String>, max_units: u32) -> Self {
        Self {
            id: id.into(),
            region_name: region_name.into(),
            owner: Owner::Neutral,
            standard_units: 0,
            evolved_units: 0,
            qr_output: 0,
            is_knowledge_junction: false,
            is_command_node: false,
            connections: BTreeSet::new(),
            max_units,
            has_fabrication_hub: false,
            is_hub_active: false,
            hub_disconnected_turn: None,
        }
    }

    /// Set the owner.
    #[must_use]
    pub fn owned_by(mut self, owner: impl Into<Owner>) -> Self {
        self.owner = owner.into();
        self
    }

    /// Set the garrison.
    #[must_use]
    pub fn with_units(mut self, standard: u32, evolved: u32) -> Self {
        self.standard_units = standard;
        self.evolved_units = evolved;
        self
    }

    /// Set the resource yield.
    #[must_use]
    pub fn with_qr_output(mut self, qr_output: u32) -> Self {
        self.qr_output = qr_output;
        self
    }

    /// Mark as a command node.
    #[must_use]
    pub fn command_node(mut self) -> Self {
        self.is_command_node = true;
        self
    }

    /// Mark as a knowledge junction.
    #[must_use]
    pub fn knowledge_junction(mut self) -> Self {
        self.is_knowledge_junction = true;
        self
    }

    /// Give the node a fabrication hub.
    #[must_use]
    pub fn with_hub(mut self) -> Self {
        self.has_fabrication_hub = true;
        self
    }

    /// Units in garrison.
    #[must_use]
    pub const fn total_units(&self) -> u32 {
        self.standard_units + self.evolved_units
    }

    /// Garrison as a stack.
    #[must_use]
    pub const fn stack(&self) -> Stack {
        Stack::new(self.standard_units, self.evolved_units)
    }

    /// Room left before `max_units`.
    #[must_use]
    pub const fn free_capacity(&self) -> u32 {
        self.max_units.saturating_sub(self.total_units())
    }

    /// Whether an edge leads to `other`.
    #[must_use]
    pub fn is_adjacent_to(&self, other: &str) -> bool {
        self.connections.contains(other)
    }

    /// Remove `count` units, standard first.
    ///
    /// # Panics
    ///
    /// Panics if the garrison holds fewer than `count` units.
    pub fn remove_units(&mut self, count: u32) -> Stack {
        assert!(
            count <= self.total_units(),
            "node {} cannot lose {count} of {} units",
            self.id,
            self.total_units()
        );
        let mut stack = self.stack();
        let removed = stack.take(count);
        self.standard_units = stack.standard;
        self.evolved_units = stack.evolved;
        removed
    }

    /// Add a stack to the garrison.
    ///
    /// # Panics
    ///
    /// Panics if the garrison would exceed `max_units`.
    pub fn add_units(&mut self, stack: Stack) {
        assert!(
            stack.total() <= self.free_capacity(),
            "node {} cannot hold {} more units (free {})",
            self.id,
            stack.total(),
            self.free_capacity()
        );
        self.standard_units += stack.standard;
        self.evolved_units += stack.evolved;
    }

    /// Shut the hub down and clear disconnection bookkeeping.
    pub fn deactivate_hub(&mut self) {
        self.is_hub_active = false;
        self.hub_disconnected_turn = None;
    }
}
