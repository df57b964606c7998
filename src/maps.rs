//! Fixed map templates.
//!
//! Every template is a node table plus an undirected edge list. The starting
//! assignment depends on fog of war: without fog each faction holds its
//! command node and the two frontier nodes next to it; with fog it holds the
//! command node alone with a larger garrison and the frontier starts neutral.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::MapError;
use crate::game::FactionId::{FactionA as A, FactionB as B};
use crate::game::{graph, FactionId, GameState, LogLevel, Node, NodeMap, Owner, VictoryRules};

/// Available map templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MapType {
    /// Ten nodes, three knowledge junctions.
    Skirmish,
    /// Twenty-two nodes, five knowledge junctions.
    Continental,
}

impl MapType {
    /// All templates.
    pub const ALL: [MapType; 2] = [MapType::Skirmish, MapType::Continental];
}

impl fmt::Display for MapType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapType::Skirmish => write!(f, "skirmish"),
            MapType::Continental => write!(f, "continental"),
        }
    }
}

impl FromStr for MapType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "skirmish" => Ok(MapType::Skirmish),
            "continental" => Ok(MapType::Continental),
            _ => Err(format!(
                "Unknown map: {s}. Use 'skirmish' or 'continental'."
            )),
        }
    }
}

const COMMAND_QR: u32 = 10;
const COMMAND_CAPACITY: u32 = 50;
const JUNCTION_QR: u32 = 8;
const JUNCTION_CAPACITY: u32 = 30;
const JUNCTION_GARRISON: u32 = 4;
const FRONTIER_QR: u32 = 3;
const WILD_QR: u32 = 2;
const FIELD_CAPACITY: u32 = 20;

const OPEN_COMMAND_GARRISON: u32 = 8;
const OPEN_FRONTIER_GARRISON: u32 = 3;
const FOG_COMMAND_GARRISON: u32 = 12;
const FOG_FRONTIER_GARRISON: u32 = 2;

#[derive(Debug, Clone, Copy)]
enum Role {
    Command(FactionId),
    Frontier(FactionId),
    Junction,
    Wild { garrison: u32 },
}

#[derive(Debug, Clone, Copy)]
struct Site {
    id: &'static str,
    region: &'static str,
    role: Role,
}

const fn site(id: &'static str, region: &'static str, role: Role) -> Site {
    Site { id, region, role }
}

const SKIRMISH_SITES: &[Site] = &[
    site("a-nexus", "Alpha Nexus", Role::Command(A)),
    site("a-relay-n", "Alpha Northern Relay", Role::Frontier(A)),
    site("a-relay-s", "Alpha Southern Relay", Role::Frontier(A)),
    site("kj-north", "Boreal Archive", Role::Junction),
    site("kj-core", "Central Lattice", Role::Junction),
    site("kj-south", "Austral Archive", Role::Junction),
    site("void-gate", "Void Gate", Role::Wild { garrison: 0 }),
    site("b-relay-n", "Beta Northern Relay", Role::Frontier(B)),
    site("b-relay-s", "Beta Southern Relay", Role::Frontier(B)),
    site("b-nexus", "Beta Nexus", Role::Command(B)),
];

const SKIRMISH_EDGES: &[(&str, &str)] = &[
    ("a-nexus", "a-relay-n"),
    ("a-nexus", "a-relay-s"),
    ("a-relay-n", "kj-north"),
    ("a-relay-n", "kj-core"),
    ("a-relay-s", "kj-south"),
    ("a-relay-s", "kj-core"),
    ("kj-north", "b-relay-n"),
    ("kj-north", "void-gate"),
    ("kj-south", "b-relay-s"),
    ("kj-south", "void-gate"),
    ("kj-core", "b-relay-n"),
    ("kj-core", "b-relay-s"),
    ("b-nexus", "b-relay-n"),
    ("b-nexus", "b-relay-s"),
];

const CONTINENTAL_SITES: &[Site] = &[
    site("a-core", "Alpha Core", Role::Command(A)),
    site("a-archive", "Alpha Archive", Role::Frontier(A)),
    site("a-forge", "Alpha Forge", Role::Frontier(A)),
    site("a-listening-post", "Alpha Listening Post", Role::Wild { garrison: 2 }),
    site("b-core", "Beta Core", Role::Command(B)),
    site("b-archive", "Beta Archive", Role::Frontier(B)),
    site("b-forge", "Beta Forge", Role::Frontier(B)),
    site("b-listening-post", "Beta Listening Post", Role::Wild { garrison: 2 }),
    site("n-west-span", "Northwest Span", Role::Wild { garrison: 2 }),
    site("n-east-span", "Northeast Span", Role::Wild { garrison: 2 }),
    site("s-west-span", "Southwest Span", Role::Wild { garrison: 2 }),
    site("s-east-span", "Southeast Span", Role::Wild { garrison: 2 }),
    site("c-west-bridge", "West Bridge", Role::Wild { garrison: 2 }),
    site("c-east-bridge", "East Bridge", Role::Wild { garrison: 2 }),
    site("kj-lumen", "Lumen Junction", Role::Junction),
    site("kj-axiom", "Axiom Junction", Role::Junction),
    site("kj-cipher", "Cipher Junction", Role::Junction),
    site("kj-meridian", "Meridian Junction", Role::Junction),
    site("kj-umbra", "Umbra Junction", Role::Junction),
    site("drift-north", "Northern Drift", Role::Wild { garrison: 0 }),
    site("drift-south", "Southern Drift", Role::Wild { garrison: 0 }),
    site("the-rift", "The Rift", Role::Wild { garrison: 0 }),
];

const CONTINENTAL_EDGES: &[(&str, &str)] = &[
    ("a-core", "a-archive"),
    ("a-core", "a-forge"),
    ("a-archive", "a-listening-post"),
    ("a-archive", "n-west-span"),
    ("a-forge", "s-west-span"),
    ("a-forge", "c-west-bridge"),
    ("a-listening-post", "drift-north"),
    ("c-west-bridge", "kj-axiom"),
    ("kj-axiom", "kj-cipher"),
    ("n-west-span", "kj-lumen"),
    ("n-west-span", "drift-north"),
    ("s-west-span", "kj-umbra"),
    ("s-west-span", "drift-south"),
    ("b-core", "b-archive"),
    ("b-core", "b-forge"),
    ("b-archive", "b-listening-post"),
    ("b-archive", "n-east-span"),
    ("b-forge", "s-east-span"),
    ("b-forge", "c-east-bridge"),
    ("b-listening-post", "drift-north"),
    ("c-east-bridge", "kj-meridian"),
    ("kj-meridian", "kj-cipher"),
    ("n-east-span", "kj-lumen"),
    ("n-east-span", "drift-north"),
    ("s-east-span", "kj-umbra"),
    ("s-east-span", "drift-south"),
    ("kj-lumen", "kj-cipher"),
    ("kj-umbra", "the-rift"),
    ("the-rift", "kj-cipher"),
    ("the-rift", "drift-south"),
];

/// Junction thresholds for a template.
#[must_use]
pub const fn victory_rules(map_type: MapType) -> VictoryRules {
    match map_type {
        MapType::Skirmish => VictoryRules::new(2, 3),
        MapType::Continental => VictoryRules::new(3, 3),
    }
}

const fn layout(map_type: MapType) -> (&'static [Site], &'static [(&'static str, &'static str)]) {
    match map_type {
        MapType::Skirmish => (SKIRMISH_SITES, SKIRMISH_EDGES),
        MapType::Continental => (CONTINENTAL_SITES, CONTINENTAL_EDGES),
    }
}

fn build_site(site: &Site, fog_of_war: bool) -> Node {
    let node = Node::new(site.id, site.region, FIELD_CAPACITY);
    match site.role {
        Role::Command(faction) => {
            let garrison = if fog_of_war {
                FOG_COMMAND_GARRISON
            } else {
                OPEN_COMMAND_GARRISON
            };
            Node {
                max_units: COMMAND_CAPACITY,
                ..node
            }
            .owned_by(faction)
            .command_node()
            .with_qr_output(COMMAND_QR)
            .with_units(garrison, 0)
        }
        Role::Frontier(faction) => {
            let node = node.with_qr_output(FRONTIER_QR);
            if fog_of_war {
                node.with_units(FOG_FRONTIER_GARRISON, 0)
            } else {
                node.owned_by(faction).with_units(OPEN_FRONTIER_GARRISON, 0)
            }
        }
        Role::Junction => Node {
            max_units: JUNCTION_CAPACITY,
            ..node
        }
        .knowledge_junction()
        .with_hub()
        .with_qr_output(JUNCTION_QR)
        .with_units(JUNCTION_GARRISON, 0),
        Role::Wild { garrison } => node.with_qr_output(WILD_QR).with_units(garrison, 0),
    }
}

/// Build the node set of a template.
///
/// # Errors
///
/// Returns an error if the template fails [`check_template`].
pub fn build_nodes(map_type: MapType, fog_of_war: bool) -> Result<NodeMap, MapError> {
    let (sites, edges) = layout(map_type);
    let mut nodes = NodeMap::new();
    for site in sites {
        if nodes.contains_key(site.id) {
            return Err(MapError::DuplicateNode(site.id.to_string()));
        }
        nodes.insert(site.id.to_string(), build_site(site, fog_of_war));
    }
    for (a, b) in edges {
        for end in [a, b] {
            if !nodes.contains_key(*end) {
                return Err(MapError::DanglingEdge((*end).to_string()));
            }
        }
        graph::link(&mut nodes, a, b);
    }
    check_template(&nodes, victory_rules(map_type))?;
    Ok(nodes)
}

/// Construction checks shared by every template.
///
/// # Errors
///
/// Returns the first failed check.
pub fn check_template(nodes: &NodeMap, victory: VictoryRules) -> Result<(), MapError> {
    if let Some((from, _)) = graph::find_broken_edge(nodes) {
        return Err(MapError::DanglingEdge(from));
    }
    for faction in FactionId::ALL {
        let found = nodes
            .values()
            .filter(|node| node.is_command_node && node.owner == Owner::from(faction))
            .count();
        if found != 1 {
            return Err(MapError::CommandNodes {
                faction: faction.to_string(),
                found,
            });
        }
    }
    let total = u32::try_from(
        nodes
            .values()
            .filter(|node| node.is_knowledge_junction)
            .count(),
    )
    .unwrap_or(u32::MAX);
    if victory.required_kjs * 2 <= total {
        return Err(MapError::AmbiguousThreshold {
            required: victory.required_kjs,
            total,
        });
    }
    if let Some(node) = nodes.values().find(|node| node.total_units() > node.max_units) {
        return Err(MapError::Overfilled(node.id.clone()));
    }
    Ok(())
}

/// Create a fresh game on a template.
///
/// # Errors
///
/// Returns an error if the template fails its construction checks.
pub fn build_game(
    map_type: MapType,
    fog_of_war: bool,
    config: &EngineConfig,
    seed: u64,
) -> Result<GameState, MapError> {
    let nodes = build_nodes(map_type, fog_of_war)?;
    let mut state = GameState::new(
        nodes,
        map_type,
        fog_of_war,
        victory_rules(map_type),
        config,
        seed,
    );
    let fog = if fog_of_war { "on" } else { "off" };
    state.log(
        LogLevel::Info,
        format!("New {map_type} game, fog of war {fog}, seed {seed}"),
    );
    Ok(state)
}
