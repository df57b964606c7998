//! Node graph queries and the supply-line (connectivity) oracle.
//!
//! Connectivity is recomputed from scratch on every query. Ownership changes
//! with nearly every move and attack, and maps stay small (a few dozen
//! nodes), so there is no cached reachability structure to keep in sync.

use std::collections::{BTreeMap, HashSet, VecDeque};

use crate::game::{FactionId, Node, NodeId};

/// All nodes of a game keyed by id.
pub type NodeMap = BTreeMap<NodeId, Node>;

/// Whether `node_id` reaches a command node owned by `faction` through
/// nodes owned by `faction`.
///
/// Returns `false` when the start node is missing or not owned by `faction`.
#[must_use]
pub fn is_connected_to_command_node(node_id: &str, faction: FactionId, nodes: &NodeMap) -> bool {
    let Some(start) = nodes.get(node_id) else {
        return false;
    };
    if !start.owner.is(faction) {
        return false;
    }

    let mut visited: HashSet<&str> = HashSet::new();
    let mut queue: VecDeque<&Node> = VecDeque::new();
    visited.insert(start.id.as_str());
    queue.push_back(start);

    while let Some(node) = queue.pop_front() {
        if node.is_command_node {
            return true;
        }
        for next_id in &node.connections {
            if visited.contains(next_id.as_str()) {
                continue;
            }
            if let Some(next) = nodes.get(next_id) {
                if next.owner.is(faction) {
                    visited.insert(next.id.as_str());
                    queue.push_back(next);
                }
            }
        }
    }

    false
}

/// Whether an edge joins `from` and `to`.
#[must_use]
pub fn are_adjacent(nodes: &NodeMap, from: &str, to: &str) -> bool {
    nodes.get(from).is_some_and(|node| node.is_adjacent_to(to))
}

/// Nodes owned by `faction`.
pub fn owned_by(nodes: &NodeMap, faction: FactionId) -> impl Iterator<Item = &Node> {
    nodes.values().filter(move |node| node.owner.is(faction))
}

/// Ids of the nodes owned by `faction` that have a supply line.
#[must_use]
pub fn connected_nodes(nodes: &NodeMap, faction: FactionId) -> Vec<NodeId> {
    owned_by(nodes, faction)
        .filter(|node| is_connected_to_command_node(&node.id, faction, nodes))
        .map(|node| node.id.clone())
        .collect()
}

/// First edge that is missing its reverse or points at a missing node.
#[must_use]
pub fn find_broken_edge(nodes: &NodeMap) -> Option<(NodeId, NodeId)> {
    for node in nodes.values() {
        for other in &node.connections {
            let symmetric = nodes
                .get(other)
                .is_some_and(|target| target.connections.contains(&node.id));
            if !symmetric {
                return Some((node.id.clone(), other.clone()));
            }
        }
    }
    None
}

/// Join two nodes with a symmetric edge. Missing ids are ignored.
pub fn link(nodes: &mut NodeMap, a: &str, b: &str) {
    if !nodes.contains_key(a) || !nodes.contains_key(b) {
        return;
    }
    if let Some(node) = nodes.get_mut(a) {
        node.connections.insert(b.to_string());
    }
    if let Some(node) = nodes.get_mut(b) {
        node.connections.insert(a.to_string());
    }
}
