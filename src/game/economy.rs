//! Resource phase: QR income from supplied nodes.

use std::collections::BTreeMap;

use crate::game::{graph, FactionId, GameState, LogLevel, NodeId};

/// Income credited to one faction in a resource phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Income {
    /// QR credited.
    pub collected: u32,
    /// Owned nodes that yielded nothing because they had no supply line.
    pub disconnected: Vec<NodeId>,
}

/// Credit every supplied node's `qr_output` to its owner.
///
/// Nodes cut off from their owner's command node yield nothing and are
/// logged.
pub fn collect_resources(state: &mut GameState) -> BTreeMap<FactionId, Income> {
    let mut incomes: BTreeMap<FactionId, Income> = BTreeMap::new();
    for faction in FactionId::ALL {
        let mut income = Income::default();
        for node in graph::owned_by(&state.nodes, faction) {
            if graph::is_connected_to_command_node(&node.id, faction, &state.nodes) {
                income.collected += node.qr_output;
            } else if node.qr_output > 0 {
                income.disconnected.push(node.id.clone());
            }
        }
        incomes.insert(faction, income);
    }

    for (faction, income) in &incomes {
        state.faction_mut(*faction).credit(income.collected);
        state.log(
            LogLevel::Info,
            format!("{faction} collected {} QR", income.collected),
        );
        if !income.disconnected.is_empty() {
            state.log(
                LogLevel::Warning,
                format!(
                    "{faction} nodes without a supply line yielded nothing: {}",
                    income.disconnected.join(", ")
                ),
            );
        }
    }
    incomes
}
