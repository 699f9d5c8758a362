use std::collections::HashSet;

use super::{NodeId, VisibleSubgraph};

/// The single selected node and its direct neighbors in the visible subgraph.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectionState {
    pub selected_node_id: Option<NodeId>,
    pub connected_ids: HashSet<NodeId>,
}

impl SelectionState {
    /// Selecting an id that is not visible yields an empty selection.
    pub fn select(node_id: NodeId, subgraph: &VisibleSubgraph) -> Self {
        if !subgraph.contains_node(node_id) {
            return Self::default();
        }

        Self {
            selected_node_id: Some(node_id),
            connected_ids: subgraph.neighbors(node_id),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.selected_node_id.is_none()
    }

    /// The selected node itself or one of its neighbors.
    pub fn is_relevant(&self, node_id: NodeId) -> bool {
        self.selected_node_id == Some(node_id) || self.connected_ids.contains(&node_id)
    }
}
