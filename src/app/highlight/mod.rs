use std::collections::HashSet;

use crate::graph::{EdgeId, NodeId, SelectionState, VisibleSubgraph};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(in crate::app) enum NodeTier {
    Normal,
    Selected,
    Connected,
    Dimmed,
}

impl NodeTier {
    pub(in crate::app) fn opacity(self) -> f32 {
        match self {
            Self::Normal | Self::Selected => 1.0,
            Self::Connected => 0.9,
            Self::Dimmed => 0.25,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(in crate::app) enum EdgeTier {
    Normal,
    Connected,
    Dimmed,
}

impl EdgeTier {
    pub(in crate::app) fn opacity(self) -> f32 {
        match self {
            Self::Normal => 0.5,
            Self::Connected => 0.8,
            Self::Dimmed => 0.15,
        }
    }
}

/// Selection plus the visible edges that touch the selected node.
#[derive(Clone, Debug, Default, PartialEq)]
pub(in crate::app) struct HighlightState {
    selection: SelectionState,
    connected_edges: HashSet<EdgeId>,
}

impl HighlightState {
    pub(in crate::app) fn select(node_id: NodeId, subgraph: &VisibleSubgraph) -> Self {
        let selection = SelectionState::select(node_id, subgraph);
        let connected_edges = selection
            .selected_node_id
            .map(|selected| {
                subgraph
                    .edges()
                    .iter()
                    .filter(|edge| edge.touches(selected))
                    .map(|edge| edge.id)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            selection,
            connected_edges,
        }
    }

    pub(in crate::app) fn clear() -> Self {
        Self::default()
    }

    pub(in crate::app) fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub(in crate::app) fn selected(&self) -> Option<NodeId> {
        self.selection.selected_node_id
    }

    pub(in crate::app) fn node_tier(&self, node_id: NodeId) -> NodeTier {
        match self.selection.selected_node_id {
            None => NodeTier::Normal,
            Some(selected) if selected == node_id => NodeTier::Selected,
            Some(_) if self.selection.connected_ids.contains(&node_id) => NodeTier::Connected,
            Some(_) => NodeTier::Dimmed,
        }
    }

    pub(in crate::app) fn edge_tier(&self, edge_id: EdgeId) -> EdgeTier {
        if self.selection.is_empty() {
            EdgeTier::Normal
        } else if self.connected_edges.contains(&edge_id) {
            EdgeTier::Connected
        } else {
            EdgeTier::Dimmed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::fixtures::{edge, node, scenario_graph};
    use crate::graph::{FilterConfiguration, Graph, visible_subgraph};

    fn full_view(graph: &Graph) -> VisibleSubgraph {
        visible_subgraph(&FilterConfiguration::for_graph(graph), graph)
    }

    #[test]
    fn nothing_selected_is_all_normal() {
        let graph = scenario_graph();
        let subgraph = full_view(&graph);
        let highlight = HighlightState::clear();
        assert!(
            subgraph
                .nodes()
                .iter()
                .all(|node| highlight.node_tier(node.id) == NodeTier::Normal)
        );
        assert!(
            subgraph
                .edges()
                .iter()
                .all(|edge| highlight.edge_tier(edge.id) == EdgeTier::Normal)
        );
    }

    #[test]
    fn selecting_the_end_of_the_chain() {
        let graph = scenario_graph();
        let subgraph = full_view(&graph);
        let highlight = HighlightState::select(1, &subgraph);

        assert_eq!(highlight.node_tier(1), NodeTier::Selected);
        assert_eq!(highlight.node_tier(2), NodeTier::Connected);
        assert_eq!(highlight.node_tier(3), NodeTier::Dimmed);
        assert_eq!(highlight.edge_tier(subgraph.edges()[0].id), EdgeTier::Connected);
        assert_eq!(highlight.edge_tier(subgraph.edges()[1].id), EdgeTier::Dimmed);
    }

    #[test]
    fn tiers_partition_the_visible_nodes() {
        let graph = Graph::from_parts(
            vec![
                node(1, "Segurança da informação", "Estrategia"),
                node(2, "Proteger os ativos digitais", "Missao"),
                node(3, "Falha no backup", "Risco"),
                node(4, "Blockchain", "Tecnologia"),
                node(5, "Adoção de IA", "Oportunidade"),
            ],
            vec![
                edge(1, 1, 2, "ALINHADA_COM"),
                edge(2, 3, 1, "IMPACTA"),
                edge(3, 5, 1, "VIABILIZA"),
                edge(4, 4, 5, "HABILITA"),
            ],
        );
        let subgraph = full_view(&graph);

        for candidate in subgraph.nodes() {
            let highlight = HighlightState::select(candidate.id, &subgraph);
            let mut selected = 0;
            let mut connected = 0;
            let mut dimmed = 0;
            for node in subgraph.nodes() {
                match highlight.node_tier(node.id) {
                    NodeTier::Selected => selected += 1,
                    NodeTier::Connected => connected += 1,
                    NodeTier::Dimmed => dimmed += 1,
                    NodeTier::Normal => panic!("normal tier while a node is selected"),
                }
            }
            assert_eq!(selected, 1);
            assert_eq!(connected, subgraph.neighbors(candidate.id).len());
            assert_eq!(selected + connected + dimmed, subgraph.nodes().len());
        }
    }

    #[test]
    fn reselecting_moves_directly_between_nodes() {
        let graph = scenario_graph();
        let subgraph = full_view(&graph);
        let first = HighlightState::select(1, &subgraph);
        let second = HighlightState::select(3, &subgraph);
        assert_ne!(first, second);
        assert_eq!(second.node_tier(1), NodeTier::Dimmed);
        assert_eq!(second.node_tier(3), NodeTier::Selected);
    }

    #[test]
    fn hidden_nodes_cannot_be_selected() {
        let graph = scenario_graph();
        let mut config = FilterConfiguration::for_graph(&graph);
        config.enabled_types.insert("Acao".into(), false);
        let subgraph = visible_subgraph(&config, &graph);
        let highlight = HighlightState::select(3, &subgraph);
        assert_eq!(highlight.selected(), None);
        assert_eq!(highlight.node_tier(1), NodeTier::Normal);
    }
}
