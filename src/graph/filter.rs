use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use super::{Graph, GraphEdge, GraphNode, NODE_TYPE_CATALOG, NodeId};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterConfiguration {
    pub search_text: String,
    pub enabled_types: BTreeMap<String, bool>,
    pub show_isolated_nodes: bool,
}

impl FilterConfiguration {
    /// Every listed label enabled, empty search, isolated nodes shown.
    pub fn with_types<'a>(labels: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            search_text: String::new(),
            enabled_types: labels
                .into_iter()
                .map(|label| (label.to_owned(), true))
                .collect(),
            show_isolated_nodes: true,
        }
    }

    /// Defaults for a snapshot: the known catalog plus any label the graph uses.
    pub fn for_graph(graph: &Graph) -> Self {
        let mut config = Self::with_types(NODE_TYPE_CATALOG);
        config.include_labels(graph.labels());
        config
    }

    /// Adds labels that have no entry yet as enabled; existing toggles stay.
    pub fn include_labels<'a>(&mut self, labels: impl IntoIterator<Item = &'a str>) {
        for label in labels {
            self.enabled_types.entry(label.to_owned()).or_insert(true);
        }
    }

    /// Labels without an entry are hidden.
    pub fn is_type_enabled(&self, label: &str) -> bool {
        self.enabled_types.get(label).copied().unwrap_or(false)
    }

    fn matches_search(&self, node: &GraphNode) -> bool {
        if self.search_text.is_empty() {
            return true;
        }
        node.name()
            .is_some_and(|name| name.to_lowercase().contains(&self.search_text.to_lowercase()))
    }

    fn matches(&self, node: &GraphNode) -> bool {
        self.is_type_enabled(&node.label) && self.matches_search(node)
    }

    fn with_change(&self, change: &FilterChange) -> Self {
        let mut next = self.clone();
        match change {
            FilterChange::SearchText(text) => next.search_text = text.clone(),
            FilterChange::ToggleType(label) => {
                let enabled = !self.is_type_enabled(label);
                next.enabled_types.insert(label.clone(), enabled);
            }
            FilterChange::SetAllTypes(enabled) => {
                for value in next.enabled_types.values_mut() {
                    *value = *enabled;
                }
            }
            FilterChange::ShowIsolatedNodes(show) => next.show_isolated_nodes = *show,
        }
        next
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FilterChange {
    SearchText(String),
    ToggleType(String),
    SetAllTypes(bool),
    ShowIsolatedNodes(bool),
}

impl FilterChange {
    fn is_guarded(&self) -> bool {
        matches!(self, Self::ToggleType(_) | Self::SetAllTypes(false))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterWarning {
    NoVisibleRelationships,
    CannotDeselectAll,
}

impl fmt::Display for FilterWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoVisibleRelationships => f.write_str(
                "This selection would leave no visible relationship. Keep at least one pair of connected nodes visible.",
            ),
            Self::CannotDeselectAll => f.write_str(
                "Cannot deselect every node type. At least one pair of connected nodes must stay visible.",
            ),
        }
    }
}

/// Nodes and edges that pass a configuration, in snapshot order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VisibleSubgraph {
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    index_by_id: HashMap<NodeId, usize>,
}

impl VisibleSubgraph {
    fn new(nodes: Vec<GraphNode>, edges: Vec<GraphEdge>) -> Self {
        let index_by_id = nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (node.id, index))
            .collect();
        Self {
            nodes,
            edges,
            index_by_id,
        }
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn node(&self, id: NodeId) -> Option<&GraphNode> {
        self.index_by_id.get(&id).map(|&index| &self.nodes[index])
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.index_by_id.contains_key(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Visible incident edge count per visible node.
    pub fn connection_counts(&self) -> HashMap<NodeId, usize> {
        let mut counts = self
            .nodes
            .iter()
            .map(|node| (node.id, 0usize))
            .collect::<HashMap<_, _>>();
        for edge in &self.edges {
            *counts.entry(edge.source_id).or_default() += 1;
            *counts.entry(edge.target_id).or_default() += 1;
        }
        counts
    }

    /// Nodes linked to `id` by a visible edge in either direction.
    pub fn neighbors(&self, id: NodeId) -> HashSet<NodeId> {
        self.edges
            .iter()
            .filter_map(|edge| edge.other_end(id))
            .filter(|&other| other != id)
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FilterOutcome {
    pub config: FilterConfiguration,
    pub subgraph: VisibleSubgraph,
    pub accepted: bool,
    pub warning: Option<FilterWarning>,
}

fn visible_node_ids(graph: &Graph, keep: impl Fn(&GraphNode) -> bool) -> HashSet<NodeId> {
    graph
        .nodes()
        .iter()
        .filter(|node| keep(node))
        .map(|node| node.id)
        .collect()
}

fn edges_between<'a>(
    graph: &'a Graph,
    node_ids: &'a HashSet<NodeId>,
) -> impl Iterator<Item = &'a GraphEdge> + 'a {
    graph
        .edges()
        .iter()
        .filter(|edge| node_ids.contains(&edge.source_id) && node_ids.contains(&edge.target_id))
}

/// Node pass, edge pass, then the isolated-node pass.
pub fn visible_subgraph(config: &FilterConfiguration, graph: &Graph) -> VisibleSubgraph {
    let node_ids = visible_node_ids(graph, |node| config.matches(node));
    let edges = edges_between(graph, &node_ids).cloned().collect::<Vec<_>>();

    let keep = if config.show_isolated_nodes {
        node_ids
    } else {
        edges
            .iter()
            .flat_map(|edge| [edge.source_id, edge.target_id])
            .collect()
    };

    let nodes = graph
        .nodes()
        .iter()
        .filter(|node| keep.contains(&node.id))
        .cloned()
        .collect();

    VisibleSubgraph::new(nodes, edges)
}

/// Edges visible under the type toggles alone, ignoring search text and the
/// isolated-node toggle.
pub fn type_visible_edge_count(config: &FilterConfiguration, graph: &Graph) -> usize {
    let node_ids = visible_node_ids(graph, |node| config.is_type_enabled(&node.label));
    edges_between(graph, &node_ids).count()
}

/// Applies `change` to `current`, refusing type changes that would hide every
/// relationship of a graph that has at least one.
pub fn validate_change(
    current: &FilterConfiguration,
    change: &FilterChange,
    graph: &Graph,
) -> Result<FilterConfiguration, FilterWarning> {
    let proposed = current.with_change(change);
    if change.is_guarded()
        && graph.edge_count() > 0
        && type_visible_edge_count(&proposed, graph) == 0
    {
        return Err(match change {
            FilterChange::SetAllTypes(false) => FilterWarning::CannotDeselectAll,
            _ => FilterWarning::NoVisibleRelationships,
        });
    }
    Ok(proposed)
}

pub fn apply_filter(
    current: &FilterConfiguration,
    change: &FilterChange,
    graph: &Graph,
) -> FilterOutcome {
    match validate_change(current, change, graph) {
        Ok(config) => FilterOutcome {
            subgraph: visible_subgraph(&config, graph),
            config,
            accepted: true,
            warning: None,
        },
        Err(warning) => FilterOutcome {
            config: current.clone(),
            subgraph: visible_subgraph(current, graph),
            accepted: false,
            warning: Some(warning),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::fixtures::{edge, node, scenario_graph};

    fn wider_graph() -> Graph {
        Graph::from_parts(
            vec![
                node(1, "Falha no backup", "Risco"),
                node(2, "Revisar política de backup", "PlanoDeAcao"),
                node(3, "Implementar backup em nuvem", "Acao"),
                node(4, "Segurança da informação", "Estrategia"),
                node(5, "Proteger os ativos digitais", "Missao"),
                node(6, "Blockchain", "Tecnologia"),
            ],
            vec![
                edge(20, 1, 2, "MITIGADO_POR"),
                edge(21, 2, 3, "CONTEM"),
                edge(22, 4, 5, "ALINHADA_COM"),
                edge(23, 4, 2, "SUPORTA"),
            ],
        )
    }

    fn ids(subgraph: &VisibleSubgraph) -> Vec<NodeId> {
        subgraph.nodes().iter().map(|node| node.id).collect()
    }

    fn edge_ids(subgraph: &VisibleSubgraph) -> Vec<i64> {
        subgraph.edges().iter().map(|edge| edge.id).collect()
    }

    #[test]
    fn default_filter_shows_everything() {
        let graph = scenario_graph();
        let config = FilterConfiguration::for_graph(&graph);
        let subgraph = visible_subgraph(&config, &graph);
        assert_eq!(ids(&subgraph), vec![1, 2, 3]);
        assert_eq!(edge_ids(&subgraph), vec![10, 11]);
    }

    #[test]
    fn disabling_acao_drops_its_edge() {
        let graph = scenario_graph();
        let config = FilterConfiguration::for_graph(&graph);
        let outcome = apply_filter(&config, &FilterChange::ToggleType("Acao".into()), &graph);
        assert!(outcome.accepted);
        assert_eq!(outcome.warning, None);
        assert_eq!(ids(&outcome.subgraph), vec![1, 2]);
        assert_eq!(edge_ids(&outcome.subgraph), vec![10]);
        assert!(!outcome.config.is_type_enabled("Acao"));
    }

    #[test]
    fn disabling_every_scenario_type_is_rejected() {
        let graph = scenario_graph();
        let mut config = FilterConfiguration::for_graph(&graph);

        let outcome = apply_filter(&config, &FilterChange::ToggleType("Risco".into()), &graph);
        assert!(outcome.accepted);
        config = outcome.config;

        let before = config.clone();
        let outcome =
            apply_filter(&config, &FilterChange::ToggleType("PlanoDeAcao".into()), &graph);
        assert!(!outcome.accepted);
        assert_eq!(outcome.config, before);
        assert_eq!(outcome.warning, Some(FilterWarning::NoVisibleRelationships));
        assert_eq!(edge_ids(&outcome.subgraph), vec![11]);
    }

    #[test]
    fn deselect_all_is_rejected_when_graph_has_edges() {
        let graph = scenario_graph();
        let config = FilterConfiguration::for_graph(&graph);
        let outcome = apply_filter(&config, &FilterChange::SetAllTypes(false), &graph);
        assert!(!outcome.accepted);
        assert_eq!(outcome.config, config);
        assert_eq!(outcome.warning, Some(FilterWarning::CannotDeselectAll));
    }

    #[test]
    fn guard_is_skipped_for_edgeless_graphs() {
        let graph = Graph::from_parts(vec![node(1, "Solo", "Risco")], Vec::new());
        let config = FilterConfiguration::for_graph(&graph);
        let outcome = apply_filter(&config, &FilterChange::SetAllTypes(false), &graph);
        assert!(outcome.accepted);
        assert!(outcome.subgraph.is_empty());
    }

    #[test]
    fn select_all_is_always_accepted() {
        let graph = scenario_graph();
        let mut config = FilterConfiguration::for_graph(&graph);
        config.enabled_types.insert("Acao".into(), false);
        let outcome = apply_filter(&config, &FilterChange::SetAllTypes(true), &graph);
        assert!(outcome.accepted);
        assert!(outcome.config.enabled_types.values().all(|enabled| *enabled));
    }

    #[test]
    fn search_narrows_by_name_and_is_not_guarded() {
        let graph = scenario_graph();
        let config = FilterConfiguration::for_graph(&graph);

        let outcome = apply_filter(&config, &FilterChange::SearchText("Plano".into()), &graph);
        assert!(outcome.accepted);
        assert_eq!(ids(&outcome.subgraph), vec![2]);
        assert!(outcome.subgraph.edges().is_empty());

        let outcome = apply_filter(
            &outcome.config,
            &FilterChange::ShowIsolatedNodes(false),
            &graph,
        );
        assert!(outcome.accepted);
        assert!(outcome.subgraph.is_empty());
    }

    #[test]
    fn search_is_case_insensitive() {
        let graph = wider_graph();
        let mut config = FilterConfiguration::for_graph(&graph);
        config.search_text = "BACKUP".into();
        let subgraph = visible_subgraph(&config, &graph);
        assert_eq!(ids(&subgraph), vec![1, 2, 3]);
        assert_eq!(edge_ids(&subgraph), vec![20, 21]);
    }

    #[test]
    fn type_toggles_ignore_search_when_guarding() {
        let graph = scenario_graph();
        let mut config = FilterConfiguration::for_graph(&graph);
        config.search_text = "Plano".into();
        let outcome = apply_filter(&config, &FilterChange::ToggleType("Acao".into()), &graph);
        assert!(outcome.accepted);
    }

    #[test]
    fn unknown_labels_are_hidden() {
        let graph = Graph::from_parts(
            vec![node(1, "A", "Risco"), node(2, "B", "Misterio")],
            vec![edge(1, 1, 2, "X")],
        );
        let config = FilterConfiguration::with_types(["Risco"]);
        let subgraph = visible_subgraph(&config, &graph);
        assert_eq!(ids(&subgraph), vec![1]);
        assert!(subgraph.edges().is_empty());
    }

    #[test]
    fn hiding_isolated_nodes_keeps_exactly_the_edge_endpoints() {
        let graph = wider_graph();
        let mut config = FilterConfiguration::for_graph(&graph);
        config.show_isolated_nodes = false;
        config.enabled_types.insert("PlanoDeAcao".into(), false);

        let subgraph = visible_subgraph(&config, &graph);
        let endpoints = subgraph
            .edges()
            .iter()
            .flat_map(|edge| [edge.source_id, edge.target_id])
            .collect::<HashSet<_>>();
        let visible = ids(&subgraph).into_iter().collect::<HashSet<_>>();
        assert_eq!(visible, endpoints);
        assert_eq!(edge_ids(&subgraph), vec![22]);
    }

    #[test]
    fn disabling_another_type_never_adds_anything() {
        let graph = wider_graph();
        let base = FilterConfiguration::for_graph(&graph);
        let labels = graph.labels().into_iter().map(str::to_owned).collect::<Vec<_>>();

        for first in &labels {
            let mut narrower = base.clone();
            narrower.enabled_types.insert(first.clone(), false);
            let wide = visible_subgraph(&narrower, &graph);

            for second in &labels {
                let mut narrowest = narrower.clone();
                narrowest.enabled_types.insert(second.clone(), false);
                let narrow = visible_subgraph(&narrowest, &graph);

                let wide_nodes = ids(&wide).into_iter().collect::<HashSet<_>>();
                let wide_edges = edge_ids(&wide).into_iter().collect::<HashSet<_>>();
                assert!(ids(&narrow).iter().all(|id| wide_nodes.contains(id)));
                assert!(edge_ids(&narrow).iter().all(|id| wide_edges.contains(id)));
            }
        }
    }

    #[test]
    fn new_labels_are_enabled_without_touching_existing_toggles() {
        let mut config = FilterConfiguration::with_types(["Risco", "Acao"]);
        config.enabled_types.insert("Acao".into(), false);
        config.include_labels(["Acao", "Novo"]);
        assert!(!config.is_type_enabled("Acao"));
        assert!(config.is_type_enabled("Novo"));
    }

    #[test]
    fn connection_counts_and_neighbors() {
        let graph = scenario_graph();
        let subgraph = visible_subgraph(&FilterConfiguration::for_graph(&graph), &graph);
        let counts = subgraph.connection_counts();
        assert_eq!(counts[&1], 1);
        assert_eq!(counts[&2], 2);
        assert_eq!(counts[&3], 1);
        assert_eq!(subgraph.neighbors(2), HashSet::from([1, 3]));
    }
}
