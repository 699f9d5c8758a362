use std::sync::{Mutex, PoisonError};

use tracing::info;

use crate::graph::{EdgeId, Graph, GraphEdge, GraphNode, NodeId};

use super::{
    GraphProvider, NewNode, NewRelationship, ProviderError, ProviderResult, RawGraph, sample_graph,
};

/// Mutable node and edge lists behind the in-process providers.
#[derive(Debug, Default)]
pub(super) struct GraphStore {
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
}

impl GraphStore {
    pub(super) fn from_graph(graph: &Graph) -> Self {
        Self {
            nodes: graph.nodes().to_vec(),
            edges: graph.edges().to_vec(),
        }
    }

    pub(super) fn to_raw(&self) -> RawGraph {
        RawGraph {
            nodes: Some(self.nodes.iter().map(GraphNode::to_raw).collect()),
            relationships: Some(self.edges.iter().map(GraphEdge::to_raw).collect()),
        }
    }

    /// Node and relationship ids share one sequence.
    fn next_id(&self) -> i64 {
        let max_node = self.nodes.iter().map(|node| node.id).max().unwrap_or(0);
        let max_edge = self.edges.iter().map(|edge| edge.id).max().unwrap_or(0);
        max_node.max(max_edge).max(0) + 1
    }

    fn has_node(&self, id: NodeId) -> bool {
        self.nodes.iter().any(|node| node.id == id)
    }

    pub(super) fn insert_node(&mut self, request: &NewNode) -> ProviderResult<GraphNode> {
        request.validate()?;
        let node = GraphNode {
            id: self.next_id(),
            label: request.label.clone(),
            properties: request.full_properties(),
        };
        self.nodes.push(node.clone());
        Ok(node)
    }

    pub(super) fn insert_relationship(
        &mut self,
        request: &NewRelationship,
    ) -> ProviderResult<GraphEdge> {
        request.validate()?;
        for endpoint in [request.source_id, request.target_id] {
            if !self.has_node(endpoint) {
                return Err(ProviderError::MissingNode(endpoint));
            }
        }

        let id: EdgeId = self.next_id();
        let edge = GraphEdge {
            id,
            source_id: request.source_id,
            target_id: request.target_id,
            kind: request.kind.clone(),
            properties: request.properties.clone(),
        };
        self.edges.push(edge.clone());
        Ok(edge)
    }

    pub(super) fn replace_with(&mut self, graph: &Graph) {
        *self = Self::from_graph(graph);
    }
}

/// Provider that keeps everything in process memory; `--demo` mode.
#[derive(Debug, Default)]
pub struct MemoryProvider {
    store: Mutex<GraphStore>,
}

impl MemoryProvider {
    pub fn new(graph: &Graph) -> Self {
        Self {
            store: Mutex::new(GraphStore::from_graph(graph)),
        }
    }

    pub fn with_sample() -> ProviderResult<Self> {
        Ok(Self::new(&sample_graph()?))
    }
}

impl GraphProvider for MemoryProvider {
    fn fetch_graph(&self) -> ProviderResult<RawGraph> {
        let store = self.store.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(store.to_raw())
    }

    fn create_node(&self, request: &NewNode) -> ProviderResult<GraphNode> {
        let mut store = self.store.lock().unwrap_or_else(PoisonError::into_inner);
        let node = store.insert_node(request)?;
        info!(id = node.id, label = %node.label, "created node in memory");
        Ok(node)
    }

    fn create_relationship(&self, request: &NewRelationship) -> ProviderResult<GraphEdge> {
        let mut store = self.store.lock().unwrap_or_else(PoisonError::into_inner);
        let edge = store.insert_relationship(request)?;
        info!(id = edge.id, kind = %edge.kind, "created relationship in memory");
        Ok(edge)
    }

    fn seed(&self) -> ProviderResult<()> {
        let sample = sample_graph()?;
        let mut store = self.store.lock().unwrap_or_else(PoisonError::into_inner);
        store.replace_with(&sample);
        Ok(())
    }

    fn describe(&self) -> String {
        "in-memory sample".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::fixtures::scenario_graph;
    use crate::graph::normalize;

    fn new_node(name: &str, label: &str) -> NewNode {
        NewNode {
            name: name.into(),
            label: label.into(),
            ..NewNode::default()
        }
    }

    #[test]
    fn fetch_round_trips_the_initial_graph() {
        let graph = scenario_graph();
        let provider = MemoryProvider::new(&graph);
        let fetched = normalize(&provider.fetch_graph().expect("fetch"));
        assert_eq!(fetched, graph);
    }

    #[test]
    fn created_nodes_get_fresh_ids_and_show_up_in_the_next_fetch() {
        let provider = MemoryProvider::new(&scenario_graph());
        let node = provider
            .create_node(&new_node("Nuvem híbrida", "Tecnologia"))
            .expect("created");
        assert_eq!(node.id, 12);
        assert_eq!(node.name(), Some("Nuvem híbrida"));

        let fetched = normalize(&provider.fetch_graph().expect("fetch"));
        assert_eq!(fetched.node_count(), 4);
        assert!(fetched.contains_node(12));
    }

    #[test]
    fn relationships_need_existing_endpoints() {
        let provider = MemoryProvider::new(&scenario_graph());
        let request = NewRelationship {
            source_id: 1,
            target_id: 99,
            kind: "IMPACTA".into(),
            ..NewRelationship::default()
        };
        assert!(matches!(
            provider.create_relationship(&request),
            Err(ProviderError::MissingNode(99))
        ));

        let request = NewRelationship {
            target_id: 3,
            ..request
        };
        let edge = provider.create_relationship(&request).expect("created");
        assert_eq!((edge.source_id, edge.target_id), (1, 3));
    }

    #[test]
    fn invalid_requests_leave_the_store_untouched() {
        let provider = MemoryProvider::new(&scenario_graph());
        assert!(provider.create_node(&new_node("", "Risco")).is_err());
        let fetched = normalize(&provider.fetch_graph().expect("fetch"));
        assert_eq!(fetched.node_count(), 3);
    }

    #[test]
    fn seeding_replaces_the_contents() {
        let provider = MemoryProvider::default();
        assert!(normalize(&provider.fetch_graph().expect("fetch")).is_empty());
        provider.seed().expect("seed");
        let fetched = normalize(&provider.fetch_graph().expect("fetch"));
        assert_eq!(fetched.node_count(), 106);
    }
}
