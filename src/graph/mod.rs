mod filter;
mod normalize;
mod selection;
mod summary;

use std::collections::HashMap;
use std::fmt;

pub use filter::{
    FilterChange, FilterConfiguration, FilterWarning, VisibleSubgraph, apply_filter,
    validate_change, visible_subgraph,
};
pub use normalize::{normalize, normalize_edge, normalize_node};
pub use selection::SelectionState;
pub use summary::{CategoryGroup, summarize};

pub type NodeId = i64;
pub type EdgeId = i64;

/// Identifier assigned to records whose id was null or missing on the wire.
pub const MISSING_ID: i64 = -1;

/// Labels the sample dataset and the add form know about, in display order.
pub const NODE_TYPE_CATALOG: [&str; 16] = [
    "Risco",
    "PlanoDeAcao",
    "Acao",
    "Estrategia",
    "Visao",
    "Missao",
    "Oportunidade",
    "Departamento",
    "Projeto",
    "Objetivo",
    "KPI",
    "Stakeholder",
    "Tecnologia",
    "Produto",
    "Mercado",
    "Competidor",
];

#[derive(Clone, Debug, PartialEq)]
pub enum PropertyValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<PropertyValue>),
    Map(Properties),
}

impl PropertyValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(value) => serde_json::Value::Bool(*value),
            Self::Number(value) => number_to_json(*value),
            Self::Text(text) => serde_json::Value::String(text.clone()),
            Self::List(items) => {
                serde_json::Value::Array(items.iter().map(PropertyValue::to_json).collect())
            }
            Self::Map(properties) => serde_json::Value::Object(properties.to_json_map()),
        }
    }
}

fn number_to_json(value: f64) -> serde_json::Value {
    if value.fract() == 0.0 && value.abs() < 9.0e15 {
        serde_json::Value::from(value as i64)
    } else {
        serde_json::Number::from_f64(value)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null)
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Number(value) if value.fract() == 0.0 && value.abs() < 9.0e15 => {
                write!(f, "{}", *value as i64)
            }
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(text) => f.write_str(text),
            Self::List(_) | Self::Map(_) => write!(f, "{}", self.to_json()),
        }
    }
}

/// Insertion-ordered property bag.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Properties(Vec<(String, PropertyValue)>);

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.0
            .iter()
            .find_map(|(name, value)| (name == key).then_some(value))
    }

    /// Replaces an existing key in place, otherwise appends.
    pub fn insert(&mut self, key: impl Into<String>, value: PropertyValue) {
        let key = key.into();
        if let Some(slot) = self.0.iter_mut().find(|(name, _)| *name == key) {
            slot.1 = value;
        } else {
            self.0.push((key, value));
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn to_json_map(&self) -> serde_json::Map<String, serde_json::Value> {
        self.0
            .iter()
            .map(|(key, value)| (key.clone(), value.to_json()))
            .collect()
    }
}

impl<K: Into<String>> FromIterator<(K, PropertyValue)> for Properties {
    fn from_iter<T: IntoIterator<Item = (K, PropertyValue)>>(iter: T) -> Self {
        let mut properties = Self::new();
        for (key, value) in iter {
            properties.insert(key, value);
        }
        properties
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphNode {
    pub id: NodeId,
    pub label: String,
    pub properties: Properties,
}

impl GraphNode {
    pub fn name(&self) -> Option<&str> {
        self.properties.get("name").and_then(PropertyValue::as_text)
    }

    pub fn display_name(&self) -> String {
        self.name()
            .map(str::to_owned)
            .unwrap_or_else(|| format!("Node {}", self.id))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphEdge {
    pub id: EdgeId,
    pub source_id: NodeId,
    pub target_id: NodeId,
    pub kind: String,
    pub properties: Properties,
}

impl GraphEdge {
    pub fn touches(&self, node_id: NodeId) -> bool {
        self.source_id == node_id || self.target_id == node_id
    }

    /// The endpoint opposite `node_id`, if the edge touches it.
    pub fn other_end(&self, node_id: NodeId) -> Option<NodeId> {
        if self.source_id == node_id {
            Some(self.target_id)
        } else if self.target_id == node_id {
            Some(self.source_id)
        } else {
            None
        }
    }
}

/// Immutable snapshot of everything a single fetch returned.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Graph {
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    index_by_id: HashMap<NodeId, usize>,
    malformed: bool,
}

impl Graph {
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn malformed() -> Self {
        Self {
            malformed: true,
            ..Self::default()
        }
    }

    /// Builds a snapshot, dropping duplicate node ids (first wins) and edges
    /// whose endpoints are missing.
    pub fn from_parts(nodes: Vec<GraphNode>, edges: Vec<GraphEdge>) -> Self {
        let mut index_by_id = HashMap::with_capacity(nodes.len());
        let mut unique_nodes = Vec::with_capacity(nodes.len());
        for node in nodes {
            if node.id == MISSING_ID || index_by_id.contains_key(&node.id) {
                continue;
            }
            index_by_id.insert(node.id, unique_nodes.len());
            unique_nodes.push(node);
        }

        let edges = edges
            .into_iter()
            .filter(|edge| {
                edge.id != MISSING_ID
                    && index_by_id.contains_key(&edge.source_id)
                    && index_by_id.contains_key(&edge.target_id)
            })
            .collect();

        Self {
            nodes: unique_nodes,
            edges,
            index_by_id,
            malformed: false,
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

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// True when the provider payload lacked the expected collections.
    pub fn is_malformed(&self) -> bool {
        self.malformed
    }

    /// Distinct labels in first-seen order.
    pub fn labels(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = Vec::new();
        for node in &self.nodes {
            if !labels.contains(&node.label.as_str()) {
                labels.push(node.label.as_str());
            }
        }
        labels
    }
}
