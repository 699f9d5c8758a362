use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::provider::{RawGraph, RawNode, RawRelationship};

use super::{EdgeId, Graph, GraphEdge, GraphNode, MISSING_ID, NodeId, Properties, PropertyValue};

const UNKNOWN_LABEL: &str = "Unknown";

/// Canonical integer for an identifier that may arrive boxed as
/// `{low, high}`, as a plain number, or not at all.
pub fn canonical_id(value: &Value) -> i64 {
    match value {
        Value::Object(object) => object.get("low").map_or(MISSING_ID, plain_id),
        Value::Null => MISSING_ID,
        other => plain_id(other),
    }
}

fn plain_id(value: &Value) -> i64 {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().filter(|value| value.is_finite()).map(|value| value as i64))
            .unwrap_or(MISSING_ID),
        Value::String(text) => text.trim().parse::<i64>().unwrap_or(MISSING_ID),
        _ => MISSING_ID,
    }
}

fn boxed_integer(object: &Map<String, Value>) -> Option<f64> {
    if object.len() != 2 {
        return None;
    }
    let low = object.get("low")?.as_i64()?;
    let high = object.get("high")?.as_i64()?;
    Some((high as f64) * 4_294_967_296.0 + (low as u32) as f64)
}

fn property_value(value: &Value) -> PropertyValue {
    match value {
        Value::Null => PropertyValue::Null,
        Value::Bool(flag) => PropertyValue::Bool(*flag),
        Value::Number(number) => number
            .as_f64()
            .map(PropertyValue::Number)
            .unwrap_or(PropertyValue::Null),
        Value::String(text) => PropertyValue::Text(text.clone()),
        Value::Array(items) => PropertyValue::List(items.iter().map(property_value).collect()),
        Value::Object(object) => match boxed_integer(object) {
            Some(number) => PropertyValue::Number(number),
            None => PropertyValue::Map(properties(Some(object))),
        },
    }
}

fn properties(raw: Option<&Map<String, Value>>) -> Properties {
    raw.map(|object| {
        object
            .iter()
            .map(|(key, value)| (key.clone(), property_value(value)))
            .collect()
    })
    .unwrap_or_default()
}

pub fn normalize_node(raw: &RawNode) -> Option<GraphNode> {
    let id: NodeId = canonical_id(&raw.id);
    if id == MISSING_ID {
        return None;
    }

    Some(GraphNode {
        id,
        label: raw.resolved_label().unwrap_or(UNKNOWN_LABEL).to_owned(),
        properties: properties(raw.properties.as_ref()),
    })
}

pub fn normalize_edge(raw: &RawRelationship) -> Option<GraphEdge> {
    let id: EdgeId = canonical_id(&raw.id);
    let source_id = canonical_id(&raw.source);
    let target_id = canonical_id(&raw.target);
    if id == MISSING_ID || source_id == MISSING_ID || target_id == MISSING_ID {
        return None;
    }

    Some(GraphEdge {
        id,
        source_id,
        target_id,
        kind: raw.kind.clone().unwrap_or_default(),
        properties: properties(raw.properties.as_ref()),
    })
}

/// Converts a provider payload into a snapshot. Never fails: a payload
/// without `nodes`/`relationships` yields an empty graph flagged malformed.
pub fn normalize(raw: &RawGraph) -> Graph {
    let (Some(raw_nodes), Some(raw_relationships)) = (&raw.nodes, &raw.relationships) else {
        warn!("graph payload is missing nodes or relationships; using an empty graph");
        return Graph::malformed();
    };

    let nodes = raw_nodes.iter().filter_map(normalize_node).collect::<Vec<_>>();
    let edges = raw_relationships
        .iter()
        .filter_map(normalize_edge)
        .collect::<Vec<_>>();

    let candidate_nodes = nodes.len();
    let candidate_edges = edges.len();
    let graph = Graph::from_parts(nodes, edges);
    debug!(
        dropped_nodes = raw_nodes.len() - graph.node_count(),
        dropped_edges = raw_relationships.len() - graph.edge_count(),
        candidate_nodes,
        candidate_edges,
        "normalized graph payload"
    );
    graph
}

impl Graph {
    /// Wire form with plain identifiers; `normalize(&graph.to_raw())`
    /// reproduces the graph.
    pub fn to_raw(&self) -> RawGraph {
        RawGraph {
            nodes: Some(self.nodes().iter().map(GraphNode::to_raw).collect()),
            relationships: Some(self.edges().iter().map(GraphEdge::to_raw).collect()),
        }
    }
}

impl GraphNode {
    pub fn to_raw(&self) -> RawNode {
        RawNode {
            id: Value::from(self.id),
            label: Some(self.label.clone()),
            labels: None,
            properties: Some(self.properties.to_json_map()),
        }
    }
}

impl GraphEdge {
    pub fn to_raw(&self) -> RawRelationship {
        RawRelationship {
            id: Value::from(self.id),
            source: Value::from(self.source_id),
            target: Value::from(self.target_id),
            kind: Some(self.kind.clone()),
            properties: Some(self.properties.to_json_map()),
        }
    }
}
