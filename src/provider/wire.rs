use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ProviderError;

/// Node record as the provider sends it. Identifiers stay untyped here; the
/// normalizer decides between boxed `{low, high}` and plain numbers.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct RawNode {
    #[serde(default, alias = "identity")]
    pub id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
}

impl RawNode {
    pub fn resolved_label(&self) -> Option<&str> {
        self.label
            .as_deref()
            .or_else(|| self.labels.as_ref().and_then(|labels| labels.first()).map(String::as_str))
            .filter(|label| !label.is_empty())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct RawRelationship {
    #[serde(default, alias = "identity")]
    pub id: Value,
    #[serde(default, alias = "start")]
    pub source: Value,
    #[serde(default, alias = "end")]
    pub target: Value,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
}

/// Whole-graph payload. A missing collection marks the payload as malformed.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct RawGraph {
    #[serde(default)]
    pub nodes: Option<Vec<RawNode>>,
    #[serde(default)]
    pub relationships: Option<Vec<RawRelationship>>,
}

impl RawGraph {
    /// Lenient conversion: entries that fail to deserialize are skipped
    /// rather than failing the whole payload.
    pub fn from_value(value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            return Self::default();
        };

        let nodes = object.get("nodes").and_then(Value::as_array).map(|items| {
            items
                .iter()
                .filter_map(|item| RawNode::deserialize(item).ok())
                .collect::<Vec<_>>()
        });
        let relationships = object
            .get("relationships")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| RawRelationship::deserialize(item).ok())
                    .collect::<Vec<_>>()
            });

        Self {
            nodes,
            relationships,
        }
    }
}

pub fn parse_graph_payload(raw: &str) -> Result<RawGraph, ProviderError> {
    let parsed: Value = serde_json::from_str(raw)
        .map_err(|error| ProviderError::Decode(format!("graph payload is not JSON: {error}")))?;
    Ok(RawGraph::from_value(&parsed))
}
