use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::graph::{GraphEdge, GraphNode, normalize_edge, normalize_node};
use crate::util::timestamp_millis;

use super::{
    GraphProvider, NewNode, NewRelationship, ProviderError, ProviderResult, RawGraph, RawNode,
    RawRelationship,
};

/// Provider for the `/api/graph`, `/api/node`, `/api/relationship` and
/// `/api/seed` endpoints.
#[derive(Debug)]
pub struct HttpProvider {
    base_url: String,
    client: Client,
}

impl HttpProvider {
    pub fn new(base_url: &str, timeout: Duration) -> ProviderResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| ProviderError::Transport(error.to_string()))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            client,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/{path}", self.base_url)
    }

    fn post(&self, path: &str, body: &Value) -> ProviderResult<Value> {
        let url = self.endpoint(path);
        debug!(%url, "POST");
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .map_err(|error| ProviderError::Transport(error.to_string()))?;
        read_json(response)
    }
}

fn read_json(response: Response) -> ProviderResult<Value> {
    let status = response.status();
    let body = response
        .text()
        .map_err(|error| ProviderError::Transport(error.to_string()))?;
    if status != StatusCode::OK {
        return Err(ProviderError::Status {
            status: status.as_u16(),
            message: error_message(&body),
        });
    }
    serde_json::from_str(&body).map_err(|error| ProviderError::Decode(error.to_string()))
}

/// The `error` field of a JSON error body, else the raw body.
fn error_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: String,
    }

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.error,
        Err(_) if body.trim().is_empty() => "<no body>".to_owned(),
        Err(_) => body.trim().to_owned(),
    }
}

fn created_record<T: DeserializeOwned>(response: &Value, field: &str) -> ProviderResult<T> {
    let record = response
        .get(field)
        .ok_or_else(|| ProviderError::Decode(format!("response has no `{field}` field")))?;
    T::deserialize(record).map_err(|error| ProviderError::Decode(error.to_string()))
}

fn created_node(response: &Value) -> ProviderResult<GraphNode> {
    let raw: RawNode = created_record(response, "node")?;
    normalize_node(&raw)
        .ok_or_else(|| ProviderError::Decode("created node has no identifier".to_owned()))
}

fn created_relationship(response: &Value) -> ProviderResult<GraphEdge> {
    let raw: RawRelationship = created_record(response, "relationship")?;
    normalize_edge(&raw)
        .ok_or_else(|| ProviderError::Decode("created relationship has no identifier".to_owned()))
}

impl GraphProvider for HttpProvider {
    fn fetch_graph(&self) -> ProviderResult<RawGraph> {
        // Cache buster.
        let url = format!("{}?t={}", self.endpoint("graph"), timestamp_millis());
        debug!(%url, "GET");
        let response = self
            .client
            .get(&url)
            .header("Cache-Control", "no-cache")
            .send()
            .map_err(|error| ProviderError::Transport(error.to_string()))?;
        Ok(RawGraph::from_value(&read_json(response)?))
    }

    fn create_node(&self, request: &NewNode) -> ProviderResult<GraphNode> {
        request.validate()?;
        let body = json!({
            "name": request.name.trim(),
            "label": request.label,
            "properties": request.properties.to_json_map(),
        });
        let node = created_node(&self.post("node", &body)?)?;
        info!(id = node.id, label = %node.label, "created node");
        Ok(node)
    }

    fn create_relationship(&self, request: &NewRelationship) -> ProviderResult<GraphEdge> {
        request.validate()?;
        let body = json!({
            "source": request.source_id,
            "target": request.target_id,
            "type": request.kind,
            "properties": request.properties.to_json_map(),
        });
        let edge = created_relationship(&self.post("relationship", &body)?)?;
        info!(id = edge.id, kind = %edge.kind, "created relationship");
        Ok(edge)
    }

    fn seed(&self) -> ProviderResult<()> {
        self.post("seed", &json!({}))?;
        info!(base_url = %self.base_url, "seeded remote graph");
        Ok(())
    }

    fn describe(&self) -> String {
        self.base_url.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_ignore_trailing_slashes() {
        let provider =
            HttpProvider::new("http://localhost:3000/", Duration::from_secs(1)).expect("client");
        assert_eq!(provider.endpoint("graph"), "http://localhost:3000/api/graph");
        assert_eq!(provider.describe(), "http://localhost:3000");
    }

    #[test]
    fn error_bodies_surface_their_message() {
        assert_eq!(
            error_message(r#"{"error": "Name and label are required"}"#),
            "Name and label are required"
        );
        assert_eq!(error_message("Bad Gateway"), "Bad Gateway");
        assert_eq!(error_message(""), "<no body>");
    }

    #[test]
    fn created_records_accept_the_driver_shape() {
        let response = json!({
            "success": true,
            "node": {
                "identity": {"low": 311, "high": 0},
                "labels": ["Tecnologia"],
                "properties": {"name": "Edge Computing", "status": "Piloto"}
            }
        });
        let node = created_node(&response).expect("node");
        assert_eq!(node.id, 311);
        assert_eq!(node.label, "Tecnologia");

        let response = json!({
            "success": true,
            "relationship": {
                "identity": {"low": 900, "high": 0},
                "start": {"low": 311, "high": 0},
                "end": 12,
                "type": "HABILITA",
                "properties": {}
            }
        });
        let edge = created_relationship(&response).expect("relationship");
        assert_eq!((edge.id, edge.source_id, edge.target_id), (900, 311, 12));
        assert_eq!(edge.kind, "HABILITA");
    }

    #[test]
    fn missing_record_is_a_decode_error() {
        assert!(matches!(
            created_node(&json!({"success": true})),
            Err(ProviderError::Decode(_))
        ));
    }

    #[test]
    fn invalid_requests_never_reach_the_network() {
        let provider =
            HttpProvider::new("http://127.0.0.1:9", Duration::from_millis(50)).expect("client");
        let result = provider.create_node(&NewNode::default());
        assert!(matches!(result, Err(ProviderError::InvalidRequest(_))));
    }
}
