//! Data providers: where graph snapshots come from and where new nodes and
//! relationships are written.

mod file;
mod http;
mod memory;
mod seed;
mod wire;

use thiserror::Error;

use crate::graph::{GraphEdge, GraphNode, NodeId, Properties, PropertyValue};

pub use file::FileProvider;
pub use http::HttpProvider;
pub use memory::MemoryProvider;
pub use seed::sample_graph;
pub use wire::{RawGraph, RawNode, RawRelationship, parse_graph_payload};

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("provider answered {status}: {message}")]
    Status { status: u16, message: String },

    #[error("could not decode provider response: {0}")]
    Decode(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("node {0} does not exist")]
    MissingNode(NodeId),
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Handle the app holds for the lifetime of a session. Every call is
/// independent; implementations must not keep per-request state.
pub trait GraphProvider: Send + Sync {
    fn fetch_graph(&self) -> ProviderResult<RawGraph>;

    fn create_node(&self, request: &NewNode) -> ProviderResult<GraphNode>;

    fn create_relationship(&self, request: &NewRelationship) -> ProviderResult<GraphEdge>;

    /// Loads the sample dataset.
    fn seed(&self) -> ProviderResult<()>;

    /// Short human description shown in the top bar.
    fn describe(&self) -> String;
}

fn is_identifier(text: &str) -> bool {
    text.chars().all(|ch| ch.is_alphanumeric() || ch == '_')
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct NewNode {
    pub name: String,
    pub label: String,
    pub properties: Properties,
}

impl NewNode {
    pub fn validate(&self) -> ProviderResult<()> {
        if self.name.trim().is_empty() || self.label.trim().is_empty() {
            return Err(ProviderError::InvalidRequest(
                "Name and label are required".to_owned(),
            ));
        }
        if !is_identifier(&self.label) {
            return Err(ProviderError::InvalidRequest(format!(
                "label `{}` may only contain letters, digits and underscores",
                self.label
            )));
        }
        Ok(())
    }

    /// `name` first, then the extra entries in order.
    pub fn full_properties(&self) -> Properties {
        let mut properties: Properties = [(
            "name",
            PropertyValue::Text(self.name.trim().to_owned()),
        )]
        .into_iter()
        .collect();
        for (key, value) in self.properties.iter() {
            if key != "name" {
                properties.insert(key, value.clone());
            }
        }
        properties
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct NewRelationship {
    pub source_id: NodeId,
    pub target_id: NodeId,
    pub kind: String,
    pub properties: Properties,
}

impl NewRelationship {
    pub fn validate(&self) -> ProviderResult<()> {
        if self.kind.trim().is_empty() {
            return Err(ProviderError::InvalidRequest(
                "Source, target, and type are required".to_owned(),
            ));
        }
        if !is_identifier(&self.kind) {
            return Err(ProviderError::InvalidRequest(format!(
                "relationship type `{}` may only contain letters, digits and underscores",
                self.kind
            )));
        }
        Ok(())
    }
}
