use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tracing::{debug, info};

use crate::graph::{GraphEdge, GraphNode, normalize};

use super::memory::GraphStore;
use super::{
    GraphProvider, NewNode, NewRelationship, ProviderError, ProviderResult, RawGraph,
    parse_graph_payload, sample_graph,
};

/// Provider backed by a JSON document in the `{nodes, relationships}` wire
/// shape. Every call reads the file; writes go back pretty-printed.
#[derive(Debug)]
pub struct FileProvider {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file reads as an empty graph.
    fn read_raw(&self) -> ProviderResult<RawGraph> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => parse_graph_payload(&contents),
            Err(error) if error.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "graph file missing; starting empty");
                Ok(RawGraph {
                    nodes: Some(Vec::new()),
                    relationships: Some(Vec::new()),
                })
            }
            Err(error) => Err(error.into()),
        }
    }

    fn write_raw(&self, raw: &RawGraph) -> ProviderResult<()> {
        let contents = serde_json::to_string_pretty(raw)
            .map_err(|error| ProviderError::Decode(error.to_string()))?;
        fs::write(&self.path, contents + "\n")?;
        Ok(())
    }

    fn modify<T>(
        &self,
        change: impl FnOnce(&mut GraphStore) -> ProviderResult<T>,
    ) -> ProviderResult<T> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let graph = normalize(&self.read_raw()?);
        if graph.is_malformed() {
            return Err(ProviderError::Decode(format!(
                "{} is missing `nodes` or `relationships`; refusing to overwrite it",
                self.path.display()
            )));
        }
        let mut store = GraphStore::from_graph(&graph);
        let result = change(&mut store)?;
        self.write_raw(&store.to_raw())?;
        Ok(result)
    }
}

impl GraphProvider for FileProvider {
    fn fetch_graph(&self) -> ProviderResult<RawGraph> {
        self.read_raw()
    }

    fn create_node(&self, request: &NewNode) -> ProviderResult<GraphNode> {
        let node = self.modify(|store| store.insert_node(request))?;
        info!(id = node.id, path = %self.path.display(), "created node");
        Ok(node)
    }

    fn create_relationship(&self, request: &NewRelationship) -> ProviderResult<GraphEdge> {
        let edge = self.modify(|store| store.insert_relationship(request))?;
        info!(id = edge.id, path = %self.path.display(), "created relationship");
        Ok(edge)
    }

    /// Replaces the file wholesale, so it also recovers a malformed one.
    fn seed(&self) -> ProviderResult<()> {
        let sample = sample_graph()?;
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.write_raw(&sample.to_raw())
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}
