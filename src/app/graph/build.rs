use std::collections::HashMap;

use eframe::egui::{Vec2, vec2};
use tracing::debug;

use crate::graph::VisibleSubgraph;

use super::super::physics::spiral_position;
use super::super::render_utils::node_radius;
use super::super::{PhysicsScratch, RenderEdge, RenderGraph, RenderNode, ViewModel, ViewScratch};

pub(in crate::app) const DEFAULT_CANVAS_SIZE: Vec2 = vec2(1200.0, 800.0);

/// Lays the subgraph out for drawing. Nodes already present in `prior` keep
/// their position and velocity; the rest start on the seeding spiral.
pub(in crate::app) fn build_render_graph(
    subgraph: &VisibleSubgraph,
    prior: Option<RenderGraph>,
    viewport: Vec2,
) -> RenderGraph {
    let counts = subgraph.connection_counts();
    let max_connections = counts.values().copied().max().unwrap_or(0);
    let total = subgraph.nodes().len();

    let (mut prior_nodes, physics_scratch, view_scratch) = match prior {
        Some(cache) => (
            cache
                .nodes
                .into_iter()
                .map(|node| (node.id, node))
                .collect::<HashMap<_, _>>(),
            cache.physics_scratch,
            cache.view_scratch,
        ),
        None => (
            HashMap::new(),
            PhysicsScratch::default(),
            ViewScratch::default(),
        ),
    };

    let mut nodes = Vec::with_capacity(total);
    let mut index_by_id = HashMap::with_capacity(total);
    let mut seeded = 0usize;
    for (index, node) in subgraph.nodes().iter().enumerate() {
        let connections = counts.get(&node.id).copied().unwrap_or(0);
        let radius = node_radius(connections, max_connections);

        let (world_pos, velocity) = match prior_nodes.remove(&node.id) {
            Some(kept) => (kept.world_pos, kept.velocity),
            None => {
                seeded += 1;
                (spiral_position(index, total, viewport), Vec2::ZERO)
            }
        };

        index_by_id.insert(node.id, index);
        nodes.push(RenderNode {
            id: node.id,
            name: node.display_name(),
            label: node.label.clone(),
            connections,
            radius,
            world_pos,
            velocity,
            last_valid_pos: world_pos,
            pinned: None,
        });
    }

    let edges = subgraph
        .edges()
        .iter()
        .filter_map(|edge| {
            Some(RenderEdge {
                id: edge.id,
                from: *index_by_id.get(&edge.source_id)?,
                to: *index_by_id.get(&edge.target_id)?,
                kind: edge.kind.clone(),
            })
        })
        .collect::<Vec<_>>();

    debug!(
        nodes = nodes.len(),
        edges = edges.len(),
        seeded,
        dropped = prior_nodes.len(),
        "built render graph"
    );

    RenderGraph {
        nodes,
        edges,
        index_by_id,
        physics_scratch,
        view_scratch,
    }
}

impl ViewModel {
    /// Picks up a newly applied subgraph. Dragging stops and the layout is
    /// reheated.
    pub(in crate::app) fn sync_render_graph(&mut self) {
        let revision = self.session.revision();
        if self.graph_cache.is_some() && self.render_graph_revision == revision {
            return;
        }

        let prior = self.graph_cache.take();
        self.graph_cache = Some(build_render_graph(
            self.session.subgraph(),
            prior,
            self.canvas_size,
        ));
        self.render_graph_revision = revision;
        self.dragging = None;
        self.energy.end_drag();
        self.energy.reheat();
        self.session.acknowledge_applied();
    }
}
