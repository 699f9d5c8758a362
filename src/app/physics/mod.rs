mod forces;
mod quadtree;

use eframe::egui::{Vec2, vec2};
use tracing::{debug, warn};

use super::RenderGraph;
use forces::{ChargeParams, LinkParams, accumulate_charge, accumulate_collisions, link_correction};
use quadtree::Cell;

const BARNES_HUT_THETA: f32 = 0.9;
const CHARGE_STRENGTH: f32 = -300.0;
const CHARGE_MIN_DISTANCE_SQ: f32 = 1.0;
const LINK_DISTANCE: f32 = 120.0;
const LINK_STRENGTH: f32 = 0.5;
const CENTER_STRENGTH: f32 = 0.05;
const COLLISION_PADDING: f32 = 25.0;
const VELOCITY_DECAY: f32 = 0.4;

const ALPHA_START: f32 = 0.6;
const ALPHA_DECAY: f32 = 0.015;
const ALPHA_MIN: f32 = 0.001;
const DRAG_ALPHA_TARGET: f32 = 0.3;

const SPIRAL_ANGLE_STEP: f32 = 2.4;
const SPIRAL_EXTENT: f32 = 0.2;

/// Simulation temperature. Decays geometrically toward `target`; the layout
/// is settled once both are below the threshold.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) struct LayoutEnergy {
    alpha: f32,
    target: f32,
}

impl Default for LayoutEnergy {
    fn default() -> Self {
        Self {
            alpha: ALPHA_START,
            target: 0.0,
        }
    }
}

impl LayoutEnergy {
    /// New structure to lay out.
    pub(in crate::app) fn reheat(&mut self) {
        debug!(alpha = ALPHA_START, "layout reheated");
        self.alpha = ALPHA_START;
    }

    pub(in crate::app) fn begin_drag(&mut self) {
        self.target = DRAG_ALPHA_TARGET;
    }

    pub(in crate::app) fn end_drag(&mut self) {
        self.target = 0.0;
    }

    pub(in crate::app) fn alpha(&self) -> f32 {
        self.alpha
    }

    pub(in crate::app) fn is_settled(&self) -> bool {
        self.alpha < ALPHA_MIN && self.target < ALPHA_MIN
    }

    fn advance(&mut self) {
        self.alpha += (self.target - self.alpha) * ALPHA_DECAY;
    }
}

/// Initial world position for the `index`-th of `count` unseen nodes: a
/// golden-angle spiral scaled to the viewport, centered on the origin.
pub(in crate::app) fn spiral_position(index: usize, count: usize, viewport: Vec2) -> Vec2 {
    let angle = index as f32 * SPIRAL_ANGLE_STEP;
    let fraction = if count == 0 {
        0.0
    } else {
        (index as f32 / count as f32).sqrt()
    };
    let radius = viewport.x.min(viewport.y) * SPIRAL_EXTENT * fraction;
    vec2(angle.cos(), angle.sin()) * radius
}

/// Advances the simulation by one tick. Returns false once it has settled.
pub(in crate::app) fn step_layout(cache: &mut RenderGraph, energy: &mut LayoutEnergy) -> bool {
    if energy.is_settled() {
        return false;
    }
    energy.advance();
    let alpha = energy.alpha();

    let node_count = cache.nodes.len();
    if node_count == 0 {
        return !energy.is_settled();
    }

    let scratch = &mut cache.physics_scratch;
    scratch.degrees.clear();
    scratch.degrees.resize(node_count, 0);
    for edge in &cache.edges {
        scratch.degrees[edge.from] += 1;
        scratch.degrees[edge.to] += 1;
    }

    let link = LinkParams {
        distance: LINK_DISTANCE,
        strength: LINK_STRENGTH * alpha,
    };
    for edge in &cache.edges {
        if edge.from == edge.to {
            continue;
        }
        let source = &cache.nodes[edge.from];
        let target = &cache.nodes[edge.to];
        let (source_shift, target_shift) = link_correction(
            (source.world_pos + source.velocity, scratch.degrees[edge.from]),
            (target.world_pos + target.velocity, scratch.degrees[edge.to]),
            link,
        );
        cache.nodes[edge.from].velocity += source_shift;
        cache.nodes[edge.to].velocity += target_shift;
    }

    scratch.positions.clear();
    scratch
        .positions
        .extend(cache.nodes.iter().map(|node| node.world_pos));
    scratch.radii.clear();
    scratch
        .radii
        .extend(cache.nodes.iter().map(|node| node.radius + COLLISION_PADDING));

    let charge = ChargeParams {
        strength: CHARGE_STRENGTH * alpha,
        theta: BARNES_HUT_THETA,
        min_distance_sq: CHARGE_MIN_DISTANCE_SQ,
    };
    if let Some(tree) = Cell::build(&scratch.positions, &scratch.radii) {
        for (index, node) in cache.nodes.iter_mut().enumerate() {
            let mut delta = Vec2::ZERO;
            accumulate_charge(&tree, index, &scratch.positions, charge, &mut delta);
            node.velocity += delta;
        }
    }

    let centroid = cache
        .nodes
        .iter()
        .fold(Vec2::ZERO, |sum, node| sum + node.world_pos)
        / node_count as f32;
    if centroid.is_finite() {
        let shift = centroid * CENTER_STRENGTH;
        for node in &mut cache.nodes {
            node.world_pos -= shift;
        }
    }

    scratch.positions.clear();
    scratch
        .positions
        .extend(cache.nodes.iter().map(|node| node.world_pos + node.velocity));
    scratch.delta_velocities.clear();
    scratch.delta_velocities.resize(node_count, Vec2::ZERO);
    if let Some(tree) = Cell::build(&scratch.positions, &scratch.radii) {
        accumulate_collisions(
            &tree,
            &tree,
            true,
            &scratch.positions,
            &scratch.radii,
            &mut scratch.delta_velocities,
        );
    }

    for (node, delta) in cache.nodes.iter_mut().zip(&scratch.delta_velocities) {
        if let Some(pin) = node.pinned {
            node.world_pos = pin;
            node.velocity = Vec2::ZERO;
        } else {
            node.velocity = (node.velocity + *delta) * (1.0 - VELOCITY_DECAY);
            node.world_pos += node.velocity;
        }

        if node.world_pos.is_finite() {
            node.last_valid_pos = node.world_pos;
        } else {
            warn!(node = node.id, "non-finite layout position; restoring last valid one");
            node.world_pos = if node.last_valid_pos.is_finite() {
                node.last_valid_pos
            } else {
                Vec2::ZERO
            };
            node.velocity = Vec2::ZERO;
        }
    }

    if energy.is_settled() {
        debug!("layout settled");
        return false;
    }
    true
}
