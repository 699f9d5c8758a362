use eframe::egui::{Vec2, vec2};

use super::quadtree::Cell;

/// Deterministic unit vector for coincident points.
fn jiggle(from: usize, to: usize) -> Vec2 {
    let angle = ((from as f32) * 0.618_034 + (to as f32) * 0.414_214) * std::f32::consts::TAU;
    vec2(angle.cos(), angle.sin()) * 1.0e-3
}

#[derive(Clone, Copy)]
pub(super) struct ChargeParams {
    /// Negative repels. Already scaled by alpha.
    pub(super) strength: f32,
    pub(super) theta: f32,
    pub(super) min_distance_sq: f32,
}

/// Velocity change on `index` from every other point, inverse to distance.
pub(super) fn accumulate_charge(
    cell: &Cell,
    index: usize,
    positions: &[Vec2],
    params: ChargeParams,
    delta_velocity: &mut Vec2,
) {
    if cell.mass <= 0.0 {
        return;
    }

    let point = positions[index];
    if cell.is_leaf() {
        for &other in &cell.indices {
            if other != index {
                *delta_velocity +=
                    pairwise_charge(point, positions[other], 1.0, params, index, other);
            }
        }
        return;
    }

    let distance = (cell.center_of_mass - point).length().max(1.0e-4);
    if !cell.bounds.contains(point) && cell.bounds.width() / distance < params.theta {
        *delta_velocity +=
            pairwise_charge(point, cell.center_of_mass, cell.mass, params, index, usize::MAX);
        return;
    }

    for child in cell.children() {
        accumulate_charge(child, index, positions, params, delta_velocity);
    }
}

fn pairwise_charge(
    point: Vec2,
    source: Vec2,
    mass: f32,
    params: ChargeParams,
    index: usize,
    other: usize,
) -> Vec2 {
    let mut delta = source - point;
    let mut distance_sq = delta.length_sq();
    if distance_sq < 1.0e-12 {
        delta = jiggle(index, other);
        distance_sq = delta.length_sq();
    }
    if distance_sq < params.min_distance_sq {
        distance_sq = (params.min_distance_sq * distance_sq).sqrt();
    }
    delta * (params.strength * mass / distance_sq)
}

/// Pushes apart every pair of circles that overlap. `predicted` are the
/// positions after the current velocities; `radii` are collision radii.
pub(super) fn accumulate_collisions(
    cell_a: &Cell,
    cell_b: &Cell,
    same_cell: bool,
    predicted: &[Vec2],
    radii: &[f32],
    delta_velocities: &mut [Vec2],
) {
    let reach = cell_a.max_radius + cell_b.max_radius;
    if cell_a.bounds.gap_sq(cell_b.bounds) > reach * reach {
        return;
    }

    if cell_a.is_leaf() && cell_b.is_leaf() {
        for (position, &from) in cell_a.indices.iter().enumerate() {
            let others = if same_cell {
                &cell_a.indices[position + 1..]
            } else {
                &cell_b.indices[..]
            };
            for &to in others {
                collide_pair(from, to, predicted, radii, delta_velocities);
            }
        }
        return;
    }

    if same_cell {
        let children = cell_a.children().collect::<Vec<_>>();
        for (position, child) in children.iter().enumerate() {
            accumulate_collisions(child, child, true, predicted, radii, delta_velocities);
            for other in &children[position + 1..] {
                accumulate_collisions(child, other, false, predicted, radii, delta_velocities);
            }
        }
        return;
    }

    let split_a = !cell_a.is_leaf()
        && (cell_b.is_leaf() || cell_a.bounds.half_extent >= cell_b.bounds.half_extent);
    if split_a {
        for child in cell_a.children() {
            accumulate_collisions(child, cell_b, false, predicted, radii, delta_velocities);
        }
    } else {
        for child in cell_b.children() {
            accumulate_collisions(cell_a, child, false, predicted, radii, delta_velocities);
        }
    }
}

fn collide_pair(
    from: usize,
    to: usize,
    predicted: &[Vec2],
    radii: &[f32],
    delta_velocities: &mut [Vec2],
) {
    let min_distance = radii[from] + radii[to];
    let mut delta = predicted[from] - predicted[to];
    let mut distance_sq = delta.length_sq();
    if distance_sq >= min_distance * min_distance {
        return;
    }
    if distance_sq < 1.0e-12 {
        delta = jiggle(from, to);
        distance_sq = delta.length_sq();
    }

    let distance = distance_sq.sqrt();
    let push = delta * ((min_distance - distance) / distance);
    let from_sq = radii[from] * radii[from];
    let to_sq = radii[to] * radii[to];
    let share = to_sq / (from_sq + to_sq);
    delta_velocities[from] += push * share;
    delta_velocities[to] -= push * (1.0 - share);
}

#[derive(Clone, Copy)]
pub(super) struct LinkParams {
    pub(super) distance: f32,
    /// Already scaled by alpha.
    pub(super) strength: f32,
}

/// Spring between two linked points, split by endpoint degree so that hubs
/// move less than leaves.
pub(super) fn link_correction(
    source: (Vec2, usize),
    target: (Vec2, usize),
    params: LinkParams,
) -> (Vec2, Vec2) {
    let (source_point, source_degree) = source;
    let (target_point, target_degree) = target;
    let mut delta = target_point - source_point;
    if delta.length_sq() < 1.0e-12 {
        delta = jiggle(source_degree, target_degree);
    }

    let length = delta.length();
    let correction = delta * ((length - params.distance) / length * params.strength);
    let total = (source_degree + target_degree).max(1) as f32;
    let bias = source_degree as f32 / total;
    (correction * (1.0 - bias), -correction * bias)
}
