use eframe::egui::{Vec2, vec2};

const LEAF_CAPACITY: usize = 12;
const MAX_DEPTH: usize = 10;

#[derive(Clone, Copy, Debug)]
pub(super) struct CellBounds {
    pub(super) center: Vec2,
    pub(super) half_extent: f32,
}

impl CellBounds {
    /// Square cell enclosing every finite point; `None` when there is none.
    fn enclosing(points: &[Vec2]) -> Option<Self> {
        let mut min = vec2(f32::INFINITY, f32::INFINITY);
        let mut max = vec2(f32::NEG_INFINITY, f32::NEG_INFINITY);
        for point in points.iter().filter(|point| point.is_finite()) {
            min.x = min.x.min(point.x);
            min.y = min.y.min(point.y);
            max.x = max.x.max(point.x);
            max.y = max.y.max(point.y);
        }

        if !min.is_finite() || !max.is_finite() {
            return None;
        }

        let span = (max.x - min.x).max(max.y - min.y).max(1.0);
        Some(Self {
            center: (min + max) * 0.5,
            half_extent: (span * 0.5) + 1.0,
        })
    }

    pub(super) fn contains(self, point: Vec2) -> bool {
        (point.x - self.center.x).abs() <= self.half_extent
            && (point.y - self.center.y).abs() <= self.half_extent
    }

    fn quadrant(self, quadrant: usize) -> Self {
        let quarter = self.half_extent * 0.5;
        let offset = vec2(
            if quadrant & 1 == 0 { -quarter } else { quarter },
            if quadrant & 2 == 0 { -quarter } else { quarter },
        );
        Self {
            center: self.center + offset,
            half_extent: quarter,
        }
    }

    fn quadrant_of(self, point: Vec2) -> usize {
        usize::from(point.x >= self.center.x) | (usize::from(point.y >= self.center.y) << 1)
    }

    pub(super) fn width(self) -> f32 {
        self.half_extent * 2.0
    }

    /// Squared gap between two cells; zero when they overlap.
    pub(super) fn gap_sq(self, other: Self) -> f32 {
        let reach = self.half_extent + other.half_extent;
        let dx = ((self.center.x - other.center.x).abs() - reach).max(0.0);
        let dy = ((self.center.y - other.center.y).abs() - reach).max(0.0);
        (dx * dx) + (dy * dy)
    }
}

/// Barnes-Hut cell. Leaves hold point indices; inner cells only aggregates.
pub(super) struct Cell {
    pub(super) bounds: CellBounds,
    pub(super) center_of_mass: Vec2,
    pub(super) mass: f32,
    pub(super) max_radius: f32,
    pub(super) indices: Vec<usize>,
    pub(super) children: [Option<Box<Cell>>; 4],
}

impl Cell {
    /// Non-finite points are left out of the tree.
    pub(super) fn build(positions: &[Vec2], radii: &[f32]) -> Option<Self> {
        let bounds = CellBounds::enclosing(positions)?;
        let indices = (0..positions.len())
            .filter(|&index| positions[index].is_finite())
            .collect::<Vec<_>>();
        Some(Self::build_cell(bounds, indices, positions, radii, 0))
    }

    fn build_cell(
        bounds: CellBounds,
        indices: Vec<usize>,
        positions: &[Vec2],
        radii: &[f32],
        depth: usize,
    ) -> Self {
        let mut center_of_mass = Vec2::ZERO;
        let mut max_radius = 0.0_f32;
        for &index in &indices {
            center_of_mass += positions[index];
            max_radius = max_radius.max(radii.get(index).copied().unwrap_or(0.0));
        }
        let mass = indices.len() as f32;
        if mass > 0.0 {
            center_of_mass /= mass;
        }

        let mut cell = Self {
            bounds,
            center_of_mass,
            mass,
            max_radius,
            indices,
            children: std::array::from_fn(|_| None),
        };
        if depth >= MAX_DEPTH || cell.indices.len() <= LEAF_CAPACITY {
            return cell;
        }

        let mut buckets = std::array::from_fn::<_, 4, _>(|_| Vec::new());
        for &index in &cell.indices {
            buckets[bounds.quadrant_of(positions[index])].push(index);
        }
        if buckets.iter().filter(|bucket| !bucket.is_empty()).count() <= 1 {
            return cell;
        }

        for (quadrant, bucket) in buckets.into_iter().enumerate() {
            if !bucket.is_empty() {
                cell.children[quadrant] = Some(Box::new(Self::build_cell(
                    bounds.quadrant(quadrant),
                    bucket,
                    positions,
                    radii,
                    depth + 1,
                )));
            }
        }
        cell.indices.clear();
        cell
    }

    pub(super) fn is_leaf(&self) -> bool {
        self.children.iter().all(Option::is_none)
    }

    pub(super) fn children(&self) -> impl Iterator<Item = &Cell> {
        self.children.iter().filter_map(|child| child.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(count: usize) -> Vec<Vec2> {
        (0..count)
            .map(|index| vec2((index % 10) as f32 * 30.0, (index / 10) as f32 * 30.0))
            .collect()
    }

    fn leaf_indices(cell: &Cell, out: &mut Vec<usize>) {
        out.extend(&cell.indices);
        for child in cell.children() {
            leaf_indices(child, out);
        }
    }

    #[test]
    fn every_point_lands_in_exactly_one_leaf() {
        let positions = grid(80);
        let radii = vec![10.0; positions.len()];
        let root = Cell::build(&positions, &radii).expect("tree");
        assert!(!root.is_leaf());
        assert_eq!(root.mass, 80.0);

        let mut indices = Vec::new();
        leaf_indices(&root, &mut indices);
        indices.sort_unstable();
        assert_eq!(indices, (0..80).collect::<Vec<_>>());
    }

    #[test]
    fn non_finite_points_are_skipped() {
        let positions = vec![vec2(0.0, 0.0), vec2(f32::NAN, 1.0), vec2(5.0, 5.0)];
        let root = Cell::build(&positions, &[1.0, 9.0, 2.0]).expect("tree");
        assert_eq!(root.mass, 2.0);
        assert_eq!(root.max_radius, 2.0);
        assert!(Cell::build(&[vec2(f32::NAN, 0.0)], &[1.0]).is_none());
    }

    #[test]
    fn cell_gap_is_zero_for_touching_cells() {
        let a = CellBounds {
            center: vec2(0.0, 0.0),
            half_extent: 5.0,
        };
        let b = CellBounds {
            center: vec2(10.0, 0.0),
            half_extent: 5.0,
        };
        let c = CellBounds {
            center: vec2(20.0, 0.0),
            half_extent: 2.0,
        };
        assert_eq!(a.gap_sq(b), 0.0);
        assert_eq!(a.gap_sq(c), 169.0);
    }
}
