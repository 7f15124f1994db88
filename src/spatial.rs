//! Uniform-grid spatial hash: the broad-phase partition used by bullet
//! collision, entity-entity push-out, enemy separation, and detection.
//!
//! Rebuilt once per tick from scratch (`rebuild`). Cells are contiguous
//! `Vec`s indexed by a row-major key, not a `HashMap`, so that iteration
//! order is a pure function of the rebuild's input order and carries no
//! incidental hash-bucket ordering.

use bevy_ecs::prelude::*;

#[derive(Debug, Clone, Copy)]
pub struct SpatialEntry {
    pub entity: Entity,
    pub x: f32,
    pub y: f32,
}

/// A grid cell's entries, in insertion order.
#[derive(Debug, Clone, Default)]
struct Cell {
    entries: Vec<SpatialEntry>,
}

#[derive(Resource, Debug)]
pub struct SpatialGrid {
    pub cell_size: f32,
    min_cell_x: i32,
    min_cell_y: i32,
    cols: i32,
    rows: i32,
    cells: Vec<Cell>,
}

impl SpatialGrid {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            min_cell_x: 0,
            min_cell_y: 0,
            cols: 0,
            rows: 0,
            cells: Vec::new(),
        }
    }

    #[inline]
    pub fn world_to_cell(&self, x: f32, y: f32) -> (i32, i32) {
        ((x / self.cell_size).floor() as i32, (y / self.cell_size).floor() as i32)
    }

    /// Clear and repopulate the grid from an ordered iterator of
    /// `(entity, x, y)`. The extent is sized to the bounding box of the
    /// input plus one cell of margin on every side, so `for_each_in_radius`
    /// queries never need bounds-checked cell lookups.
    pub fn rebuild<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (Entity, f32, f32)>,
    {
        let items: Vec<(Entity, f32, f32)> = entries.into_iter().collect();

        if items.is_empty() {
            self.cols = 0;
            self.rows = 0;
            self.cells.clear();
            return;
        }

        let mut min_cx = i32::MAX;
        let mut max_cx = i32::MIN;
        let mut min_cy = i32::MAX;
        let mut max_cy = i32::MIN;
        for (_, x, y) in &items {
            let (cx, cy) = self.world_to_cell(*x, *y);
            min_cx = min_cx.min(cx - 1);
            max_cx = max_cx.max(cx + 1);
            min_cy = min_cy.min(cy - 1);
            max_cy = max_cy.max(cy + 1);
        }

        self.min_cell_x = min_cx;
        self.min_cell_y = min_cy;
        self.cols = max_cx - min_cx + 1;
        self.rows = max_cy - min_cy + 1;

        let cell_count = (self.cols as usize) * (self.rows as usize);
        self.cells.clear();
        self.cells.resize_with(cell_count, Cell::default);

        for (entity, x, y) in items {
            let (cx, cy) = self.world_to_cell(x, y);
            let idx = self.cell_index(cx, cy);
            self.cells[idx].entries.push(SpatialEntry { entity, x, y });
        }
    }

    #[inline]
    fn cell_index(&self, cx: i32, cy: i32) -> usize {
        let col = (cx - self.min_cell_x) as usize;
        let row = (cy - self.min_cell_y) as usize;
        row * self.cols as usize + col
    }

    #[inline]
    fn cell_in_bounds(&self, cx: i32, cy: i32) -> bool {
        cx >= self.min_cell_x
            && cy >= self.min_cell_y
            && cx < self.min_cell_x + self.cols
            && cy < self.min_cell_y + self.rows
    }

    /// Visit every entity in cells intersecting the AABB around
    /// `(cx - r, cy - r)..(cx + r, cy + r)`, in `(cellY, cellX,
    /// insertion_order)` lexicographic order. The callback is responsible
    /// for its own distance filtering.
    pub fn for_each_in_radius<F>(&self, cx: f32, cy: f32, r: f32, mut cb: F)
    where
        F: FnMut(&SpatialEntry),
    {
        if self.cols == 0 || self.rows == 0 {
            return;
        }
        let (center_cx, center_cy) = self.world_to_cell(cx, cy);
        let span = (r / self.cell_size).ceil() as i32 + 1;

        for gy in (center_cy - span)..=(center_cy + span) {
            for gx in (center_cx - span)..=(center_cx + span) {
                if !self.cell_in_bounds(gx, gy) {
                    continue;
                }
                let idx = self.cell_index(gx, gy);
                for entry in &self.cells[idx].entries {
                    cb(entry);
                }
            }
        }
    }

    /// Collect every entity within radius `r` of `(cx, cy)`, filtering by
    /// exact distance, in the grid's deterministic visit order.
    pub fn query_radius(&self, cx: f32, cy: f32, r: f32) -> Vec<SpatialEntry> {
        let r2 = r * r;
        let mut out = Vec::new();
        self.for_each_in_radius(cx, cy, r, |e| {
            let dx = e.x - cx;
            let dy = e.y - cy;
            if dx * dx + dy * dy <= r2 {
                out.push(*e);
            }
        });
        out
    }

    pub fn total_count(&self) -> usize {
        self.cells.iter().map(|c| c.entries.len()).sum()
    }
}

impl Default for SpatialGrid {
    fn default() -> Self {
        Self::new(32.0)
    }
}

/// System that rebuilds the spatial grid each tick from every entity with
/// a `Collider`. Runs as step 12 of the normative tick order, after
/// movement has committed new positions.
pub fn spatial_hash_rebuild_system(
    mut grid: ResMut<SpatialGrid>,
    query: Query<(Entity, &crate::components::Position), With<crate::components::Collider>>,
) {
    grid.rebuild(query.iter().map(|(e, pos)| (e, pos.x, pos.y)));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ent(n: u32) -> Entity {
        Entity::from_raw(n)
    }

    #[test]
    fn rebuild_then_query_finds_nearby() {
        let mut grid = SpatialGrid::new(10.0);
        grid.rebuild(vec![(ent(1), 5.0, 5.0), (ent(2), 15.0, 5.0), (ent(3), 1000.0, 1000.0)]);

        let found = grid.query_radius(5.0, 5.0, 12.0);
        let ids: Vec<u32> = found.iter().map(|e| e.entity.index()).collect();
        assert!(ids.contains(&1));
        assert!(ids.contains(&2));
        assert!(!ids.contains(&3));
    }

    #[test]
    fn iteration_order_is_lexicographic_by_cell_then_insertion() {
        let mut grid = SpatialGrid::new(10.0);
        // Two entities in the same cell: insertion order preserved.
        grid.rebuild(vec![(ent(5), 1.0, 1.0), (ent(6), 2.0, 2.0), (ent(7), 1.0, 1.0)]);

        let mut seen = Vec::new();
        grid.for_each_in_radius(1.5, 1.5, 20.0, |e| seen.push(e.entity.index()));

        // entity 5 and 7 share a cell and were inserted in that order.
        let pos5 = seen.iter().position(|&i| i == 5).unwrap();
        let pos7 = seen.iter().position(|&i| i == 7).unwrap();
        assert!(pos5 < pos7);
    }

    #[test]
    fn iteration_order_is_stable_across_identical_rebuilds() {
        let input = vec![(ent(1), 3.0, 3.0), (ent(2), 30.0, 30.0), (ent(3), 3.0, 30.0)];

        let mut grid_a = SpatialGrid::new(8.0);
        grid_a.rebuild(input.clone());
        let mut seq_a = Vec::new();
        grid_a.for_each_in_radius(15.0, 15.0, 100.0, |e| seq_a.push(e.entity.index()));

        let mut grid_b = SpatialGrid::new(8.0);
        grid_b.rebuild(input);
        let mut seq_b = Vec::new();
        grid_b.for_each_in_radius(15.0, 15.0, 100.0, |e| seq_b.push(e.entity.index()));

        assert_eq!(seq_a, seq_b);
    }

    #[test]
    fn empty_rebuild_yields_no_results() {
        let mut grid = SpatialGrid::new(10.0);
        grid.rebuild(Vec::<(Entity, f32, f32)>::new());
        assert_eq!(grid.query_radius(0.0, 0.0, 1000.0).len(), 0);
        assert_eq!(grid.total_count(), 0);
    }
}
