//! Sparse hash grid for bounded neighbor queries

use ahash::AHashMap;

use crate::core::types::Vec2;

/// Sparse hash grid over particle storage indices
pub struct SparseHashGrid {
    cell_size: f32,
    cells: AHashMap<(i32, i32), Vec<usize>>,
}

impl SparseHashGrid {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: cell_size.max(f32::EPSILON),
            cells: AHashMap::new(),
        }
    }

    #[inline]
    fn cell_coord(&self, pos: Vec2) -> (i32, i32) {
        (
            (pos.x / self.cell_size).floor() as i32,
            (pos.y / self.cell_size).floor() as i32,
        )
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    pub fn insert(&mut self, index: usize, pos: Vec2) {
        let coord = self.cell_coord(pos);
        self.cells.entry(coord).or_default().push(index);
    }

    /// Indices strictly within `radius` of `center`, ascending
    ///
    /// Radii larger than the cell size widen the scanned block. Sorting keeps
    /// callers that accumulate floating point sums in index order bit-identical
    /// to a full scan.
    pub fn query_radius(&self, center: Vec2, radius: f32, positions: &[Vec2]) -> Vec<usize> {
        let reach = (radius / self.cell_size).ceil().max(1.0) as i32;
        let (cx, cy) = self.cell_coord(center);

        let mut found = Vec::new();
        for dx in -reach..=reach {
            for dy in -reach..=reach {
                if let Some(cell) = self.cells.get(&(cx + dx, cy + dy)) {
                    found.extend(
                        cell.iter()
                            .copied()
                            .filter(|&i| center.distance(positions[i]) < radius),
                    );
                }
            }
        }
        found.sort_unstable();
        found
    }

    /// Rebuild grid from positions
    pub fn rebuild(&mut self, entries: impl Iterator<Item = (usize, Vec2)>) {
        self.clear();
        for (index, pos) in entries {
            self.insert(index, pos);
        }
    }
}
