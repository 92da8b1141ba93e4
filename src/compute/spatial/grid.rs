//! Uniform hash grid over projected coordinates.
//!
//! Used while merging one zoom level: the cell side equals the merge radius,
//! so every candidate within the radius of a feature lives in the 3x3 block
//! of cells around it. Only occupied cells are stored.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

type Bucket = SmallVec<[u32; 8]>;

/// Grid of feature slots keyed by integer cell coordinates.
#[derive(Debug)]
pub struct PixelGrid {
    cell_size: f64,
    cells: FxHashMap<(i64, i64), Bucket>,
}

impl PixelGrid {
    /// Build a grid with `cell_size` over the given projected positions.
    /// Slot `i` refers to `positions[i]`.
    pub fn build(cell_size: f64, positions: &[[f64; 2]]) -> Self {
        let mut grid = Self {
            cell_size,
            cells: FxHashMap::default(),
        };
        for (slot, position) in positions.iter().enumerate() {
            let key = grid.cell_of(position[0], position[1]);
            grid.cells.entry(key).or_default().push(slot as u32);
        }
        grid
    }

    #[inline]
    fn cell_of(&self, x: f64, y: f64) -> (i64, i64) {
        (
            (x / self.cell_size).floor() as i64,
            (y / self.cell_size).floor() as i64,
        )
    }

    /// Slots whose position lies within `radius` of `(x, y)`, in ascending
    /// slot order. `radius` must not exceed the cell size.
    pub fn within(&self, positions: &[[f64; 2]], x: f64, y: f64, radius: f64) -> Vec<u32> {
        debug_assert!(radius <= self.cell_size);
        let (cx, cy) = self.cell_of(x, y);
        let r2 = radius * radius;
        let mut found = Vec::new();

        for gx in cx - 1..=cx + 1 {
            for gy in cy - 1..=cy + 1 {
                let Some(bucket) = self.cells.get(&(gx, gy)) else {
                    continue;
                };
                for &slot in bucket {
                    let [px, py] = positions[slot as usize];
                    let dx = px - x;
                    let dy = py - y;
                    if dx * dx + dy * dy <= r2 {
                        found.push(slot);
                    }
                }
            }
        }

        found.sort_unstable();
        found
    }
}
