//! Greedy merge of one zoom level into the next coarser one.
//!
//! Features of the finer level are visited in level order. Each unvisited
//! feature seeds a neighbourhood query of radius `radius / (extent * 2^zoom)`
//! in projected space; the unvisited neighbours found there either merge
//! with the seed into a new aggregate or, when the combined point count is
//! below `min_points`, pass through unchanged alongside it.

use crate::compute::spatial::grid::PixelGrid;
use crate::config::{CentroidPolicy, ClusterOptions};

/// One entry of the coarser level, expressed against the finer level's slots.
#[derive(Debug, Clone, PartialEq)]
pub enum LevelItem {
    /// The finer feature at this slot is carried over as-is.
    Carry(u32),
    /// A new aggregate made of the listed finer slots (seed first).
    Merge {
        members: Vec<u32>,
        x: f64,
        y: f64,
        count: usize,
    },
}

/// Cluster the features of a finer level at `zoom`.
///
/// `positions[i]` and `counts[i]` describe slot `i` of the finer level.
/// Returns the coarser level in its final order.
pub fn cluster_level(
    positions: &[[f64; 2]],
    counts: &[usize],
    zoom: u8,
    options: &ClusterOptions,
) -> Vec<LevelItem> {
    debug_assert_eq!(positions.len(), counts.len());

    let radius = options.radius_at(zoom);
    let grid = PixelGrid::build(radius, positions);
    let mut visited = vec![false; positions.len()];
    let mut items = Vec::with_capacity(positions.len());

    for seed in 0..positions.len() {
        if visited[seed] {
            continue;
        }
        visited[seed] = true;

        let [x, y] = positions[seed];
        let neighbours: Vec<u32> = grid
            .within(positions, x, y, radius)
            .into_iter()
            .filter(|&slot| !visited[slot as usize])
            .collect();

        let seed_count = counts[seed];
        let total = seed_count
            + neighbours
                .iter()
                .map(|&slot| counts[slot as usize])
                .sum::<usize>();

        for &slot in &neighbours {
            visited[slot as usize] = true;
        }

        if !neighbours.is_empty() && total >= options.min_points {
            let (cx, cy) = match options.centroid {
                CentroidPolicy::Weighted => {
                    let mut wx = x * seed_count as f64;
                    let mut wy = y * seed_count as f64;
                    for &slot in &neighbours {
                        let weight = counts[slot as usize] as f64;
                        wx += positions[slot as usize][0] * weight;
                        wy += positions[slot as usize][1] * weight;
                    }
                    (wx / total as f64, wy / total as f64)
                }
                CentroidPolicy::FirstPoint => (x, y),
            };

            let mut members = Vec::with_capacity(neighbours.len() + 1);
            members.push(seed as u32);
            members.extend(neighbours);

            items.push(LevelItem::Merge {
                members,
                x: cx,
                y: cy,
                count: total,
            });
        } else {
            items.push(LevelItem::Carry(seed as u32));
            items.extend(neighbours.into_iter().map(LevelItem::Carry));
        }
    }

    items
}
