use std::cmp::Ordering;
use std::collections::BinaryHeap;

use tracing::debug;

use crate::geodesic::Geodesic;

/// Drop `amount` of water on every cell and route each drop downhill.
///
/// A drop at cell `c` moves to the neighbor with the lowest combined
/// surface `heights + waters` as long as that is strictly below `c`'s own,
/// crediting `flows` at every cell it passes. It settles where no neighbor
/// is lower. Routing is iterative: drainage chains on a fine mesh run
/// thousands of cells deep.
pub fn rain(
    amount: f64,
    waters: &mut [f64],
    heights: &[f64],
    flows: &mut [f64],
    sphere: &Geodesic,
) {
    for start in 0..waters.len() {
        let mut idx = start;
        loop {
            flows[idx] += amount;

            let mut flow_to = idx;
            let mut flow_to_surface = waters[idx] + heights[idx];
            for &n in sphere.neighbors(idx) {
                let surface = waters[n] + heights[n];
                if surface < flow_to_surface {
                    flow_to = n;
                    flow_to_surface = surface;
                }
            }

            if flow_to == idx {
                waters[idx] += amount;
                break;
            }
            idx = flow_to;
        }
    }
}

/// One cell's contribution to a lake while it is being collected.
#[derive(Debug, Clone)]
struct LakeCell {
    index: usize,
    /// The effective floor for this cell: its terrain height, or the
    /// highest saddle crossed to reach it, whichever is greater.
    height: f64,
    /// Water drawn out of the cell during collection.
    drawn: f64,
    /// Water assigned back after leveling.
    assigned: f64,
}

/// A connected body of water collected during equalization.
#[derive(Debug, Clone, Default)]
pub struct Lake {
    cells: Vec<LakeCell>,
    volume: f64,
}

impl Lake {
    fn add(&mut self, index: usize, height: f64, drawn: f64) {
        self.cells.push(LakeCell {
            index,
            height,
            drawn,
            assigned: 0.0,
        });
        self.volume += drawn;
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Distribute the collected volume so the water surface is level:
    /// find the surface W with Σ max(0, W − h) equal to the volume, filling
    /// cells from the bottom up. If the volume exceeds what the cells can
    /// hold below the highest floor, everything is submerged evenly.
    fn level(&mut self) {
        self.cells
            .sort_by(|a, b| a.height.total_cmp(&b.height));

        let mut filled = 0;
        let mut used = 0.0;
        let mut surface = 0.0;
        let mut floor_sum = 0.0;
        while filled < self.cells.len() {
            let h = self.cells[filled].height;
            floor_sum += h;
            let next_used = used + filled as f64 * (h - surface);
            if next_used > self.volume {
                surface += (self.volume - used) / filled as f64;
                break;
            }
            used = next_used;
            surface = h;
            filled += 1;
        }
        if filled == self.cells.len() {
            surface = (self.volume + floor_sum) / self.cells.len() as f64;
        }

        for (i, cell) in self.cells.iter_mut().enumerate() {
            cell.assigned = if i < filled {
                (surface - cell.height).max(0.0)
            } else {
                0.0
            };
        }
    }

    /// Hand every cell back exactly what was drawn from it. Used for lakes
    /// too small to be worth leveling, so water is still conserved.
    fn restore(&mut self) {
        for cell in &mut self.cells {
            cell.assigned = cell.drawn;
        }
    }
}

/// Candidate cell in the region-growing frontier, ordered by the lowest
/// ceiling first.
struct Frontier {
    ceiling: f64,
    seq: usize,
    index: usize,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap and we pop lowest ceilings.
        other
            .ceiling
            .total_cmp(&self.ceiling)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Flood-fill contiguous water bodies and level each one, respecting
/// overflow into neighboring basins.
///
/// Cells are seeded in order of increasing terrain height. From a seed,
/// the frontier grows through neighbors keyed by the "ceiling": the lowest
/// saddle crossed on the way in. Water above the ceiling is drawn into the
/// lake; after collection each lake is leveled and the water written back.
/// Lakes smaller than `min_lake_cells` are returned unleveled rather than
/// dropped, so total water is conserved either way.
pub fn equalize(waters: &mut [f64], heights: &[f64], sphere: &Geodesic, min_lake_cells: usize) {
    let mut order: Vec<usize> = (0..heights.len()).collect();
    order.sort_by(|&a, &b| heights[a].total_cmp(&heights[b]));

    let mut visited = vec![false; heights.len()];
    let mut lakes = Vec::new();

    for &seed in &order {
        if visited[seed] {
            continue;
        }
        lakes.push(collect_lake(seed, waters, heights, &mut visited, sphere));
    }

    let total_volume: f64 = lakes.iter().map(Lake::volume).sum();
    debug!(lakes = lakes.len(), total_volume, "equalizing water bodies");

    lakes.sort_by(|a, b| b.cell_count().cmp(&a.cell_count()));
    for lake in &mut lakes {
        if lake.cell_count() < min_lake_cells {
            lake.restore();
        } else {
            lake.level();
        }
        for cell in &lake.cells {
            waters[cell.index] += cell.assigned;
        }
    }
}

/// Ignore surfaces this close to the ceiling when growing a lake; they
/// cannot contribute meaningful water.
const OVERFLOW_EPSILON: f64 = 0.001;

fn collect_lake(
    seed: usize,
    waters: &mut [f64],
    heights: &[f64],
    visited: &mut [bool],
    sphere: &Geodesic,
) -> Lake {
    visited[seed] = true;

    let mut lake = Lake::default();
    let mut frontier = BinaryHeap::new();
    let mut seq = 0;
    let mut push = |frontier: &mut BinaryHeap<Frontier>, seq: &mut usize, index, ceiling| {
        frontier.push(Frontier {
            ceiling,
            seq: *seq,
            index,
        });
        *seq += 1;
    };

    let seed_height = heights[seed];
    push(&mut frontier, &mut seq, seed, seed_height);
    // Every neighbor of the seed is at least as high, so the seed's own
    // height is the ceiling into each of them.
    for &n in sphere.neighbors(seed) {
        push(&mut frontier, &mut seq, n, seed_height);
    }

    while let Some(Frontier { ceiling, index, .. }) = frontier.pop() {
        if index != seed && visited[index] {
            continue;
        }
        visited[index] = true;

        let height = heights[index];
        let drawn = (height + waters[index] - ceiling)
            .max(0.0)
            .min(waters[index]);
        waters[index] -= drawn;
        lake.add(index, height.max(ceiling), drawn);

        let next_ceiling = ceiling.max(height);
        for &n in sphere.neighbors(index) {
            if visited[n] {
                continue;
            }
            if heights[n] + waters[n] - next_ceiling < OVERFLOW_EPSILON {
                continue;
            }
            push(&mut frontier, &mut seq, n, next_ceiling);
        }
    }

    lake
}
