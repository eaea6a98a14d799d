//! River carving.
//!
//! Each river starts from one of three anchor categories (coastline, an
//! existing river, or the largest rock cluster) and heads for the farthest
//! cell of a different category. The path is a greedy walk over the
//! 8-neighborhood scored by jittered progress minus terrain and turning
//! penalties, painting a 1-3 cell wide cross-section at every step.

use crate::config::GenerationParams;
use crate::grid::{Terrain, WorldGrid, NEIGHBORS_8};
use crate::rng::SeededRng;

/// Squared distance at which a river counts as having reached its target.
const ARRIVAL_DISTANCE_SQ: i64 = 2;

/// Where a river starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiverSource {
    /// A land cell touching the ocean.
    Coast,
    /// A cell of an existing river.
    River,
    /// The center of the largest rock cluster.
    Rocks,
}

/// Category of cells a river may head for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiverTarget {
    /// Land that neither touches the ocean nor is river.
    Inland,
    /// The rock-cluster anchor cell.
    RockAnchor,
    /// A land cell touching the ocean.
    Coastline,
    /// An existing river cell.
    River,
}

impl RiverSource {
    /// Target categories in priority order; the first non-empty one wins.
    #[must_use]
    pub const fn target_priority(self) -> &'static [RiverTarget] {
        match self {
            RiverSource::Coast => &[RiverTarget::Inland, RiverTarget::RockAnchor],
            RiverSource::Rocks => &[
                RiverTarget::Coastline,
                RiverTarget::River,
                RiverTarget::Inland,
            ],
            RiverSource::River => &[
                RiverTarget::Coastline,
                RiverTarget::RockAnchor,
                RiverTarget::Inland,
            ],
        }
    }
}

/// Cell categories recomputed before each river.
struct Landmarks {
    coastline: Vec<(u32, u32)>,
    river: Vec<(u32, u32)>,
    inland: Vec<(u32, u32)>,
    rock_anchor: Option<(u32, u32)>,
}

impl Landmarks {
    fn survey(grid: &WorldGrid, rock_cluster_min: usize) -> Self {
        let mut coastline = Vec::new();
        let mut river = Vec::new();
        let mut inland = Vec::new();

        for y in 0..grid.height() {
            for x in 0..grid.width() {
                match grid.terrain(x, y) {
                    Some(Terrain::Ocean) | None => {}
                    Some(Terrain::River) => river.push((x, y)),
                    Some(_) => {
                        let touches_ocean = grid
                            .neighbors8(x, y)
                            .any(|(nx, ny)| grid.terrain(nx, ny) == Some(Terrain::Ocean));
                        if touches_ocean {
                            coastline.push((x, y));
                        } else {
                            inland.push((x, y));
                        }
                    }
                }
            }
        }

        Self {
            coastline,
            river,
            inland,
            rock_anchor: largest_rock_cluster_anchor(grid, rock_cluster_min),
        }
    }

    fn available_sources(&self) -> Vec<RiverSource> {
        let mut sources = Vec::with_capacity(3);
        if !self.coastline.is_empty() {
            sources.push(RiverSource::Coast);
        }
        if !self.river.is_empty() {
            sources.push(RiverSource::River);
        }
        if self.rock_anchor.is_some() {
            sources.push(RiverSource::Rocks);
        }
        sources
    }

    fn cells(&self, target: RiverTarget) -> Vec<(u32, u32)> {
        match target {
            RiverTarget::Inland => self.inland.clone(),
            RiverTarget::Coastline => self.coastline.clone(),
            RiverTarget::River => self.river.clone(),
            RiverTarget::RockAnchor => self.rock_anchor.into_iter().collect(),
        }
    }
}

/// Carve up to `max_rivers` rivers. Returns how many were carved.
pub fn carve_rivers(grid: &mut WorldGrid, params: &GenerationParams, rng: &mut SeededRng) -> u32 {
    let count = rng.range_i64(0, i64::from(params.max_rivers)).max(0) as u32;
    let mut carved = 0;

    for _ in 0..count {
        let landmarks = Landmarks::survey(grid, params.rock_cluster_min);
        let sources = landmarks.available_sources();
        if sources.is_empty() {
            continue;
        }

        let source = sources[rng.index(sources.len())];
        let start = match source {
            RiverSource::Coast => landmarks.coastline[rng.index(landmarks.coastline.len())],
            RiverSource::River => landmarks.river[rng.index(landmarks.river.len())],
            RiverSource::Rocks => match landmarks.rock_anchor {
                Some(anchor) => anchor,
                None => continue,
            },
        };

        let Some(target) = source
            .target_priority()
            .iter()
            .map(|&t| landmarks.cells(t))
            .find(|cells| !cells.is_empty())
            .and_then(|cells| farthest_from(start, &cells))
        else {
            continue;
        };

        tracing::debug!(?source, ?start, ?target, "Carving river");
        carve_path(grid, start, target, params, rng);
        carved += 1;
    }
    carved
}

/// The candidate with the largest squared distance from `from`; the
/// first in row-major order wins ties.
fn farthest_from(from: (u32, u32), candidates: &[(u32, u32)]) -> Option<(u32, u32)> {
    let mut best: Option<((u32, u32), i64)> = None;
    for &cell in candidates {
        let d = dist_sq(from, cell);
        if best.map_or(true, |(_, bd)| d > bd) {
            best = Some((cell, d));
        }
    }
    best.map(|(cell, _)| cell)
}

fn dist_sq(a: (u32, u32), b: (u32, u32)) -> i64 {
    let dx = i64::from(a.0) - i64::from(b.0);
    let dy = i64::from(a.1) - i64::from(b.1);
    dx * dx + dy * dy
}

fn dist(a: (u32, u32), b: (u32, u32)) -> f64 {
    (dist_sq(a, b) as f64).sqrt()
}

/// The largest 8-connected rock cluster, if it meets `min_size`, reduced
/// to its cell nearest the cluster mean.
#[must_use]
pub fn largest_rock_cluster_anchor(grid: &WorldGrid, min_size: usize) -> Option<(u32, u32)> {
    let width = grid.width() as usize;
    let mut visited = vec![false; grid.cell_count()];
    let mut largest: Vec<(u32, u32)> = Vec::new();

    for (index, terrain) in grid.terrain_cells().iter().enumerate() {
        if *terrain != Terrain::Rocks || visited[index] {
            continue;
        }
        let mut cluster = Vec::new();
        let mut stack = vec![grid.index_to_coords(index)];
        visited[index] = true;
        while let Some((x, y)) = stack.pop() {
            cluster.push((x, y));
            for (nx, ny) in grid.neighbors8(x, y) {
                let n = ny as usize * width + nx as usize;
                if !visited[n] && grid.terrain_cells()[n] == Terrain::Rocks {
                    visited[n] = true;
                    stack.push((nx, ny));
                }
            }
        }
        if cluster.len() > largest.len() {
            largest = cluster;
        }
    }

    if largest.is_empty() || largest.len() < min_size {
        return None;
    }

    let n = largest.len() as f64;
    let mx = largest.iter().map(|c| f64::from(c.0)).sum::<f64>() / n;
    let my = largest.iter().map(|c| f64::from(c.1)).sum::<f64>() / n;
    largest.sort_unstable_by_key(|&(x, y)| (y, x));
    let mut best = largest[0];
    let mut best_d = f64::INFINITY;
    for &(x, y) in &largest {
        let d = (f64::from(x) - mx).powi(2) + (f64::from(y) - my).powi(2);
        if d < best_d {
            best_d = d;
            best = (x, y);
        }
    }
    Some(best)
}

/// Greedy walk from `start` toward `target`, painting river as it goes.
fn carve_path(
    grid: &mut WorldGrid,
    start: (u32, u32),
    target: (u32, u32),
    params: &GenerationParams,
    rng: &mut SeededRng,
) {
    let width = rng.range_i64(1, 3) as i32;
    let budget = 2 * (grid.width() + grid.height());

    let mut pos = start;
    let mut heading = initial_heading(start, target);
    let mut previous: Option<(i32, i32)> = None;

    for _ in 0..budget {
        paint_cross_section(grid, pos, heading, width);
        if dist_sq(pos, target) <= ARRIVAL_DISTANCE_SQ {
            break;
        }

        let here = dist(pos, target);
        let mut best: Option<(f64, (u32, u32), (i32, i32))> = None;
        for &(dx, dy) in &NEIGHBORS_8 {
            let Some(next) = grid.offset(pos.0, pos.1, dx, dy) else {
                continue;
            };
            let jitter = rng.next();
            let progress = here - dist(next, target);
            let mut score =
                jitter * params.river_jitter_weight + progress * params.river_progress_weight;
            match grid.terrain(next.0, next.1) {
                Some(Terrain::Ocean) => score -= params.river_ocean_penalty,
                Some(Terrain::River) => score -= params.river_river_penalty,
                _ => {}
            }
            if dx != 0 && dy != 0 {
                score -= params.river_diagonal_penalty;
            }
            if let Some((px, py)) = previous {
                if dx * px + dy * py < 0 {
                    score -= params.river_reversal_penalty;
                }
            }
            if best.map_or(true, |(s, _, _)| score > s) {
                best = Some((score, next, (dx, dy)));
            }
        }

        let Some((_, next, step)) = best else {
            break;
        };
        pos = next;
        heading = step;
        previous = Some(step);
        if grid.terrain(pos.0, pos.1) == Some(Terrain::Ocean) {
            break;
        }
    }
}

fn initial_heading(from: (u32, u32), to: (u32, u32)) -> (i32, i32) {
    let dx = (i64::from(to.0) - i64::from(from.0)).signum() as i32;
    let dy = (i64::from(to.1) - i64::from(from.1)).signum() as i32;
    if dx == 0 && dy == 0 {
        (1, 0)
    } else {
        (dx, dy)
    }
}

/// Paint river across the direction of travel, never over ocean.
fn paint_cross_section(grid: &mut WorldGrid, pos: (u32, u32), heading: (i32, i32), width: i32) {
    let (px, py) = (-heading.1, heading.0);
    let offsets: &[i32] = match width {
        1 => &[0],
        2 => &[0, 1],
        _ => &[-1, 0, 1],
    };
    for &k in offsets {
        let Some((x, y)) = grid.offset(pos.0, pos.1, px * k, py * k) else {
            continue;
        };
        if grid.terrain(x, y) != Some(Terrain::Ocean) {
            grid.set_tile(x, y, Terrain::River);
        }
    }
}
