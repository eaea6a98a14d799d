//! Territory zoning: Voronoi partition of land via Lloyd relaxation.

use crate::config::GenerationParams;
use crate::grid::{Terrain, WorldGrid, ZoneId};
use crate::rng::SeededRng;

/// Number of zones for a given amount of land.
///
/// Targets `cells_per_zone` land cells per zone, clamped to
/// `[2, min(max_zones, land / min_cells_per_zone)]`. Land too small for two
/// zones gets one; no land gets none.
#[must_use]
pub fn zone_count_for(land_cells: usize, params: &GenerationParams) -> usize {
    if land_cells == 0 {
        return 0;
    }
    let per_zone_floor = params.min_cells_per_zone.max(1) as usize;
    let upper = (params.max_zones as usize).min(land_cells / per_zone_floor);
    if upper < 2 {
        return 1;
    }
    let target = (land_cells as f64 / f64::from(params.cells_per_zone.max(1))).round() as usize;
    target.clamp(2, upper)
}

/// Partition land into zones and draw the player's zone.
///
/// With no land the partition is empty and there is no player zone.
pub fn assign_zones(grid: &mut WorldGrid, params: &GenerationParams, rng: &mut SeededRng) {
    let land: Vec<(u32, u32)> = (0..grid.cell_count())
        .filter(|&i| grid.terrain_cells()[i] != Terrain::Ocean)
        .map(|i| grid.index_to_coords(i))
        .collect();

    let count = zone_count_for(land.len(), params);
    if count == 0 {
        tracing::debug!("No land; partition is empty");
        grid.set_partition(vec![None; grid.cell_count()], 0, None);
        return;
    }

    let mut centroids = seed_centroids(&land, count, rng);
    for _ in 0..params.lloyd_iterations {
        let owners = nearest(&land, &centroids);
        relax(&land, &owners, &mut centroids);
    }
    let owners = nearest(&land, &centroids);

    let mut zones = vec![None; grid.cell_count()];
    let mut sizes = vec![0usize; centroids.len()];
    let width = grid.width() as usize;
    for (&(x, y), &owner) in land.iter().zip(&owners) {
        zones[y as usize * width + x as usize] = Some(owner as ZoneId);
        sizes[owner] += 1;
    }

    let non_empty: Vec<ZoneId> = sizes
        .iter()
        .enumerate()
        .filter(|(_, &n)| n > 0)
        .map(|(z, _)| z as ZoneId)
        .collect();
    let player = non_empty[rng.index(non_empty.len())];

    tracing::debug!(zones = centroids.len(), ?sizes, player, "Zones assigned");
    grid.set_partition(zones, centroids.len() as u32, Some(player));
}

/// Farthest-point sampling: a random first seed, then repeatedly the land
/// cell farthest from every seed chosen so far.
fn seed_centroids(land: &[(u32, u32)], count: usize, rng: &mut SeededRng) -> Vec<(f64, f64)> {
    let first = land[rng.index(land.len())];
    let mut centroids = vec![(f64::from(first.0), f64::from(first.1))];

    let mut nearest_sq: Vec<f64> = land
        .iter()
        .map(|&c| dist_sq(c, centroids[0]))
        .collect();

    while centroids.len() < count {
        let mut best_index = 0;
        let mut best_d = -1.0;
        for (i, &d) in nearest_sq.iter().enumerate() {
            if d > best_d {
                best_d = d;
                best_index = i;
            }
        }
        if best_d <= 0.0 {
            break;
        }
        let (x, y) = land[best_index];
        let seed = (f64::from(x), f64::from(y));
        centroids.push(seed);
        for (d, &c) in nearest_sq.iter_mut().zip(land) {
            *d = d.min(dist_sq(c, seed));
        }
    }
    centroids
}

/// Index of the nearest centroid for each land cell (lowest index on ties).
fn nearest(land: &[(u32, u32)], centroids: &[(f64, f64)]) -> Vec<usize> {
    land.iter()
        .map(|&c| {
            let mut best = 0;
            let mut best_d = f64::INFINITY;
            for (i, &centroid) in centroids.iter().enumerate() {
                let d = dist_sq(c, centroid);
                if d < best_d {
                    best_d = d;
                    best = i;
                }
            }
            best
        })
        .collect()
}

/// Move each centroid to the mean of its cells. Empty zones keep theirs.
fn relax(land: &[(u32, u32)], owners: &[usize], centroids: &mut [(f64, f64)]) {
    let mut sums = vec![(0.0, 0.0, 0usize); centroids.len()];
    for (&(x, y), &owner) in land.iter().zip(owners) {
        let s = &mut sums[owner];
        s.0 += f64::from(x);
        s.1 += f64::from(y);
        s.2 += 1;
    }
    for (centroid, (sx, sy, n)) in centroids.iter_mut().zip(sums) {
        if n > 0 {
            *centroid = (sx / n as f64, sy / n as f64);
        }
    }
}

fn dist_sq(cell: (u32, u32), centroid: (f64, f64)) -> f64 {
    let dx = f64::from(cell.0) - centroid.0;
    let dy = f64::from(cell.1) - centroid.1;
    dx * dx + dy * dy
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_count_for() {
        let params = GenerationParams::default();
        assert_eq!(zone_count_for(0, &params), 0);
        assert_eq!(zone_count_for(30, &params), 1);
        assert_eq!(zone_count_for(60, &params), 2);
        // 600 / 70 = 8.57 -> 9, upper min(12, 24)
        assert_eq!(zone_count_for(600, &params), 9);
        // 110 / 70 = 1.57 -> 2
        assert_eq!(zone_count_for(110, &params), 2);
        assert_eq!(zone_count_for(5000, &params), 12);
    }

    #[test]
    fn test_all_ocean_has_no_zones() {
        let mut grid = WorldGrid::new(6, 6);
        for y in 0..6 {
            for x in 0..6 {
                grid.set_tile(x, y, Terrain::Ocean);
            }
        }
        assign_zones(&mut grid, &GenerationParams::default(), &mut SeededRng::new(1));
        assert_eq!(grid.zone_count(), 0);
        assert_eq!(grid.player_zone(), None);
        assert!(grid.zone_cells().iter().all(Option::is_none));
    }

    #[test]
    fn test_every_land_cell_zoned() {
        let mut grid = WorldGrid::new(30, 20);
        for y in 0..20 {
            grid.set_tile(0, y, Terrain::Ocean);
        }
        assign_zones(&mut grid, &GenerationParams::default(), &mut SeededRng::new(42));

        assert_eq!(grid.zone_count(), 8); // 580 / 70 = 8.29
        for y in 0..20 {
            for x in 0..30 {
                let zone = grid.zone(x, y);
                if x == 0 {
                    assert_eq!(zone, None);
                } else {
                    assert!(zone.is_some_and(|z| z < 8));
                }
            }
        }
        assert!(grid.player_zone().is_some());
    }

    #[test]
    fn test_farthest_point_seeds_are_spread() {
        let land: Vec<(u32, u32)> = (0..10).flat_map(|y| (0..10).map(move |x| (x, y))).collect();
        let seeds = seed_centroids(&land, 2, &mut SeededRng::new(4));
        assert_eq!(seeds.len(), 2);
        // Every cell of a 10x10 square has a cell at least 5 + 5 away.
        let d = (seeds[0].0 - seeds[1].0).powi(2) + (seeds[0].1 - seeds[1].1).powi(2);
        assert!(d >= 50.0, "seeds too close: {seeds:?}");
    }

    #[test]
    fn test_relax_moves_to_mean() {
        let land = [(0, 0), (2, 0), (10, 10)];
        let owners = [0, 0, 1];
        let mut centroids = vec![(5.0, 5.0), (0.0, 0.0)];
        relax(&land, &owners, &mut centroids);
        assert_eq!(centroids, vec![(1.0, 0.0), (10.0, 10.0)]);
    }

    #[test]
    fn test_zoning_determinism() {
        let params = GenerationParams::default();
        let mut a = WorldGrid::new(25, 25);
        let mut b = WorldGrid::new(25, 25);
        assign_zones(&mut a, &params, &mut SeededRng::new(77));
        assign_zones(&mut b, &params, &mut SeededRng::new(77));
        assert_eq!(a, b);
    }
}
