//! Beaches and riverbanks.

use crate::config::GenerationParams;
use crate::grid::{Terrain, WorldGrid};
use crate::rng::SeededRng;

/// Chebyshev radius of the "near water" band.
const NEAR_WATER_RADIUS: i32 = 2;

/// Turn plains near water into sand. Returns the number of cells converted.
///
/// Only plains cells adjacent to, or within two cells of, water draw from
/// the random source; everything else is skipped without a draw.
pub fn place_sand(grid: &mut WorldGrid, params: &GenerationParams, rng: &mut SeededRng) -> usize {
    let mut converted = 0;
    for y in 0..grid.height() {
        for x in 0..grid.width() {
            if grid.terrain(x, y) != Some(Terrain::Plains) {
                continue;
            }
            let Some(chance) = sand_chance(grid, x, y, params) else {
                continue;
            };
            if rng.random_chance(chance) {
                grid.set_tile(x, y, Terrain::Sand);
                converted += 1;
            }
        }
    }
    converted
}

fn sand_chance(grid: &WorldGrid, x: u32, y: u32, params: &GenerationParams) -> Option<f64> {
    let mut touches_ocean = false;
    let mut touches_river = false;
    for (nx, ny) in grid.neighbors8(x, y) {
        match grid.terrain(nx, ny) {
            Some(Terrain::Ocean) => touches_ocean = true,
            Some(Terrain::River) => touches_river = true,
            _ => {}
        }
    }

    if touches_ocean {
        Some(params.sand_ocean_chance)
    } else if touches_river {
        Some(params.sand_river_chance)
    } else if water_within(grid, x, y, NEAR_WATER_RADIUS) {
        Some(params.sand_near_chance)
    } else {
        None
    }
}

fn water_within(grid: &WorldGrid, x: u32, y: u32, radius: i32) -> bool {
    (-radius..=radius).any(|dy| {
        (-radius..=radius).any(|dx| {
            grid.offset(x, y, dx, dy)
                .and_then(|(nx, ny)| grid.terrain(nx, ny))
                .is_some_and(Terrain::is_water)
        })
    })
}
