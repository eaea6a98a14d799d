//! Clustered rocks and forest.
//!
//! Two independent smoothed noise fields are drawn over the whole grid.
//! Plains cells are ranked by field value and the top fractions converted,
//! which clusters each biome without explicit region growing.

use crate::config::GenerationParams;
use crate::grid::{Terrain, WorldGrid, NEIGHBORS_8};
use crate::rng::SeededRng;

/// Blur weight of the center cell.
const CENTER_WEIGHT: f64 = 4.0;
/// Blur weight of orthogonal neighbors.
const ORTHOGONAL_WEIGHT: f64 = 2.0;
/// Blur weight of diagonal neighbors.
const DIAGONAL_WEIGHT: f64 = 1.0;

/// Row-major field of smoothed noise values.
#[derive(Debug, Clone, PartialEq)]
pub struct NoiseField {
    width: u32,
    height: u32,
    values: Vec<f64>,
}

impl NoiseField {
    /// Draw one uniform value per cell, then blur `passes` times.
    pub fn generate(width: u32, height: u32, passes: u32, rng: &mut SeededRng) -> Self {
        let count = (width as usize) * (height as usize);
        let values = (0..count).map(|_| rng.next()).collect();
        let mut field = Self {
            width,
            height,
            values,
        };
        for _ in 0..passes {
            field.blur();
        }
        field
    }

    /// Value at a row-major index.
    #[must_use]
    pub fn at(&self, index: usize) -> f64 {
        self.values[index]
    }

    /// 3x3 weighted average, normalized over in-bounds weights so edges
    /// are not darkened.
    fn blur(&mut self) {
        let w = self.width as i64;
        let h = self.height as i64;
        let mut out = vec![0.0; self.values.len()];

        for y in 0..h {
            for x in 0..w {
                let mut sum = self.values[(y * w + x) as usize] * CENTER_WEIGHT;
                let mut weight = CENTER_WEIGHT;
                for &(dx, dy) in &NEIGHBORS_8 {
                    let nx = x + i64::from(dx);
                    let ny = y + i64::from(dy);
                    if nx < 0 || ny < 0 || nx >= w || ny >= h {
                        continue;
                    }
                    let k = if dx != 0 && dy != 0 {
                        DIAGONAL_WEIGHT
                    } else {
                        ORTHOGONAL_WEIGHT
                    };
                    sum += self.values[(ny * w + nx) as usize] * k;
                    weight += k;
                }
                out[(y * w + x) as usize] = sum / weight;
            }
        }
        self.values = out;
    }
}

/// Convert the top-ranked plains to rocks, then forest.
///
/// Returns `(rocks, forest)` converted.
pub fn place_biomes(
    grid: &mut WorldGrid,
    params: &GenerationParams,
    rng: &mut SeededRng,
) -> (usize, usize) {
    let rock_field = NoiseField::generate(grid.width(), grid.height(), params.blur_passes, rng);
    let forest_field = NoiseField::generate(grid.width(), grid.height(), params.blur_passes, rng);

    let plains = plains_indices(grid);
    let plains_total = plains.len() as f64;
    let rock_target = (plains_total * params.rock_fraction).round() as usize;
    let forest_target = (plains_total * params.forest_fraction).round() as usize;

    let ranked = rank(&plains, &rock_field, params.rank_jitter, rng);
    let rocks = convert_top(grid, &ranked, rock_target, Terrain::Rocks);

    let remaining = plains_indices(grid);
    let ranked = rank(&remaining, &forest_field, params.rank_jitter, rng);
    let forest = convert_top(grid, &ranked, forest_target, Terrain::Forest);

    (rocks, forest)
}

fn plains_indices(grid: &WorldGrid) -> Vec<usize> {
    grid.terrain_cells()
        .iter()
        .enumerate()
        .filter(|(_, t)| **t == Terrain::Plains)
        .map(|(i, _)| i)
        .collect()
}

/// Sort candidates by field value plus jitter, highest first. Equal scores
/// fall back to row-major order.
fn rank(candidates: &[usize], field: &NoiseField, jitter: f64, rng: &mut SeededRng) -> Vec<usize> {
    let mut scored: Vec<(f64, usize)> = candidates
        .iter()
        .map(|&i| (field.at(i) + rng.next() * jitter, i))
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));
    scored.into_iter().map(|(_, i)| i).collect()
}

fn convert_top(grid: &mut WorldGrid, ranked: &[usize], target: usize, terrain: Terrain) -> usize {
    let mut converted = 0;
    for &index in ranked.iter().take(target) {
        let (x, y) = grid.index_to_coords(index);
        if grid.set_tile(x, y, terrain) {
            converted += 1;
        }
    }
    converted
}
