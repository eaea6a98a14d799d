//! World generation configuration.
//!
//! Every tuning constant of the generation pipeline lives in
//! [`GenerationParams`] so a world can be reproduced from a seed plus a
//! RON config file. Defaults match the shipped game.

use serde::{Deserialize, Serialize};

use crate::error::{IsleError, Result};

/// Smallest width or height the generator accepts.
pub const MIN_DIMENSION: u32 = 6;

/// Largest width or height the generator accepts.
pub const MAX_DIMENSION: u32 = 512;

/// World size and generation tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Grid width in cells.
    pub width: u32,
    /// Grid height in cells.
    pub height: u32,
    /// Pipeline tuning.
    #[serde(default)]
    pub params: GenerationParams,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl WorldConfig {
    /// Small 20x14 island, used by quick tests.
    #[must_use]
    pub fn small() -> Self {
        Self {
            width: 20,
            height: 14,
            params: GenerationParams::default(),
        }
    }

    /// Standard 30x20 world.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            width: 30,
            height: 20,
            params: GenerationParams::default(),
        }
    }

    /// Large 48x32 world.
    #[must_use]
    pub fn large() -> Self {
        Self {
            width: 48,
            height: 32,
            params: GenerationParams::default(),
        }
    }

    /// Set the dimensions.
    #[must_use]
    pub const fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Replace the tuning parameters.
    #[must_use]
    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    /// Dimensions clamped to the supported range.
    #[must_use]
    pub fn clamped_size(&self) -> (u32, u32) {
        (
            self.width.clamp(MIN_DIMENSION, MAX_DIMENSION),
            self.height.clamp(MIN_DIMENSION, MAX_DIMENSION),
        )
    }

    /// Parse a config from RON text.
    ///
    /// # Errors
    ///
    /// Returns [`IsleError::DataParseError`] naming `source_name`.
    pub fn from_ron(source_name: &str, text: &str) -> Result<Self> {
        ron::from_str(text).map_err(|e| IsleError::DataParseError {
            source_name: source_name.to_string(),
            message: e.to_string(),
        })
    }

    /// Serialize to pretty RON.
    ///
    /// # Errors
    ///
    /// Returns [`IsleError::Serialization`] if encoding fails.
    pub fn to_ron(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| IsleError::Serialization(e.to_string()))
    }
}

/// Tuning constants for each generation stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationParams {
    // Ocean
    /// Minimum edge carve depth as a fraction of the carved dimension.
    pub ocean_depth_min: f64,
    /// Maximum edge carve depth as a fraction of the carved dimension.
    pub ocean_depth_max: f64,
    /// Depth multiplier for corner layouts, which carve two edges.
    pub corner_depth_scale: f64,
    /// Center blob position range as a fraction of each dimension.
    pub blob_center_min: f64,
    /// Upper bound of the blob center range.
    pub blob_center_max: f64,
    /// Minimum blob radius as a fraction of each dimension.
    pub blob_radius_min: f64,
    /// Maximum blob radius as a fraction of each dimension.
    pub blob_radius_max: f64,
    /// Amplitude of per-cell jitter on the blob boundary.
    pub blob_jitter: f64,
    /// Ocean neighbors (of 8) that turn a land cell into ocean.
    pub smoothing_threshold: u32,

    // Biomes
    /// Blur passes applied to each noise field.
    pub blur_passes: u32,
    /// Amplitude of the ranking tie-break jitter.
    pub rank_jitter: f64,
    /// Fraction of plains converted to rocks.
    pub rock_fraction: f64,
    /// Fraction of plains converted to forest.
    pub forest_fraction: f64,

    // Rivers
    /// Maximum rivers per world.
    pub max_rivers: u32,
    /// Rock clusters smaller than this cannot anchor a river.
    pub rock_cluster_min: usize,
    /// Weight of the random term in the step score.
    pub river_jitter_weight: f64,
    /// Weight of progress toward the target.
    pub river_progress_weight: f64,
    /// Penalty for stepping into ocean.
    pub river_ocean_penalty: f64,
    /// Penalty for stepping onto existing river.
    pub river_river_penalty: f64,
    /// Penalty for diagonal steps.
    pub river_diagonal_penalty: f64,
    /// Penalty for turning back against the previous direction.
    pub river_reversal_penalty: f64,

    // Sand
    /// Sand chance for plains touching ocean.
    pub sand_ocean_chance: f64,
    /// Sand chance for plains touching river.
    pub sand_river_chance: f64,
    /// Sand chance for plains within two cells of water.
    pub sand_near_chance: f64,

    // Zoning
    /// Target land cells per zone.
    pub cells_per_zone: u32,
    /// Minimum land cells per zone (bounds the zone count from above).
    pub min_cells_per_zone: u32,
    /// Hard cap on zone count.
    pub max_zones: u32,
    /// Lloyd relaxation iterations.
    pub lloyd_iterations: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            ocean_depth_min: 0.12,
            ocean_depth_max: 0.24,
            corner_depth_scale: 0.72,
            blob_center_min: 0.35,
            blob_center_max: 0.65,
            blob_radius_min: 0.18,
            blob_radius_max: 0.30,
            blob_jitter: 0.3,
            smoothing_threshold: 5,
            blur_passes: 3,
            rank_jitter: 0.02,
            rock_fraction: 0.11,
            forest_fraction: 0.28,
            max_rivers: 2,
            rock_cluster_min: 6,
            river_jitter_weight: 0.6,
            river_progress_weight: 1.0,
            river_ocean_penalty: 2.0,
            river_river_penalty: 0.35,
            river_diagonal_penalty: 0.15,
            river_reversal_penalty: 1.0,
            sand_ocean_chance: 0.78,
            sand_river_chance: 0.5,
            sand_near_chance: 0.14,
            cells_per_zone: 70,
            min_cells_per_zone: 25,
            max_zones: 12,
            lloyd_iterations: 3,
        }
    }
}
