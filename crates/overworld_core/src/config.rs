//! Sizes handed to levels and overworlds at construction

use crate::tilemap::DEFAULT_TILE_SIZE;
use serde::{Deserialize, Serialize};

/// Cell and tile sizes for the indices a level or overworld builds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    /// Object grid cell width in world units
    pub cell_width: f32,
    /// Object grid cell height in world units
    pub cell_height: f32,
    /// Edge length of one tile in world units
    pub tile_size: f32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            cell_width: 256.0,
            cell_height: 256.0,
            tile_size: DEFAULT_TILE_SIZE,
        }
    }
}

impl GridConfig {
    /// Config with a custom object cell size
    pub fn with_cell_size(cell_width: f32, cell_height: f32) -> Self {
        Self {
            cell_width,
            cell_height,
            ..Default::default()
        }
    }
}
