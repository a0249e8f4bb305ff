//! Editor preferences
//!
//! Persisted as JSON in the platform config directory.

mod file;

pub use file::*;

use bevy::prelude::Resource;
use overworld_core::GridConfig;
use serde::{Deserialize, Serialize};

/// Maximum number of entries kept in the recent worlds list
const MAX_RECENT_WORLDS: usize = 10;

/// User preferences for the editor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Resource)]
#[serde(default)]
pub struct EditorPreferences {
    /// Object grid cell width in world units
    pub object_cell_width: f32,
    /// Object grid cell height in world units
    pub object_cell_height: f32,
    /// Edge length of one tile in world units
    pub tile_size: f32,
    /// Width of new levels in tiles
    pub default_level_width: u32,
    /// Height of new levels in tiles
    pub default_level_height: u32,
    /// Extra world units collected around the viewport so panning doesn't pop
    pub viewport_margin: f32,
    /// Recently opened overworlds, most recent first
    pub recent_worlds: Vec<String>,
}

impl Default for EditorPreferences {
    fn default() -> Self {
        let grid = GridConfig::default();
        Self {
            object_cell_width: grid.cell_width,
            object_cell_height: grid.cell_height,
            tile_size: grid.tile_size,
            default_level_width: 64,
            default_level_height: 64,
            viewport_margin: 64.0,
            recent_worlds: Vec::new(),
        }
    }
}

impl EditorPreferences {
    /// Grid sizes for new levels and overworlds
    pub fn grid_config(&self) -> GridConfig {
        GridConfig {
            cell_width: self.object_cell_width,
            cell_height: self.object_cell_height,
            tile_size: self.tile_size,
        }
    }

    /// Footprint of a default level in world units
    pub fn level_footprint(&self) -> (f32, f32) {
        (
            self.default_level_width as f32 * self.tile_size,
            self.default_level_height as f32 * self.tile_size,
        )
    }

    /// Move `name` to the front of the recent list
    pub fn add_recent_world(&mut self, name: &str) {
        self.recent_worlds.retain(|n| n != name);
        self.recent_worlds.insert(0, name.to_string());
        self.recent_worlds.truncate(MAX_RECENT_WORLDS);
    }
}
