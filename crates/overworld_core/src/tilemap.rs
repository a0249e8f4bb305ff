//! One tile layer of one level

use crate::spatial::Bounded;
use crate::tile::{is_invisible, INVISIBLE_TILE};
use crate::Rect;
use serde::{Deserialize, Serialize};

/// Default edge length of one tile in world units
pub const DEFAULT_TILE_SIZE: f32 = 16.0;

/// A grid of packed tile codes for one layer.
///
/// The layer index doubles as the drawing depth. Maps are never resized in
/// place; see [`TileMap::resized`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileMap {
    /// Layer index, also the drawing depth
    pub layer: i32,
    /// World position of the top-left tile
    pub x: f32,
    pub y: f32,
    /// Edge length of one tile in world units
    pub tile_size: f32,
    hcount: u32,
    vcount: u32,
    tiles: Vec<u32>,
}

impl TileMap {
    /// Create a map with every cell set to [`INVISIBLE_TILE`]
    pub fn new(layer: i32, hcount: u32, vcount: u32) -> Self {
        Self {
            layer,
            x: 0.0,
            y: 0.0,
            tile_size: DEFAULT_TILE_SIZE,
            hcount,
            vcount,
            tiles: vec![INVISIBLE_TILE; (hcount as usize) * (vcount as usize)],
        }
    }

    /// Place the map's top-left corner in world space
    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn with_tile_size(mut self, tile_size: f32) -> Self {
        self.tile_size = tile_size;
        self
    }

    /// Width in tiles
    pub fn hcount(&self) -> u32 {
        self.hcount
    }

    /// Height in tiles
    pub fn vcount(&self) -> u32 {
        self.vcount
    }

    pub fn depth(&self) -> i32 {
        self.layer
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.hcount && (y as u32) < self.vcount
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if self.in_bounds(x, y) {
            Some(y as usize * self.hcount as usize + x as usize)
        } else {
            None
        }
    }

    /// Tile at `(x, y)`, or 0 outside the map
    pub fn get_tile(&self, x: i32, y: i32) -> u32 {
        self.try_get_tile(x, y).unwrap_or(0)
    }

    /// Tile at `(x, y)`, or `None` outside the map.
    ///
    /// Callers that need a tile code regardless use
    /// `try_get_tile(x, y).unwrap_or(INVISIBLE_TILE)`.
    pub fn try_get_tile(&self, x: i32, y: i32) -> Option<u32> {
        self.index(x, y).map(|index| self.tiles[index])
    }

    /// Write a tile; writes outside the map are ignored
    pub fn set_tile(&mut self, x: i32, y: i32, tile: u32) {
        if let Some(index) = self.index(x, y) {
            self.tiles[index] = tile;
        }
    }

    /// Fill the whole map with one tile code
    pub fn clear(&mut self, tile: u32) {
        self.tiles.fill(tile);
    }

    /// True when every cell is invisible
    pub fn is_empty(&self) -> bool {
        self.tiles.iter().all(|&tile| is_invisible(tile))
    }

    /// Raw row-major tile codes
    pub fn tiles(&self) -> &[u32] {
        &self.tiles
    }

    /// A new map of a different size holding the overlapping cells of this one.
    /// Cells outside the old extent start invisible.
    pub fn resized(&self, hcount: u32, vcount: u32) -> TileMap {
        let mut map = TileMap::new(self.layer, hcount, vcount)
            .at(self.x, self.y)
            .with_tile_size(self.tile_size);
        let copy_w = self.hcount.min(hcount) as usize;
        let copy_h = self.vcount.min(vcount) as usize;
        for row in 0..copy_h {
            let src = row * self.hcount as usize;
            let dst = row * hcount as usize;
            map.tiles[dst..dst + copy_w].copy_from_slice(&self.tiles[src..src + copy_w]);
        }
        map
    }

    /// Tile coordinate containing a world point (may be outside the map)
    pub fn tile_coords(&self, world_x: f32, world_y: f32) -> (i32, i32) {
        (
            ((world_x - self.x) / self.tile_size).floor() as i32,
            ((world_y - self.y) / self.tile_size).floor() as i32,
        )
    }

    /// Tile under a world point, `None` outside the map
    pub fn tile_at_world(&self, world_x: f32, world_y: f32) -> Option<u32> {
        let (x, y) = self.tile_coords(world_x, world_y);
        self.try_get_tile(x, y)
    }

    /// Snapshot of the tiles in an inclusive region, clamped to the map
    pub fn region(&self, min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Vec<((i32, i32), u32)> {
        let mut tiles = Vec::new();
        if self.hcount == 0 || self.vcount == 0 {
            return tiles;
        }
        let min_x = min_x.max(0);
        let min_y = min_y.max(0);
        let max_x = max_x.min(self.hcount as i32 - 1);
        let max_y = max_y.min(self.vcount as i32 - 1);
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                tiles.push(((x, y), self.get_tile(x, y)));
            }
        }
        tiles
    }
}

impl Bounded for TileMap {
    fn bounds(&self) -> Rect {
        Rect::new(
            self.x,
            self.y,
            self.hcount as f32 * self.tile_size,
            self.vcount as f32 * self.tile_size,
        )
    }
}
