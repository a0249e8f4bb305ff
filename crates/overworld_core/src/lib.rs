//! Core data structures for overworld_editor
//!
//! This crate provides the spatial indexing engine behind the editor:
//! - `SpatialGrid` - Uniform-cell hash grid with incremental maintenance
//! - `TileMap` - One layer of packed 32-bit tile codes
//! - `MapObject` / `ObjectIndex` - Loose objects (NPCs, links, signs) in an arena plus grid
//! - `Level` - Tile layers and objects; standalone levels own their own object grid
//! - `Overworld` - Levels in a fixed layout sharing a single object grid
//! - `WorldContext` - Per-document counters for micro-depths and search stamps

mod config;
mod context;
mod draw;
mod geometry;
mod level;
mod object;
mod overworld;
pub mod spatial;
pub mod tile;
mod tilemap;

pub use config::GridConfig;
pub use context::{SearchId, WorldContext, MICRO_DEPTH_DISTINCT};
pub use draw::{sort_drawables, DrawItem, Drawable};
pub use geometry::Rect;
pub use level::{Level, LevelContents, LevelLoadError, LevelLoader};
pub use object::{compare_sort_keys, MapObject, ObjectId, ObjectIndex, ObjectKind};
pub use overworld::{LevelObjects, Overworld};
pub use spatial::{Bounded, BoundsSource, CellSpan, SearchOutput, SpatialGrid, SpatialIndexHandle};
pub use tile::{is_invisible, make_invisible, make_tile, TileParts, INVISIBLE_TILE};
pub use tilemap::{TileMap, DEFAULT_TILE_SIZE};
