//! Depth-ordered drawing candidates handed to the renderer

use crate::object::{compare_sort_keys, ObjectId};
use uuid::Uuid;

/// Something the renderer draws
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawItem {
    /// One tile layer of a level
    Layer { level: Uuid, layer: i32 },
    /// A loose object
    Object(ObjectId),
}

/// A draw item with its ordering key
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drawable {
    pub item: DrawItem,
    pub depth: i32,
    /// Tile layers use 0, objects their creation micro-depth
    pub micro_depth: f64,
}

impl Drawable {
    pub fn layer(level: Uuid, layer: i32) -> Self {
        Self {
            item: DrawItem::Layer { level, layer },
            depth: layer,
            micro_depth: 0.0,
        }
    }

    pub fn object(id: ObjectId, depth: i32, micro_depth: f64) -> Self {
        Self {
            item: DrawItem::Object(id),
            depth,
            micro_depth,
        }
    }
}

/// Sort back to front by (depth, micro-depth)
pub fn sort_drawables(items: &mut [Drawable]) {
    items.sort_by(|a, b| compare_sort_keys((a.depth, a.micro_depth), (b.depth, b.micro_depth)));
}
