//! Packed 32-bit tile codes
//!
//! Layout, low bits first:
//!
//! | bits    | field                          |
//! |---------|--------------------------------|
//! | 0..10   | top atlas coordinate           |
//! | 10..20  | left atlas coordinate          |
//! | 20..28  | behaviour type                 |
//! | 28..32  | translucency                   |
//!
//! The layout is shared with the level file formats and must stay bit-exact.

use serde::{Deserialize, Serialize};

pub const TILE_TOP_SHIFT: u32 = 0;
pub const TILE_LEFT_SHIFT: u32 = 10;
pub const TILE_TYPE_SHIFT: u32 = 20;
pub const TILE_TRANSLUCENCY_SHIFT: u32 = 28;

/// Mask for one 10-bit atlas coordinate (before shifting)
pub const TILE_COORD_MASK: u32 = 0x3FF;
/// Mask for the behaviour type (before shifting)
pub const TILE_TYPE_MASK: u32 = 0xFF;
/// Mask for the translucency (before shifting)
pub const TILE_TRANSLUCENCY_MASK: u32 = 0xF;
/// Low 20 bits: both atlas coordinates
pub const TILE_POSITION_MASK: u32 = 0x000F_FFFF;

/// Atlas position marking "nothing painted here": left = top = 1023
pub const INVISIBLE_POSITION: u32 = TILE_COORD_MASK | (TILE_COORD_MASK << TILE_LEFT_SHIFT);
/// Plain invisible tile with type and translucency zero
pub const INVISIBLE_TILE: u32 = INVISIBLE_POSITION;

/// Pack an atlas position, behaviour type and translucency into one code.
/// Each field is truncated to its width.
#[inline]
pub fn make_tile(left: u32, top: u32, tile_type: u32, translucency: u32) -> u32 {
    ((top & TILE_COORD_MASK) << TILE_TOP_SHIFT)
        | ((left & TILE_COORD_MASK) << TILE_LEFT_SHIFT)
        | ((tile_type & TILE_TYPE_MASK) << TILE_TYPE_SHIFT)
        | ((translucency & TILE_TRANSLUCENCY_MASK) << TILE_TRANSLUCENCY_SHIFT)
}

#[inline]
pub fn tile_left(tile: u32) -> u32 {
    (tile >> TILE_LEFT_SHIFT) & TILE_COORD_MASK
}

#[inline]
pub fn tile_top(tile: u32) -> u32 {
    (tile >> TILE_TOP_SHIFT) & TILE_COORD_MASK
}

#[inline]
pub fn tile_type(tile: u32) -> u32 {
    (tile >> TILE_TYPE_SHIFT) & TILE_TYPE_MASK
}

#[inline]
pub fn tile_translucency(tile: u32) -> u32 {
    (tile >> TILE_TRANSLUCENCY_SHIFT) & TILE_TRANSLUCENCY_MASK
}

/// Replace the atlas position with the invisible sentinel, keeping type and translucency
#[inline]
pub fn make_invisible(tile: u32) -> u32 {
    (tile & !TILE_POSITION_MASK) | INVISIBLE_POSITION
}

/// True when the atlas position is the invisible sentinel (upper 12 bits ignored)
#[inline]
pub fn is_invisible(tile: u32) -> bool {
    tile & TILE_POSITION_MASK == INVISIBLE_POSITION
}

/// Same tile with a different behaviour type
#[inline]
pub fn with_type(tile: u32, tile_type: u32) -> u32 {
    (tile & !(TILE_TYPE_MASK << TILE_TYPE_SHIFT))
        | ((tile_type & TILE_TYPE_MASK) << TILE_TYPE_SHIFT)
}

/// Same tile with a different translucency
#[inline]
pub fn with_translucency(tile: u32, translucency: u32) -> u32 {
    (tile & !(TILE_TRANSLUCENCY_MASK << TILE_TRANSLUCENCY_SHIFT))
        | ((translucency & TILE_TRANSLUCENCY_MASK) << TILE_TRANSLUCENCY_SHIFT)
}

/// Unpacked view of a tile code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TileParts {
    pub left: u32,
    pub top: u32,
    pub tile_type: u32,
    pub translucency: u32,
}

impl TileParts {
    pub fn decode(tile: u32) -> Self {
        Self {
            left: tile_left(tile),
            top: tile_top(tile),
            tile_type: tile_type(tile),
            translucency: tile_translucency(tile),
        }
    }

    pub fn encode(&self) -> u32 {
        make_tile(self.left, self.top, self.tile_type, self.translucency)
    }

    pub fn is_invisible(&self) -> bool {
        self.left == TILE_COORD_MASK && self.top == TILE_COORD_MASK
    }
}
