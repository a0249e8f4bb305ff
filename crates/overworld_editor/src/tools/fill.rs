//! Tile fill operations on a single layer

use overworld_core::TileMap;
use std::collections::HashSet;

/// One tile written by a fill, enough to undo it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileChange {
    pub x: i32,
    pub y: i32,
    pub old: u32,
    pub new: u32,
}

/// Replace the 4-connected run of tiles equal to the one at `(x, y)` with `tile`
pub fn flood_fill(map: &mut TileMap, x: i32, y: i32, tile: u32) -> Vec<TileChange> {
    let Some(target) = map.try_get_tile(x, y) else {
        return Vec::new();
    };
    if target == tile {
        return Vec::new();
    }

    let mut changes = Vec::new();
    let mut stack = vec![(x, y)];
    let mut visited = HashSet::new();

    while let Some((x, y)) = stack.pop() {
        if !visited.insert((x, y)) {
            continue;
        }
        if map.try_get_tile(x, y) != Some(target) {
            continue;
        }

        map.set_tile(x, y, tile);
        changes.push(TileChange {
            x,
            y,
            old: target,
            new: tile,
        });

        stack.push((x - 1, y));
        stack.push((x + 1, y));
        stack.push((x, y - 1));
        stack.push((x, y + 1));
    }

    changes
}

/// Write `tile` over an inclusive tile rectangle, clipped to the map
pub fn fill_rect(
    map: &mut TileMap,
    min_x: i32,
    min_y: i32,
    max_x: i32,
    max_y: i32,
    tile: u32,
) -> Vec<TileChange> {
    let mut changes = Vec::new();
    for ((x, y), old) in map.region(min_x, min_y, max_x, max_y) {
        if old == tile {
            continue;
        }
        map.set_tile(x, y, tile);
        changes.push(TileChange { x, y, old, new: tile });
    }
    changes
}

/// Put back the tiles a fill replaced
pub fn revert(map: &mut TileMap, changes: &[TileChange]) {
    for change in changes.iter().rev() {
        map.set_tile(change.x, change.y, change.old);
    }
}
