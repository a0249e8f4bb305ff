//! Levels: tile layers plus loose objects
//!
//! A standalone level owns its own [`ObjectIndex`]. A level placed in an
//! [`Overworld`](crate::Overworld) owns none; its objects live in the
//! overworld's shared index and are reached through the overworld.

use crate::draw::{sort_drawables, Drawable};
use crate::object::{MapObject, ObjectId, ObjectIndex};
use crate::spatial::{Bounded, SearchOutput};
use crate::tilemap::TileMap;
use crate::{GridConfig, Rect, WorldContext};
use std::collections::{BTreeMap, HashSet};
use uuid::Uuid;

/// Errors raised by a [`LevelLoader`]
#[derive(Debug, Clone, PartialEq)]
pub enum LevelLoadError {
    /// No level file with that name
    NotFound(String),
    /// Reading the file failed
    Io(String),
    /// The file could not be decoded
    Parse(String),
}

impl std::fmt::Display for LevelLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LevelLoadError::NotFound(name) => write!(f, "Level not found: {}", name),
            LevelLoadError::Io(e) => write!(f, "IO error: {}", e),
            LevelLoadError::Parse(e) => write!(f, "Parse error: {}", e),
        }
    }
}

impl std::error::Error for LevelLoadError {}

/// Decoded level contents in level-local coordinates (origin at the level's top-left)
#[derive(Debug, Clone, Default)]
pub struct LevelContents {
    pub layers: Vec<TileMap>,
    pub objects: Vec<MapObject>,
}

/// Level file codec boundary.
///
/// Implementations decode a level by name and build fully formed tile maps
/// and objects; the level or overworld registers them.
pub trait LevelLoader {
    fn load_level(
        &mut self,
        ctx: &mut WorldContext,
        name: &str,
    ) -> Result<LevelContents, LevelLoadError>;
}

/// A fixed-size level
#[derive(Debug, Clone)]
pub struct Level {
    pub id: Uuid,
    pub name: String,
    bounds: Rect,
    tile_size: f32,
    layers: BTreeMap<i32, TileMap>,
    /// Objects this level owns, wherever they are indexed
    objects: HashSet<ObjectId>,
    overworld: Option<Uuid>,
    loaded: bool,
    /// Present only for standalone levels
    index: Option<ObjectIndex>,
}

impl Level {
    /// Create an empty standalone level with its own object grid
    pub fn standalone(name: String, bounds: Rect, config: &GridConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            bounds,
            tile_size: config.tile_size,
            layers: BTreeMap::new(),
            objects: HashSet::new(),
            overworld: None,
            loaded: true,
            index: Some(ObjectIndex::new(bounds, config)),
        }
    }

    /// Open a standalone level through a loader
    pub fn open<L: LevelLoader + ?Sized>(
        ctx: &mut WorldContext,
        name: String,
        bounds: Rect,
        config: &GridConfig,
        loader: &mut L,
    ) -> Result<Self, LevelLoadError> {
        let contents = loader.load_level(ctx, &name)?;
        let mut level = Self::standalone(name, bounds, config);
        level.install(contents);
        Ok(level)
    }

    /// Create a level that belongs to an overworld and has no grid of its own
    pub(crate) fn child(name: String, bounds: Rect, tile_size: f32, overworld: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            bounds,
            tile_size,
            layers: BTreeMap::new(),
            objects: HashSet::new(),
            overworld: Some(overworld),
            loaded: false,
            index: None,
        }
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Size in tiles; 0×0 when the tile size is not positive
    pub fn tile_dimensions(&self) -> (u32, u32) {
        if !(self.tile_size > 0.0) {
            return (0, 0);
        }
        (
            (self.bounds.width / self.tile_size).ceil().max(0.0) as u32,
            (self.bounds.height / self.tile_size).ceil().max(0.0) as u32,
        )
    }

    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    /// Parent overworld, `None` for a standalone level
    pub fn overworld(&self) -> Option<Uuid> {
        self.overworld
    }

    pub fn is_standalone(&self) -> bool {
        self.index.is_some()
    }

    /// Whether the level's contents have been read from its file
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub(crate) fn mark_loaded(&mut self) {
        self.loaded = true;
    }

    // --- Layers ---

    /// Layer at `index`, creating an empty one sized to the level if missing
    pub fn add_layer(&mut self, index: i32) -> &mut TileMap {
        let (hcount, vcount) = self.tile_dimensions();
        let (x, y, tile_size) = (self.bounds.x, self.bounds.y, self.tile_size);
        self.layers.entry(index).or_insert_with(|| {
            TileMap::new(index, hcount, vcount)
                .at(x, y)
                .with_tile_size(tile_size)
        })
    }

    /// Adopt a decoded tile map, placing it at the level's origin.
    /// Returns the map previously stored at that layer index.
    pub fn insert_layer(&mut self, map: TileMap) -> Option<TileMap> {
        let map = map
            .at(self.bounds.x, self.bounds.y)
            .with_tile_size(self.tile_size);
        self.layers.insert(map.layer, map)
    }

    pub fn layer(&self, index: i32) -> Option<&TileMap> {
        self.layers.get(&index)
    }

    pub fn layer_mut(&mut self, index: i32) -> Option<&mut TileMap> {
        self.layers.get_mut(&index)
    }

    pub fn remove_layer(&mut self, index: i32) -> Option<TileMap> {
        self.layers.remove(&index)
    }

    /// Layers in ascending depth
    pub fn layers(&self) -> impl Iterator<Item = &TileMap> {
        self.layers.values()
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Replace every layer with a resized copy
    pub fn resize_layers(&mut self, hcount: u32, vcount: u32) {
        for map in self.layers.values_mut() {
            *map = map.resized(hcount, vcount);
        }
    }

    /// Tile under a world point on one layer
    pub fn tile_at(&self, layer: i32, world_x: f32, world_y: f32) -> Option<u32> {
        self.layers.get(&layer)?.tile_at_world(world_x, world_y)
    }

    // --- Object membership ---

    /// Ids of the objects this level owns
    pub fn object_ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.objects.iter().copied()
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn owns_object(&self, id: ObjectId) -> bool {
        self.objects.contains(&id)
    }

    pub(crate) fn adopt_object(&mut self, id: ObjectId) {
        self.objects.insert(id);
    }

    pub(crate) fn release_object(&mut self, id: ObjectId) -> bool {
        self.objects.remove(&id)
    }

    pub(crate) fn take_object_ids(&mut self) -> Vec<ObjectId> {
        self.objects.drain().collect()
    }

    pub(crate) fn install_layers(&mut self, layers: Vec<TileMap>) {
        for map in layers {
            self.insert_layer(map);
        }
    }

    /// Install decoded contents into a standalone level, translating object
    /// rectangles from level-local to world coordinates
    pub fn install(&mut self, contents: LevelContents) {
        self.install_layers(contents.layers);
        let (dx, dy) = (self.bounds.x, self.bounds.y);
        for mut object in contents.objects {
            object.translate(dx, dy);
            self.add_object(object);
        }
        self.loaded = true;
    }

    // --- Standalone object index ---
    //
    // On a child level these find no index and return `None`/`false`; use
    // `Overworld::level_objects_mut` instead.

    /// The level's own index, `None` inside an overworld
    pub fn object_index(&self) -> Option<&ObjectIndex> {
        self.index.as_ref()
    }

    /// Take ownership of an object and index it in this level's own grid.
    ///
    /// Returns `None` for a level inside an overworld; those register objects
    /// through [`Overworld::level_objects_mut`](crate::Overworld::level_objects_mut).
    pub fn add_object(&mut self, mut object: MapObject) -> Option<ObjectId> {
        let Some(index) = self.index.as_mut() else {
            tracing::warn!(
                "add_object on child level '{}'; register through its overworld",
                self.name
            );
            return None;
        };
        object.level = Some(self.id);
        let id = index.insert(object);
        self.objects.insert(id);
        Some(id)
    }

    pub fn remove_object(&mut self, id: ObjectId) -> Option<MapObject> {
        let object = self.index.as_mut()?.remove(id)?;
        self.objects.remove(&id);
        Some(object)
    }

    pub fn object(&self, id: ObjectId) -> Option<&MapObject> {
        self.index.as_ref()?.get(id)
    }

    /// Mutable access; call [`update_spatial_entity`](Self::update_spatial_entity) after moving it
    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut MapObject> {
        self.index.as_mut()?.get_mut(id)
    }

    pub fn add_to_spatial_map(&mut self, id: ObjectId) -> bool {
        self.index
            .as_mut()
            .is_some_and(|index| index.add_to_spatial_map(id))
    }

    pub fn remove_from_spatial_map(&mut self, id: ObjectId) -> bool {
        self.index
            .as_mut()
            .is_some_and(|index| index.remove_from_spatial_map(id))
    }

    pub fn update_spatial_entity(&mut self, id: ObjectId) -> bool {
        self.index
            .as_mut()
            .is_some_and(|index| index.update_spatial_entity(id))
    }

    pub fn search_objects<O: SearchOutput<ObjectId>>(
        &mut self,
        ctx: &mut WorldContext,
        rect: Rect,
        accurate: bool,
        out: &mut O,
    ) {
        if let Some(index) = self.index.as_mut() {
            index.search(ctx, rect, accurate, out);
        }
    }

    pub fn search_objects_filtered<O, P>(
        &mut self,
        ctx: &mut WorldContext,
        rect: Rect,
        accurate: bool,
        out: &mut O,
        predicate: P,
    ) where
        O: SearchOutput<ObjectId>,
        P: FnMut(ObjectId, &MapObject) -> bool,
    {
        if let Some(index) = self.index.as_mut() {
            index.search_filtered(ctx, rect, accurate, out, predicate);
        }
    }

    pub fn first_object<P>(&self, rect: Rect, accurate: bool, predicate: P) -> Option<ObjectId>
    where
        P: FnMut(ObjectId, &MapObject) -> bool,
    {
        self.index.as_ref()?.search_first(rect, accurate, predicate)
    }

    pub fn object_at(&self, x: f32, y: f32) -> Option<ObjectId> {
        self.index.as_ref()?.object_at(x, y)
    }

    /// Tile layers and objects overlapping the viewport, back to front
    pub fn collect_drawables(&mut self, ctx: &mut WorldContext, viewport: Rect) -> Vec<Drawable> {
        let mut drawables = Vec::new();
        if self.bounds.intersects(&viewport) {
            drawables.extend(self.layers.keys().map(|&layer| Drawable::layer(self.id, layer)));
        }
        if let Some(index) = self.index.as_mut() {
            let mut ids = Vec::new();
            index.search(ctx, viewport, false, &mut ids);
            drawables.extend(ids.into_iter().filter_map(|id| {
                index
                    .get(id)
                    .map(|object| Drawable::object(id, object.depth, object.micro_depth))
            }));
        }
        sort_drawables(&mut drawables);
        drawables
    }
}

impl Bounded for Level {
    fn bounds(&self) -> Rect {
        self.bounds
    }
}
