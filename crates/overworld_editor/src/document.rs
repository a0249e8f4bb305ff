//! The world currently open in the editor
//!
//! A document is either one standalone level or one overworld of child
//! levels. Either way it owns its own [`WorldContext`], so two open worlds
//! never share micro-depth or search counters.

use bevy::prelude::Resource;
use overworld_core::{
    compare_sort_keys, Drawable, GridConfig, Level, LevelLoadError, LevelLoader, MapObject,
    ObjectId, ObjectKind, Overworld, Rect, SearchOutput, TileMap, WorldContext,
};
use uuid::Uuid;

/// What kind of world is open
#[derive(Debug, Clone)]
pub enum EditedWorld {
    Level(Level),
    Overworld(Overworld),
}

/// The open document
#[derive(Debug, Clone, Resource)]
pub struct Document {
    pub context: WorldContext,
    pub world: EditedWorld,
}

impl Document {
    /// Open a fresh standalone level of `width` x `height` tiles
    pub fn new_level(name: String, width: u32, height: u32, config: &GridConfig) -> Self {
        let bounds = Rect::new(
            0.0,
            0.0,
            width as f32 * config.tile_size,
            height as f32 * config.tile_size,
        );
        Self {
            context: WorldContext::new(),
            world: EditedWorld::Level(Level::standalone(name, bounds, config)),
        }
    }

    /// Open a fresh overworld with every slot filled by an empty level
    pub fn new_overworld(
        name: String,
        levels_wide: u32,
        levels_tall: u32,
        level_width: f32,
        level_height: f32,
        config: &GridConfig,
    ) -> Self {
        let mut overworld = Overworld::new(
            name.clone(),
            levels_wide,
            levels_tall,
            level_width,
            level_height,
            config,
        );
        for gy in 0..levels_tall {
            for gx in 0..levels_wide {
                overworld.place_level(gx, gy, format!("{}_{}_{}", name, gx, gy));
            }
        }
        Self {
            context: WorldContext::new(),
            world: EditedWorld::Overworld(overworld),
        }
    }

    /// Wrap an already built world
    pub fn from_world(world: EditedWorld) -> Self {
        Self {
            context: WorldContext::new(),
            world,
        }
    }

    pub fn name(&self) -> &str {
        match &self.world {
            EditedWorld::Level(level) => &level.name,
            EditedWorld::Overworld(overworld) => &overworld.name,
        }
    }

    pub fn bounds(&self) -> Rect {
        match &self.world {
            EditedWorld::Level(level) => level.bounds(),
            EditedWorld::Overworld(overworld) => overworld.bounds(),
        }
    }

    pub fn is_overworld(&self) -> bool {
        matches!(self.world, EditedWorld::Overworld(_))
    }

    // --- Levels ---

    /// Level under a world point
    pub fn level_at(&self, x: f32, y: f32) -> Option<Uuid> {
        match &self.world {
            EditedWorld::Level(level) => level.bounds().contains_point(x, y).then_some(level.id),
            EditedWorld::Overworld(overworld) => overworld.level_at(x, y),
        }
    }

    pub fn level(&self, id: Uuid) -> Option<&Level> {
        match &self.world {
            EditedWorld::Level(level) => (level.id == id).then_some(level),
            EditedWorld::Overworld(overworld) => overworld.level(id),
        }
    }

    pub fn level_mut(&mut self, id: Uuid) -> Option<&mut Level> {
        match &mut self.world {
            EditedWorld::Level(level) => (level.id == id).then_some(level),
            EditedWorld::Overworld(overworld) => overworld.level_mut(id),
        }
    }

    /// Tile layer of whichever level lies under a world point
    pub fn layer_at_mut(&mut self, layer: i32, x: f32, y: f32) -> Option<&mut TileMap> {
        let level = self.level_at(x, y)?;
        self.level_mut(level)?.layer_mut(layer)
    }

    /// Load the child levels overlapping `rect` that haven't been read yet.
    /// A standalone level is always loaded.
    pub fn load_visible<L: LevelLoader + ?Sized>(
        &mut self,
        rect: Rect,
        loader: &mut L,
    ) -> Result<usize, LevelLoadError> {
        match &mut self.world {
            EditedWorld::Level(_) => Ok(0),
            EditedWorld::Overworld(overworld) => {
                overworld.load_levels_in(&mut self.context, rect, loader)
            }
        }
    }

    // --- Objects ---

    /// Create an object at a world rectangle in the level under its centre.
    ///
    /// Returns `None` when no level lies there.
    pub fn place_object(
        &mut self,
        kind: ObjectKind,
        rect: Rect,
        depth: i32,
    ) -> Option<ObjectId> {
        let (cx, cy) = rect.center();
        let level = self.level_at(cx, cy)?;
        let object = MapObject::new(&mut self.context, kind, rect, depth);
        match &mut self.world {
            EditedWorld::Level(standalone) => standalone.add_object(object),
            EditedWorld::Overworld(overworld) => overworld.add_object(level, object),
        }
    }

    pub fn remove_object(&mut self, id: ObjectId) -> Option<MapObject> {
        match &mut self.world {
            EditedWorld::Level(level) => level.remove_object(id),
            EditedWorld::Overworld(overworld) => overworld.remove_object(id),
        }
    }

    pub fn object(&self, id: ObjectId) -> Option<&MapObject> {
        match &self.world {
            EditedWorld::Level(level) => level.object(id),
            EditedWorld::Overworld(overworld) => overworld.object(id),
        }
    }

    /// Mutable access; call [`update_spatial_entity`](Self::update_spatial_entity) after moving it
    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut MapObject> {
        match &mut self.world {
            EditedWorld::Level(level) => level.object_mut(id),
            EditedWorld::Overworld(overworld) => overworld.object_mut(id),
        }
    }

    pub fn update_spatial_entity(&mut self, id: ObjectId) -> bool {
        match &mut self.world {
            EditedWorld::Level(level) => level.update_spatial_entity(id),
            EditedWorld::Overworld(overworld) => overworld.update_spatial_entity(id),
        }
    }

    /// Settle an object after a move: inside an overworld it changes owner
    /// to the level under its centre. Returns the owning level.
    pub fn relocate(&mut self, id: ObjectId) -> Option<Uuid> {
        match &mut self.world {
            EditedWorld::Level(level) => {
                level.update_spatial_entity(id);
                level.object(id).and_then(|object| object.level)
            }
            EditedWorld::Overworld(overworld) => overworld.relocate_object(id),
        }
    }

    pub fn search_objects<O: SearchOutput<ObjectId>>(
        &mut self,
        rect: Rect,
        accurate: bool,
        out: &mut O,
    ) {
        match &mut self.world {
            EditedWorld::Level(level) => {
                level.search_objects(&mut self.context, rect, accurate, out)
            }
            EditedWorld::Overworld(overworld) => {
                overworld.search_objects(&mut self.context, rect, accurate, out)
            }
        }
    }

    /// Objects overlapping `rect` that belong to `level`
    pub fn search_level_objects<O: SearchOutput<ObjectId>>(
        &mut self,
        rect: Rect,
        level: Uuid,
        out: &mut O,
    ) {
        let owned_by = move |_: ObjectId, object: &MapObject| object.level == Some(level);
        match &mut self.world {
            EditedWorld::Level(standalone) => {
                standalone.search_objects_filtered(&mut self.context, rect, true, out, owned_by)
            }
            EditedWorld::Overworld(overworld) => {
                overworld.search_objects_filtered(&mut self.context, rect, true, out, owned_by)
            }
        }
    }

    /// Any object indexed in the cell under a world point
    pub fn object_at(&self, x: f32, y: f32) -> Option<ObjectId> {
        match &self.world {
            EditedWorld::Level(level) => level.object_at(x, y),
            EditedWorld::Overworld(overworld) => overworld.object_at(x, y),
        }
    }

    /// Topmost object under a world point, by drawing order
    pub fn pick_object(&mut self, x: f32, y: f32) -> Option<ObjectId> {
        let mut hits = Vec::new();
        self.search_objects(Rect::point(x, y), true, &mut hits);
        hits.into_iter()
            .filter_map(|id| self.object(id).map(|object| (id, object.sort_key())))
            .max_by(|a, b| compare_sort_keys(a.1, b.1))
            .map(|(id, _)| id)
    }

    /// Everything to draw inside the viewport, back to front
    pub fn collect_drawables(&mut self, viewport: Rect) -> Vec<Drawable> {
        match &mut self.world {
            EditedWorld::Level(level) => level.collect_drawables(&mut self.context, viewport),
            EditedWorld::Overworld(overworld) => {
                overworld.collect_drawables(&mut self.context, viewport)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(text: &str) -> ObjectKind {
        ObjectKind::Sign {
            text: text.to_string(),
        }
    }

    #[test]
    fn test_pick_object_returns_topmost() {
        let mut doc = Document::new_level("solo".to_string(), 64, 64, &GridConfig::default());
        let below = doc.place_object(sign("below"), Rect::new(10.0, 10.0, 32.0, 32.0), 0);
        let above = doc.place_object(sign("above"), Rect::new(20.0, 20.0, 32.0, 32.0), 0);
        let deep = doc.place_object(sign("deep"), Rect::new(20.0, 20.0, 32.0, 32.0), -1);
        assert!(below.is_some() && above.is_some() && deep.is_some());

        assert_eq!(doc.pick_object(25.0, 25.0), above);
        assert_eq!(doc.pick_object(12.0, 12.0), below);
        assert_eq!(doc.pick_object(500.0, 500.0), None);
    }

    #[test]
    fn test_place_object_outside_world_is_rejected() {
        let mut doc = Document::new_level("solo".to_string(), 4, 4, &GridConfig::default());
        assert_eq!(
            doc.place_object(sign("far"), Rect::new(500.0, 500.0, 16.0, 16.0), 0),
            None
        );
    }

    #[test]
    fn test_overworld_document_relocates_between_levels() {
        let mut doc = Document::new_overworld(
            "kingdom".to_string(),
            2,
            1,
            1024.0,
            1024.0,
            &GridConfig::default(),
        );
        let left = doc.level_at(10.0, 10.0);
        let right = doc.level_at(1030.0, 10.0);
        assert!(left.is_some() && right.is_some() && left != right);

        let Some(id) = doc.place_object(sign("moving"), Rect::new(990.0, 10.0, 20.0, 20.0), 0)
        else {
            panic!("object not placed");
        };
        assert_eq!(doc.object(id).and_then(|o| o.level), left);

        if let Some(object) = doc.object_mut(id) {
            object.set_position(1020.0, 10.0);
        }
        assert_eq!(doc.relocate(id), right);

        let mut found = Vec::new();
        doc.search_level_objects(Rect::new(1000.0, 0.0, 100.0, 100.0), right.unwrap(), &mut found);
        assert_eq!(found, vec![id]);
        found.clear();
        doc.search_level_objects(Rect::new(1000.0, 0.0, 100.0, 100.0), left.unwrap(), &mut found);
        assert!(found.is_empty());
    }
}
