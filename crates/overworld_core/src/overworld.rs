//! Overworlds: a rectangular arrangement of equally sized levels
//!
//! The overworld keeps two grids. The level grid has one cell per level
//! footprint and answers "which level is at this point". The object grid is
//! shared by every child level, so a viewport straddling several levels is a
//! single query, and an object crossing a level boundary only changes its
//! owning-level pointer.

use crate::draw::{sort_drawables, Drawable};
use crate::level::{Level, LevelLoadError, LevelLoader};
use crate::object::{MapObject, ObjectId, ObjectIndex};
use crate::spatial::{SearchOutput, SpatialGrid};
use crate::{GridConfig, Rect, WorldContext};
use std::collections::HashMap;
use uuid::Uuid;

/// A grid of levels sharing one object index
#[derive(Debug, Clone)]
pub struct Overworld {
    pub id: Uuid,
    pub name: String,
    levels_wide: u32,
    levels_tall: u32,
    level_width: f32,
    level_height: f32,
    tile_size: f32,
    /// Row-major level slots
    slots: Vec<Option<Uuid>>,
    levels: HashMap<Uuid, Level>,
    level_grid: SpatialGrid<Uuid>,
    objects: ObjectIndex,
}

impl Overworld {
    /// Create an empty overworld of `levels_wide × levels_tall` level slots,
    /// each `level_width × level_height` world units
    pub fn new(
        name: String,
        levels_wide: u32,
        levels_tall: u32,
        level_width: f32,
        level_height: f32,
        config: &GridConfig,
    ) -> Self {
        let bounds = Rect::new(
            0.0,
            0.0,
            levels_wide as f32 * level_width,
            levels_tall as f32 * level_height,
        );
        Self {
            id: Uuid::new_v4(),
            name,
            levels_wide,
            levels_tall,
            level_width,
            level_height,
            tile_size: config.tile_size,
            slots: vec![None; (levels_wide as usize) * (levels_tall as usize)],
            levels: HashMap::new(),
            level_grid: SpatialGrid::new(bounds, level_width, level_height),
            objects: ObjectIndex::new(bounds, config),
        }
    }

    pub fn bounds(&self) -> Rect {
        self.level_grid.bounds()
    }

    /// Slots across and down
    pub fn dimensions(&self) -> (u32, u32) {
        (self.levels_wide, self.levels_tall)
    }

    /// Size of one level in world units
    pub fn level_footprint(&self) -> (f32, f32) {
        (self.level_width, self.level_height)
    }

    fn slot_index(&self, gx: u32, gy: u32) -> Option<usize> {
        if gx < self.levels_wide && gy < self.levels_tall {
            Some(gy as usize * self.levels_wide as usize + gx as usize)
        } else {
            None
        }
    }

    // --- Levels ---

    /// Create a level in slot `(gx, gy)`, destroying any level already there
    pub fn place_level(&mut self, gx: u32, gy: u32, name: String) -> Option<Uuid> {
        let slot = self.slot_index(gx, gy)?;
        if let Some(previous) = self.slots[slot] {
            self.remove_level(previous);
        }
        let bounds = Rect::new(
            gx as f32 * self.level_width,
            gy as f32 * self.level_height,
            self.level_width,
            self.level_height,
        );
        let level = Level::child(name, bounds, self.tile_size, self.id);
        let id = level.id;
        self.level_grid.add(id, bounds);
        self.levels.insert(id, level);
        self.slots[slot] = Some(id);
        Some(id)
    }

    /// Level placed in slot `(gx, gy)`
    pub fn level_in_slot(&self, gx: u32, gy: u32) -> Option<Uuid> {
        self.slots[self.slot_index(gx, gy)?]
    }

    /// Destroy a level together with every object it owns
    pub fn remove_level(&mut self, id: Uuid) -> Option<Level> {
        let mut level = self.levels.remove(&id)?;
        self.level_grid.remove(id);
        for slot in self.slots.iter_mut().filter(|slot| **slot == Some(id)) {
            *slot = None;
        }
        let owned = level.take_object_ids();
        tracing::debug!(
            "Removing level '{}' and {} objects",
            level.name,
            owned.len()
        );
        for object in owned {
            self.objects.remove(object);
        }
        Some(level)
    }

    pub fn level(&self, id: Uuid) -> Option<&Level> {
        self.levels.get(&id)
    }

    pub fn level_mut(&mut self, id: Uuid) -> Option<&mut Level> {
        self.levels.get_mut(&id)
    }

    pub fn levels(&self) -> impl Iterator<Item = &Level> {
        self.levels.values()
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Level whose footprint contains the point
    pub fn level_at(&self, x: f32, y: f32) -> Option<Uuid> {
        self.level_grid.entity_at(x, y, &self.levels)
    }

    /// Levels overlapping a rectangle
    pub fn levels_in(&mut self, ctx: &mut WorldContext, rect: Rect, accurate: bool) -> Vec<Uuid> {
        let mut found = Vec::new();
        self.level_grid
            .search(ctx, rect, accurate, &self.levels, &mut found);
        found
    }

    /// Load every not-yet-loaded level overlapping `rect`.
    /// Returns how many levels were loaded.
    pub fn load_levels_in<L: LevelLoader + ?Sized>(
        &mut self,
        ctx: &mut WorldContext,
        rect: Rect,
        loader: &mut L,
    ) -> Result<usize, LevelLoadError> {
        let pending: Vec<(Uuid, String)> = self
            .levels_in(ctx, rect, true)
            .into_iter()
            .filter_map(|id| {
                let level = self.levels.get(&id)?;
                (!level.is_loaded()).then(|| (id, level.name.clone()))
            })
            .collect();

        for (id, name) in &pending {
            let contents = loader.load_level(ctx, name)?;
            let Some(level) = self.levels.get_mut(id) else {
                continue;
            };
            let origin = level.bounds();
            level.install_layers(contents.layers);
            level.mark_loaded();
            for mut object in contents.objects {
                object.translate(origin.x, origin.y);
                self.add_object(*id, object);
            }
            tracing::debug!("Loaded level '{}'", name);
        }
        Ok(pending.len())
    }

    // --- Objects ---

    /// The shared object index
    pub fn object_index(&self) -> &ObjectIndex {
        &self.objects
    }

    /// Object registration for one child level, backed by the shared index
    pub fn level_objects_mut(&mut self, level: Uuid) -> Option<LevelObjects<'_>> {
        let owner = self.levels.get_mut(&level)?;
        Some(LevelObjects {
            level: owner,
            objects: &mut self.objects,
        })
    }

    /// Give an object to `level` and index it in the shared grid
    pub fn add_object(&mut self, level: Uuid, object: MapObject) -> Option<ObjectId> {
        let Some(mut owner) = self.level_objects_mut(level) else {
            tracing::warn!("add_object on unknown level {}", level);
            return None;
        };
        Some(owner.add_object(object))
    }

    /// Unindex and destroy an object
    pub fn remove_object(&mut self, id: ObjectId) -> Option<MapObject> {
        let object = self.objects.remove(id)?;
        if let Some(level) = object.level.and_then(|level| self.levels.get_mut(&level)) {
            level.release_object(id);
        }
        Some(object)
    }

    pub fn object(&self, id: ObjectId) -> Option<&MapObject> {
        self.objects.get(id)
    }

    /// Mutable access; follow up with [`update_spatial_entity`](Self::update_spatial_entity)
    /// or [`relocate_object`](Self::relocate_object) after moving it
    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut MapObject> {
        self.objects.get_mut(id)
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn add_to_spatial_map(&mut self, id: ObjectId) -> bool {
        self.objects.add_to_spatial_map(id)
    }

    pub fn remove_from_spatial_map(&mut self, id: ObjectId) -> bool {
        self.objects.remove_from_spatial_map(id)
    }

    pub fn update_spatial_entity(&mut self, id: ObjectId) -> bool {
        self.objects.update_spatial_entity(id)
    }

    /// Hand an object to the level under its centre and re-bucket it.
    ///
    /// Returns the owning level afterwards; `None` means the object lies
    /// outside every level and is now detached (it stays indexed).
    pub fn relocate_object(&mut self, id: ObjectId) -> Option<Uuid> {
        let Some(object) = self.objects.get(id) else {
            tracing::warn!("relocate_object on unknown object {:?}", id);
            return None;
        };
        let previous = object.level;
        let (cx, cy) = object.rect.center();
        let target = self.level_at(cx, cy);

        if target != previous {
            if let Some(level) = previous.and_then(|level| self.levels.get_mut(&level)) {
                level.release_object(id);
            }
            if let Some(level) = target.and_then(|level| self.levels.get_mut(&level)) {
                level.adopt_object(id);
            }
            if let Some(object) = self.objects.get_mut(id) {
                object.level = target;
            }
            tracing::debug!("Object {:?} moved from {:?} to {:?}", id, previous, target);
        }
        self.objects.update_spatial_entity(id);
        target
    }

    /// Move an object's top-left corner and relocate it
    pub fn move_object(&mut self, id: ObjectId, x: f32, y: f32) -> Option<Uuid> {
        self.objects.get_mut(id)?.set_position(x, y);
        self.relocate_object(id)
    }

    pub fn search_objects<O: SearchOutput<ObjectId>>(
        &mut self,
        ctx: &mut WorldContext,
        rect: Rect,
        accurate: bool,
        out: &mut O,
    ) {
        self.objects.search(ctx, rect, accurate, out);
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
        self.objects
            .search_filtered(ctx, rect, accurate, out, predicate);
    }

    pub fn first_object<P>(&self, rect: Rect, accurate: bool, predicate: P) -> Option<ObjectId>
    where
        P: FnMut(ObjectId, &MapObject) -> bool,
    {
        self.objects.search_first(rect, accurate, predicate)
    }

    pub fn object_at(&self, x: f32, y: f32) -> Option<ObjectId> {
        self.objects.object_at(x, y)
    }

    /// Tile under a world point on one layer of whichever level is there
    pub fn tile_at(&self, layer: i32, x: f32, y: f32) -> Option<u32> {
        let level = self.level_at(x, y)?;
        self.levels.get(&level)?.tile_at(layer, x, y)
    }

    /// Tile layers of loaded visible levels plus visible objects, back to front.
    ///
    /// One query against the level grid and one against the shared object
    /// grid, however many levels the viewport straddles.
    pub fn collect_drawables(&mut self, ctx: &mut WorldContext, viewport: Rect) -> Vec<Drawable> {
        let mut drawables = Vec::new();
        for id in self.levels_in(ctx, viewport, true) {
            if let Some(level) = self.levels.get(&id).filter(|level| level.is_loaded()) {
                drawables.extend(level.layers().map(|map| Drawable::layer(id, map.layer)));
            }
        }

        let mut ids = Vec::new();
        self.objects.search(ctx, viewport, false, &mut ids);
        drawables.extend(ids.into_iter().filter_map(|id| {
            self.objects
                .get(id)
                .map(|object| Drawable::object(id, object.depth, object.micro_depth))
        }));

        sort_drawables(&mut drawables);
        drawables
    }
}

/// A child level together with the overworld's shared object index.
///
/// This is how code holding one level of an overworld registers and
/// unregisters that level's objects; the level itself has no grid.
pub struct LevelObjects<'a> {
    level: &'a mut Level,
    objects: &'a mut ObjectIndex,
}

impl LevelObjects<'_> {
    pub fn level(&self) -> &Level {
        &*self.level
    }

    /// Layers and other per-level state; objects go through this view
    pub fn level_mut(&mut self) -> &mut Level {
        &mut *self.level
    }

    /// Take ownership of an object for this level and index it in the shared grid
    pub fn add_object(&mut self, mut object: MapObject) -> ObjectId {
        object.level = Some(self.level.id);
        let id = self.objects.insert(object);
        self.level.adopt_object(id);
        id
    }

    /// Unindex and destroy an object owned by this level.
    /// Objects of other levels are left alone.
    pub fn remove_object(&mut self, id: ObjectId) -> Option<MapObject> {
        if !self.level.owns_object(id) {
            return None;
        }
        self.level.release_object(id);
        self.objects.remove(id)
    }

    pub fn object(&self, id: ObjectId) -> Option<&MapObject> {
        self.objects.get(id).filter(|_| self.level.owns_object(id))
    }

    pub fn add_to_spatial_map(&mut self, id: ObjectId) -> bool {
        self.level.owns_object(id) && self.objects.add_to_spatial_map(id)
    }

    pub fn remove_from_spatial_map(&mut self, id: ObjectId) -> bool {
        self.level.owns_object(id) && self.objects.remove_from_spatial_map(id)
    }

    pub fn update_spatial_entity(&mut self, id: ObjectId) -> bool {
        self.level.owns_object(id) && self.objects.update_spatial_entity(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::LevelContents;
    use crate::object::ObjectKind;
    use crate::tilemap::TileMap;

    fn two_by_one() -> (Overworld, Uuid, Uuid) {
        let mut world = Overworld::new(
            "world".to_string(),
            2,
            1,
            1024.0,
            1024.0,
            &GridConfig::default(),
        );
        let a = world.place_level(0, 0, "world_a.nw".to_string());
        let b = world.place_level(1, 0, "world_b.nw".to_string());
        match (a, b) {
            (Some(a), Some(b)) => (world, a, b),
            _ => panic!("slots inside the overworld must accept levels"),
        }
    }

    fn npc(ctx: &mut WorldContext, x: f32, y: f32) -> MapObject {
        MapObject::new(
            ctx,
            ObjectKind::Npc {
                image: "guard.png".to_string(),
                script: String::new(),
            },
            Rect::new(x, y, 32.0, 32.0),
            0,
        )
    }

    #[derive(Default)]
    struct CountingLoader {
        loaded: Vec<String>,
    }

    impl LevelLoader for CountingLoader {
        fn load_level(
            &mut self,
            ctx: &mut WorldContext,
            name: &str,
        ) -> Result<LevelContents, LevelLoadError> {
            self.loaded.push(name.to_string());
            Ok(LevelContents {
                layers: vec![TileMap::new(0, 64, 64)],
                objects: vec![npc(ctx, 100.0, 100.0)],
            })
        }
    }

    struct FailingLoader;

    impl LevelLoader for FailingLoader {
        fn load_level(
            &mut self,
            _ctx: &mut WorldContext,
            name: &str,
        ) -> Result<LevelContents, LevelLoadError> {
            Err(LevelLoadError::Parse(format!("{}: bad header", name)))
        }
    }

    #[test]
    fn test_level_at_boundaries() {
        let (world, a, b) = two_by_one();
        assert_eq!(world.bounds(), Rect::new(0.0, 0.0, 2048.0, 1024.0));
        assert_eq!(world.level_at(1025.0, 10.0), Some(b));
        assert_eq!(world.level_at(1023.0, 10.0), Some(a));
        assert_eq!(world.level_at(1024.0, 10.0), Some(b));
        assert_eq!(world.level_in_slot(1, 0), Some(b));
        assert_eq!(world.level_in_slot(2, 0), None);
    }

    #[test]
    fn test_child_levels_have_no_own_index() {
        let (mut world, a, _) = two_by_one();
        let mut ctx = WorldContext::new();
        let level = world.level_mut(a);
        let Some(level) = level else {
            panic!("level a missing");
        };
        assert!(!level.is_standalone());
        assert!(level.add_object(npc(&mut ctx, 10.0, 10.0)).is_none());
    }

    #[test]
    fn test_child_level_registers_through_shared_index() {
        let (mut world, a, b) = two_by_one();
        let mut ctx = WorldContext::new();
        let Some(mut objects) = world.level_objects_mut(a) else {
            panic!("level a missing");
        };
        let id = objects.add_object(npc(&mut ctx, 200.0, 200.0));
        assert!(objects.level().owns_object(id));
        assert_eq!(objects.object(id).and_then(|o| o.level), Some(a));

        let mut found = Vec::new();
        world.search_objects(&mut ctx, Rect::new(190.0, 190.0, 50.0, 50.0), true, &mut found);
        assert_eq!(found, vec![id]);
        assert_eq!(world.object_at(210.0, 210.0), Some(id));

        // Another level's view cannot remove it.
        if let Some(mut other) = world.level_objects_mut(b) {
            assert!(other.remove_object(id).is_none());
            assert!(!other.remove_from_spatial_map(id));
        }
        assert!(world.object_index().is_indexed(id));

        if let Some(mut objects) = world.level_objects_mut(a) {
            assert!(objects.remove_from_spatial_map(id));
            assert!(objects.add_to_spatial_map(id));
            assert!(objects.remove_object(id).is_some());
        }
        assert_eq!(world.object_count(), 0);
        assert!(world.level(a).is_some_and(|l| l.object_count() == 0));
        assert!(world.level_objects_mut(Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_relocation_across_boundary() {
        let (mut world, a, b) = two_by_one();
        let mut ctx = WorldContext::new();
        let Some(id) = world.add_object(a, npc(&mut ctx, 980.0, 500.0)) else {
            panic!("add_object failed");
        };
        assert!(world.level(a).is_some_and(|l| l.owns_object(id)));

        // Drag across the shared edge.
        assert_eq!(world.move_object(id, 1100.0, 500.0), Some(b));
        assert_eq!(world.object(id).and_then(|o| o.level), Some(b));
        assert!(world.level(b).is_some_and(|l| l.owns_object(id)));
        assert!(world.level(a).is_some_and(|l| !l.owns_object(id)));

        let b_bounds = Rect::new(1024.0, 0.0, 1024.0, 1024.0);
        let mut in_b = Vec::new();
        world.search_objects(&mut ctx, b_bounds, true, &mut in_b);
        assert_eq!(in_b, vec![id]);

        let a_bounds = Rect::new(0.0, 0.0, 1024.0, 1024.0);
        let mut owned_by_a = Vec::new();
        world.search_objects_filtered(&mut ctx, a_bounds, false, &mut owned_by_a, |_, o| {
            o.level == Some(a)
        });
        assert!(owned_by_a.is_empty());
    }

    #[test]
    fn test_object_outside_every_level_is_detached() {
        let (mut world, a, _) = two_by_one();
        let mut ctx = WorldContext::new();
        let Some(id) = world.add_object(a, npc(&mut ctx, 10.0, 10.0)) else {
            panic!("add_object failed");
        };
        assert_eq!(world.move_object(id, 10.0, 3000.0), None);
        assert_eq!(world.object(id).and_then(|o| o.level), None);
        assert!(world.object_index().is_indexed(id));

        // Dropping it back re-attaches it.
        assert_eq!(world.move_object(id, 10.0, 10.0), Some(a));
    }

    #[test]
    fn test_remove_level_destroys_its_objects() {
        let (mut world, a, b) = two_by_one();
        let mut ctx = WorldContext::new();
        let in_a = world.add_object(a, npc(&mut ctx, 10.0, 10.0));
        let in_b = world.add_object(b, npc(&mut ctx, 1100.0, 10.0));

        assert!(world.remove_level(a).is_some());
        assert_eq!(world.level_count(), 1);
        assert_eq!(world.level_at(10.0, 10.0), None);
        assert!(in_a.and_then(|id| world.object(id)).is_none());
        assert!(in_b.and_then(|id| world.object(id)).is_some());
        assert_eq!(world.object_count(), 1);
    }

    #[test]
    fn test_place_level_replaces_slot_occupant() {
        let (mut world, a, _) = two_by_one();
        let replacement = world.place_level(0, 0, "world_c.nw".to_string());
        assert!(world.level(a).is_none());
        assert_eq!(world.level_at(10.0, 10.0), replacement);
        assert_eq!(world.level_count(), 2);
    }

    #[test]
    fn test_lazy_loading_only_touches_visible_levels() {
        let (mut world, a, b) = two_by_one();
        let mut ctx = WorldContext::new();
        let mut loader = CountingLoader::default();

        let loaded = world.load_levels_in(&mut ctx, Rect::new(0.0, 0.0, 800.0, 600.0), &mut loader);
        assert_eq!(loaded, Ok(1));
        assert_eq!(loader.loaded, vec!["world_a.nw".to_string()]);
        assert!(world.level(a).is_some_and(|l| l.is_loaded()));
        assert!(world.level(b).is_some_and(|l| !l.is_loaded()));

        // Already loaded levels are skipped; the neighbour loads once visible.
        let loaded = world.load_levels_in(&mut ctx, Rect::new(900.0, 0.0, 400.0, 600.0), &mut loader);
        assert_eq!(loaded, Ok(1));
        assert_eq!(loader.loaded.len(), 2);

        // Loaded objects are translated into world space.
        assert!(world.object_at(1024.0 + 110.0, 110.0).is_some());
        assert_eq!(world.object_count(), 2);
    }

    #[test]
    fn test_loader_errors_propagate() {
        let (mut world, a, _) = two_by_one();
        let mut ctx = WorldContext::new();
        let result = world.load_levels_in(&mut ctx, Rect::new(0.0, 0.0, 10.0, 10.0), &mut FailingLoader);
        assert_eq!(
            result,
            Err(LevelLoadError::Parse("world_a.nw: bad header".to_string()))
        );
        assert!(world.level(a).is_some_and(|l| !l.is_loaded()));
    }

    #[test]
    fn test_viewport_straddling_levels_is_one_query() {
        let (mut world, a, b) = two_by_one();
        let mut ctx = WorldContext::new();
        let mut loader = CountingLoader::default();
        let viewport = Rect::new(900.0, 0.0, 400.0, 400.0);
        assert_eq!(world.load_levels_in(&mut ctx, viewport, &mut loader), Ok(2));

        let left = world.add_object(a, npc(&mut ctx, 950.0, 50.0));
        let right = world.add_object(b, npc(&mut ctx, 1050.0, 50.0));

        let drawables = world.collect_drawables(&mut ctx, viewport);
        let layers = drawables
            .iter()
            .filter(|d| matches!(d.item, crate::DrawItem::Layer { .. }))
            .count();
        assert_eq!(layers, 2);
        for id in [left, right].into_iter().flatten() {
            assert!(drawables
                .iter()
                .any(|d| d.item == crate::DrawItem::Object(id)));
        }
        assert!(drawables
            .windows(2)
            .all(|w| (w[0].depth, w[0].micro_depth) <= (w[1].depth, w[1].micro_depth)));

        // Level a's far edge shares b's level cell; only b is drawn.
        let inside_b = world.collect_drawables(&mut ctx, Rect::new(1100.0, 0.0, 200.0, 200.0));
        let levels: Vec<_> = inside_b
            .iter()
            .filter_map(|d| match d.item {
                crate::DrawItem::Layer { level, .. } => Some(level),
                crate::DrawItem::Object(_) => None,
            })
            .collect();
        assert_eq!(levels, vec![b]);
    }
}
